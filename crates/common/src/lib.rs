// sitewright-common: shared types and utilities for the Sitewright workspace

pub mod path;
pub mod protocol;
pub mod types;
