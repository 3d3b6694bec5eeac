// sitewright-engine: deterministic source patcher behind the durable sync connection.

pub mod config;
pub mod patch;
pub mod rpc;
pub mod store;
pub mod upload;
