pub mod normalize;

pub use normalize::{normalize_source_path, PathError};
