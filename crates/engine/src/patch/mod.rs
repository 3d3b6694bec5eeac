// Deterministic source patching: locate, convert, rewrite.
//
// Everything here operates on raw source text with byte offsets and
// substring heuristics — intentionally no parser, so edits stay fast and
// require no build step. The trade-off is approximation: every strategy
// either succeeds with a verified span or refuses, and nothing is ever
// written on a failed locate.

pub mod apply;
pub mod classes;
pub mod locator;
pub mod text;

use thiserror::Error;

pub use apply::Patcher;
pub use locator::{locate_element, ElementLocation, LocationKind, LocatorHints};

/// Failure taxonomy for patch operations.
#[derive(Debug, Error)]
pub enum PatchError {
    /// No locator strategy resolved an element; the file was not touched.
    #[error("could not locate element {selector} in {file_path} (strategies tried: {strategies_tried})")]
    Locate {
        selector: String,
        file_path: String,
        strategies_tried: String,
    },

    /// No source file matched the request's path hints.
    #[error("no source file found for {0}")]
    FileNotFound(String),

    /// Every occurrence of the old text failed the safety predicate.
    #[error("no safe occurrence of {old_text:?} found in {file_path}")]
    UnsafeText { old_text: String, file_path: String },

    /// The old text does not occur in the file at all.
    #[error("text {old_text:?} not found in {file_path}")]
    TextNotFound { old_text: String, file_path: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
