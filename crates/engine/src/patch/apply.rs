// Patch orchestration: one durable request in, at most one file write out.
//
// The rewrite is atomic from the caller's perspective: the new class string
// is folded in memory across the whole batch and written with a single
// `save_file`, or nothing is written at all.

use std::sync::Arc;

use sitewright_common::path::normalize_source_path;
use sitewright_common::protocol::sync::PropertyResult;
use sitewright_common::types::{SourceLocation, StyleChange};
use tracing::{info, warn};

use crate::patch::classes;
use crate::patch::locator::{self, ElementLocation, LocationKind, LocatorHints};
use crate::patch::text::{self, TextReplaceError};
use crate::patch::PatchError;
use crate::store::{FileStore, SourceFile};

/// Outcome of a style batch: the saved file plus per-property results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePatchOutcome {
    pub file_path: String,
    pub results: Vec<PropertyResult>,
    /// False when every property in the batch failed conversion.
    pub any_applied: bool,
}

/// Hints accompanying a style update request.
#[derive(Debug, Clone, Default)]
pub struct StyleUpdateInput {
    pub selector: String,
    pub file_path: Option<String>,
    pub text_content: Option<String>,
    pub changes: Vec<StyleChange>,
    pub source_location: Option<SourceLocation>,
    pub class_name: Option<String>,
}

/// Hints accompanying a text update request.
#[derive(Debug, Clone, Default)]
pub struct TextUpdateInput {
    pub selector: String,
    pub old_text: String,
    pub new_text: String,
    pub file_path: Option<String>,
    pub source_location: Option<SourceLocation>,
}

/// Deterministic source patcher over a file collaborator.
#[derive(Clone)]
pub struct Patcher {
    store: Arc<dyn FileStore>,
}

impl Patcher {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    /// Apply a batch of style changes for one element and save the file.
    pub fn apply_style_update(&self, input: &StyleUpdateInput) -> Result<StylePatchOutcome, PatchError> {
        let file = self.resolve_file(input.file_path.as_deref(), input.source_location.as_ref())?;

        let hints = LocatorHints {
            selector: &input.selector,
            line_number: input.source_location.as_ref().map(|location| location.line_number),
            text_content: input.text_content.as_deref(),
            class_attribute: input.class_name.as_deref(),
        };

        let Some((location, strategy)) = locator::locate_element(&file.contents, &hints) else {
            warn!(selector = %input.selector, file = %file.file_path, "no locator strategy matched");
            return Err(PatchError::Locate {
                selector: input.selector.clone(),
                file_path: file.file_path.clone(),
                strategies_tried: locator::strategy_names(),
            });
        };

        let (class_attribute, results) = fold_changes(&location.current_text, &input.changes);
        let any_applied = results.iter().any(|result| result.success);

        if any_applied {
            let contents = splice(&file.contents, &location, &class_attribute);
            let message = format!("Update styles for {}", input.selector);
            self.store.save_file(&file.file_path, &contents, &message)?;
            info!(
                selector = %input.selector,
                file = %file.file_path,
                strategy,
                applied = results.iter().filter(|result| result.success).count(),
                "style update saved"
            );
        }

        Ok(StylePatchOutcome { file_path: file.file_path, results, any_applied })
    }

    /// Replace one safe occurrence of the element's text and save the file.
    pub fn apply_text_update(&self, input: &TextUpdateInput) -> Result<String, PatchError> {
        let file = self.resolve_file(input.file_path.as_deref(), input.source_location.as_ref())?;

        // Best-effort bias: when the element resolves, search near it first.
        let hints = LocatorHints {
            selector: &input.selector,
            line_number: input.source_location.as_ref().map(|location| location.line_number),
            text_content: Some(&input.old_text),
            class_attribute: None,
        };
        let bias = locator::locate_element(&file.contents, &hints)
            .map(|(location, _)| location.start);

        let patched = text::replace_text(&file.contents, &input.old_text, &input.new_text, bias)
            .map_err(|error| match error {
                TextReplaceError::NotFound(old_text) => {
                    PatchError::TextNotFound { old_text, file_path: file.file_path.clone() }
                }
                TextReplaceError::NoSafeOccurrence(old_text) => {
                    PatchError::UnsafeText { old_text, file_path: file.file_path.clone() }
                }
            })?;

        let message = format!("Update text for {}", input.selector);
        self.store.save_file(&file.file_path, &patched, &message)?;
        info!(selector = %input.selector, file = %file.file_path, "text update saved");
        Ok(file.file_path)
    }

    /// Pick the source file named by the request, trying the explicit path
    /// first and the source location second. Paths are normalized before
    /// comparison against store keys.
    fn resolve_file(
        &self,
        file_path: Option<&str>,
        source_location: Option<&SourceLocation>,
    ) -> Result<SourceFile, PatchError> {
        let mut candidates = Vec::new();
        if let Some(path) = file_path {
            candidates.push(path);
        }
        if let Some(location) = source_location {
            candidates.push(&location.file_path);
        }
        if candidates.is_empty() {
            return Err(PatchError::FileNotFound("(no path hint)".to_string()));
        }

        let files = self.store.list_files()?;
        for candidate in &candidates {
            let Ok(normalized) = normalize_source_path(candidate) else { continue };
            if let Some(file) = files.iter().find(|file| file.file_path == normalized) {
                return Ok(file.clone());
            }
            // Locations sometimes carry a deeper root; match on suffix.
            if let Some(file) = files
                .iter()
                .find(|file| normalized.ends_with(&format!("/{}", file.file_path)))
            {
                return Ok(file.clone());
            }
        }

        Err(PatchError::FileNotFound(candidates.join(", ")))
    }
}

/// Fold a batch of changes into a running class string, reporting each
/// property separately. A failed conversion never aborts its siblings.
fn fold_changes(initial: &str, changes: &[StyleChange]) -> (String, Vec<PropertyResult>) {
    let mut class_attribute = initial.to_string();
    let mut results = Vec::with_capacity(changes.len());

    for change in changes {
        match classes::apply_change(&class_attribute, &change.property, &change.new_value) {
            Ok(applied) => {
                class_attribute = applied.class_attribute;
                results.push(PropertyResult {
                    property: change.property.clone(),
                    success: true,
                    token: Some(applied.token),
                    error: None,
                });
            }
            Err(error) => {
                results.push(PropertyResult {
                    property: change.property.clone(),
                    success: false,
                    token: None,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    (class_attribute, results)
}

/// Write the new class string back into the file text.
fn splice(source: &str, location: &ElementLocation, class_attribute: &str) -> String {
    let replacement = match location.kind {
        LocationKind::Attribute => class_attribute.to_string(),
        // Insertion point sits right after the tag name; the spelling
        // follows what the file already uses.
        LocationKind::Insert => {
            format!(" {}=\"{class_attribute}\"", location.attribute_name)
        }
    };

    let mut patched = String::with_capacity(source.len() + replacement.len());
    patched.push_str(&source[..location.start]);
    patched.push_str(&replacement);
    patched.push_str(&source[location.end..]);
    patched
}
