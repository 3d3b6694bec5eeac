// Sandbox path normalization: absolute container paths to project-relative.

use thiserror::Error;

/// Sandbox workspace mount point, e.g. `/workspace/<instance-id>/src/App.tsx`.
const WORKSPACE_ROOT: &str = "/workspace/";

/// Container app root, e.g. `/app/src/App.tsx`.
const APP_ROOT: &str = "/app/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path contains directory traversal component: {0}")]
    Traversal(String),

    #[error("path contains null byte")]
    NullByte,
}

/// Reduce a source-location path to the project-relative form used as a
/// source-file key.
///
/// Rules (stable, applied in order):
/// - Strip a leading `/workspace/<instance-id>/` segment
/// - Strip a leading `/app/` prefix
/// - Strip a redundant leading slash before `src/`
/// - Reject `.` and `..` components and null bytes
///
/// Already-relative paths pass through unchanged, so the function is
/// idempotent.
pub fn normalize_source_path(input: &str) -> Result<String, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let stripped = strip_sandbox_prefix(input);

    let relative = stripped.strip_prefix('/').unwrap_or(stripped);
    if relative.is_empty() {
        return Err(PathError::Empty);
    }

    for component in relative.split('/') {
        if component == "." || component == ".." {
            return Err(PathError::Traversal(component.to_string()));
        }
    }

    Ok(relative.to_string())
}

fn strip_sandbox_prefix(path: &str) -> &str {
    if let Some(rest) = path.strip_prefix(WORKSPACE_ROOT) {
        // The first segment after /workspace/ is the instance id.
        match rest.split_once('/') {
            Some((_instance_id, project_path)) => return project_path,
            None => return rest,
        }
    }

    if let Some(rest) = path.strip_prefix(APP_ROOT) {
        return rest;
    }

    path
}
