// Durable-connection messages for the sitewright-sync.v1 protocol.
//
// One JSON message per WebSocket frame, tagged by `type`. The stream is a
// single ordered duplex pipe: requests are not acknowledged individually
// beyond their typed response, and concurrent commits for different
// selectors are not reordering-protected — callers serialize when ordering
// matters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{SourceLocation, StyleChange};

/// Client -> Engine requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncRequest {
    /// Commit a batch of style changes for one element into source.
    StyleUpdate {
        selector: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        /// Direct text content of the element, used as a locator hint.
        #[serde(skip_serializing_if = "Option::is_none")]
        text_content: Option<String>,
        changes: Vec<StyleChange>,
        #[serde(default)]
        skip_deploy: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_location: Option<SourceLocation>,
        /// The element's current class attribute, used as a locator hint.
        #[serde(skip_serializing_if = "Option::is_none")]
        class_name: Option<String>,
    },

    /// Replace one prose occurrence of `old_text` with `new_text`.
    TextUpdate {
        selector: String,
        old_text: String,
        new_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        #[serde(default)]
        skip_deploy: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_location: Option<SourceLocation>,
    },

    /// One transport-encoded chunk of an uploaded image asset.
    ImageUpload {
        upload_id: Uuid,
        /// Base64 (standard alphabet, padded) slice of the file.
        chunk: String,
        chunk_index: u32,
        total_chunks: u32,
        file_name: String,
        mime_type: String,
        file_size: u64,
        #[serde(default)]
        is_background: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        element_context: Option<String>,
    },
}

/// Outcome of converting a single property within a style batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyResult {
    pub property: String,
    pub success: bool,
    /// Utility-class token the property mapped to, when conversion succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Engine -> Client responses and status messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncResponse {
    StyleUpdated {
        success: bool,
        selector: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        /// Per-property outcomes; present even on partial success.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        results: Vec<PropertyResult>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    TextUpdated {
        success: bool,
        selector: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Non-terminal: chunks are still outstanding for this upload.
    UploadProgress {
        upload_id: Uuid,
        received_chunks: u32,
        total_chunks: u32,
    },

    ImageUploaded {
        success: bool,
        upload_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        image_path: Option<String>,
        /// Set when the asset was saved but no markup rewrite was attempted.
        #[serde(default)]
        requires_manual_update: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}
