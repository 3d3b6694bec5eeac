// Request dispatch for the sync connection.

use std::sync::{Arc, Mutex};

use chrono::Duration;
use sitewright_common::protocol::sync::{SyncRequest, SyncResponse};
use sitewright_common::types::{SourceLocation, StyleChange};
use tracing::{info, warn};
use uuid::Uuid;

use crate::patch::apply::{StyleUpdateInput, TextUpdateInput};
use crate::patch::Patcher;
use crate::store::FileStore;
use crate::upload::{asset_path, UploadChunk, UploadReassembler, UploadStatus};

/// Shared state behind the sync WebSocket.
#[derive(Clone)]
pub struct EngineState {
    patcher: Patcher,
    store: Arc<dyn FileStore>,
    uploads: Arc<Mutex<UploadReassembler>>,
    upload_dir: String,
    upload_stale: Duration,
}

impl EngineState {
    pub fn new(store: Arc<dyn FileStore>, upload_dir: String, upload_stale_secs: u64) -> Self {
        Self {
            patcher: Patcher::new(store.clone()),
            store,
            uploads: Arc::new(Mutex::new(UploadReassembler::new())),
            upload_dir,
            upload_stale: Duration::seconds(upload_stale_secs as i64),
        }
    }

    /// Handle one decoded request, producing exactly one response.
    pub fn handle_request(&self, request: SyncRequest) -> SyncResponse {
        match request {
            SyncRequest::StyleUpdate {
                selector,
                file_path,
                text_content,
                changes,
                skip_deploy,
                source_location,
                class_name,
            } => self.handle_style_update(
                selector,
                file_path,
                text_content,
                changes,
                skip_deploy,
                source_location,
                class_name,
            ),
            SyncRequest::TextUpdate {
                selector,
                old_text,
                new_text,
                file_path,
                skip_deploy: _,
                source_location,
            } => self.handle_text_update(selector, old_text, new_text, file_path, source_location),
            SyncRequest::ImageUpload {
                upload_id,
                chunk,
                chunk_index,
                total_chunks,
                file_name,
                mime_type,
                file_size: _,
                is_background,
                element_context,
            } => self.handle_image_upload(UploadChunk {
                upload_id,
                chunk,
                chunk_index,
                total_chunks,
                file_name,
                mime_type,
                is_background,
                element_context,
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_style_update(
        &self,
        selector: String,
        file_path: Option<String>,
        text_content: Option<String>,
        changes: Vec<StyleChange>,
        skip_deploy: bool,
        source_location: Option<SourceLocation>,
        class_name: Option<String>,
    ) -> SyncResponse {
        let input = StyleUpdateInput {
            selector: selector.clone(),
            file_path,
            text_content,
            changes,
            source_location,
            class_name,
        };

        match self.patcher.apply_style_update(&input) {
            Ok(outcome) => {
                info!(selector = %selector, file = %outcome.file_path, skip_deploy, "style update handled");
                SyncResponse::StyleUpdated {
                    success: outcome.any_applied,
                    selector,
                    file_path: Some(outcome.file_path),
                    results: outcome.results,
                    error: None,
                }
            }
            Err(error) => {
                warn!(selector = %selector, %error, "style update failed");
                SyncResponse::StyleUpdated {
                    success: false,
                    selector,
                    file_path: None,
                    results: Vec::new(),
                    error: Some(error.to_string()),
                }
            }
        }
    }

    fn handle_text_update(
        &self,
        selector: String,
        old_text: String,
        new_text: String,
        file_path: Option<String>,
        source_location: Option<SourceLocation>,
    ) -> SyncResponse {
        let input = TextUpdateInput {
            selector: selector.clone(),
            old_text,
            new_text,
            file_path,
            source_location,
        };

        match self.patcher.apply_text_update(&input) {
            Ok(saved_path) => SyncResponse::TextUpdated {
                success: true,
                selector,
                file_path: Some(saved_path),
                error: None,
            },
            Err(error) => {
                warn!(selector = %selector, %error, "text update failed");
                SyncResponse::TextUpdated {
                    success: false,
                    selector,
                    file_path: None,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    fn handle_image_upload(&self, chunk: UploadChunk) -> SyncResponse {
        let upload_id = chunk.upload_id;

        let status = {
            let mut uploads = self.uploads.lock().expect("upload lock poisoned");
            uploads.evict_stale(self.upload_stale);
            uploads.accept(chunk)
        };

        match status {
            Ok(UploadStatus::Pending { received, total }) => SyncResponse::UploadProgress {
                upload_id,
                received_chunks: received,
                total_chunks: total,
            },
            Ok(UploadStatus::Complete(upload)) => {
                let path = asset_path(&self.upload_dir, &upload.file_name);
                let message = format!("Upload image {}", upload.file_name);
                match self.store.save_binary(&path, &upload.bytes, &message) {
                    Ok(()) => {
                        info!(upload_id = %upload_id, path = %path, "upload stored");
                        SyncResponse::ImageUploaded {
                            success: true,
                            upload_id,
                            image_path: Some(path),
                            // No markup rewrite is attempted for uploads.
                            requires_manual_update: true,
                            error: None,
                        }
                    }
                    Err(error) => upload_failure(upload_id, &error.to_string()),
                }
            }
            Err(error) => upload_failure(upload_id, &error.to_string()),
        }
    }
}

fn upload_failure(upload_id: Uuid, error: &str) -> SyncResponse {
    warn!(upload_id = %upload_id, error, "upload failed");
    SyncResponse::ImageUploaded {
        success: false,
        upload_id,
        image_path: None,
        requires_manual_update: false,
        error: Some(error.to_string()),
    }
}

/// Decode raw bytes off the socket and dispatch; undecodable payloads get
/// no response (the channel carries one JSON request per message).
pub fn handle_raw_request(payload: &[u8], state: &EngineState) -> Option<SyncResponse> {
    let request: SyncRequest = match serde_json::from_slice(payload) {
        Ok(request) => request,
        Err(error) => {
            warn!(%error, "dropping undecodable sync request");
            return None;
        }
    };
    Some(state.handle_request(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use base64::Engine as _;

    fn state_with(files: &[(&str, &str)]) -> (EngineState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(
            files.iter().map(|(path, contents)| (path.to_string(), contents.to_string())),
        ));
        (EngineState::new(store.clone(), "public/images".to_string(), 300), store)
    }

    #[test]
    fn style_update_round_trip() {
        let (state, store) =
            state_with(&[("src/App.tsx", "<div className=\"hero-card p-2\">Hi</div>")]);

        let response = state.handle_request(SyncRequest::StyleUpdate {
            selector: "sw-el-1".to_string(),
            file_path: Some("src/App.tsx".to_string()),
            text_content: None,
            changes: vec![StyleChange {
                property: "backgroundColor".to_string(),
                old_value: "#ffffff".to_string(),
                new_value: "#0f172a".to_string(),
            }],
            skip_deploy: false,
            source_location: None,
            class_name: Some("hero-card".to_string()),
        });

        match response {
            SyncResponse::StyleUpdated { success, results, .. } => {
                assert!(success);
                assert_eq!(results[0].token.as_deref(), Some("bg-slate-900"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
        assert!(store.contents_of("src/App.tsx").unwrap().contains("hero-card p-2 bg-slate-900"));
    }

    #[test]
    fn locate_failure_maps_to_failed_response() {
        let (state, _) = state_with(&[("src/App.tsx", "<div>no classes</div>")]);
        let response = state.handle_request(SyncRequest::StyleUpdate {
            selector: "sw-el-1".to_string(),
            file_path: Some("src/App.tsx".to_string()),
            text_content: None,
            changes: Vec::new(),
            skip_deploy: false,
            source_location: None,
            class_name: None,
        });
        match response {
            SyncResponse::StyleUpdated { success, error, .. } => {
                assert!(!success);
                assert!(error.unwrap().contains("locate"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn upload_progresses_then_completes() {
        let (state, store) = state_with(&[]);
        let upload_id = Uuid::new_v4();
        let encode =
            |bytes: &[u8]| base64::engine::general_purpose::STANDARD.encode(bytes);

        let first = state.handle_request(SyncRequest::ImageUpload {
            upload_id,
            chunk: encode(b"PNG-"),
            chunk_index: 1,
            total_chunks: 2,
            file_name: "logo.png".to_string(),
            mime_type: "image/png".to_string(),
            file_size: 8,
            is_background: false,
            element_context: None,
        });
        assert_eq!(
            first,
            SyncResponse::UploadProgress { upload_id, received_chunks: 1, total_chunks: 2 }
        );

        let second = state.handle_request(SyncRequest::ImageUpload {
            upload_id,
            chunk: encode(b"head"),
            chunk_index: 0,
            total_chunks: 2,
            file_name: "logo.png".to_string(),
            mime_type: "image/png".to_string(),
            file_size: 8,
            is_background: false,
            element_context: None,
        });
        match second {
            SyncResponse::ImageUploaded { success, image_path, .. } => {
                assert!(success);
                assert_eq!(image_path.as_deref(), Some("public/images/logo.png"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(store.binary_of("public/images/logo.png").unwrap(), b"headPNG-");
    }

    #[test]
    fn undecodable_payload_is_dropped() {
        let (state, _) = state_with(&[]);
        assert!(handle_raw_request(b"{]garbage", &state).is_none());
    }
}
