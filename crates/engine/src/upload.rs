// Chunked upload reassembly.
//
// Chunks arrive over the durable connection in no guaranteed order, each
// base64-encoded independently. Slots are index-addressed so arrival order
// is irrelevant; the first write to a slot is authoritative and duplicates
// are dropped. A buffer lives only until its last chunk lands (or it goes
// stale), keeping memory bounded.

use std::collections::HashMap;

use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("chunk index {index} out of range for upload with {total} chunks")]
    IndexOutOfRange { index: u32, total: u32 },

    #[error("upload {0} declared zero chunks")]
    ZeroChunks(Uuid),

    #[error("chunk {index} of upload {upload_id} is not valid base64: {detail}")]
    InvalidEncoding { upload_id: Uuid, index: u32, detail: String },

    /// `total_chunks` changed between chunks of the same upload.
    #[error("upload {0} metadata conflicts with its first chunk")]
    MetadataMismatch(Uuid),
}

/// Progress of one upload after accepting a chunk.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadStatus {
    /// Still waiting for more chunks.
    Pending { received: u32, total: u32 },
    /// All chunks arrived; payload is the decoded file.
    Complete(CompletedUpload),
}

#[derive(Debug, PartialEq, Eq)]
pub struct CompletedUpload {
    pub upload_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub is_background: bool,
    pub element_context: Option<String>,
}

/// One chunk as received off the wire.
#[derive(Debug, Clone)]
pub struct UploadChunk {
    pub upload_id: Uuid,
    pub chunk: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub file_name: String,
    pub mime_type: String,
    pub is_background: bool,
    pub element_context: Option<String>,
}

struct UploadBuffer {
    file_name: String,
    mime_type: String,
    total_chunks: u32,
    slots: Vec<Option<String>>,
    received: u32,
    is_background: bool,
    element_context: Option<String>,
    created_at: DateTime<Utc>,
}

/// Reassembles uploads keyed by id.
#[derive(Default)]
pub struct UploadReassembler {
    buffers: HashMap<Uuid, UploadBuffer>,
}

impl UploadReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one chunk. Returns the upload's status afterwards; on
    /// `Complete` the buffer has already been discarded.
    pub fn accept(&mut self, chunk: UploadChunk) -> Result<UploadStatus, UploadError> {
        if chunk.total_chunks == 0 {
            return Err(UploadError::ZeroChunks(chunk.upload_id));
        }

        let buffer = self.buffers.entry(chunk.upload_id).or_insert_with(|| UploadBuffer {
            file_name: chunk.file_name.clone(),
            mime_type: chunk.mime_type.clone(),
            total_chunks: chunk.total_chunks,
            slots: vec![None; chunk.total_chunks as usize],
            received: 0,
            is_background: chunk.is_background,
            element_context: chunk.element_context.clone(),
            created_at: Utc::now(),
        });

        if buffer.total_chunks != chunk.total_chunks {
            return Err(UploadError::MetadataMismatch(chunk.upload_id));
        }
        if chunk.chunk_index >= buffer.total_chunks {
            return Err(UploadError::IndexOutOfRange {
                index: chunk.chunk_index,
                total: buffer.total_chunks,
            });
        }

        let slot = &mut buffer.slots[chunk.chunk_index as usize];
        if slot.is_none() {
            // First arrival wins; a duplicate index is dropped silently.
            *slot = Some(chunk.chunk);
            buffer.received += 1;
        }

        if buffer.received < buffer.total_chunks {
            return Ok(UploadStatus::Pending {
                received: buffer.received,
                total: buffer.total_chunks,
            });
        }

        // Complete: decode in index order and discard the buffer whether or
        // not decoding succeeds.
        let buffer = self
            .buffers
            .remove(&chunk.upload_id)
            .expect("buffer exists; it was just updated");
        let mut bytes = Vec::new();
        for (index, slot) in buffer.slots.iter().enumerate() {
            let encoded = slot.as_ref().expect("all slots filled at completion");
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|error| UploadError::InvalidEncoding {
                    upload_id: chunk.upload_id,
                    index: index as u32,
                    detail: error.to_string(),
                })?;
            bytes.extend_from_slice(&decoded);
        }

        Ok(UploadStatus::Complete(CompletedUpload {
            upload_id: chunk.upload_id,
            file_name: buffer.file_name,
            mime_type: buffer.mime_type,
            bytes,
            is_background: buffer.is_background,
            element_context: buffer.element_context,
        }))
    }

    /// Drop incomplete buffers older than `max_age`. Returns evicted ids.
    pub fn evict_stale(&mut self, max_age: Duration) -> Vec<Uuid> {
        let cutoff = Utc::now() - max_age;
        let stale: Vec<Uuid> = self
            .buffers
            .iter()
            .filter(|(_, buffer)| buffer.created_at < cutoff)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.buffers.remove(id);
            tracing::warn!(upload_id = %id, "evicted stale incomplete upload");
        }
        stale
    }

    pub fn pending_count(&self) -> usize {
        self.buffers.len()
    }
}

/// Target path for a completed upload, under the public asset directory.
pub fn asset_path(upload_dir: &str, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("{}/{safe_name}", upload_dir.trim_end_matches('/'))
}
