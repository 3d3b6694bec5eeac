// Host edit controller: selection, style layering, history, durable sync.
//
// Two style maps exist per selector. `committed` mirrors what has been sent
// for durable persistence; `preview` is ephemeral and visual-only. Preview
// merges rather than replaces so independently previewed properties
// compose. Undo and redo replay inverse entries through the durable path —
// the engine, not this controller, is the source of truth for files.

use std::collections::{BTreeMap, HashMap};

use sitewright_common::protocol::frame::FrameMessage;
use sitewright_common::protocol::sync::{SyncRequest, SyncResponse};
use sitewright_common::types::{ElementDescriptor, HistoryEntry, StyleChange};
use thiserror::Error;
use tracing::{debug, warn};

use crate::history::EditHistory;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("no element is selected")]
    NoSelection,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

/// Sync lifecycle of the last committed edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    /// A durable update is in flight.
    Saving,
    /// Saved to source but not redeployed yet.
    PendingDeploy,
    /// The last durable update failed.
    Failed,
}

#[derive(Debug, Default)]
pub struct EditController {
    enabled: bool,
    selected: Option<ElementDescriptor>,
    hovered: Option<ElementDescriptor>,
    committed: HashMap<String, BTreeMap<String, String>>,
    preview: HashMap<String, BTreeMap<String, String>>,
    history: EditHistory,
    sync_status: SyncStatus,
    last_error: Option<String>,
    outbound_frame: Vec<FrameMessage>,
    outbound_sync: Vec<SyncRequest>,
}

impl EditController {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Outbound queues (drained by the embedder's transports) ──────

    pub fn take_frame_messages(&mut self) -> Vec<FrameMessage> {
        std::mem::take(&mut self.outbound_frame)
    }

    pub fn take_sync_requests(&mut self) -> Vec<SyncRequest> {
        std::mem::take(&mut self.outbound_sync)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    pub fn enable(&mut self) {
        self.enabled = true;
        self.outbound_frame.push(FrameMessage::Enable);
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.selected = None;
        self.hovered = None;
        self.preview.clear();
        self.outbound_frame.push(FrameMessage::Disable);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn selected(&self) -> Option<&ElementDescriptor> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&ElementDescriptor> {
        self.hovered.as_ref()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Frame messages in ───────────────────────────────────────────

    pub fn handle_frame_message(&mut self, message: FrameMessage) {
        match message {
            // A reload drops the overlay's state: re-arm and re-apply any
            // outstanding preview styles.
            FrameMessage::Ready => {
                if self.enabled {
                    self.outbound_frame.push(FrameMessage::Enable);
                    for (selector, styles) in &self.preview {
                        self.outbound_frame.push(FrameMessage::PreviewStyle {
                            selector: selector.clone(),
                            styles: styles.clone(),
                        });
                    }
                }
            }
            FrameMessage::ElementHovered { element } => {
                self.hovered = element;
            }
            FrameMessage::ElementSelected { element } => {
                debug!(selector = %element.selector, "element selected");
                self.selected = Some(element);
            }
            FrameMessage::ElementDeselected => {
                self.selected = None;
            }
            FrameMessage::TextEdit { selector, old_text, new_text, source_location } => {
                self.outbound_sync.push(SyncRequest::TextUpdate {
                    selector,
                    old_text,
                    new_text,
                    file_path: source_location.as_ref().map(|loc| loc.file_path.clone()),
                    skip_deploy: false,
                    source_location,
                });
                self.sync_status = SyncStatus::Saving;
            }
            FrameMessage::Error { message, context } => {
                warn!(message, ?context, "overlay error");
                self.last_error = Some(message);
            }
            // Host->frame messages echoing back and frame chatter we don't
            // track are ignored.
            _ => {}
        }
    }

    // ── Preview layer ───────────────────────────────────────────────

    /// Merge one property into the selected element's preview map and
    /// re-send the full merged map.
    pub fn preview_style(&mut self, property: &str, value: &str) -> Result<(), ControllerError> {
        let selector = self.selected.as_ref().ok_or(ControllerError::NoSelection)?.selector.clone();

        let committed = self.committed.get(&selector).cloned().unwrap_or_default();
        let preview = self.preview.entry(selector.clone()).or_insert(committed);
        preview.insert(property.to_string(), value.to_string());

        self.outbound_frame.push(FrameMessage::PreviewStyle {
            selector,
            styles: preview.clone(),
        });
        Ok(())
    }

    /// Drop the preview layer, reverting the frame to the committed state.
    pub fn clear_preview(&mut self) -> Result<(), ControllerError> {
        let selector = self.selected.as_ref().ok_or(ControllerError::NoSelection)?.selector.clone();
        self.preview.remove(&selector);

        match self.committed.get(&selector) {
            Some(styles) if !styles.is_empty() => {
                self.outbound_frame.push(FrameMessage::PreviewStyle {
                    selector,
                    styles: styles.clone(),
                });
            }
            _ => {
                self.outbound_frame.push(FrameMessage::ClearPreview { selector: Some(selector) });
            }
        }
        Ok(())
    }

    /// Effective styles for a selector: preview when present, else committed.
    pub fn effective_styles(&self, selector: &str) -> BTreeMap<String, String> {
        self.preview
            .get(selector)
            .or_else(|| self.committed.get(selector))
            .cloned()
            .unwrap_or_default()
    }

    // ── Commit path ─────────────────────────────────────────────────

    /// Commit a batch of changes: move preview into committed, record one
    /// history entry, and emit a durable update request.
    pub fn apply_styles(&mut self, changes: Vec<StyleChange>) -> Result<(), ControllerError> {
        let descriptor = self.selected.as_ref().ok_or(ControllerError::NoSelection)?.clone();
        let selector = descriptor.selector.clone();

        let committed = self.committed.entry(selector.clone()).or_default();
        for change in &changes {
            committed.insert(change.property.clone(), change.new_value.clone());
        }
        self.preview.remove(&selector);

        let file_path = descriptor.source_location.as_ref().map(|loc| loc.file_path.clone());
        self.history.record(selector.clone(), file_path.clone(), changes.clone());

        self.push_style_update(&descriptor, changes);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), ControllerError> {
        let entry = self.history.undo().ok_or(ControllerError::NothingToUndo)?;
        self.replay(entry);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), ControllerError> {
        let entry = self.history.redo().ok_or(ControllerError::NothingToRedo)?;
        self.replay(entry);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replay a history entry (already inverted for undo) through the same
    /// durable path a fresh commit takes.
    fn replay(&mut self, entry: HistoryEntry) {
        let committed = self.committed.entry(entry.selector.clone()).or_default();
        for change in &entry.changes {
            committed.insert(change.property.clone(), change.new_value.clone());
        }

        let descriptor = match self.selected.as_ref() {
            Some(selected) if selected.selector == entry.selector => Some(selected.clone()),
            _ => None,
        };

        self.outbound_sync.push(SyncRequest::StyleUpdate {
            selector: entry.selector.clone(),
            file_path: entry.file_path.clone(),
            text_content: descriptor.as_ref().and_then(|d| d.text_content.clone()),
            changes: entry.changes,
            skip_deploy: false,
            source_location: descriptor.as_ref().and_then(|d| d.source_location.clone()),
            class_name: descriptor.map(|d| d.class_attribute),
        });
        self.sync_status = SyncStatus::Saving;
    }

    fn push_style_update(&mut self, descriptor: &ElementDescriptor, changes: Vec<StyleChange>) {
        self.outbound_sync.push(SyncRequest::StyleUpdate {
            selector: descriptor.selector.clone(),
            file_path: descriptor.source_location.as_ref().map(|loc| loc.file_path.clone()),
            text_content: descriptor.text_content.clone(),
            changes,
            skip_deploy: false,
            source_location: descriptor.source_location.clone(),
            class_name: Some(descriptor.class_attribute.clone()),
        });
        self.sync_status = SyncStatus::Saving;
    }

    // ── Sync responses in ───────────────────────────────────────────

    pub fn handle_sync_response(&mut self, response: SyncResponse) {
        match response {
            SyncResponse::StyleUpdated { success, selector, error, .. }
            | SyncResponse::TextUpdated { success, selector, error, .. } => {
                if success {
                    debug!(selector = %selector, "durable update saved");
                    self.sync_status = SyncStatus::PendingDeploy;
                    self.last_error = None;
                } else {
                    warn!(selector = %selector, ?error, "durable update failed");
                    self.sync_status = SyncStatus::Failed;
                    self.last_error = error;
                }
            }
            SyncResponse::UploadProgress { .. } => {}
            SyncResponse::ImageUploaded { success, error, .. } => {
                if !success {
                    self.sync_status = SyncStatus::Failed;
                    self.last_error = error;
                }
            }
        }
    }

    /// Called when the user refreshes the preview after a deploy.
    pub fn mark_deployed(&mut self) {
        if self.sync_status == SyncStatus::PendingDeploy {
            self.sync_status = SyncStatus::Idle;
        }
    }
}
