// Cross-frame messages exchanged between the host and the preview frame.
//
// The underlying channel is a wildcard-target postMessage pipe, so it also
// carries unrelated traffic: every envelope is tagged with a constant prefix
// and receivers drop anything that does not carry it. Delivery is
// fire-and-forget, FIFO per direction, with no acknowledgements.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ElementDescriptor, SourceLocation};

/// Constant envelope tag for the sitewright-frame.v1 protocol.
pub const FRAME_PREFIX: &str = "sitewright";

/// All message types in the sitewright-frame.v1 cross-frame protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameMessage {
    /// Host -> Frame: arm the overlay and install listeners.
    Enable,

    /// Host -> Frame: tear down the overlay and restore element styles.
    Disable,

    /// Host -> Frame: apply an ephemeral style map to one element.
    PreviewStyle {
        selector: String,
        styles: std::collections::BTreeMap<String, String>,
    },

    /// Host -> Frame: revert preview styles (all elements when no selector).
    ClearPreview {
        #[serde(skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },

    /// Host -> Frame: programmatically select an element.
    SelectElement { selector: String },

    /// Host -> Frame: replace an element's direct text content.
    UpdateText { selector: String, text: String },

    /// Frame -> Host: overlay script loaded (re-sent after frame reloads).
    Ready,

    /// Frame -> Host: pointer entered or left an eligible element.
    ElementHovered { element: Option<ElementDescriptor> },

    /// Frame -> Host: an element was selected.
    ElementSelected { element: ElementDescriptor },

    /// Frame -> Host: the current selection was dismissed.
    ElementDeselected,

    /// Frame -> Host: an inline text edit was committed.
    TextEdit {
        selector: String,
        old_text: String,
        new_text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_location: Option<SourceLocation>,
    },

    /// Frame -> Host: a host-requested text update was applied in the DOM.
    TextEdited {
        selector: String,
        old_text: String,
        new_text: String,
    },

    /// Frame -> Host: overlay-side failure.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
}

/// Prefix-tagged wire envelope around a [`FrameMessage`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameEnvelope {
    pub prefix: String,
    #[serde(flatten)]
    pub message: FrameMessage,
}

impl FrameEnvelope {
    pub fn new(message: FrameMessage) -> Self {
        Self { prefix: FRAME_PREFIX.to_string(), message }
    }
}

/// Serialize a message into its prefix-tagged wire form.
pub fn encode(message: &FrameMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&FrameEnvelope {
        prefix: FRAME_PREFIX.to_string(),
        message: message.clone(),
    })
}

/// Decode one raw envelope received from the channel.
///
/// Returns `None` for wrong-prefix envelopes (unrelated traffic shares the
/// channel) and for well-prefixed envelopes whose `type` is unknown — both
/// are dropped silently, never surfaced as errors.
pub fn decode(raw: &str) -> Option<FrameMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    decode_value(&value)
}

/// Decode an already-parsed JSON value (the channel may deliver objects).
pub fn decode_value(value: &Value) -> Option<FrameMessage> {
    if value.get("prefix")?.as_str()? != FRAME_PREFIX {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}
