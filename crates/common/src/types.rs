// Core domain types shared across all Sitewright crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a rendered element originates in the application's source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLocation {
    pub file_path: String,
    /// 1-based line number.
    pub line_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

/// Viewport-relative bounding rectangle of a live element.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BoundingRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Snapshot of a live element taken when it is hovered or selected.
///
/// Immutable once built; a re-selection produces a fresh descriptor rather
/// than mutating the previous one. The `selector` is an opaque, stable,
/// session-scoped identifier (not a general CSS selector).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDescriptor {
    pub selector: String,
    pub tag_name: String,
    /// Raw value of the element's `class` attribute ("" when absent).
    #[serde(default)]
    pub class_attribute: String,
    /// Computed styles captured at snapshot time, keyed by CSS property.
    #[serde(default)]
    pub computed_style: BTreeMap<String, String>,
    /// Inline `style` declarations present on the element itself.
    #[serde(default)]
    pub inline_style: BTreeMap<String, String>,
    pub bounding_rect: BoundingRect,
    /// Direct (non-child) text content, when the element carries any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    pub is_text_editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_selector: Option<String>,
    pub child_count: u32,
}

/// One property edit within a logical style change.
///
/// `old_value` always stores the true pre-edit value so the inverse of a
/// change is a structural swap, not a recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleChange {
    pub property: String,
    pub old_value: String,
    pub new_value: String,
}

impl StyleChange {
    /// The undo form of this change: old and new values swapped.
    pub fn inverse(&self) -> Self {
        Self {
            property: self.property.clone(),
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
        }
    }
}

/// One committed edit in the host controller's linear undo history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub changes: Vec<StyleChange>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Entry with every change inverted, suitable for replay as an undo.
    pub fn inverse(&self) -> Self {
        Self {
            id: self.id,
            selector: self.selector.clone(),
            file_path: self.file_path.clone(),
            changes: self.changes.iter().map(StyleChange::inverse).collect(),
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_change_inverse_swaps_values() {
        let change = StyleChange {
            property: "color".to_string(),
            old_value: "#000000".to_string(),
            new_value: "#ff0000".to_string(),
        };
        let inverse = change.inverse();
        assert_eq!(inverse.old_value, "#ff0000");
        assert_eq!(inverse.new_value, "#000000");
        assert_eq!(inverse.inverse(), change);
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let descriptor = ElementDescriptor {
            selector: "sw-el-7".to_string(),
            tag_name: "button".to_string(),
            class_attribute: "bg-blue-500 text-white".to_string(),
            computed_style: BTreeMap::from([(
                "font-weight".to_string(),
                "700".to_string(),
            )]),
            inline_style: BTreeMap::new(),
            bounding_rect: BoundingRect { x: 10.0, y: 20.0, width: 120.0, height: 40.0 },
            text_content: Some("Save".to_string()),
            is_text_editable: true,
            source_location: Some(SourceLocation {
                file_path: "src/components/Toolbar.tsx".to_string(),
                line_number: 42,
                column_number: Some(8),
            }),
            parent_selector: Some("sw-el-3".to_string()),
            child_count: 0,
        };

        let encoded = serde_json::to_string(&descriptor).expect("descriptor should serialize");
        let decoded: ElementDescriptor =
            serde_json::from_str(&encoded).expect("descriptor should deserialize");
        assert_eq!(decoded, descriptor);
    }

    #[test]
    fn descriptor_tolerates_missing_optional_fields() {
        let decoded: ElementDescriptor = serde_json::from_str(
            r#"{
                "selector": "sw-el-1",
                "tag_name": "div",
                "bounding_rect": {"x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0},
                "is_text_editable": false,
                "child_count": 3
            }"#,
        )
        .expect("minimal descriptor should deserialize");
        assert!(decoded.class_attribute.is_empty());
        assert!(decoded.text_content.is_none());
        assert!(decoded.source_location.is_none());
    }
}
