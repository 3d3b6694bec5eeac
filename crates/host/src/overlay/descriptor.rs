// Reading element descriptors through the DOM seam.

use std::collections::BTreeMap;

use sitewright_common::types::ElementDescriptor;

use crate::overlay::source_location::SourceResolver;

/// Opaque handle to a live element. The embedder maps these to real nodes.
pub type NodeId = u64;

/// Everything the overlay reads from, or writes into, the live document.
pub trait DomSurface {
    fn tag_name(&self, node: NodeId) -> String;
    fn element_id(&self, node: NodeId) -> Option<String>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn class_attribute(&self, node: NodeId) -> String;
    fn computed_style(&self, node: NodeId) -> BTreeMap<String, String>;
    fn inline_style(&self, node: NodeId) -> BTreeMap<String, String>;
    fn bounding_rect(&self, node: NodeId) -> sitewright_common::types::BoundingRect;
    /// Concatenated text of direct text children, `None` when there are none.
    fn direct_text(&self, node: NodeId) -> Option<String>;
    /// Number of element children (text nodes excluded).
    fn child_count(&self, node: NodeId) -> u32;
    fn tracking_selector(&self, node: NodeId) -> Option<String>;
    fn assign_tracking_selector(&mut self, node: NodeId, selector: &str);
    fn node_by_selector(&self, selector: &str) -> Option<NodeId>;
}

/// Return the node's tracking selector, assigning the next `sw-el-{n}` if it
/// has none. Re-describing a node never mints a second selector.
pub fn ensure_tracking_selector(
    dom: &mut dyn DomSurface,
    node: NodeId,
    counter: &mut u64,
) -> String {
    if let Some(existing) = dom.tracking_selector(node) {
        return existing;
    }
    *counter += 1;
    let selector = format!("sw-el-{counter}");
    dom.assign_tracking_selector(node, &selector);
    selector
}

/// Snapshot a node into the wire descriptor the host consumes.
pub fn describe(
    dom: &mut dyn DomSurface,
    resolver: &dyn SourceResolver,
    node: NodeId,
    counter: &mut u64,
) -> ElementDescriptor {
    let selector = ensure_tracking_selector(dom, node, counter);
    let text_content = dom.direct_text(node);
    let child_count = dom.child_count(node);

    ElementDescriptor {
        selector,
        tag_name: dom.tag_name(node).to_ascii_lowercase(),
        class_attribute: dom.class_attribute(node),
        computed_style: dom.computed_style(node),
        inline_style: dom.inline_style(node),
        bounding_rect: dom.bounding_rect(node),
        // Inline edits only when the element holds nothing but text.
        is_text_editable: child_count == 0 && text_content.is_some(),
        text_content,
        source_location: resolver.resolve(node),
        parent_selector: dom.parent(node).and_then(|parent| dom.tracking_selector(parent)),
        child_count,
    }
}
