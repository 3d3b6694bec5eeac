// Overlay interaction state machine.
//
// One instance runs per preview frame. Pointer and keyboard events come in,
// frame messages and DOM commands come out. The machine holds no transport
// and no DOM references, so every transition is testable against a fake
// surface.

use std::collections::{BTreeMap, BTreeSet};

use sitewright_common::protocol::frame::FrameMessage;
use tracing::debug;

use crate::overlay::descriptor::{self, DomSurface, NodeId};
use crate::overlay::source_location::SourceResolver;

/// Tags that are never hoverable or selectable.
const IGNORED_TAGS: &[&str] = &["script", "style", "meta", "link", "head", "html"];

/// Elements inside the overlay's own UI carry ids with this prefix; the
/// machine must never select its own chrome.
const OVERLAY_ID_PREFIX: &str = "sitewright-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Disabled,
    Idle,
    Hovering,
    Selected,
    EditingText,
}

/// Inputs to the machine: DOM events plus decoded host messages.
#[derive(Debug, Clone)]
pub enum OverlayEvent {
    PointerMove { target: Option<NodeId> },
    Click { target: Option<NodeId> },
    DoubleClick { target: Option<NodeId> },
    EscapePressed,
    EnterPressed { shift: bool, draft: String },
    EditorBlurred { draft: String },
    /// A message from the host, already prefix-checked and decoded.
    Host(FrameMessage),
}

/// DOM side effects for the embedder to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    InstallListeners,
    RemoveListeners,
    ShowHoverHighlight(NodeId),
    HideHoverHighlight,
    ShowSelectionHighlight(NodeId),
    HideSelectionHighlight,
    BeginTextEditing(NodeId),
    EndTextEditing,
    ApplyInlineStyles { selector: String, styles: BTreeMap<String, String> },
    /// Revert inline styles (all previewed elements when no selector).
    ClearInlineStyles { selector: Option<String> },
    SetText { node: NodeId, text: String },
}

#[derive(Debug, Default)]
pub struct StepOutput {
    /// Messages to post to the host, in order.
    pub messages: Vec<FrameMessage>,
    /// DOM work for the embedder, in order.
    pub commands: Vec<OverlayCommand>,
}

#[derive(Debug, Default)]
pub struct OverlayMachine {
    phase: Phase,
    hovered: Option<NodeId>,
    selected: Option<NodeId>,
    /// Direct text at the moment editing began, for cancel.
    editing_original: Option<String>,
    /// Selectors currently carrying preview styles, for teardown.
    previewed: BTreeSet<String>,
    selector_counter: u64,
}

impl OverlayMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The announcement posted when the overlay script loads (and again
    /// after every frame reload).
    pub fn announce() -> FrameMessage {
        FrameMessage::Ready
    }

    pub fn step(
        &mut self,
        event: OverlayEvent,
        dom: &mut dyn DomSurface,
        resolver: &dyn SourceResolver,
    ) -> StepOutput {
        let mut out = StepOutput::default();

        if self.phase == Phase::Disabled {
            // Only an enable wakes the machine; everything else is dropped.
            if let OverlayEvent::Host(FrameMessage::Enable) = event {
                self.phase = Phase::Idle;
                out.commands.push(OverlayCommand::InstallListeners);
            }
            return out;
        }

        match event {
            OverlayEvent::PointerMove { target } => {
                self.on_pointer_move(target, dom, resolver, &mut out);
            }
            OverlayEvent::Click { target } => self.on_click(target, dom, resolver, &mut out),
            OverlayEvent::DoubleClick { target } => self.on_double_click(target, dom, &mut out),
            OverlayEvent::EscapePressed => self.on_escape(&mut out),
            OverlayEvent::EnterPressed { shift, draft } => {
                if self.phase == Phase::EditingText && !shift {
                    self.commit_edit(draft, dom, resolver, &mut out);
                }
            }
            OverlayEvent::EditorBlurred { draft } => {
                if self.phase == Phase::EditingText {
                    self.commit_edit(draft, dom, resolver, &mut out);
                }
            }
            OverlayEvent::Host(message) => self.on_host_message(message, dom, resolver, &mut out),
        }

        out
    }

    // ── Pointer and keyboard ────────────────────────────────────────

    fn on_pointer_move(
        &mut self,
        target: Option<NodeId>,
        dom: &mut dyn DomSurface,
        resolver: &dyn SourceResolver,
        out: &mut StepOutput,
    ) {
        if self.phase == Phase::EditingText {
            return;
        }

        let eligible = target.filter(|&node| self.is_eligible(node, dom));
        // Hovering the selected element adds nothing over the selection
        // highlight, so it is treated as no hover at all.
        let effective = eligible.filter(|node| Some(*node) != self.selected);

        if effective == self.hovered {
            return;
        }

        match effective {
            Some(node) => {
                self.hovered = Some(node);
                let element = descriptor::describe(dom, resolver, node, &mut self.selector_counter);
                out.messages.push(FrameMessage::ElementHovered { element: Some(element) });
                out.commands.push(OverlayCommand::ShowHoverHighlight(node));
                if self.selected.is_none() {
                    self.phase = Phase::Hovering;
                }
            }
            None => {
                self.hovered = None;
                out.messages.push(FrameMessage::ElementHovered { element: None });
                out.commands.push(OverlayCommand::HideHoverHighlight);
                if self.selected.is_none() {
                    self.phase = Phase::Idle;
                }
            }
        }
    }

    fn on_click(
        &mut self,
        target: Option<NodeId>,
        dom: &mut dyn DomSurface,
        resolver: &dyn SourceResolver,
        out: &mut StepOutput,
    ) {
        if self.phase == Phase::EditingText {
            // The editor owns clicks; leaving it arrives as a blur.
            return;
        }

        match target.filter(|&node| self.is_eligible(node, dom)) {
            Some(node) if Some(node) == self.selected => self.deselect(out),
            Some(node) => self.select(node, dom, resolver, out),
            None => {
                if self.selected.is_some() {
                    self.deselect(out);
                }
            }
        }
    }

    fn on_double_click(
        &mut self,
        target: Option<NodeId>,
        dom: &mut dyn DomSurface,
        out: &mut StepOutput,
    ) {
        if self.phase != Phase::Selected {
            return;
        }
        let Some(node) = target.filter(|&node| Some(node) == self.selected) else {
            return;
        };
        // Only pure text elements are editable in place.
        if dom.child_count(node) != 0 {
            return;
        }
        let Some(original) = dom.direct_text(node) else {
            return;
        };

        self.editing_original = Some(original);
        self.phase = Phase::EditingText;
        out.commands.push(OverlayCommand::BeginTextEditing(node));
    }

    fn on_escape(&mut self, out: &mut StepOutput) {
        match self.phase {
            Phase::EditingText => {
                if let (Some(node), Some(original)) = (self.selected, self.editing_original.take())
                {
                    out.commands.push(OverlayCommand::SetText { node, text: original });
                }
                out.commands.push(OverlayCommand::EndTextEditing);
                self.phase = Phase::Selected;
            }
            Phase::Selected => self.deselect(out),
            _ => {}
        }
    }

    fn commit_edit(
        &mut self,
        draft: String,
        dom: &mut dyn DomSurface,
        resolver: &dyn SourceResolver,
        out: &mut StepOutput,
    ) {
        out.commands.push(OverlayCommand::EndTextEditing);
        self.phase = Phase::Selected;

        let Some(node) = self.selected else {
            return;
        };
        let Some(original) = self.editing_original.take() else {
            return;
        };
        if draft == original {
            return;
        }

        let selector =
            descriptor::ensure_tracking_selector(dom, node, &mut self.selector_counter);
        debug!(%selector, "committing inline text edit");
        out.messages.push(FrameMessage::TextEdit {
            selector,
            old_text: original,
            new_text: draft,
            source_location: resolver.resolve(node),
        });
    }

    // ── Host messages ───────────────────────────────────────────────

    fn on_host_message(
        &mut self,
        message: FrameMessage,
        dom: &mut dyn DomSurface,
        resolver: &dyn SourceResolver,
        out: &mut StepOutput,
    ) {
        match message {
            // Already enabled; a second enable must not stack listeners.
            FrameMessage::Enable => {}
            FrameMessage::Disable => self.teardown(out),
            FrameMessage::PreviewStyle { selector, styles } => {
                self.previewed.insert(selector.clone());
                out.commands.push(OverlayCommand::ApplyInlineStyles { selector, styles });
            }
            FrameMessage::ClearPreview { selector } => {
                match &selector {
                    Some(one) => {
                        self.previewed.remove(one);
                    }
                    None => self.previewed.clear(),
                }
                out.commands.push(OverlayCommand::ClearInlineStyles { selector });
            }
            FrameMessage::SelectElement { selector } => {
                if let Some(node) = dom.node_by_selector(&selector) {
                    self.select(node, dom, resolver, out);
                }
            }
            FrameMessage::UpdateText { selector, text } => {
                let Some(node) = dom.node_by_selector(&selector) else {
                    out.messages.push(FrameMessage::Error {
                        message: format!("no element tracked as {selector}"),
                        context: Some("update_text".to_string()),
                    });
                    return;
                };
                let old_text = dom.direct_text(node).unwrap_or_default();
                out.commands.push(OverlayCommand::SetText { node, text: text.clone() });
                out.messages.push(FrameMessage::TextEdited {
                    selector,
                    old_text,
                    new_text: text,
                });
            }
            // Frame-to-host traffic reflected back is not ours to handle.
            _ => {}
        }
    }

    // ── Shared transitions ──────────────────────────────────────────

    fn select(
        &mut self,
        node: NodeId,
        dom: &mut dyn DomSurface,
        resolver: &dyn SourceResolver,
        out: &mut StepOutput,
    ) {
        if self.hovered == Some(node) {
            self.hovered = None;
            out.commands.push(OverlayCommand::HideHoverHighlight);
        }
        self.selected = Some(node);
        self.phase = Phase::Selected;
        let element = descriptor::describe(dom, resolver, node, &mut self.selector_counter);
        out.messages.push(FrameMessage::ElementSelected { element });
        out.commands.push(OverlayCommand::ShowSelectionHighlight(node));
    }

    fn deselect(&mut self, out: &mut StepOutput) {
        self.selected = None;
        self.phase = if self.hovered.is_some() { Phase::Hovering } else { Phase::Idle };
        out.messages.push(FrameMessage::ElementDeselected);
        out.commands.push(OverlayCommand::HideSelectionHighlight);
    }

    fn teardown(&mut self, out: &mut StepOutput) {
        if self.phase == Phase::EditingText {
            out.commands.push(OverlayCommand::EndTextEditing);
        }
        if self.selected.take().is_some() {
            out.commands.push(OverlayCommand::HideSelectionHighlight);
        }
        if self.hovered.take().is_some() {
            out.commands.push(OverlayCommand::HideHoverHighlight);
        }
        if !self.previewed.is_empty() {
            self.previewed.clear();
            out.commands.push(OverlayCommand::ClearInlineStyles { selector: None });
        }
        out.commands.push(OverlayCommand::RemoveListeners);
        self.editing_original = None;
        self.phase = Phase::Disabled;
    }

    /// An element is eligible unless its tag is structural or it sits inside
    /// the overlay's own chrome.
    fn is_eligible(&self, node: NodeId, dom: &dyn DomSurface) -> bool {
        if IGNORED_TAGS.contains(&dom.tag_name(node).to_ascii_lowercase().as_str()) {
            return false;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(element_id) = dom.element_id(id) {
                if element_id.starts_with(OVERLAY_ID_PREFIX) {
                    return false;
                }
            }
            current = dom.parent(id);
        }
        true
    }
}
