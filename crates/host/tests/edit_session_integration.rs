// Drives a full edit session: the controller on one side, the overlay
// machine on the other, joined by the real wire encoding so every message
// crosses the prefix-tagged envelope exactly as it would in a browser.

use std::collections::BTreeMap;

use sitewright_common::protocol::frame::{decode, encode, FrameMessage};
use sitewright_common::protocol::sync::{SyncRequest, SyncResponse};
use sitewright_common::types::{BoundingRect, SourceLocation, StyleChange};
use sitewright_host::controller::{EditController, SyncStatus};
use sitewright_host::overlay::{
    DomSurface, NodeId, OverlayCommand, OverlayEvent, OverlayMachine, SourceResolver,
};

struct PageNode {
    tag: &'static str,
    text: Option<&'static str>,
    parent: Option<NodeId>,
    child_count: u32,
    selector: Option<String>,
}

struct PageDom {
    nodes: Vec<PageNode>,
}

impl PageDom {
    // 0 body > 1 section > 2 h1 (text)
    fn new() -> Self {
        Self {
            nodes: vec![
                PageNode {
                    tag: "body",
                    text: None,
                    parent: None,
                    child_count: 1,
                    selector: None,
                },
                PageNode {
                    tag: "section",
                    text: None,
                    parent: Some(0),
                    child_count: 1,
                    selector: None,
                },
                PageNode {
                    tag: "h1",
                    text: Some("Build faster"),
                    parent: Some(1),
                    child_count: 0,
                    selector: None,
                },
            ],
        }
    }
}

impl DomSurface for PageDom {
    fn tag_name(&self, node: NodeId) -> String {
        self.nodes[node as usize].tag.to_string()
    }

    fn element_id(&self, _node: NodeId) -> Option<String> {
        None
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node as usize].parent
    }

    fn class_attribute(&self, _node: NodeId) -> String {
        "text-4xl font-bold".to_string()
    }

    fn computed_style(&self, _node: NodeId) -> BTreeMap<String, String> {
        BTreeMap::from([("font-size".to_string(), "36px".to_string())])
    }

    fn inline_style(&self, _node: NodeId) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn bounding_rect(&self, _node: NodeId) -> BoundingRect {
        BoundingRect { x: 0.0, y: 0.0, width: 640.0, height: 48.0 }
    }

    fn direct_text(&self, node: NodeId) -> Option<String> {
        self.nodes[node as usize].text.map(str::to_string)
    }

    fn child_count(&self, node: NodeId) -> u32 {
        self.nodes[node as usize].child_count
    }

    fn tracking_selector(&self, node: NodeId) -> Option<String> {
        self.nodes[node as usize].selector.clone()
    }

    fn assign_tracking_selector(&mut self, node: NodeId, selector: &str) {
        self.nodes[node as usize].selector = Some(selector.to_string());
    }

    fn node_by_selector(&self, selector: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.selector.as_deref() == Some(selector))
            .map(|i| i as NodeId)
    }
}

struct FixedResolver;

impl SourceResolver for FixedResolver {
    fn resolve(&self, _node: NodeId) -> Option<SourceLocation> {
        Some(SourceLocation {
            file_path: "src/Hero.tsx".to_string(),
            line_number: 7,
            column_number: None,
        })
    }
}

/// Deliver the controller's queued messages to the machine over the wire
/// encoding, and feed everything the machine says back into the controller.
fn pump(
    controller: &mut EditController,
    machine: &mut OverlayMachine,
    dom: &mut PageDom,
) -> Vec<OverlayCommand> {
    let mut commands = Vec::new();
    let mut to_frame: Vec<FrameMessage> = controller.take_frame_messages();
    while let Some(message) = to_frame.first().cloned() {
        to_frame.remove(0);
        let raw = encode(&message).expect("host message should encode");
        let decoded = decode(&raw).expect("host message should survive the envelope");
        let out = machine.step(OverlayEvent::Host(decoded), dom, &FixedResolver);
        commands.extend(out.commands);
        for reply in out.messages {
            let raw = encode(&reply).expect("frame message should encode");
            controller.handle_frame_message(decode(&raw).expect("frame message should decode"));
        }
        to_frame.extend(controller.take_frame_messages());
    }
    commands
}

fn frame_to_host(
    controller: &mut EditController,
    out: sitewright_host::overlay::StepOutput,
) {
    for message in out.messages {
        let raw = encode(&message).expect("frame message should encode");
        controller.handle_frame_message(decode(&raw).expect("frame message should decode"));
    }
}

#[test]
fn select_preview_commit_round_trip() {
    let mut dom = PageDom::new();
    let mut machine = OverlayMachine::new();
    let mut controller = EditController::new();

    controller.handle_frame_message(OverlayMachine::announce());
    controller.enable();
    let commands = pump(&mut controller, &mut machine, &mut dom);
    assert!(commands.contains(&OverlayCommand::InstallListeners));

    // User clicks the heading inside the frame.
    let out = machine.step(OverlayEvent::Click { target: Some(2) }, &mut dom, &FixedResolver);
    frame_to_host(&mut controller, out);
    let selector = controller.selected().expect("selection should reach the host").selector.clone();
    assert_eq!(controller.selected().unwrap().tag_name, "h1");

    // Preview travels back down as inline styles.
    controller.preview_style("color", "#e11d48").unwrap();
    let commands = pump(&mut controller, &mut machine, &mut dom);
    assert!(commands.iter().any(|command| matches!(
        command,
        OverlayCommand::ApplyInlineStyles { selector: s, styles }
            if *s == selector && styles.get("color").map(String::as_str) == Some("#e11d48")
    )));

    // Commit produces exactly one durable request carrying locator hints.
    controller
        .apply_styles(vec![StyleChange {
            property: "color".to_string(),
            old_value: "#0f172a".to_string(),
            new_value: "#e11d48".to_string(),
        }])
        .unwrap();
    let requests = controller.take_sync_requests();
    assert_eq!(requests.len(), 1);
    match &requests[0] {
        SyncRequest::StyleUpdate { selector: s, source_location, class_name, .. } => {
            assert_eq!(*s, selector);
            assert_eq!(source_location.as_ref().unwrap().file_path, "src/Hero.tsx");
            assert_eq!(class_name.as_deref(), Some("text-4xl font-bold"));
        }
        other => panic!("unexpected request: {other:?}"),
    }

    controller.handle_sync_response(SyncResponse::StyleUpdated {
        success: true,
        selector,
        file_path: Some("src/Hero.tsx".to_string()),
        results: Vec::new(),
        error: None,
    });
    assert_eq!(controller.sync_status(), SyncStatus::PendingDeploy);
}

#[test]
fn inline_text_edit_reaches_the_sync_queue() {
    let mut dom = PageDom::new();
    let mut machine = OverlayMachine::new();
    let mut controller = EditController::new();

    controller.enable();
    pump(&mut controller, &mut machine, &mut dom);

    let out = machine.step(OverlayEvent::Click { target: Some(2) }, &mut dom, &FixedResolver);
    frame_to_host(&mut controller, out);
    controller.take_sync_requests();

    machine.step(OverlayEvent::DoubleClick { target: Some(2) }, &mut dom, &FixedResolver);
    let out = machine.step(
        OverlayEvent::EnterPressed { shift: false, draft: "Ship faster".to_string() },
        &mut dom,
        &FixedResolver,
    );
    frame_to_host(&mut controller, out);

    let requests = controller.take_sync_requests();
    match &requests[0] {
        SyncRequest::TextUpdate { old_text, new_text, file_path, .. } => {
            assert_eq!(old_text, "Build faster");
            assert_eq!(new_text, "Ship faster");
            assert_eq!(file_path.as_deref(), Some("src/Hero.tsx"));
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn frame_reload_restores_enable_and_preview() {
    let mut dom = PageDom::new();
    let mut machine = OverlayMachine::new();
    let mut controller = EditController::new();

    controller.enable();
    pump(&mut controller, &mut machine, &mut dom);
    let out = machine.step(OverlayEvent::Click { target: Some(1) }, &mut dom, &FixedResolver);
    frame_to_host(&mut controller, out);
    controller.preview_style("padding", "24px").unwrap();
    pump(&mut controller, &mut machine, &mut dom);

    // The frame reloads: a brand-new machine announces itself.
    let mut fresh = OverlayMachine::new();
    controller.handle_frame_message(OverlayMachine::announce());
    let commands = pump(&mut controller, &mut fresh, &mut dom);

    assert!(commands.contains(&OverlayCommand::InstallListeners));
    assert!(commands.iter().any(|command| matches!(
        command,
        OverlayCommand::ApplyInlineStyles { styles, .. }
            if styles.get("padding").map(String::as_str) == Some("24px")
    )));
}
