// sitewright-host: edit controller and overlay state machine.
//
// Both sides of the cross-frame protocol live here. The controller runs in
// the host page; the overlay machine runs inside the preview frame against
// a narrow DOM seam. Neither owns a transport: inputs arrive as events or
// decoded messages, outputs are queued messages the embedder sends.

pub mod controller;
pub mod history;
pub mod overlay;
