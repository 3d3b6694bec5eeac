// Preview-frame overlay: a state machine driven through a narrow DOM seam.
//
// The machine never touches a document directly. Reads go through
// [`DomSurface`], writes come back out as [`OverlayCommand`]s, and
// everything the host needs to know leaves as queued frame messages.

pub mod descriptor;
pub mod machine;
pub mod source_location;

pub use descriptor::{DomSurface, NodeId};
pub use machine::{OverlayCommand, OverlayEvent, OverlayMachine, Phase, StepOutput};
pub use source_location::SourceResolver;
