//! Per-frame systems
//!
//! The update targets the runtime registers on the frame loop: locomotion
//! (session input -> camera rig), interaction (controller ray -> highlight,
//! selection, grab), and the selection policies interaction delegates to.

mod interaction;
mod locomotion;
mod selection;

pub use interaction::{InteractionConfig, InteractionSystem, NodeFilter};
pub use locomotion::{
    integrate_locomotion, LocomotionConfig, LocomotionReport, LocomotionStatus, LocomotionSystem,
};
pub use selection::{
    PersistentSelection, SelectionCommand, SelectionMode, SelectionPolicy, TransientSelection,
};
