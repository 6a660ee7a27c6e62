//! Selection policies
//!
//! What "select" and "deselect" mean is a strategy, not a property of the
//! interaction system: a policy receives the currently intersected node on
//! select-start and the currently selected node on select-end, and answers
//! with the node that should now be considered selected. Policies never
//! touch scene data; they only pass node identities around.

use serde::{Deserialize, Serialize};

use crate::scene::NodeKey;

/// Decision produced by a selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionCommand {
    /// The node now considered selected, if any
    pub selected: Option<NodeKey>,

    /// Whether the selected node's position should be snapshotted so it can
    /// be restored when the selection is released
    pub restore_original_position: bool,
}

/// Pluggable decision logic for select/deselect transitions
pub trait SelectionPolicy {
    /// A select gesture began while `intersected` was under the ray
    fn on_select_start(&mut self, intersected: Option<NodeKey>) -> SelectionCommand;

    /// The select gesture ended while `current` was selected
    fn on_select_end(&mut self, current: Option<NodeKey>) -> SelectionCommand;
}

/// Hold-to-select: selection lives only while the gesture is held
///
/// Select-start adopts whatever is under the ray (possibly nothing) and
/// asks for a position snapshot; select-end always clears the selection.
/// The restore itself is driven by the snapshot taken at selection time.
#[derive(Debug, Default)]
pub struct TransientSelection;

impl SelectionPolicy for TransientSelection {
    fn on_select_start(&mut self, intersected: Option<NodeKey>) -> SelectionCommand {
        SelectionCommand {
            selected: intersected,
            restore_original_position: true,
        }
    }

    fn on_select_end(&mut self, _current: Option<NodeKey>) -> SelectionCommand {
        SelectionCommand::default()
    }
}

/// Toggle-to-select: selection sticks until toggled off or replaced
#[derive(Debug, Default)]
pub struct PersistentSelection {
    last_selected: Option<NodeKey>,
}

impl SelectionPolicy for PersistentSelection {
    fn on_select_start(&mut self, intersected: Option<NodeKey>) -> SelectionCommand {
        // Selecting nothing, or the held node again, toggles off
        if intersected.is_none() || intersected == self.last_selected {
            self.last_selected = None;
            return SelectionCommand::default();
        }

        self.last_selected = intersected;
        SelectionCommand {
            selected: intersected,
            restore_original_position: false,
        }
    }

    fn on_select_end(&mut self, current: Option<NodeKey>) -> SelectionCommand {
        // Releasing never changes a persistent selection
        SelectionCommand {
            selected: current,
            restore_original_position: false,
        }
    }
}

/// Configuration-level choice of selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// [`TransientSelection`]
    Transient,
    /// [`PersistentSelection`]
    Persistent,
}

impl SelectionMode {
    /// Instantiate the policy this mode names
    pub fn policy(self) -> Box<dyn SelectionPolicy> {
        match self {
            Self::Transient => Box::new(TransientSelection),
            Self::Persistent => Box::new(PersistentSelection::default()),
        }
    }
}
