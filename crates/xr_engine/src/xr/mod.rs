//! Immersive session input model
//!
//! Mirrors the shape of headset input: a session owns zero or more input
//! sources (one per tracked controller), each optionally exposing a
//! gamepad-like axis/button cluster. The platform layer refreshes this
//! state every host frame; locomotion and interaction only ever read it.

use bitflags::bitflags;

bitflags! {
    /// Pressed-button set of a controller gamepad
    ///
    /// Indices follow the common controller profile: on a left-hand source
    /// buttons 0/1 drive vertical movement, on a right-hand source they
    /// scale the movement speed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GamepadButtons: u32 {
        /// Button at index 0
        const BUTTON_0 = 1;
        /// Button at index 1
        const BUTTON_1 = 1 << 1;
    }
}

/// Which hand a tracked input source belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    /// Untracked or hand-agnostic source
    None,
    /// Left-hand controller
    Left,
    /// Right-hand controller
    Right,
}

/// Axis/button cluster of one input source
#[derive(Debug, Clone, Default)]
pub struct Gamepad {
    /// Raw axis values in [-1, 1]; sticks report on indices 2/3,
    /// touchpads on 0/1
    pub axes: Vec<f32>,

    /// Currently pressed buttons
    pub buttons: GamepadButtons,
}

impl Gamepad {
    /// Resolve the usable horizontal/vertical axis pair
    ///
    /// Prefers stick axes (2/3) and falls back to touchpad axes (0/1) per
    /// component. Sources with fewer than two axes have no usable pair.
    pub fn axis_pair(&self) -> Option<(f32, f32)> {
        if self.axes.len() < 2 {
            return None;
        }
        let x = self.axes.get(2).copied().unwrap_or(self.axes[0]);
        let y = self.axes.get(3).copied().unwrap_or(self.axes[1]);
        Some((x, y))
    }

    /// Whether all buttons in `buttons` are currently pressed
    pub fn pressed(&self, buttons: GamepadButtons) -> bool {
        self.buttons.contains(buttons)
    }
}

/// One tracked controller within a session
#[derive(Debug, Clone)]
pub struct InputSource {
    /// Hand assignment of this source
    pub handedness: Handedness,

    /// Gamepad cluster, absent for bare trackers
    pub gamepad: Option<Gamepad>,

    /// Whether the primary select input is currently held
    pub selecting: bool,
}

impl InputSource {
    /// Create a source with no gamepad and select released
    pub fn new(handedness: Handedness) -> Self {
        Self {
            handedness,
            gamepad: None,
            selecting: false,
        }
    }

    /// Attach a gamepad cluster
    pub fn with_gamepad(mut self, gamepad: Gamepad) -> Self {
        self.gamepad = Some(gamepad);
        self
    }
}

/// An active immersive session
#[derive(Debug, Clone, Default)]
pub struct XrSession {
    /// Input sources currently tracked by the session
    pub input_sources: Vec<InputSource>,
}

impl XrSession {
    /// Create a session with no input sources yet
    pub fn new() -> Self {
        Self::default()
    }

    /// First input source with the given handedness, if tracked
    pub fn source(&self, handedness: Handedness) -> Option<&InputSource> {
        self.input_sources
            .iter()
            .find(|source| source.handedness == handedness)
    }

    /// Mutable access to the first source with the given handedness
    pub fn source_mut(&mut self, handedness: Handedness) -> Option<&mut InputSource> {
        self.input_sources
            .iter_mut()
            .find(|source| source.handedness == handedness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_pair_prefers_stick_axes() {
        let gamepad = Gamepad {
            axes: vec![0.1, 0.2, 0.7, -0.4],
            buttons: GamepadButtons::empty(),
        };
        assert_eq!(gamepad.axis_pair(), Some((0.7, -0.4)));
    }

    #[test]
    fn test_axis_pair_falls_back_per_component() {
        // Three axes: horizontal from the stick, vertical from the touchpad
        let gamepad = Gamepad {
            axes: vec![0.1, 0.2, 0.7],
            buttons: GamepadButtons::empty(),
        };
        assert_eq!(gamepad.axis_pair(), Some((0.7, 0.2)));

        let touchpad_only = Gamepad {
            axes: vec![0.1, 0.2],
            buttons: GamepadButtons::empty(),
        };
        assert_eq!(touchpad_only.axis_pair(), Some((0.1, 0.2)));
    }

    #[test]
    fn test_axis_pair_requires_two_axes() {
        let gamepad = Gamepad {
            axes: vec![0.5],
            buttons: GamepadButtons::empty(),
        };
        assert!(gamepad.axis_pair().is_none());
    }

    #[test]
    fn test_session_source_lookup_by_hand() {
        let mut session = XrSession::new();
        session.input_sources.push(InputSource::new(Handedness::Left));
        session.input_sources.push(InputSource::new(Handedness::Right));
        assert_eq!(
            session.source(Handedness::Right).map(|s| s.handedness),
            Some(Handedness::Right)
        );
        assert!(session.source(Handedness::None).is_none());
    }
}
