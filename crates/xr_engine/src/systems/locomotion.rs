//! Locomotion system
//!
//! Reads the immersive session's input sources every tick and integrates
//! camera-rig translation and yaw. The rig, not the camera, is what moves:
//! camera-local attachments (controller, laser) ride along untouched.
//!
//! The left-hand stick translates in the rig's horizontal plane and its
//! buttons move the rig vertically; the right-hand stick yaws, and its
//! buttons scale the movement speed while held. The effective speed
//! multiplier is resolved fresh every tick and threaded through the report
//! rather than mutated in place, so the integration is testable without a
//! standing system instance.

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::{Quat, Vec3};
use crate::render::RenderBackend;
use crate::scene::{NodeKey, Scene, Tint};
use crate::schedule::Updatable;
use crate::xr::{GamepadButtons, Handedness, XrSession};

/// Speed multiplier while the right-hand slow button is held
const SLOW_MULTIPLIER: f32 = 0.1;

/// Speed multiplier while the right-hand fast button is held
const FAST_MULTIPLIER: f32 = 10.0;

/// Speed multiplier with no right-hand button held
const NEUTRAL_MULTIPLIER: f32 = 1.0;

/// What the locomotion pass concluded this tick
///
/// Surfaced as a visual cue on the status node; tests treat it as the
/// observable record of the tick's internal decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocomotionStatus {
    /// No immersive session is active; movement was skipped
    NoSession,
    /// Session active but no input source offered a usable axis pair
    NoInput,
    /// Input was read but every axis sat inside the dead-zone
    InputWithoutMovement,
    /// The rig translated or rotated this tick
    Moving,
}

impl LocomotionStatus {
    /// Diagnostic cue color for this status
    pub const fn cue(self) -> Tint {
        match self {
            Self::NoSession => [1.0, 0.0, 0.0],
            Self::NoInput => [1.0, 0.55, 0.0],
            Self::InputWithoutMovement => [1.0, 1.0, 0.0],
            Self::Moving => [0.0, 1.0, 0.0],
        }
    }
}

/// Locomotion tunables
#[derive(Debug, Clone)]
pub struct LocomotionConfig {
    /// Base translation speed in units per second
    pub speed: f32,

    /// Yaw rate in radians per second
    pub rotation_rate: f32,

    /// Minimum axis magnitude that registers as input
    pub dead_zone: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            rotation_rate: 2.0,
            dead_zone: 0.1,
        }
    }
}

/// Outcome of one locomotion tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionReport {
    /// Diagnostic status of the tick
    pub status: LocomotionStatus,

    /// The multiplier that applied this tick; feeds the next tick when no
    /// right-hand controller is present to override it
    pub speed_multiplier: f32,

    /// Whether the rig translated or rotated
    pub moved: bool,

    /// Whether any input source offered a usable axis pair
    pub input_detected: bool,
}

/// Resolve the effective speed multiplier from right-hand buttons
///
/// `None` when no right-hand source with a usable gamepad is tracked, in
/// which case the caller keeps its previous multiplier. Buttons win over
/// everything and nothing is sticky: releasing both resets to neutral.
fn resolve_speed_multiplier(session: &XrSession) -> Option<f32> {
    let gamepad = session.source(Handedness::Right)?.gamepad.as_ref()?;
    gamepad.axis_pair()?;
    if gamepad.pressed(GamepadButtons::BUTTON_0) {
        Some(SLOW_MULTIPLIER)
    } else if gamepad.pressed(GamepadButtons::BUTTON_1) {
        Some(FAST_MULTIPLIER)
    } else {
        Some(NEUTRAL_MULTIPLIER)
    }
}

/// Integrate one tick of session input into the camera rig
///
/// Standalone so the state machine is exercisable without a backend or a
/// frame loop; [`LocomotionSystem::tick`] is a thin wrapper around it.
pub fn integrate_locomotion(
    scene: &mut Scene,
    rig: NodeKey,
    session: &XrSession,
    config: &LocomotionConfig,
    current_multiplier: f32,
    delta: f32,
) -> LocomotionReport {
    let speed_multiplier = resolve_speed_multiplier(session).unwrap_or(current_multiplier);
    let speed = config.speed * speed_multiplier;

    let mut moved = false;
    let mut input_detected = false;

    let Some(rig_node) = scene.get_mut(rig) else {
        log::warn!("locomotion: camera rig node is gone");
        return LocomotionReport {
            status: LocomotionStatus::NoInput,
            speed_multiplier,
            moved,
            input_detected,
        };
    };

    for source in &session.input_sources {
        let Some(gamepad) = source.gamepad.as_ref() else {
            continue;
        };
        let Some((x, y)) = gamepad.axis_pair() else {
            continue;
        };
        input_detected = true;

        match source.handedness {
            Handedness::Left => {
                // Stick drives translation in the rig's horizontal plane
                if x.abs() > config.dead_zone || y.abs() > config.dead_zone {
                    let direction = Vec3::new(x, 0.0, y).normalize();
                    let step = (rig_node.transform.rotation * direction) * (speed * delta);
                    rig_node.transform.position += step;
                    moved = true;
                }

                // Buttons drive vertical movement, dead-zone not consulted
                if gamepad.pressed(GamepadButtons::BUTTON_0) {
                    rig_node.transform.position.y -= speed * delta;
                    moved = true;
                }
                if gamepad.pressed(GamepadButtons::BUTTON_1) {
                    rig_node.transform.position.y += speed * delta;
                    moved = true;
                }
            }
            Handedness::Right => {
                // Stick drives yaw about the world vertical axis
                if x.abs() > config.dead_zone {
                    let yaw = -x * config.rotation_rate * delta;
                    let rotation = Quat::from_axis_angle(&Vec3::y_axis(), yaw);
                    rig_node.transform.rotation = rotation * rig_node.transform.rotation;
                    moved = true;
                }
            }
            Handedness::None => {}
        }

        log::trace!(
            "locomotion input: hand {:?}, axes ({x:.2}, {y:.2}), buttons {:?}",
            source.handedness,
            gamepad.buttons,
        );
    }

    let status = if !input_detected {
        LocomotionStatus::NoInput
    } else if moved {
        LocomotionStatus::Moving
    } else {
        LocomotionStatus::InputWithoutMovement
    };

    LocomotionReport {
        status,
        speed_multiplier,
        moved,
        input_detected,
    }
}

/// Update target that moves the camera rig from session input
pub struct LocomotionSystem {
    scene: Rc<RefCell<Scene>>,
    backend: Rc<RefCell<dyn RenderBackend>>,
    rig: NodeKey,
    status_node: Option<NodeKey>,
    config: LocomotionConfig,
    speed_multiplier: f32,
    last_report: LocomotionReport,
}

impl LocomotionSystem {
    /// Create a system that moves `rig` within `scene`
    pub fn new(
        scene: Rc<RefCell<Scene>>,
        backend: Rc<RefCell<dyn RenderBackend>>,
        rig: NodeKey,
    ) -> Self {
        Self {
            scene,
            backend,
            rig,
            status_node: None,
            config: LocomotionConfig::default(),
            speed_multiplier: NEUTRAL_MULTIPLIER,
            last_report: LocomotionReport {
                status: LocomotionStatus::NoSession,
                speed_multiplier: NEUTRAL_MULTIPLIER,
                moved: false,
                input_detected: false,
            },
        }
    }

    /// Replace the tunables
    pub fn with_config(mut self, config: LocomotionConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from a non-neutral speed multiplier
    pub fn with_speed_multiplier(mut self, multiplier: f32) -> Self {
        self.speed_multiplier = multiplier;
        self.last_report.speed_multiplier = multiplier;
        self
    }

    /// Paint the diagnostic cue onto this node's emissive tint each tick
    pub fn with_status_node(mut self, node: NodeKey) -> Self {
        self.status_node = Some(node);
        self
    }

    /// Outcome of the most recent tick
    pub fn report(&self) -> LocomotionReport {
        self.last_report
    }

    /// Diagnostic status of the most recent tick
    pub fn status(&self) -> LocomotionStatus {
        self.last_report.status
    }
}

impl Updatable for LocomotionSystem {
    fn tick(&mut self, delta: f32) {
        let report = {
            let backend = self.backend.borrow();
            match backend.session() {
                None => LocomotionReport {
                    status: LocomotionStatus::NoSession,
                    speed_multiplier: self.speed_multiplier,
                    moved: false,
                    input_detected: false,
                },
                Some(session) => integrate_locomotion(
                    &mut self.scene.borrow_mut(),
                    self.rig,
                    session,
                    &self.config,
                    self.speed_multiplier,
                    delta,
                ),
            }
        };

        self.speed_multiplier = report.speed_multiplier;
        self.last_report = report;

        if let Some(status_node) = self.status_node {
            if let Some(node) = self.scene.borrow_mut().get_mut(status_node) {
                node.emissive = report.status.cue();
            }
        }
    }
}
