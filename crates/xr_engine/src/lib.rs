//! # XR Engine
//!
//! A small engine core for real-time immersive 3D scenes: a pluggable frame
//! scheduler, an ordered per-frame update loop, and a controller interaction
//! subsystem (spatial picking, selection policies, locomotion).
//!
//! ## Features
//!
//! - **Pluggable frame timing**: display-refresh-driven or session-driven
//!   scheduling behind one small trait
//! - **Ordered update loop**: registration-ordered update targets with a
//!   render-last composition contract
//! - **Controller interaction**: ray picking, highlight, grab/restore with
//!   swappable selection policies
//! - **Locomotion**: stick/button driven camera-rig movement with
//!   diagnostic status cues
//! - **Headless-friendly**: narrow render-backend interface with a headless
//!   implementation for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use xr_engine::prelude::*;
//!
//! fn main() -> Result<(), RuntimeError> {
//!     let backend = Rc::new(RefCell::new(HeadlessBackend::new(800, 600)));
//!     let mut runtime = RuntimeBuilder::new(RuntimeConfig::default())
//!         .build(backend)?;
//!     runtime.init()?;
//!     runtime.start();
//!     // ... drive frames through the backend's frame pump ...
//!     runtime.stop();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod systems;
pub mod xr;

mod runtime;

pub use runtime::{CameraControls, Runtime, RuntimeBuilder, RuntimeError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, RuntimeConfig},
        foundation::{
            math::{Point3, Quat, Transform, Vec3},
            time::FrameClock,
        },
        render::{FramePump, HeadlessBackend, RenderBackend},
        scene::{Node, NodeKey, NodeKind, PerspectiveCamera, Ray, Scene},
        schedule::{
            DisplayScheduler, FrameLoop, ManualRefreshDriver, Scheduler, SessionScheduler,
            SharedUpdatable, Updatable,
        },
        systems::{
            InteractionConfig, InteractionSystem, LocomotionConfig, LocomotionStatus,
            LocomotionSystem, PersistentSelection, SelectionCommand, SelectionMode,
            SelectionPolicy, TransientSelection,
        },
        xr::{Gamepad, GamepadButtons, Handedness, InputSource, XrSession},
        CameraControls, Runtime, RuntimeBuilder, RuntimeError,
    };
}
