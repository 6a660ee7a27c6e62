//! Rendering interface
//!
//! The engine never talks to a GPU directly. It consumes the narrow
//! [`RenderBackend`] trait: paint a frame, expose the immersive session,
//! and host the per-frame callback registration the session-driven
//! scheduler relies on. [`HeadlessBackend`] implements the trait without
//! any graphics device, which is what the tests and the demo app run on.

mod backend;
mod headless;

pub use backend::{FrameCallback, FramePump, RenderBackend};
pub use headless::HeadlessBackend;
