//! Frame scheduling and the ordered update loop
//!
//! [`Scheduler`] abstracts what drives frame timing: [`DisplayScheduler`]
//! rides the platform's display-refresh requests, [`SessionScheduler`]
//! hands pacing to the render backend so an immersive session can stay
//! synchronized with the headset compositor. [`FrameLoop`] owns the
//! registration-ordered update targets and pulls its timing from whichever
//! scheduler it was built with.

mod frame_loop;
mod scheduler;

pub use frame_loop::{FrameLoop, SharedUpdatable, Updatable};
pub use scheduler::{
    DisplayScheduler, FrameRequest, ManualRefreshDriver, RefreshDriver, Scheduler,
    SessionScheduler, TickCallback,
};
