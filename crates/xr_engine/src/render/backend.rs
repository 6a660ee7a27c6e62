//! Backend abstraction for the rendering system

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::Transform;
use crate::scene::{NodeKey, PerspectiveCamera, Scene};
use crate::xr::XrSession;

/// Per-frame callback registered by the session-driven scheduler
pub type FrameCallback = Box<dyn FnMut()>;

/// Narrow interface the engine consumes from a renderer
///
/// Everything GPU-shaped stays behind this trait; the engine only needs to
/// trigger paints, read session input, and register for host-paced frames.
pub trait RenderBackend {
    /// Paint one frame of `scene` viewed through `camera` posed at the
    /// `view` node
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera, view: NodeKey);

    /// Enable or disable immersive presentation
    fn set_immersive_enabled(&mut self, enabled: bool);

    /// Whether immersive presentation is enabled
    fn immersive_enabled(&self) -> bool;

    /// The active immersive session, if presentation has begun
    fn session(&self) -> Option<&XrSession>;

    /// Mutable access to the active immersive session
    fn session_mut(&mut self) -> Option<&mut XrSession>;

    /// World-relative pose of the tracked controller at `index`
    fn controller_pose(&self, index: usize) -> Option<Transform>;

    /// Register (`Some`) or deregister (`None`) the host-driven frame
    /// callback
    ///
    /// Registration is last-write-wins: at most one callback is live at a
    /// time.
    fn set_frame_callback(&mut self, callback: Option<FrameCallback>);

    /// Notify the backend that the presentation surface changed size
    fn set_extent(&mut self, width: u32, height: u32);
}

struct CallbackSlot {
    callback: Option<FrameCallback>,
    /// Bumped on every registration so an in-flight dispatch can tell
    /// whether the callback was swapped out from under it
    generation: u64,
}

/// Shared registration slot for host-driven frame callbacks
///
/// Backends store registrations here and hand out a [`FramePump`] so the
/// platform loop can dispatch frames without borrowing the backend itself
/// (the callback will usually want to borrow the backend to render).
#[derive(Clone)]
pub(crate) struct FrameCallbackSlot {
    inner: Rc<RefCell<CallbackSlot>>,
}

impl FrameCallbackSlot {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(CallbackSlot {
                callback: None,
                generation: 0,
            })),
        }
    }

    pub(crate) fn set(&self, callback: Option<FrameCallback>) {
        let mut slot = self.inner.borrow_mut();
        slot.callback = callback;
        slot.generation += 1;
    }

    pub(crate) fn pump(&self) -> FramePump {
        FramePump {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Handle that dispatches the registered frame callback
///
/// The native stand-in for the host compositor's frame pacing: whoever owns
/// the pump decides when frames happen. Obtained from a backend before it
/// is wrapped in `Rc<RefCell<...>>`, so firing a frame never conflicts with
/// the callback's own borrows of the backend.
#[derive(Clone)]
pub struct FramePump {
    inner: Rc<RefCell<CallbackSlot>>,
}

impl FramePump {
    /// Invoke the registered frame callback, if any
    ///
    /// Returns whether a callback ran. A callback that re-registers or
    /// deregisters during dispatch wins over the in-flight invocation.
    pub fn fire(&self) -> bool {
        let (callback, generation) = {
            let mut slot = self.inner.borrow_mut();
            (slot.callback.take(), slot.generation)
        };
        let Some(mut callback) = callback else {
            return false;
        };
        callback();
        let mut slot = self.inner.borrow_mut();
        if slot.generation == generation {
            slot.callback = Some(callback);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pump_fires_registered_callback() {
        let slot = FrameCallbackSlot::new();
        let pump = slot.pump();
        let count = Rc::new(RefCell::new(0));
        let count_in = Rc::clone(&count);
        slot.set(Some(Box::new(move || *count_in.borrow_mut() += 1)));

        assert!(pump.fire());
        assert!(pump.fire());
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_pump_without_registration_is_noop() {
        let slot = FrameCallbackSlot::new();
        assert!(!slot.pump().fire());
    }

    #[test]
    fn test_deregistration_during_dispatch_sticks() {
        let slot = FrameCallbackSlot::new();
        let pump = slot.pump();
        let slot_in = slot.clone();
        slot.set(Some(Box::new(move || slot_in.set(None))));

        assert!(pump.fire());
        // The callback removed itself; nothing is left to dispatch
        assert!(!pump.fire());
    }
}
