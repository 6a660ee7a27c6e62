//! Frame timing sources
//!
//! Two interchangeable schedulers sit behind the [`Scheduler`] contract.
//! The display variant re-requests a refresh callback after every frame and
//! owns its cancellation; the session variant registers once with the
//! render backend and lets the host pace the frames.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::time::FrameClock;
use crate::render::RenderBackend;

/// Callback invoked once per frame with the elapsed seconds since the
/// previous frame
pub type TickCallback = Box<dyn FnMut(f32)>;

/// Source of frame timing
///
/// At most one callback is active at a time. Stopping a scheduler that was
/// never started is a no-op, not an error.
pub trait Scheduler {
    /// Begin delivering frame callbacks
    fn start(&mut self, callback: TickCallback);

    /// Stop delivering frame callbacks, cancelling any pending request
    fn stop(&mut self);
}

/// One-shot display refresh request
pub type FrameRequest = Box<dyn FnOnce()>;

/// Display-refresh callback facility
///
/// The native analog of a compositor's refresh callback queue: a request is
/// honored exactly once, on the next refresh, unless cancelled first.
pub trait RefreshDriver {
    /// Queue `request` for the next refresh; returns a cancellation handle
    fn request_frame(&mut self, request: FrameRequest) -> u64;

    /// Cancel a previously queued request; unknown handles are ignored
    fn cancel_frame(&mut self, handle: u64);
}

struct DriverQueue {
    pending: Vec<(u64, FrameRequest)>,
    next_handle: u64,
}

/// Queue-backed refresh driver fired by hand
///
/// Used by tests and headless demos: requests accumulate until [`pump`]
/// (the synthetic vsync) runs them. Requests made while pumping land in the
/// next batch, mirroring how refresh callbacks never fire re-entrantly.
///
/// [`pump`]: ManualRefreshDriver::pump
#[derive(Clone, Default)]
pub struct ManualRefreshDriver {
    inner: Rc<RefCell<DriverQueue>>,
}

impl Default for DriverQueue {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_handle: 1,
        }
    }
}

impl ManualRefreshDriver {
    /// Create an empty driver
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every request queued before this call
    ///
    /// Returns the number of requests dispatched.
    pub fn pump(&self) -> usize {
        let batch = std::mem::take(&mut self.inner.borrow_mut().pending);
        let fired = batch.len();
        for (_, request) in batch {
            request();
        }
        fired
    }

    /// Number of requests currently waiting for a refresh
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl RefreshDriver for ManualRefreshDriver {
    fn request_frame(&mut self, request: FrameRequest) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let handle = inner.next_handle;
        inner.next_handle += 1;
        inner.pending.push((handle, request));
        handle
    }

    fn cancel_frame(&mut self, handle: u64) {
        self.inner
            .borrow_mut()
            .pending
            .retain(|(queued, _)| *queued != handle);
    }
}

type StepFn = Box<dyn FnMut()>;
type StepSlot = Rc<RefCell<Option<StepFn>>>;

struct DisplayState {
    running: Cell<bool>,
    handle: Cell<Option<u64>>,
}

/// Scheduler driven by successive display-refresh requests
///
/// Each frame computes the elapsed time, invokes the user callback, then
/// re-requests the next refresh. `start` while already running is a no-op;
/// `stop` cancels the outstanding refresh request so no callback is left in
/// flight.
pub struct DisplayScheduler {
    driver: Rc<RefCell<dyn RefreshDriver>>,
    state: Rc<DisplayState>,
    clock: Rc<RefCell<FrameClock>>,
    step: StepSlot,
}

impl DisplayScheduler {
    /// Create a scheduler on top of the given refresh driver
    pub fn new(driver: Rc<RefCell<dyn RefreshDriver>>) -> Self {
        Self {
            driver,
            state: Rc::new(DisplayState {
                running: Cell::new(false),
                handle: Cell::new(None),
            }),
            clock: Rc::new(RefCell::new(FrameClock::new())),
            step: Rc::new(RefCell::new(None)),
        }
    }
}

/// Queue a refresh that runs the step function, holding it only weakly so
/// a stopped or dropped scheduler leaves dead requests behind, not live
/// callbacks.
fn queue_step(driver: &Rc<RefCell<dyn RefreshDriver>>, step: &StepSlot) -> u64 {
    let weak = Rc::downgrade(step);
    driver.borrow_mut().request_frame(Box::new(move || {
        if let Some(slot) = weak.upgrade() {
            if let Some(step) = slot.borrow_mut().as_mut() {
                step();
            }
        }
    }))
}

impl Scheduler for DisplayScheduler {
    fn start(&mut self, mut callback: TickCallback) {
        if self.state.running.get() {
            return;
        }
        self.state.running.set(true);
        self.clock.borrow_mut().reset();

        // Fresh slot per run; requests queued by a previous run hold weak
        // references to the old slot and can no longer fire anything.
        self.step = Rc::new(RefCell::new(None));
        let driver = Rc::clone(&self.driver);
        let state = Rc::clone(&self.state);
        let clock = Rc::clone(&self.clock);
        let slot = Rc::downgrade(&self.step);
        *self.step.borrow_mut() = Some(Box::new(move || {
            if !state.running.get() {
                return;
            }
            let delta = clock.borrow_mut().delta();
            callback(delta);
            if !state.running.get() {
                return;
            }
            if let Some(step) = slot.upgrade() {
                let handle = queue_step(&driver, &step);
                state.handle.set(Some(handle));
            }
        }));

        let handle = queue_step(&self.driver, &self.step);
        self.state.handle.set(Some(handle));
    }

    fn stop(&mut self) {
        self.state.running.set(false);
        if let Some(handle) = self.state.handle.take() {
            self.driver.borrow_mut().cancel_frame(handle);
        }
        // Drop the step closure unless a frame is executing it right now;
        // in that case the running flag already keeps it inert.
        if let Ok(mut slot) = self.step.try_borrow_mut() {
            slot.take();
        }
    }
}

/// Scheduler that delegates pacing to the render backend
///
/// Used while an immersive session is presenting: the platform must control
/// frame pacing for headset synchronization, so this variant registers one
/// callback with the backend and only computes deltas itself. `stop`
/// deregisters by passing `None`; repeated `start` simply re-registers,
/// which is safe because registration is last-write-wins.
pub struct SessionScheduler {
    backend: Rc<RefCell<dyn RenderBackend>>,
    clock: Rc<RefCell<FrameClock>>,
}

impl SessionScheduler {
    /// Create a scheduler registering on the given backend
    pub fn new(backend: Rc<RefCell<dyn RenderBackend>>) -> Self {
        Self {
            backend,
            clock: Rc::new(RefCell::new(FrameClock::new())),
        }
    }
}

impl Scheduler for SessionScheduler {
    fn start(&mut self, mut callback: TickCallback) {
        self.clock.borrow_mut().reset();
        let clock = Rc::clone(&self.clock);
        self.backend
            .borrow_mut()
            .set_frame_callback(Some(Box::new(move || {
                let delta = clock.borrow_mut().delta();
                callback(delta);
            })));
    }

    fn stop(&mut self) {
        self.backend.borrow_mut().set_frame_callback(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;

    fn counting_callback() -> (TickCallback, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let count_in = Rc::clone(&count);
        (
            Box::new(move |_delta| count_in.set(count_in.get() + 1)),
            count,
        )
    }

    #[test]
    fn test_display_scheduler_ticks_once_per_refresh() {
        let driver = ManualRefreshDriver::new();
        let mut scheduler = DisplayScheduler::new(Rc::new(RefCell::new(driver.clone())));
        let (callback, count) = counting_callback();

        scheduler.start(callback);
        assert_eq!(driver.pump(), 1);
        assert_eq!(driver.pump(), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_display_scheduler_start_is_idempotent() {
        let driver = ManualRefreshDriver::new();
        let mut scheduler = DisplayScheduler::new(Rc::new(RefCell::new(driver.clone())));
        let (callback, count) = counting_callback();
        let (second, second_count) = counting_callback();

        scheduler.start(callback);
        scheduler.start(second);
        driver.pump();

        // Only the first callback stream exists
        assert_eq!(count.get(), 1);
        assert_eq!(second_count.get(), 0);
        assert_eq!(driver.pending(), 1);
    }

    #[test]
    fn test_display_scheduler_stop_cancels_pending_request() {
        let driver = ManualRefreshDriver::new();
        let mut scheduler = DisplayScheduler::new(Rc::new(RefCell::new(driver.clone())));
        let (callback, count) = counting_callback();

        scheduler.start(callback);
        driver.pump();
        scheduler.stop();

        assert_eq!(driver.pending(), 0);
        assert_eq!(driver.pump(), 0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_display_scheduler_stop_before_start_is_noop() {
        let driver = ManualRefreshDriver::new();
        let mut scheduler = DisplayScheduler::new(Rc::new(RefCell::new(driver.clone())));
        scheduler.stop();
        assert_eq!(driver.pending(), 0);
    }

    #[test]
    fn test_display_scheduler_restarts_after_stop() {
        let driver = ManualRefreshDriver::new();
        let mut scheduler = DisplayScheduler::new(Rc::new(RefCell::new(driver.clone())));
        let (callback, count) = counting_callback();

        scheduler.start(callback);
        driver.pump();
        scheduler.stop();

        let (again, again_count) = counting_callback();
        scheduler.start(again);
        driver.pump();

        assert_eq!(count.get(), 1);
        assert_eq!(again_count.get(), 1);
    }

    #[test]
    fn test_session_scheduler_rides_backend_frames() {
        let backend = HeadlessBackend::new(800, 600);
        let pump = backend.frame_pump();
        let backend: Rc<RefCell<dyn RenderBackend>> = Rc::new(RefCell::new(backend));
        let mut scheduler = SessionScheduler::new(backend);
        let (callback, count) = counting_callback();

        scheduler.start(callback);
        pump.fire();
        pump.fire();
        assert_eq!(count.get(), 2);

        scheduler.stop();
        assert!(!pump.fire());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_session_scheduler_restart_reregisters() {
        let backend = HeadlessBackend::new(800, 600);
        let pump = backend.frame_pump();
        let backend: Rc<RefCell<dyn RenderBackend>> = Rc::new(RefCell::new(backend));
        let mut scheduler = SessionScheduler::new(backend);

        let (first, first_count) = counting_callback();
        let (second, second_count) = counting_callback();
        scheduler.start(first);
        scheduler.start(second);
        pump.fire();

        // Last registration wins; no doubled callback stream
        assert_eq!(first_count.get(), 0);
        assert_eq!(second_count.get(), 1);
    }

    #[test]
    fn test_session_scheduler_stop_before_start_is_noop() {
        let backend = HeadlessBackend::new(800, 600);
        let pump = backend.frame_pump();
        let backend: Rc<RefCell<dyn RenderBackend>> = Rc::new(RefCell::new(backend));
        let mut scheduler = SessionScheduler::new(backend);
        scheduler.stop();
        assert!(!pump.fire());
    }
}
