//! Ordered per-frame update loop

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use super::scheduler::Scheduler;

/// Minimal contract for systems that update each frame
pub trait Updatable {
    /// Advance this target by `delta` seconds
    fn tick(&mut self, delta: f32);

    /// Hook invoked when the owning loop starts
    fn on_start(&mut self) {}

    /// Hook invoked when the owning loop stops
    fn on_stop(&mut self) {}
}

/// Shared handle to a registered update target
///
/// The handle's allocation is the target's identity: removal compares
/// handles, not contents, so the same target can be registered twice and
/// distinct targets never alias.
pub type SharedUpdatable = Rc<RefCell<dyn Updatable>>;

/// Registration-ordered collection of update targets driven by a scheduler
///
/// Targets tick in exactly the order they were added; the loop never
/// reorders or deduplicates. Keeping the render-producing target last is
/// the composition root's contract, not the loop's.
pub struct FrameLoop {
    scheduler: Box<dyn Scheduler>,
    targets: Rc<RefCell<Vec<SharedUpdatable>>>,
}

impl FrameLoop {
    /// Create a loop that pulls timing from `scheduler`
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            targets: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register a target at the end of the tick order
    pub fn add(&mut self, target: SharedUpdatable) {
        self.targets.borrow_mut().push(target);
    }

    /// Register several targets, preserving the iteration order
    pub fn extend(&mut self, targets: impl IntoIterator<Item = SharedUpdatable>) {
        self.targets.borrow_mut().extend(targets);
    }

    /// Remove every registration of `target`
    ///
    /// Identity-based: other targets keep their relative order. Removing a
    /// target that was never added is silently accepted.
    pub fn remove(&mut self, target: &SharedUpdatable) {
        self.targets
            .borrow_mut()
            .retain(|registered| !Rc::ptr_eq(registered, target));
    }

    /// Drop all registrations
    pub fn clear(&mut self) {
        self.targets.borrow_mut().clear();
    }

    /// Number of current registrations
    pub fn len(&self) -> usize {
        self.targets.borrow().len()
    }

    /// Whether no targets are registered
    pub fn is_empty(&self) -> bool {
        self.targets.borrow().is_empty()
    }

    /// Run every target's start hook in registration order, then begin the
    /// scheduler
    pub fn start(&mut self) {
        for target in snapshot(&self.targets) {
            if let Ok(mut target) = target.try_borrow_mut() {
                target.on_start();
            } else {
                log::debug!("skipping start hook on a target that is mid-tick");
            }
        }
        let targets = Rc::clone(&self.targets);
        self.scheduler.start(Box::new(move |delta| {
            for target in snapshot(&targets) {
                tick_isolated(&target, delta);
            }
        }));
    }

    /// Stop the scheduler, then run every target's stop hook in
    /// registration order
    ///
    /// The scheduler stops first so no tick can land between a target's
    /// stop hook and the end of the frame.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        for target in snapshot(&self.targets) {
            if let Ok(mut target) = target.try_borrow_mut() {
                target.on_stop();
            } else {
                log::debug!("skipping stop hook on a target that is mid-tick");
            }
        }
    }
}

/// Clone the registration list so in-tick `add`/`remove` calls mutate the
/// live list without invalidating the traversal; they take effect next
/// frame.
fn snapshot(targets: &Rc<RefCell<Vec<SharedUpdatable>>>) -> Vec<SharedUpdatable> {
    targets.borrow().clone()
}

/// Tick one target, containing any panic it raises
///
/// One failing system must not stall the rest of the frame or the loop
/// itself; the failure is reported and the remaining targets still run.
fn tick_isolated(target: &SharedUpdatable, delta: f32) {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        target.borrow_mut().tick(delta);
    }));
    if let Err(payload) = outcome {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        log::error!("update target panicked during tick: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::scheduler::TickCallback;

    /// Scheduler test double: records lifecycle calls and fires synthetic
    /// ticks on demand
    #[derive(Clone, Default)]
    struct FakeScheduler {
        callback: Rc<RefCell<Option<TickCallback>>>,
        starts: Rc<RefCell<u32>>,
        stops: Rc<RefCell<u32>>,
    }

    impl FakeScheduler {
        fn fire(&self, delta: f32) {
            let mut callback = self.callback.borrow_mut();
            if let Some(callback) = callback.as_mut() {
                callback(delta);
            }
        }
    }

    impl Scheduler for FakeScheduler {
        fn start(&mut self, callback: TickCallback) {
            *self.callback.borrow_mut() = Some(callback);
            *self.starts.borrow_mut() += 1;
        }

        fn stop(&mut self) {
            self.callback.borrow_mut().take();
            *self.stops.borrow_mut() += 1;
        }
    }

    /// Update target that records every lifecycle event into a shared log
    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Recorder {
        fn shared(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> SharedUpdatable {
            Rc::new(RefCell::new(Self {
                name,
                log: Rc::clone(log),
            }))
        }
    }

    impl Updatable for Recorder {
        fn tick(&mut self, delta: f32) {
            self.log.borrow_mut().push(format!("tick:{}:{delta}", self.name));
        }

        fn on_start(&mut self) {
            self.log.borrow_mut().push(format!("start:{}", self.name));
        }

        fn on_stop(&mut self) {
            self.log.borrow_mut().push(format!("stop:{}", self.name));
        }
    }

    #[test]
    fn test_tick_order_survives_interleaved_removal() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let scheduler = FakeScheduler::default();
        let mut frame_loop = FrameLoop::new(Box::new(scheduler.clone()));

        let a = Recorder::shared("a", &log);
        let b = Recorder::shared("b", &log);
        let c = Recorder::shared("c", &log);
        let d = Recorder::shared("d", &log);
        frame_loop.add(Rc::clone(&a));
        frame_loop.add(Rc::clone(&b));
        frame_loop.add(Rc::clone(&c));
        frame_loop.remove(&b);
        frame_loop.add(Rc::clone(&d));

        frame_loop.start();
        log.borrow_mut().clear();
        scheduler.fire(0.5);

        assert_eq!(
            *log.borrow(),
            vec!["tick:a:0.5", "tick:c:0.5", "tick:d:0.5"]
        );
    }

    #[test]
    fn test_duplicate_registration_ticks_twice_and_removes_together() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let scheduler = FakeScheduler::default();
        let mut frame_loop = FrameLoop::new(Box::new(scheduler.clone()));

        let a = Recorder::shared("a", &log);
        let b = Recorder::shared("b", &log);
        frame_loop.add(Rc::clone(&a));
        frame_loop.add(Rc::clone(&b));
        frame_loop.add(Rc::clone(&a));
        assert_eq!(frame_loop.len(), 3);

        frame_loop.start();
        log.borrow_mut().clear();
        scheduler.fire(1.0);
        assert_eq!(*log.borrow(), vec!["tick:a:1", "tick:b:1", "tick:a:1"]);

        // Removal is by identity and takes every registration with it
        frame_loop.remove(&a);
        log.borrow_mut().clear();
        scheduler.fire(1.0);
        assert_eq!(*log.borrow(), vec!["tick:b:1"]);
    }

    #[test]
    fn test_start_and_stop_hooks_bracket_the_scheduler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let scheduler = FakeScheduler::default();
        let mut frame_loop = FrameLoop::new(Box::new(scheduler.clone()));

        frame_loop.add(Recorder::shared("a", &log));
        frame_loop.add(Recorder::shared("b", &log));

        frame_loop.start();
        assert_eq!(*log.borrow(), vec!["start:a", "start:b"]);
        assert_eq!(*scheduler.starts.borrow(), 1);

        frame_loop.stop();
        assert_eq!(
            *log.borrow(),
            vec!["start:a", "start:b", "stop:a", "stop:b"]
        );
        assert_eq!(*scheduler.stops.borrow(), 1);
    }

    #[test]
    fn test_stop_silences_ticks_until_restarted() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let scheduler = FakeScheduler::default();
        let mut frame_loop = FrameLoop::new(Box::new(scheduler.clone()));
        frame_loop.add(Recorder::shared("a", &log));

        frame_loop.start();
        scheduler.fire(0.1);
        frame_loop.stop();
        log.borrow_mut().clear();

        scheduler.fire(0.1);
        assert!(log.borrow().is_empty());

        frame_loop.start();
        scheduler.fire(0.1);
        assert!(log.borrow().iter().any(|entry| entry.starts_with("tick:a")));
    }

    #[test]
    fn test_removing_unregistered_target_is_accepted() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut frame_loop = FrameLoop::new(Box::new(FakeScheduler::default()));
        let never_added = Recorder::shared("x", &log);
        frame_loop.remove(&never_added);
        assert!(frame_loop.is_empty());
    }

    #[test]
    fn test_panicking_target_does_not_stall_the_frame() {
        struct Faulty;
        impl Updatable for Faulty {
            fn tick(&mut self, _delta: f32) {
                panic!("boom");
            }
        }

        // Quiet the default hook; the panic is expected
        let previous_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let log = Rc::new(RefCell::new(Vec::new()));
        let scheduler = FakeScheduler::default();
        let mut frame_loop = FrameLoop::new(Box::new(scheduler.clone()));
        frame_loop.add(Rc::new(RefCell::new(Faulty)));
        frame_loop.add(Recorder::shared("after", &log));

        frame_loop.start();
        log.borrow_mut().clear();
        scheduler.fire(0.1);
        scheduler.fire(0.1);

        std::panic::set_hook(previous_hook);

        // The target after the faulty one still ran, both frames
        assert_eq!(*log.borrow(), vec!["tick:after:0.1", "tick:after:0.1"]);
    }

    #[test]
    fn test_end_to_end_system_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let scheduler = FakeScheduler::default();
        let mut frame_loop = FrameLoop::new(Box::new(scheduler.clone()));

        frame_loop.extend([
            Recorder::shared("locomotion", &log),
            Recorder::shared("interaction", &log),
            Recorder::shared("render", &log),
        ]);

        frame_loop.start();
        log.borrow_mut().clear();
        scheduler.fire(0.016);

        assert_eq!(
            *log.borrow(),
            vec![
                "tick:locomotion:0.016",
                "tick:interaction:0.016",
                "tick:render:0.016"
            ]
        );
    }
}
