use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

/// Deferred one-shot tasks on the UI thread.
pub trait Scheduler {
    /// Run `task` once after `delay_ms`. Returns `None` when the task could not be scheduled.
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TaskHandle>;
}

/// Owns a scheduled task. Cancelling or dropping the handle unschedules the
/// task if it has not run yet and releases what it captured.
#[must_use = "dropping a TaskHandle cancels the task"]
pub struct TaskHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TaskHandle {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

/// `window.setTimeout` through `gloo-timers`; the pending [`Timeout`] lives in the handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TaskHandle> {
        web_sys::window()?;
        let timeout = Timeout::new(delay_ms, move || task());
        Some(TaskHandle::new(move || drop(timeout)))
    }
}

type TaskKey = (u64, u64);

#[derive(Default)]
struct ManualInner {
    now: u64,
    next_id: u64,
    tasks: BTreeMap<TaskKey, Box<dyn FnOnce()>>,
}

/// A virtual clock. Tasks only run when [`ManualScheduler::advance`] moves
/// time past their deadline.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Move the clock forward by `ms`, running due tasks in deadline order.
    /// Tasks scheduled by a running task are honored if they fall due in the window.
    pub fn advance(&self, ms: u64) {
        let target = self.inner.borrow().now + ms;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                match inner.tasks.keys().next().copied() {
                    Some(key) if key.0 <= target => {
                        inner.now = key.0;
                        inner.tasks.remove(&key)
                    }
                    _ => None,
                }
            };
            match next {
                Some(task) => task(),
                None => break,
            }
        }
        self.inner.borrow_mut().now = target;
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Option<TaskHandle> {
        let key = {
            let mut inner = self.inner.borrow_mut();
            let key = (inner.now + u64::from(delay_ms), inner.next_id);
            inner.next_id += 1;
            inner.tasks.insert(key, task);
            key
        };
        let inner = Rc::clone(&self.inner);
        Some(TaskHandle::new(move || {
            inner.borrow_mut().tasks.remove(&key);
        }))
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_task_runs_at_deadline() {
        let scheduler = ManualScheduler::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let _handle = scheduler.schedule(300, Box::new(move || flag.set(true)));

        scheduler.advance(299);
        assert!(!ran.get());
        scheduler.advance(1);
        assert!(ran.get());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), 300);
    }

    #[test]
    fn test_cancelled_task_never_runs() {
        let scheduler = ManualScheduler::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let handle = scheduler
            .schedule(10, Box::new(move || flag.set(true)))
            .unwrap();

        handle.cancel();
        scheduler.advance(100);
        assert!(!ran.get());
    }

    #[test]
    fn test_dropped_handle_cancels_task() {
        let scheduler = ManualScheduler::new();
        let captured = Rc::new(());
        let held = Rc::clone(&captured);
        drop(scheduler.schedule(10, Box::new(move || drop(held))));

        assert_eq!(scheduler.pending(), 0);
        assert_eq!(Rc::strong_count(&captured), 1);
    }

    #[test]
    fn test_held_handle_keeps_task_until_it_runs() {
        let scheduler = ManualScheduler::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let handle = scheduler.schedule(10, Box::new(move || flag.set(true)));

        scheduler.advance(10);
        assert!(ran.get());
        // Cancelling after the task ran is a no-op.
        drop(handle);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_tasks_run_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for (delay, name) in [(30, "c"), (10, "a"), (20, "b")] {
            let order = Rc::clone(&order);
            let task = Box::new(move || order.borrow_mut().push(name));
            handles.push(scheduler.schedule(delay, task));
        }

        scheduler.advance(50);
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_task_may_schedule_another() {
        let scheduler = ManualScheduler::new();
        let ran = Rc::new(Cell::new(0));
        let follow_up = Rc::new(RefCell::new(None));
        let inner_sched = scheduler.clone();
        let counter = Rc::clone(&ran);
        let slot = Rc::clone(&follow_up);
        let _handle = scheduler.schedule(
            5,
            Box::new(move || {
                counter.set(counter.get() + 1);
                let counter = Rc::clone(&counter);
                *slot.borrow_mut() =
                    inner_sched.schedule(5, Box::new(move || counter.set(counter.get() + 1)));
            }),
        );

        scheduler.advance(10);
        assert_eq!(ran.get(), 2);
    }
}
