//! The thread table and the round-robin scheduler.
//!
//! This is the one piece of genuinely global mutable state in the crate:
//! the fixed-size task table, the "current task" cursor, and the tid
//! counter. The non-preemptive model is what makes sharing it through a
//! bare static safe — no suspension point is ever reached while a caller
//! holds the table borrowed, so there is never a moment where two borrows
//! could overlap. That is the design's central bargain (see the crate's
//! concurrency model docs): the absence of preemption replaces what would
//! otherwise require locks or atomics.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::MAX_THREADS;
use crate::context::{self, TaskContext};
use crate::task::{State, TaskId, TaskRecord};

/// The thread table plus scheduling cursor.
pub struct Scheduler {
    table: [TaskRecord; MAX_THREADS],
    current: usize,
    next_tid: u64,
}

impl Scheduler {
    fn new() -> Self {
        let mut table = [TaskRecord::unused(); MAX_THREADS];
        table[0].tid = TaskId::BOOTSTRAP;
        table[0].state = State::Running;
        Scheduler {
            table,
            current: 0,
            next_tid: 1,
        }
    }

    /// Index of the currently running slot.
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Tid of the currently running task.
    pub fn current_tid(&self) -> TaskId {
        self.table[self.current].tid
    }

    pub fn slot(&self, index: usize) -> &TaskRecord {
        &self.table[index]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut TaskRecord {
        &mut self.table[index]
    }

    pub fn current(&self) -> &TaskRecord {
        &self.table[self.current]
    }

    pub fn current_mut(&mut self) -> &mut TaskRecord {
        &mut self.table[self.current]
    }

    /// Locates the slot holding `tid`, regardless of its state.
    pub fn find(&self, tid: TaskId) -> Option<usize> {
        self.table
            .iter()
            .position(|t| t.tid == tid && t.state != State::Unused)
    }

    /// Finds the lowest-index `Unused` slot and reserves it by assigning the
    /// next monotonic tid and marking it `Runnable`. Returns the new slot's
    /// index and tid, or `None` if the table is full.
    pub fn reserve_slot(&mut self) -> Option<(usize, TaskId)> {
        let index = self.table.iter().position(|t| t.state == State::Unused)?;
        let tid = TaskId::new(self.next_tid);
        self.next_tid += 1;
        self.table[index].tid = tid;
        self.table[index].state = State::Runnable;
        self.table[index].joined_tid = None;
        self.table[index].retval = None;
        Some((index, tid))
    }

    /// The round-robin picker: scans forward from the slot after `current`,
    /// wrapping around, and returns the first `Runnable` slot found. Falls
    /// back to `current` itself if nothing else is runnable and it is
    /// still `Runnable`. Returns `None` if no slot is runnable at all.
    fn pick_next(&self) -> Option<usize> {
        let n = self.table.len();
        for offset in 1..=n {
            let idx = (self.current + offset) % n;
            if idx == self.current {
                if self.table[idx].state == State::Runnable {
                    return Some(idx);
                }
                break;
            }
            if self.table[idx].state == State::Runnable {
                return Some(idx);
            }
        }
        None
    }

    /// Performs one schedule step: picks the next runnable task and, if it
    /// differs from the current one, context-switches into it.
    ///
    /// Returns the raw pointers needed to perform the switch outside the
    /// lock-free borrow this function holds, since [`context::switch`] may
    /// not return to this stack frame until some later schedule step
    /// switches back here.
    ///
    /// # Safety
    ///
    /// Must only be called from within the scheduler's public entry points
    /// ([`crate::thread::yield_now`], the wait loops of the synchronization
    /// primitives, [`crate::thread::exit`], and [`crate::thread::join`]),
    /// which are the only documented suspension points.
    pub unsafe fn schedule_step(&mut self) {
        let old = self.current;
        let Some(next) = self.pick_next() else {
            return;
        };

        if self.table[old].state == State::Running {
            self.table[old].state = State::Runnable;
        }
        self.table[next].state = State::Running;
        self.current = next;

        if old != next {
            let old_ctx: *mut TaskContext = &mut self.table[old].ctx;
            let new_ctx: *const TaskContext = &self.table[next].ctx;
            unsafe {
                context::switch(old_ctx, new_ctx);
            }
        }
    }

    /// Wakes the sleeping task identified by `tid`: transitions its slot
    /// from `Sleeping` to `Runnable`. Does not itself invoke the scheduler;
    /// the caller keeps running until it reaches its own next scheduling
    /// point. Returns `false` if no sleeping slot with that tid exists
    /// (e.g., it raced with a cancellation this runtime doesn't support, or
    /// the caller has a stale tid).
    pub fn wake(&mut self, tid: TaskId) -> bool {
        if let Some(slot) = self
            .table
            .iter()
            .position(|t| t.tid == tid && t.state == State::Sleeping)
        {
            self.table[slot].state = State::Runnable;
            true
        } else {
            false
        }
    }
}

struct SchedulerCell(UnsafeCell<Option<Scheduler>>);

// Safety: the non-preemptive scheduling model guarantees exactly one task
// ever touches this cell at a time, and no suspension point is reached
// while a `&mut Scheduler` borrow from `with` is live. There is no real
// concurrent access to race on, only the single kernel-visible execution
// context this whole crate exists to multiplex.
unsafe impl Sync for SchedulerCell {}

static SCHEDULER: SchedulerCell = SchedulerCell(UnsafeCell::new(None));
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Adopts the host's current execution context as task 0 (the bootstrap
/// task) and marks it `Running`. Must precede every other call into this
/// crate; calling any other runtime operation first is undefined behavior,
/// and calling `init` itself more than once is a programmer error caught by
/// a debug assertion.
pub fn init() {
    debug_assert!(
        !INITIALIZED.load(Ordering::Relaxed),
        "cothread::scheduler::init called more than once"
    );
    unsafe {
        *SCHEDULER.0.get() = Some(Scheduler::new());
    }
    INITIALIZED.store(true, Ordering::Relaxed);
}

/// Grants transient exclusive access to the global scheduler.
///
/// Every other module in this crate reaches the thread table only through
/// this function. Because the model is non-preemptive, `f` never runs
/// concurrently with another call to `with`: the only way control leaves
/// `f` is by `f` returning.
pub fn with<R>(f: impl FnOnce(&mut Scheduler) -> R) -> R {
    debug_assert!(
        INITIALIZED.load(Ordering::Relaxed),
        "cothread::scheduler::init was never called"
    );
    let scheduler = unsafe { &mut *SCHEDULER.0.get() };
    let scheduler = scheduler
        .as_mut()
        .expect("cothread::scheduler::init was never called");
    f(scheduler)
}

/// Replaces the global scheduler with a freshly initialized one.
///
/// Test-only: the crate's test suites run against a process-wide global, so
/// every test module that exercises the runtime resets it first rather than
/// relying on whatever the previous test left behind.
#[cfg(test)]
pub(crate) fn reset_for_test() {
    unsafe {
        *SCHEDULER.0.get() = Some(Scheduler::new());
    }
    INITIALIZED.store(true, Ordering::Relaxed);
}

/// The one lock every test module in this crate must hold while it resets
/// and exercises the global scheduler.
///
/// `cargo test` runs `#[test]` functions on a pool of OS threads, but the
/// scheduler is a process-wide global sized for exactly one kernel-visible
/// execution context (see [`SchedulerCell`]'s safety comment). Without a
/// shared lock, two tests in different modules could touch `SCHEDULER`
/// concurrently from real OS threads, which the non-preemptive design does
/// not tolerate. This has nothing to do with the runtime's own cooperative
/// semantics — it exists purely to make the test suite, not the runtime,
/// safe under a multi-threaded harness.
#[cfg(test)]
pub(crate) fn test_lock() -> &'static std::sync::Mutex<()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    &LOCK
}

/// Acquires [`test_lock`], recovering from poison so that one test's panic
/// (with the global scheduler left mid-mutation) does not cascade into
/// every later test failing to even acquire the lock.
#[cfg(test)]
pub(crate) fn lock_for_test() -> std::sync::MutexGuard<'static, ()> {
    test_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_fresh_scheduler<R>(f: impl FnOnce() -> R) -> R {
        let _guard = lock_for_test();
        reset_for_test();
        f()
    }

    #[test]
    fn exactly_one_running_after_init() {
        with_fresh_scheduler(|| {
            with(|s| {
                assert_eq!(s.current_tid(), TaskId::BOOTSTRAP);
                assert_eq!(s.current().state, State::Running);
            });
        });
    }

    #[test]
    fn picker_scans_forward_and_wraps() {
        with_fresh_scheduler(|| {
            with(|s| {
                s.slot_mut(3).state = State::Runnable;
                s.slot_mut(3).tid = TaskId::new(1);
                assert_eq!(s.pick_next(), Some(3));

                s.slot_mut(1).state = State::Runnable;
                s.slot_mut(1).tid = TaskId::new(2);
                // current is slot 0, so slot 1 is found before slot 3.
                assert_eq!(s.pick_next(), Some(1));
            });
        });
    }

    #[test]
    fn picker_returns_none_when_nothing_runnable() {
        with_fresh_scheduler(|| {
            with(|s| {
                s.current_mut().state = State::Sleeping;
                assert_eq!(s.pick_next(), None);
            });
        });
    }

    #[test]
    fn wake_transitions_sleeping_to_runnable() {
        with_fresh_scheduler(|| {
            with(|s| {
                let (slot, tid) = s.reserve_slot().unwrap();
                s.slot_mut(slot).state = State::Sleeping;
                assert!(s.wake(tid));
                assert_eq!(s.slot(slot).state, State::Runnable);
            });
        });
    }

    #[test]
    fn wake_is_noop_for_non_sleeping_tid() {
        with_fresh_scheduler(|| {
            with(|s| {
                let (slot, tid) = s.reserve_slot().unwrap();
                // still Runnable, not Sleeping
                assert!(!s.wake(tid));
                assert_eq!(s.slot(slot).state, State::Runnable);
            });
        });
    }

    #[test]
    fn reserved_tids_are_monotonic_and_unique() {
        with_fresh_scheduler(|| {
            with(|s| {
                let (_, t1) = s.reserve_slot().unwrap();
                let (_, t2) = s.reserve_slot().unwrap();
                let (_, t3) = s.reserve_slot().unwrap();
                assert!(t1 < t2);
                assert!(t2 < t3);
            });
        });
    }
}
