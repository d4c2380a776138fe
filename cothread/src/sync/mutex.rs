//! A FIFO mutual-exclusion lock built on the scheduler's wait/wake
//! discipline, exposed as a safe `Mutex<T>` / `MutexGuard<T>` pair in the
//! shape of `std::sync::Mutex` so callers get unlock-on-drop instead of a
//! raw lock/unlock pair to remember to pair up correctly.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};

use crate::scheduler;
use crate::sync::WaitQueue;
use crate::task::{State, TaskId};

struct RawState {
    locked: bool,
    owner: Option<TaskId>,
    waiters: WaitQueue,
}

/// A mutex guarding a `T`, acquired and released through the scheduler's
/// blocking discipline rather than a spin loop or an OS futex.
pub struct Mutex<T> {
    raw: UnsafeCell<RawState>,
    data: UnsafeCell<T>,
}

// Safety: `Mutex<T>` is only ever touched from the single kernel-visible
// execution context this crate multiplexes; `T: Send` is still required so
// that handing the guarded value across tasks (which may run the value's
// destructor from a "different" logical thread of control) is sound.
unsafe impl<T: Send> Sync for Mutex<T> {}
unsafe impl<T: Send> Send for Mutex<T> {}

impl<T> Mutex<T> {
    pub const fn new(value: T) -> Self {
        Mutex {
            raw: UnsafeCell::new(RawState {
                locked: false,
                owner: None,
                waiters: WaitQueue::new(),
            }),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, blocking the calling task (cooperatively) until
    /// it is available.
    ///
    /// While locked, arriving waiters are appended to a FIFO wait list; the
    /// list is served strictly in arrival order regardless of how the
    /// scheduler's round-robin rotation happens to visit tasks in between.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        loop {
            let already_locked = unsafe { (*self.raw.get()).locked };
            if !already_locked {
                break;
            }
            scheduler::with(|s| unsafe {
                (*self.raw.get()).waiters.push(s.current_tid());
                s.current_mut().state = State::Sleeping;
            });
            unsafe {
                scheduler::with(|s| s.schedule_step());
            }
        }

        scheduler::with(|s| unsafe {
            let raw = &mut *self.raw.get();
            raw.locked = true;
            raw.owner = Some(s.current_tid());
        });

        MutexGuard { mutex: self }
    }

    /// Releases the lock.
    ///
    /// Only reachable through [`MutexGuard`]'s `Drop`, which statically
    /// prevents the spec's "unlock by a task that doesn't hold the lock"
    /// programmer error: you cannot construct a guard without having
    /// acquired it. The owner check and log line are kept anyway as
    /// defense in depth and to document the intended behavior if that
    /// invariant were ever violated through unsafe code.
    pub(crate) fn unlock(&self) {
        scheduler::with(|s| unsafe {
            let raw = &mut *self.raw.get();
            let me = s.current_tid();
            if raw.owner != Some(me) {
                log::warn!(
                    "cothread: unlock called by {} but mutex is owned by {:?}",
                    me,
                    raw.owner
                );
                return;
            }
            if let Some(next) = raw.waiters.pop() {
                s.wake(next);
            }
            raw.locked = false;
            raw.owner = None;
        });
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        unsafe { (*self.raw.get()).locked }
    }

    #[cfg(test)]
    pub(crate) fn owner(&self) -> Option<TaskId> {
        unsafe { (*self.raw.get()).owner }
    }

    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        unsafe { (*self.raw.get()).waiters.len() }
    }
}

/// RAII guard produced by [`Mutex::lock`]; releases the lock when dropped.
pub struct MutexGuard<'a, T> {
    pub(crate) mutex: &'a Mutex<T>,
}

impl<'a, T> Deref for MutexGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<'a, T> DerefMut for MutexGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<'a, T> Drop for MutexGuard<'a, T> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
