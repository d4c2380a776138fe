//! Synchronization primitives built on the scheduler's wait/wake discipline.
//!
//! Every primitive in this module owns a [`WaitQueue`] of task ids and
//! manipulates task state only through [`crate::scheduler`]'s `wake` and
//! `schedule_step`. None of them need a `std::sync` lock around their own
//! bookkeeping: the non-preemptive model means the bookkeeping itself is
//! never observed mid-update by another task (see the crate's concurrency
//! model docs).

mod channel;
mod condvar;
mod mutex;
mod semaphore;

pub use channel::Channel;
pub use condvar::CondVar;
pub use mutex::{Mutex, MutexGuard};
pub use semaphore::Semaphore;

use std::collections::VecDeque;

use crate::config::MAX_THREADS;
use crate::task::TaskId;

/// A bounded FIFO of task identifiers, capacity [`MAX_THREADS`].
///
/// Enqueue is at the tail, dequeue is from the head — plain arrival order,
/// which is what gives every primitive built on this its FIFO fairness
/// guarantee.
pub(crate) struct WaitQueue {
    tids: VecDeque<TaskId>,
}

impl WaitQueue {
    pub(crate) const fn new() -> Self {
        WaitQueue {
            tids: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, tid: TaskId) {
        debug_assert!(
            self.tids.len() < MAX_THREADS,
            "wait queue cannot hold more than MAX_THREADS waiters"
        );
        self.tids.push_back(tid);
    }

    pub(crate) fn pop(&mut self) -> Option<TaskId> {
        self.tids.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tids.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.tids.len()
    }
}
