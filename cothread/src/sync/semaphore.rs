//! A counting semaphore built on the scheduler's wait/wake discipline.

use std::cell::UnsafeCell;

use crate::scheduler;
use crate::sync::WaitQueue;
use crate::task::State;

struct RawState {
    count: i64,
    waiters: WaitQueue,
}

/// A counting semaphore. `count` never goes negative; a `wait` that finds
/// `count == 0` blocks the caller instead of decrementing past zero.
pub struct Semaphore {
    raw: UnsafeCell<RawState>,
}

// Safety: see `Mutex`'s safety comment — the same non-preemption argument
// applies identically here.
unsafe impl Sync for Semaphore {}
unsafe impl Send for Semaphore {}

impl Semaphore {
    pub const fn new(initial: u64) -> Self {
        Semaphore {
            raw: UnsafeCell::new(RawState {
                count: initial as i64,
                waiters: WaitQueue::new(),
            }),
        }
    }

    /// Decrements the count, blocking first if it is zero.
    ///
    /// The count is checked exactly once, up front. If it is already
    /// positive, this takes a unit immediately. Otherwise the caller
    /// enqueues, sleeps, and is switched out; once a later [`Semaphore::post`]
    /// wakes it back up, it decrements unconditionally, with no second look
    /// at `count` — being woken is itself the grant. Re-checking on
    /// resumption would let some other task's own `wait` race in and observe
    /// `count` as positive in between the wake and this task actually
    /// running again, stealing the unit `post` meant for this waiter and
    /// sending it back to sleep incorrectly.
    pub fn wait(&self) {
        let available = unsafe { (*self.raw.get()).count > 0 };
        if available {
            unsafe {
                (*self.raw.get()).count -= 1;
            }
            return;
        }

        scheduler::with(|s| unsafe {
            (*self.raw.get()).waiters.push(s.current_tid());
            s.current_mut().state = State::Sleeping;
        });
        unsafe {
            scheduler::with(|s| s.schedule_step());
        }

        unsafe {
            (*self.raw.get()).count -= 1;
        }
    }

    /// Increments the count and wakes the longest-waiting blocked task, if
    /// any.
    ///
    /// The increment always happens, even when a waiter is woken: the woken
    /// task performs its own decrement once it resumes in `wait`, keeping
    /// the post/wait pairing symmetric rather than special-casing the
    /// handoff.
    pub fn post(&self) {
        scheduler::with(|s| unsafe {
            let raw = &mut *self.raw.get();
            raw.count += 1;
            if let Some(next) = raw.waiters.pop() {
                s.wake(next);
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> i64 {
        unsafe { (*self.raw.get()).count }
    }

    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        unsafe { (*self.raw.get()).waiters.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler;
    use crate::sync::Mutex;
    use crate::thread::{join, spawn, yield_now};

    fn fresh_runtime<R>(f: impl FnOnce() -> R) -> R {
        let _guard = scheduler::lock_for_test();
        scheduler::reset_for_test();
        f()
    }

    #[test]
    fn wait_blocks_until_post() {
        fresh_runtime(|| {
            static SEM: Semaphore = Semaphore::new(0);

            fn waiter(_arg: usize) -> usize {
                SEM.wait();
                1
            }

            let t = spawn(waiter, 0).unwrap();
            yield_now();
            assert_eq!(SEM.waiter_count(), 1, "waiter should be blocked");

            SEM.post();
            assert_eq!(join(t).unwrap(), 1);
            assert_eq!(SEM.count(), 0);
        });
    }

    #[test]
    fn count_never_goes_negative_under_contention() {
        fresh_runtime(|| {
            static SEM: Semaphore = Semaphore::new(2);
            static OBSERVED_MIN: Mutex<i64> = Mutex::new(i64::MAX);

            fn worker(_arg: usize) -> usize {
                for _ in 0..20 {
                    SEM.wait();
                    {
                        let mut min = OBSERVED_MIN.lock();
                        let c = SEM.count();
                        if c < *min {
                            *min = c;
                        }
                    }
                    yield_now();
                    SEM.post();
                }
                0
            }

            let tasks: Vec<_> = (0..4).map(|_| spawn(worker, 0).unwrap()).collect();
            for t in tasks {
                join(t).unwrap();
            }

            assert!(*OBSERVED_MIN.lock() >= 0);
            assert_eq!(SEM.count(), 2);
        });
    }

    #[test]
    fn bounded_buffer_producer_consumer() {
        fresh_runtime(|| {
            const CAPACITY: u64 = 3;
            static EMPTY_SLOTS: Semaphore = Semaphore::new(CAPACITY);
            static FILLED_SLOTS: Semaphore = Semaphore::new(0);
            static BUFFER: Mutex<Vec<u64>> = Mutex::new(Vec::new());

            fn producer(_arg: usize) -> usize {
                for i in 0..10u64 {
                    EMPTY_SLOTS.wait();
                    BUFFER.lock().push(i);
                    FILLED_SLOTS.post();
                }
                0
            }

            fn consumer(_arg: usize) -> usize {
                let mut sum = 0u64;
                for _ in 0..10 {
                    FILLED_SLOTS.wait();
                    let item = BUFFER.lock().pop().expect("producer already posted");
                    sum += item;
                    EMPTY_SLOTS.post();
                }
                sum as usize
            }

            *BUFFER.lock() = Vec::new();
            let p = spawn(producer, 0).unwrap();
            let c = spawn(consumer, 0).unwrap();
            join(p).unwrap();
            let total = join(c).unwrap();

            assert_eq!(total as u64, (0..10u64).sum::<u64>());
            assert_eq!(EMPTY_SLOTS.count(), CAPACITY as i64);
            assert!(BUFFER.lock().is_empty());
        });
    }
}
