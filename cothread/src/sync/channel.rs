//! A bounded MPMC channel, built from a [`crate::sync::Mutex`]-guarded ring
//! buffer and two [`crate::sync::CondVar`]s rather than its own bespoke
//! wait/wake bookkeeping — the same way `std::sync::mpsc` is commonly
//! reimplemented in terms of lower-level primitives when a language's
//! standard library doesn't ship a bounded channel outright.

use crate::error::RuntimeError;
use crate::sync::{CondVar, Mutex};

struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    read: usize,
    write: usize,
    count: usize,
    closed: bool,
}

/// A bounded, closable FIFO channel shared by any number of producers and
/// consumers.
pub struct Channel<T> {
    state: Mutex<RingBuffer<T>>,
    not_empty: CondVar,
    not_full: CondVar,
    capacity: usize,
}

impl<T> Channel<T> {
    /// Allocates a channel holding up to `capacity` items.
    ///
    /// Fails with [`RuntimeError::OutOfMemory`] rather than aborting the
    /// process if the backing buffer cannot be allocated — the one place in
    /// this crate where an ordinary allocation failure is surfaced as a
    /// recoverable error instead of relying on the global allocator's
    /// default abort-on-OOM behavior.
    pub fn new(capacity: usize) -> Result<Self, RuntimeError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| RuntimeError::OutOfMemory(capacity))?;
        slots.resize_with(capacity, || None);

        Ok(Channel {
            state: Mutex::new(RingBuffer {
                slots,
                read: 0,
                write: 0,
                count: 0,
                closed: false,
            }),
            not_empty: CondVar::new(),
            not_full: CondVar::new(),
            capacity,
        })
    }

    /// Blocks until there is room, then pushes `value`.
    ///
    /// Fails with [`RuntimeError::Closed`] if the channel is closed, either
    /// already or while this call was blocked waiting for room.
    pub fn send(&self, value: T) -> Result<(), RuntimeError> {
        let mut buf = self.state.lock();
        loop {
            if buf.closed {
                return Err(RuntimeError::Closed);
            }
            if buf.count < self.capacity {
                break;
            }
            buf = self.not_full.wait(buf);
        }
        let idx = buf.write;
        buf.slots[idx] = Some(value);
        buf.write = (buf.write + 1) % self.capacity;
        buf.count += 1;
        drop(buf);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks until an item is available or the channel is closed and
    /// drained.
    ///
    /// Returns `Ok(value)` for each buffered item, in FIFO order, and only
    /// then `Err(Closed)` once the buffer is empty and no sender remains.
    pub fn recv(&self) -> Result<T, RuntimeError> {
        let mut buf = self.state.lock();
        loop {
            if buf.count > 0 {
                break;
            }
            if buf.closed {
                return Err(RuntimeError::Closed);
            }
            buf = self.not_empty.wait(buf);
        }
        let idx = buf.read;
        let value = buf.slots[idx].take().expect("slot marked full must hold a value");
        buf.read = (buf.read + 1) % self.capacity;
        buf.count -= 1;
        drop(buf);
        self.not_full.notify_one();
        Ok(value)
    }

    /// Marks the channel closed: every blocked and future `send` fails
    /// immediately, while `recv` keeps returning buffered items until the
    /// buffer is drained.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler;
    use crate::thread::{join, spawn, yield_now};
    use proptest::prelude::*;

    fn fresh_runtime<R>(f: impl FnOnce() -> R) -> R {
        let _guard = scheduler::lock_for_test();
        scheduler::reset_for_test();
        f()
    }

    #[test]
    fn bounded_producer_consumer_preserves_fifo_order() {
        fresh_runtime(|| {
            let chan: &'static Channel<u64> =
                Box::leak(Box::new(Channel::new(2).expect("allocation should succeed")));

            fn producer(chan: usize) -> usize {
                let chan = unsafe { &*(chan as *const Channel<u64>) };
                for i in 0..10u64 {
                    chan.send(i).unwrap();
                }
                0
            }

            fn consumer(chan: usize) -> usize {
                let chan = unsafe { &*(chan as *const Channel<u64>) };
                let mut sum = 0u64;
                for _ in 0..10 {
                    sum += chan.recv().unwrap();
                }
                sum as usize
            }

            let addr = chan as *const Channel<u64> as usize;
            let p = spawn(producer, addr).unwrap();
            let c = spawn(consumer, addr).unwrap();
            join(p).unwrap();
            let total = join(c).unwrap();

            assert_eq!(total as u64, (0..10u64).sum::<u64>());
            assert_eq!(chan.len(), 0);
        });
    }

    #[test]
    fn send_blocks_when_full_until_recv_makes_room() {
        fresh_runtime(|| {
            let chan: &'static Channel<u64> =
                Box::leak(Box::new(Channel::new(1).unwrap()));

            fn filler(chan: usize) -> usize {
                let chan = unsafe { &*(chan as *const Channel<u64>) };
                chan.send(1).unwrap();
                chan.send(2).unwrap();
                0
            }

            let addr = chan as *const Channel<u64> as usize;
            let t = spawn(filler, addr).unwrap();
            yield_now();
            yield_now();

            assert_eq!(chan.len(), 1, "second send should still be blocked");

            join(t).unwrap();
            assert_eq!(chan.recv().unwrap(), 1);
            assert_eq!(chan.recv().unwrap(), 2);
        });
    }

    #[test]
    fn close_drains_buffered_items_before_failing() {
        fresh_runtime(|| {
            let chan = Channel::new(4).unwrap();
            chan.send(1u64).unwrap();
            chan.send(2u64).unwrap();
            chan.close();

            assert_eq!(chan.recv().unwrap(), 1);
            assert_eq!(chan.recv().unwrap(), 2);
            assert_eq!(chan.recv(), Err(RuntimeError::Closed));
            assert_eq!(chan.send(3u64), Err(RuntimeError::Closed));
        });
    }

    #[test]
    fn new_surfaces_allocation_failure_as_out_of_memory() {
        // A capacity this large cannot possibly be satisfied by
        // `try_reserve_exact`, exercising the error path without actually
        // exhausting process memory.
        let result = Channel::<u64>::new(usize::MAX / 2);
        assert_eq!(result.err(), Some(RuntimeError::OutOfMemory(usize::MAX / 2)));
    }

    proptest! {
        #[test]
        fn count_never_exceeds_capacity(ops in prop::collection::vec(0..2u8, 1..200)) {
            fresh_runtime(|| {
                let chan = Channel::<u8>::new(5).unwrap();
                let mut expected = 0usize;
                for op in ops {
                    if op == 0 && expected < chan.capacity() {
                        chan.send(0).unwrap();
                        expected += 1;
                    } else if op == 1 && expected > 0 {
                        chan.recv().unwrap();
                        expected -= 1;
                    }
                    prop_assert!(chan.len() <= chan.capacity());
                    prop_assert_eq!(chan.len(), expected);
                }
                Ok(())
            })?;
        }
    }
}
