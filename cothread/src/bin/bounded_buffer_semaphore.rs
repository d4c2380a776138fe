//! Bounded-buffer producer/consumer built on counting semaphores.
//!
//! Capacity 5, three producers each producing 10 items, two consumers each
//! consuming 15. `empty` starts at 5, `full` at 0. Total consumed must be
//! 30, and the buffer's occupancy must never leave `[0, 5]`.

use std::collections::VecDeque;

use cothread::scheduler;
use cothread::sync::{Mutex, Semaphore};
use cothread::thread::{join, spawn};

const CAPACITY: u64 = 5;
const ITEMS_PER_PRODUCER: u64 = 10;
const PRODUCERS: usize = 3;
const ITEMS_PER_CONSUMER: u64 = 15;
const CONSUMERS: usize = 2;

static EMPTY: Semaphore = Semaphore::new(CAPACITY);
static FULL: Semaphore = Semaphore::new(0);
static BUFFER: Mutex<VecDeque<u64>> = Mutex::new(VecDeque::new());
static MAX_OCCUPANCY_SEEN: Mutex<u64> = Mutex::new(0);

fn producer(_arg: usize) -> usize {
    for i in 0..ITEMS_PER_PRODUCER {
        EMPTY.wait();
        {
            let mut buf = BUFFER.lock();
            buf.push_back(i);
            let occ = buf.len() as u64;
            let mut seen = MAX_OCCUPANCY_SEEN.lock();
            if occ > *seen {
                *seen = occ;
            }
        }
        FULL.post();
    }
    0
}

fn consumer(_arg: usize) -> usize {
    let mut consumed = 0u64;
    for _ in 0..ITEMS_PER_CONSUMER {
        FULL.wait();
        {
            let mut buf = BUFFER.lock();
            buf.pop_front().expect("full count guarantees an item is present");
        }
        EMPTY.post();
        consumed += 1;
    }
    consumed as usize
}

fn main() {
    scheduler::init();

    let producers: Vec<_> = (0..PRODUCERS).map(|_| spawn(producer, 0).unwrap()).collect();
    let consumers: Vec<_> = (0..CONSUMERS).map(|_| spawn(consumer, 0).unwrap()).collect();

    for p in producers {
        join(p).unwrap();
    }
    let mut total_consumed = 0usize;
    for c in consumers {
        total_consumed += join(c).unwrap();
    }

    let max_occupancy = *MAX_OCCUPANCY_SEEN.lock();
    println!(
        "bounded_buffer_semaphore: consumed {total_consumed}, max occupancy observed {max_occupancy}"
    );
    assert_eq!(total_consumed, (PRODUCERS as u64 * ITEMS_PER_PRODUCER) as usize);
    assert!(max_occupancy <= CAPACITY);
    assert!(BUFFER.lock().is_empty());
    println!("bounded_buffer_semaphore: PASS");
}
