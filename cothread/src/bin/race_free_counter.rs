//! Race-free counter: three tasks each run 1000 iterations of
//! `{lock; read; yield; write; unlock}`. Final value must be exactly 3000.

use cothread::scheduler;
use cothread::sync::Mutex;
use cothread::thread::{join, spawn, yield_now};

static SHARED: Mutex<u64> = Mutex::new(0);

const ITERATIONS: u64 = 1000;
const TASKS: usize = 3;

fn worker(_arg: usize) -> usize {
    for _ in 0..ITERATIONS {
        let mut guard = SHARED.lock();
        let t = *guard;
        yield_now();
        *guard = t + 1;
    }
    0
}

fn main() {
    scheduler::init();

    let tasks: Vec<_> = (0..TASKS).map(|_| spawn(worker, 0).unwrap()).collect();
    for t in tasks {
        join(t).unwrap();
    }

    let total = *SHARED.lock();
    let expected = ITERATIONS * TASKS as u64;
    println!("race_free_counter: shared = {total} (expected {expected})");
    assert_eq!(total, expected, "lock failed to rule out interleaving");
    println!("race_free_counter: PASS");
}
