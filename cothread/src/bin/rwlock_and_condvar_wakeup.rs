//! Two scenarios sharing one binary: a writer-priority reader/writer lock
//! built from a mutex and two condition variables, and a plain
//! condition-variable broadcast wakeup.

use cothread::scheduler;
use cothread::sync::{CondVar, Mutex};
use cothread::thread::{join, spawn, yield_now};

struct RwState {
    active_readers: u32,
    active_writers: u32,
    waiting_writers: u32,
}

struct RwLock {
    state: Mutex<RwState>,
    ok_to_read: CondVar,
    ok_to_write: CondVar,
}

impl RwLock {
    const fn new() -> Self {
        RwLock {
            state: Mutex::new(RwState {
                active_readers: 0,
                active_writers: 0,
                waiting_writers: 0,
            }),
            ok_to_read: CondVar::new(),
            ok_to_write: CondVar::new(),
        }
    }

    fn read_lock(&self) {
        let mut s = self.state.lock();
        while s.active_writers > 0 || s.waiting_writers > 0 {
            s = self.ok_to_read.wait(s);
        }
        s.active_readers += 1;
    }

    fn read_unlock(&self) {
        let mut s = self.state.lock();
        s.active_readers -= 1;
        if s.active_readers == 0 {
            self.ok_to_write.notify_one();
        }
    }

    fn write_lock(&self) {
        let mut s = self.state.lock();
        s.waiting_writers += 1;
        while s.active_writers > 0 || s.active_readers > 0 {
            s = self.ok_to_write.wait(s);
        }
        s.waiting_writers -= 1;
        s.active_writers += 1;
    }

    fn write_unlock(&self) {
        let mut s = self.state.lock();
        s.active_writers -= 1;
        if s.waiting_writers > 0 {
            self.ok_to_write.notify_one();
        } else {
            self.ok_to_read.notify_all();
        }
    }
}

static RW: RwLock = RwLock::new();
static SHARED_COUNTER: Mutex<u64> = Mutex::new(0);

const READERS: usize = 3;
const READS_PER_READER: u64 = 5;
const WRITERS: usize = 2;
const WRITES_PER_WRITER: u64 = 3;

fn reader(_arg: usize) -> usize {
    for _ in 0..READS_PER_READER {
        RW.read_lock();
        let _ = *SHARED_COUNTER.lock();
        yield_now();
        RW.read_unlock();
    }
    0
}

fn writer(_arg: usize) -> usize {
    for _ in 0..WRITES_PER_WRITER {
        RW.write_lock();
        *SHARED_COUNTER.lock() += 1;
        yield_now();
        RW.write_unlock();
    }
    0
}

fn run_reader_writer_scenario() {
    let readers: Vec<_> = (0..READERS).map(|_| spawn(reader, 0).unwrap()).collect();
    let writers: Vec<_> = (0..WRITERS).map(|_| spawn(writer, 0).unwrap()).collect();

    for r in readers {
        join(r).unwrap();
    }
    for w in writers {
        join(w).unwrap();
    }

    let total = *SHARED_COUNTER.lock();
    let expected = (WRITERS as u64) * WRITES_PER_WRITER;
    println!("rwlock: shared counter = {total} (expected {expected})");
    assert_eq!(total, expected);
    println!("rwlock: PASS");
}

static READY_LOCK: Mutex<bool> = Mutex::new(false);
static READY_COND: CondVar = CondVar::new();
static WAKE_COUNT: Mutex<u32> = Mutex::new(0);

const WAITERS: usize = 10;

fn condvar_waiter(_arg: usize) -> usize {
    let mut ready = READY_LOCK.lock();
    while !*ready {
        ready = READY_COND.wait(ready);
    }
    assert!(*ready, "waiter must observe ready=true after waking");
    drop(ready);
    *WAKE_COUNT.lock() += 1;
    0
}

fn run_condvar_wakeup_scenario() {
    *READY_LOCK.lock() = false;
    *WAKE_COUNT.lock() = 0;

    let waiters: Vec<_> = (0..WAITERS).map(|_| spawn(condvar_waiter, 0).unwrap()).collect();
    for _ in 0..WAITERS {
        yield_now();
    }

    {
        let mut ready = READY_LOCK.lock();
        *ready = true;
    }
    READY_COND.notify_all();

    for w in waiters {
        join(w).unwrap();
    }

    let woken = *WAKE_COUNT.lock();
    println!("condvar_wakeup: {woken} of {WAITERS} waiters observed ready=true");
    assert_eq!(woken as usize, WAITERS);
    println!("condvar_wakeup: PASS");
}

fn main() {
    scheduler::init();
    run_reader_writer_scenario();
    run_condvar_wakeup_scenario();
}
