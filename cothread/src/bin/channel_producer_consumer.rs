//! Channel producer/consumer: capacity 5, three producers x 10 items, two
//! consumers. After producers finish and the channel closes, both consumers
//! drain the remainder and observe `Closed`; total consumed must be 30.

use cothread::error::RuntimeError;
use cothread::scheduler;
use cothread::sync::Channel;
use cothread::thread::{join, spawn};

const CAPACITY: usize = 5;
const ITEMS_PER_PRODUCER: u64 = 10;
const PRODUCERS: usize = 3;
const CONSUMERS: usize = 2;

fn producer(chan: usize) -> usize {
    let chan = unsafe { &*(chan as *const Channel<u64>) };
    for i in 0..ITEMS_PER_PRODUCER {
        chan.send(i).expect("channel is not closed while producers run");
    }
    0
}

fn consumer(chan: usize) -> usize {
    let chan = unsafe { &*(chan as *const Channel<u64>) };
    let mut consumed = 0u64;
    loop {
        match chan.recv() {
            Ok(_) => consumed += 1,
            Err(RuntimeError::Closed) => break,
            Err(other) => panic!("unexpected channel error: {other}"),
        }
    }
    consumed as usize
}

fn main() {
    scheduler::init();
    let chan: &'static Channel<u64> =
        Box::leak(Box::new(Channel::new(CAPACITY).expect("allocation should succeed")));
    let addr = chan as *const Channel<u64> as usize;

    let producers: Vec<_> = (0..PRODUCERS).map(|_| spawn(producer, addr).unwrap()).collect();
    let consumers: Vec<_> = (0..CONSUMERS).map(|_| spawn(consumer, addr).unwrap()).collect();

    for p in producers {
        join(p).unwrap();
    }
    chan.close();

    let mut total_consumed = 0usize;
    for c in consumers {
        total_consumed += join(c).unwrap();
    }

    println!("channel_producer_consumer: consumed {total_consumed}");
    assert_eq!(total_consumed, (PRODUCERS as u64 * ITEMS_PER_PRODUCER) as usize);
    println!("channel_producer_consumer: PASS");
}
