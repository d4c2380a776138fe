//! Basic join: three tasks each return `arg * 100`. After joining in
//! creation order, the returned values are exactly 100, 200, 300.

use cothread::scheduler;
use cothread::thread::{join, spawn, yield_now};

fn times_100(arg: usize) -> usize {
    yield_now();
    arg * 100
}

fn main() {
    scheduler::init();

    let t1 = spawn(times_100, 1).unwrap();
    let t2 = spawn(times_100, 2).unwrap();
    let t3 = spawn(times_100, 3).unwrap();

    let r1 = join(t1).unwrap();
    let r2 = join(t2).unwrap();
    let r3 = join(t3).unwrap();

    println!("basic_join: {r1}, {r2}, {r3}");
    assert_eq!((r1, r2, r3), (100, 200, 300));
    println!("basic_join: PASS");
}
