//! A user-space cooperative M:N threading runtime.
//!
//! `cothread` multiplexes any number of application-level tasks (up to
//! [`config::MAX_THREADS`]) onto the single kernel-visible execution
//! context the host process already has. There is no preemption: a task
//! keeps the processor until it calls [`thread::yield_now`], blocks on a
//! synchronization primitive, or exits. That absence of preemption is the
//! whole design's load-bearing assumption — see [`scheduler`]'s module
//! docs for what it buys and what it costs.
//!
//! # Layout
//!
//! - [`context`] — the machine-level context switch and stack-priming
//!   protocol. The crate's only unsafe surface of consequence.
//! - [`task`] — task records and the five-state lifecycle.
//! - [`scheduler`] — the thread table and the round-robin picker.
//! - [`thread`] — the public task-management surface: spawn, join, exit,
//!   current, yield_now.
//! - [`sync`] — mutex, semaphore, condition variable, and bounded channel,
//!   all built on the scheduler's block/wake discipline.
//! - [`error`] — the [`error::RuntimeError`] type every fallible operation
//!   here returns.
//!
//! # Getting started
//!
//! ```no_run
//! use cothread::{scheduler, thread};
//!
//! scheduler::init();
//!
//! fn say_hello(n: usize) -> usize {
//!     println!("hello from task {n}");
//!     n * 2
//! }
//!
//! let t = thread::spawn(say_hello, 21).unwrap();
//! let result = thread::join(t).unwrap();
//! assert_eq!(result, 42);
//! ```
//!
//! [`scheduler::init`] must run exactly once, before any other call into
//! this crate, from the thread that will host task 0.

pub mod config;
pub mod context;
pub mod error;
pub mod scheduler;
pub mod sync;
pub mod task;
pub mod thread;

pub use error::RuntimeError;
pub use task::TaskId;
