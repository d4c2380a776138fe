//! Error taxonomy for fallible runtime operations.
//!
//! Only the reportable kinds get a `Result`. Programmer errors (unlocking a
//! mutex you don't own, waiting on a condition variable without holding its
//! mutex, joining a task that already has a joiner) are not represented
//! here: the first is logged and ignored at the call site, the rest are
//! documented preconditions the caller must not violate.

use thiserror::Error;

use crate::task::TaskId;

/// Everything that can go wrong calling into the runtime, reported in-band.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum RuntimeError {
    /// [`crate::thread::spawn`] found no free slot in the thread table.
    #[error("thread table is full, all {0} slots are in use")]
    OutOfSlots(usize),

    /// [`crate::thread::join`] was given a tid that is not in the table
    /// (never issued, or already reaped by a previous join).
    #[error("no such task: {0:?}")]
    NoSuchTask(TaskId),

    /// A channel operation was attempted after [`crate::sync::Channel::close`]
    /// and, for `recv`, after the buffer had also drained.
    #[error("channel is closed")]
    Closed,

    /// Allocating a channel's backing buffer failed.
    #[error("out of memory allocating a channel of capacity {0}")]
    OutOfMemory(usize),
}
