//! Task records and the lifecycle state machine.

use crate::context::TaskContext;
use crate::config::STACK_SIZE;

/// Identifies a task for its entire lifetime. Tid 0 is reserved for the
/// bootstrap task that adopts the host's own execution context at
/// [`crate::scheduler::init`]. Every other tid is issued once, by a single
/// monotonic counter, and is never reused even after the task is reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// The bootstrap task's identifier.
    pub const BOOTSTRAP: TaskId = TaskId(0);

    pub(crate) const fn new(raw: u64) -> Self {
        TaskId(raw)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A task's position in the lifecycle state machine.
///
/// See the crate-level documentation for the transition diagram; in short:
/// `Unused -> Runnable` (create), `Runnable -> Running` (picker),
/// `Running -> Runnable` (yield or displacement), `Running -> Sleeping`
/// (entering a wait), `Sleeping -> Runnable` (wake), `Running -> Zombie`
/// (exit), `Zombie -> Unused` (join collects the return value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unused,
    Runnable,
    Running,
    Sleeping,
    Zombie,
}

/// A task's entry function: takes one machine-word-sized opaque argument
/// and produces one machine-word-sized opaque return value, mirroring the
/// `void* (*)(void*)` shape this kind of runtime traditionally exposes.
pub type EntryFn = fn(usize) -> usize;

/// One slot in the fixed-size thread table.
///
/// The stack buffer is embedded by value so its address is stable for the
/// slot's entire lifetime — task records live in a fixed array and are
/// never relocated or reallocated. Slot 0 (the bootstrap task) never primes
/// or uses its embedded stack; it continues running on the host-provided
/// stack, and `ctx.rsp` for that slot is only ever written the first time
/// the bootstrap task switches away.
#[derive(Clone, Copy)]
pub struct TaskRecord {
    pub tid: TaskId,
    pub state: State,
    pub ctx: TaskContext,
    pub stack: [u8; STACK_SIZE],
    pub entry: Option<EntryFn>,
    pub arg: usize,
    pub retval: Option<usize>,
    /// The tid of the single task, if any, blocked in `join` on this one.
    pub joined_tid: Option<TaskId>,
}

impl TaskRecord {
    pub const fn unused() -> Self {
        TaskRecord {
            tid: TaskId::BOOTSTRAP,
            state: State::Unused,
            ctx: TaskContext::empty(),
            stack: [0u8; STACK_SIZE],
            entry: None,
            arg: 0,
            retval: None,
            joined_tid: None,
        }
    }
}
