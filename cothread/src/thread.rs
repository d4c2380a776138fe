//! The task-management surface: create, join, exit, self-identity, yield.
//!
//! Thin policy on top of [`crate::scheduler`]. Every function here either
//! is a scheduling point or calls one; see each function's doc comment for
//! which.

use crate::config::MAX_THREADS;
use crate::context::{self, Trampoline};
use crate::error::RuntimeError;
use crate::scheduler;
use crate::task::{EntryFn, State, TaskId};

/// Creates a new task running `entry(arg)` on its own 8 KiB stack.
///
/// Locates the lowest-index unused slot, primes its stack so that the
/// scheduler's next switch into it lands in [`trampoline`], and marks it
/// `Runnable`. This is not itself a scheduling point: the new task does not
/// run until some later schedule step picks it.
pub fn spawn(entry: EntryFn, arg: usize) -> Result<TaskId, RuntimeError> {
    scheduler::with(|s| match s.reserve_slot() {
        None => Err(RuntimeError::OutOfSlots(MAX_THREADS)),
        Some((slot, tid)) => {
            let rec = s.slot_mut(slot);
            let ctx = context::prime_stack(&mut rec.stack, trampoline);
            rec.entry = Some(entry);
            rec.arg = arg;
            rec.ctx = ctx;
            Ok(tid)
        }
    })
}

/// Resume target for every freshly created task.
///
/// Reads `entry` and `arg` out of the *current* task record (i.e. its own
/// record, now that the scheduler has switched into it), invokes
/// `entry(arg)`, and forwards the result to [`exit`]. Never returns to a
/// caller frame: there is no meaningful caller, since the stack below this
/// point holds only the priming garbage [`context::prime_stack`] wrote.
unsafe extern "C" fn trampoline() -> ! {
    let (entry, arg) = scheduler::with(|s| {
        let rec = s.current();
        (
            rec.entry
                .expect("trampoline entered but no entry fn was recorded"),
            rec.arg,
        )
    });
    let retval = entry(arg);
    exit(retval)
}

// Ensure `trampoline`'s ABI matches what `prime_stack` expects.
const _: Trampoline = trampoline;

/// Terminates the calling task with `retval`, never returning.
///
/// Publishes `retval` and the `Zombie` state, wakes any task blocked in
/// [`join`] on this tid, and performs a schedule step. If that step finds no
/// other runnable task, every task is `Sleeping` or `Zombie` — the runtime
/// has deadlocked, which is undefined behavior per this crate's scope, and
/// this function panics rather than silently corrupting state.
pub fn exit(retval: usize) -> ! {
    let me_tid = scheduler::with(|s| {
        let me = s.current_slot();
        let tid = s.slot(me).tid;
        s.slot_mut(me).retval = Some(retval);
        s.slot_mut(me).state = State::Zombie;
        tid
    });

    scheduler::with(|s| {
        for i in 0..MAX_THREADS {
            if s.slot(i).state == State::Sleeping && s.slot(i).joined_tid == Some(me_tid) {
                s.slot_mut(i).joined_tid = None;
                s.slot_mut(i).state = State::Runnable;
            }
        }
    });

    unsafe {
        scheduler::with(|s| s.schedule_step());
    }
    panic!("cothread: exit found no runnable task — every task is sleeping or zombie (deadlock)");
}

/// Returns the calling task's identifier.
pub fn current() -> TaskId {
    scheduler::with(|s| s.current_tid())
}

/// Blocks the calling task until `tid` exits, then returns its return
/// value.
///
/// Fails with [`RuntimeError::NoSuchTask`] if `tid` names no task currently
/// in the table (never issued, or already reaped by an earlier join).
/// Joining a task that already has a joiner is undefined — this runtime is
/// single-joiner, matching the tid-indexed `joined_tid` back-reference's
/// 0-or-1 shape.
pub fn join(tid: TaskId) -> Result<usize, RuntimeError> {
    let target = scheduler::with(|s| s.find(tid)).ok_or(RuntimeError::NoSuchTask(tid))?;

    loop {
        let is_zombie = scheduler::with(|s| s.slot(target).state == State::Zombie);
        if is_zombie {
            break;
        }
        scheduler::with(|s| {
            let me = s.current_slot();
            s.slot_mut(me).joined_tid = Some(tid);
            s.slot_mut(me).state = State::Sleeping;
        });
        unsafe {
            scheduler::with(|s| s.schedule_step());
        }
    }

    Ok(scheduler::with(|s| {
        let retval = s
            .slot(target)
            .retval
            .expect("zombie task has no retval recorded");
        s.slot_mut(target).state = State::Unused;
        retval
    }))
}

/// Voluntarily gives up the rest of the calling task's time slice.
///
/// After `yield_now` returns, zero or more other runnable tasks have each
/// run for some prefix and reached their own scheduling point; the calling
/// task has not observed any intermediate state of another task's critical
/// sections, since those never span scheduling points.
pub fn yield_now() {
    scheduler::with(|s| s.current_mut().state = State::Runnable);
    unsafe {
        scheduler::with(|s| s.schedule_step());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler;

    fn fresh_runtime<R>(f: impl FnOnce() -> R) -> R {
        let _guard = scheduler::lock_for_test();
        scheduler::reset_for_test();
        f()
    }

    fn entry_times_100(arg: usize) -> usize {
        yield_now();
        arg * 100
    }

    #[test]
    fn basic_join_round_trip() {
        fresh_runtime(|| {
            let t1 = spawn(entry_times_100, 1).unwrap();
            let t2 = spawn(entry_times_100, 2).unwrap();
            let t3 = spawn(entry_times_100, 3).unwrap();

            assert_eq!(join(t1).unwrap(), 100);
            assert_eq!(join(t2).unwrap(), 200);
            assert_eq!(join(t3).unwrap(), 300);
        });
    }

    #[test]
    fn join_unknown_tid_fails() {
        fresh_runtime(|| {
            let bogus = TaskId::new(9999);
            assert_eq!(join(bogus), Err(RuntimeError::NoSuchTask(bogus)));
        });
    }

    #[test]
    fn spawn_fails_when_table_is_full() {
        fresh_runtime(|| {
            // slot 0 is the bootstrap task; MAX_THREADS - 1 slots remain.
            let mut spawned = Vec::new();
            for _ in 0..MAX_THREADS - 1 {
                spawned.push(spawn(entry_times_100, 0).unwrap());
            }
            assert_eq!(
                spawn(entry_times_100, 0),
                Err(RuntimeError::OutOfSlots(MAX_THREADS))
            );
            for tid in spawned {
                join(tid).unwrap();
            }
        });
    }

    #[test]
    fn self_reports_bootstrap_tid_on_main_task() {
        fresh_runtime(|| {
            assert_eq!(current(), TaskId::BOOTSTRAP);
        });
    }

    fn racefree_counter_entry(_arg: usize) -> usize {
        0
    }

    #[test]
    fn yield_interleaves_without_corrupting_scheduler_state() {
        fresh_runtime(|| {
            let tasks: Vec<TaskId> = (0..3).map(|_| spawn(racefree_counter_entry, 0).unwrap()).collect();
            for _ in 0..5 {
                yield_now();
            }
            for t in tasks {
                join(t).unwrap();
            }
        });
    }
}
