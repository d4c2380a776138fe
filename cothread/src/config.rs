//! Structural constants fixing the shape of the thread table.
//!
//! There is no runtime-loaded configuration in this crate: no file, no
//! environment variable, no CLI surface reaches the scheduler. The only
//! "configuration" is these two compile-time constants, mirrored here as a
//! single module the way the reference runtime keeps `MAX_THREADS` and its
//! stack size as module-level consts rather than a config struct.

/// Number of task slots in the thread table, including slot 0 (the
/// bootstrap task). Fixed at compile time so the table can be a plain array
/// with no reallocation and no relocation of task records.
pub const MAX_THREADS: usize = 16;

/// Size, in bytes, of each task's embedded stack buffer.
///
/// 8 KiB is enough for the shallow, allocation-light call stacks expected of
/// cooperative tasks in this runtime; it is not a general-purpose stack size
/// and there is no growth or guard-page mechanism (see the crate's
/// non-goals).
pub const STACK_SIZE: usize = 8 * 1024;
