//! Bounded concurrent execution of finite task batches.
//!
//! This crate runs a known list of asynchronous tasks with a hard cap on how
//! many are in flight at once, and resolves to results in input order no
//! matter which tasks finish first. Two failure policies are exposed, both
//! driven by the same scheduler:
//!
//! - **[`try_run`]**: the first task error aborts the whole batch.
//! - **[`run_settled`]**: every task's own `Result` lands in its own slot.
//!
//! The task executor is an opaque caller-supplied async function; the
//! scheduler neither knows nor cares whether it performs network I/O.

pub mod scheduler;

pub use scheduler::{run_settled, try_run};
