//! Awaitable decision gates.
//!
//! A [`Gate`] adapts a "wait for one discrete user decision" flow (show a
//! dialog, wait for submit or cancel) into a single awaitable [`Attempt`]
//! per invocation, with built-in protection against overlapping
//! invocations: opening the gate again while an attempt is pending
//! supersedes the old attempt, which settles with
//! [`GateError::Superseded`] instead of hanging forever.
//!
//! The gate is long-lived (created once per UI surface, cheaply cloned
//! into handlers); each [`Gate::open`] call is one logical attempt ending
//! in settlement of its future.

mod attempt;
mod error;
mod gate;

pub use attempt::Attempt;
pub use error::GateError;
pub use gate::{Binding, Gate, GateStatus};
