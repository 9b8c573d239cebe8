use thiserror::Error;

/// Why a gate attempt settled without a submitted value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// The active attempt was cancelled by the user.
    ///
    /// This is a normal outcome of the flow, not a fault: callers are
    /// expected to branch on it (close the dialog quietly), not log it as
    /// an error.
    #[error("attempt was cancelled")]
    Cancelled,

    /// A newer `open()` call replaced this attempt before it settled.
    #[error("attempt {attempt} was superseded by attempt {by}")]
    Superseded {
        /// Id of the attempt that was replaced.
        attempt: u64,
        /// Id of the attempt that replaced it.
        by: u64,
    },

    /// Every handle to the gate was dropped while the attempt was pending,
    /// so no decision can ever arrive.
    #[error("gate was dropped while the attempt was pending")]
    Closed,
}

impl GateError {
    /// True for the user-initiated abort, the one outcome callers usually
    /// swallow rather than surface.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, GateError::Cancelled)
    }
}
