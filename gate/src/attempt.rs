use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::GateError;

/// One pending decision on a [`Gate`](crate::Gate).
///
/// Settles with `Ok(value)` when the gate's `submit` fires for this
/// attempt, or with a [`GateError`] on cancel, supersession, or gate drop.
/// The attempt is fully registered by the time `open` returns; dropping it
/// without awaiting is harmless (the eventual decision is discarded).
#[derive(Debug)]
#[must_use = "an attempt settles only when awaited"]
pub struct Attempt<V> {
    pub(crate) id: u64,
    pub(crate) decision: oneshot::Receiver<Result<V, GateError>>,
}

impl<V> Attempt<V> {
    /// Identifier of this attempt, unique and monotonic per gate.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl<V> Future for Attempt<V> {
    type Output = Result<V, GateError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.decision).poll(cx).map(|decided| {
            match decided {
                Ok(outcome) => outcome,
                // Sender dropped without deciding: every gate handle is gone.
                Err(_) => Err(GateError::Closed),
            }
        })
    }
}
