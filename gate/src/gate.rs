use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::attempt::Attempt;
use crate::error::GateError;

/// Externally visible gate state.
///
/// `Idle` only before the first attempt; after an attempt settles the gate
/// keeps showing that attempt's terminal state until the next `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateStatus {
    #[default]
    Idle,
    /// An attempt is active and the UI should be presented.
    Pending,
    /// The last attempt resolved with a submitted value.
    Submitted,
    /// The last attempt was cancelled by the user.
    Cancelled,
}

/// The one attempt currently able to receive a decision.
struct Active<P, V> {
    id: u64,
    extra: Option<P>,
    decide: oneshot::Sender<Result<V, GateError>>,
}

struct State<P, V> {
    next_id: u64,
    status: GateStatus,
    active: Option<Active<P, V>>,
}

/// An awaitable decision gate.
///
/// [`open`](Gate::open) starts an attempt and returns its future;
/// [`submit`](Gate::submit) and [`cancel`](Gate::cancel) are the two
/// external mutators that settle it, typically called from a UI event
/// handler an arbitrarily long time later. At most one attempt is active:
/// opening again immediately supersedes the previous attempt, whose future
/// settles with [`GateError::Superseded`].
///
/// Cloning is cheap and every clone drives the same gate.
pub struct Gate<P, V> {
    state: Arc<Mutex<State<P, V>>>,
}

impl<P, V> Clone for Gate<P, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<P, V> Default for Gate<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, V> Gate<P, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: 0,
                status: GateStatus::Idle,
                active: None,
            })),
        }
    }

    /// Start a new attempt with no extra payload.
    pub fn open(&self) -> Attempt<V> {
        self.begin(None)
    }

    /// Start a new attempt carrying context for the presented UI.
    pub fn open_with(&self, extra: P) -> Attempt<V> {
        self.begin(Some(extra))
    }

    /// Resolve the active attempt with a submitted value.
    ///
    /// No-op when no attempt is pending.
    pub fn submit(&self, value: V) {
        self.settle(GateStatus::Submitted, Ok(value));
    }

    /// Resolve the active attempt as cancelled by the user.
    ///
    /// No-op when no attempt is pending. Only the currently active attempt
    /// is affected; superseded attempts have already settled.
    pub fn cancel(&self) {
        self.settle(GateStatus::Cancelled, Err(GateError::Cancelled));
    }

    #[must_use]
    pub fn status(&self) -> GateStatus {
        self.lock().status
    }

    /// True while an attempt is pending, i.e. the UI should be shown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status() == GateStatus::Pending
    }

    /// Id of the active attempt, if one is pending.
    #[must_use]
    pub fn current_attempt(&self) -> Option<u64> {
        self.lock().active.as_ref().map(|active| active.id)
    }

    /// Attempt bookkeeping happens here, synchronously, so that a second
    /// `open` observably supersedes the first even if the first future was
    /// never polled.
    fn begin(&self, extra: Option<P>) -> Attempt<V> {
        let (decide, decision) = oneshot::channel();
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.status = GateStatus::Pending;
        let superseded = state.active.replace(Active { id, extra, decide });
        drop(state);

        if let Some(previous) = superseded {
            tracing::debug!(attempt = previous.id, by = id, "pending attempt superseded");
            let _ = previous.decide.send(Err(GateError::Superseded {
                attempt: previous.id,
                by: id,
            }));
        }
        tracing::debug!(attempt = id, "gate opened");
        Attempt { id, decision }
    }

    fn settle(&self, status: GateStatus, outcome: Result<V, GateError>) {
        let mut state = self.lock();
        let Some(active) = state.active.take() else {
            tracing::trace!(?status, "settle with no pending attempt");
            return;
        };
        state.status = status;
        drop(state);

        tracing::debug!(attempt = active.id, ?status, "attempt settled");
        // The attempt future may have been dropped; the decision is then
        // simply discarded.
        let _ = active.decide.send(outcome);
    }

    // The lock is never held across an await point or a caller-supplied
    // callback, so re-entrant open/submit/cancel sequences cannot deadlock.
    fn lock(&self) -> MutexGuard<'_, State<P, V>> {
        self.state.lock().expect("gate state lock")
    }
}

impl<P: Clone, V> Gate<P, V> {
    /// Project the gate into a shape a dialog-style UI component consumes:
    /// a visibility flag, the attempt's payload, and the two decision
    /// callbacks. This is the seam between the gate and the rendering
    /// layer, which must call [`Binding::submit`] or [`Binding::cancel`]
    /// exactly once per presented attempt.
    #[must_use]
    pub fn bind(&self) -> Binding<P, V> {
        let state = self.lock();
        Binding {
            visible: state.status == GateStatus::Pending,
            extra: state.active.as_ref().and_then(|active| active.extra.clone()),
            gate: self.clone(),
        }
    }
}

/// Snapshot of gate state plus the decision callbacks, for the UI layer.
pub struct Binding<P, V> {
    /// Whether the dialog should currently be rendered.
    pub visible: bool,
    /// Payload supplied to [`Gate::open_with`] for the active attempt.
    pub extra: Option<P>,
    gate: Gate<P, V>,
}

impl<P, V> Binding<P, V> {
    pub fn submit(&self, value: V) {
        self.gate.submit(value);
    }

    pub fn cancel(&self) {
        self.gate.cancel();
    }
}
