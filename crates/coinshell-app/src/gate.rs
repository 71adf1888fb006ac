//! Blocking fee-approval protocol.
//!
//! A backend thread that needs the user to accept a transaction fee calls
//! [`ConfirmationGate::request_approval`] and blocks. The consumer notices the
//! request through [`ConfirmationGate::pending`], shows a prompt, and answers
//! with [`ConfirmationGate::resolve`], which wakes the backend thread.
//!
//! Backends running on a tokio runtime await
//! [`ConfirmationGate::request_async`] instead of blocking a worker.
//!
//! The blocked thread always has a way out: [`ConfirmationGate::flush`] (model
//! re-attach) and [`ConfirmationGate::shutdown`] (consumer teardown) drop the
//! response slot, and the waiting call returns a decline.
//!
//! # Invariants
//!
//! - At most one request is live. A second request while one is live returns
//!   [`ApprovalOutcome::Busy`] immediately and never replaces the first.
//! - [`ApprovalId`]s strictly increase. A resolved or abandoned id is never
//!   handed out again.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{
    runtime::{Handle, RuntimeFlavor},
    sync::oneshot,
};

use crate::{Generation, error::GateError};

/// Identifier of one fee-approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApprovalId(u64);

impl ApprovalId {
    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a fee-approval request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// User accepted the fee.
    Approved,
    /// User declined the fee.
    Declined,
    /// Request was abandoned by a flush or shutdown before the user answered.
    Cancelled,
    /// Another request was already live.
    Busy,
    /// Request was issued under a binding that has since been replaced.
    Superseded,
    /// Gate was shut down before the request was made.
    Closed,
}

impl ApprovalOutcome {
    /// Whether the backend may proceed with the fee.
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Consumer-visible view of the live request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingView {
    /// Request identifier, passed back to [`ConfirmationGate::resolve_id`].
    pub id: ApprovalId,
    /// Required fee in base units.
    pub fee: i64,
    /// Binding the request was issued under.
    pub generation: Generation,
}

/// Inspectable gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDiagnostics {
    /// Live request, if any.
    pub pending: Option<PendingView>,
    /// Most recently finished request and how it finished.
    pub last: Option<(ApprovalId, ApprovalOutcome)>,
    /// Number of requests ever registered.
    pub issued: u64,
    /// Current binding generation.
    pub generation: Generation,
    /// Whether the gate has been shut down.
    pub closed: bool,
}

struct Pending {
    view: PendingView,
    responder: oneshot::Sender<bool>,
}

struct GateState {
    next_id: u64,
    pending: Option<Pending>,
    last: Option<(ApprovalId, ApprovalOutcome)>,
    generation: Generation,
    closed: bool,
}

/// Single-slot request/response hand-off between backend and consumer.
pub struct ConfirmationGate {
    state: Mutex<GateState>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate {
    /// Create an open gate with no live request.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                next_id: 1,
                pending: None,
                last: None,
                generation: Generation::INITIAL,
                closed: false,
            }),
        }
    }

    /// Ask the user to approve `fee`, blocking until answered.
    ///
    /// Returns `false` for every outcome other than an explicit approval.
    ///
    /// On a multi-threaded tokio worker the wait moves off the worker with
    /// `block_in_place`. A single-threaded runtime cannot both block and let
    /// the consumer answer, so the request is cancelled without being
    /// registered; use [`request_async`](Self::request_async) there.
    pub fn request_approval(&self, fee: i64) -> bool {
        self.request(fee).is_approved()
    }

    /// Ask the user to approve `fee` under the current generation, blocking
    /// until answered. Same runtime rules as
    /// [`request_approval`](Self::request_approval).
    pub fn request(&self, fee: i64) -> ApprovalOutcome {
        let generation = self.state.lock().generation;
        self.request_in(generation, fee)
    }

    /// Ask the user to approve `fee`, waiting without blocking the thread.
    pub async fn request_async(&self, fee: i64) -> ApprovalOutcome {
        let generation = self.state.lock().generation;
        self.request_in_async(generation, fee).await
    }

    /// Blocking request on behalf of the binding identified by `generation`.
    pub(crate) fn request_in(&self, generation: Generation, fee: i64) -> ApprovalOutcome {
        let in_worker = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => true,
            Ok(_) => {
                tracing::warn!(fee, "Blocking fee request on a current-thread runtime, cancelling");
                return ApprovalOutcome::Cancelled;
            },
            Err(_) => false,
        };

        let (id, response) = match self.register(generation, fee) {
            Ok(registered) => registered,
            Err(outcome) => return outcome,
        };

        let answer = if in_worker {
            tokio::task::block_in_place(|| response.blocking_recv())
        } else {
            response.blocking_recv()
        };
        Self::finish(id, answer)
    }

    /// Awaiting request on behalf of the binding identified by `generation`.
    pub(crate) async fn request_in_async(
        &self,
        generation: Generation,
        fee: i64,
    ) -> ApprovalOutcome {
        match self.register(generation, fee) {
            Ok((id, response)) => Self::finish(id, response.await),
            Err(outcome) => outcome,
        }
    }

    fn register(
        &self,
        generation: Generation,
        fee: i64,
    ) -> Result<(ApprovalId, oneshot::Receiver<bool>), ApprovalOutcome> {
        let mut state = self.state.lock();
        if state.closed {
            tracing::debug!(fee, "Fee request after shutdown, declining");
            return Err(ApprovalOutcome::Closed);
        }
        if generation != state.generation {
            tracing::debug!(fee, %generation, "Fee request from superseded binding, declining");
            return Err(ApprovalOutcome::Superseded);
        }
        if let Some(live) = &state.pending {
            tracing::warn!(live = %live.view.id, fee, "Fee request while another is pending");
            return Err(ApprovalOutcome::Busy);
        }

        let id = ApprovalId(state.next_id);
        state.next_id += 1;
        let (responder, response) = oneshot::channel();
        state.pending = Some(Pending { view: PendingView { id, fee, generation }, responder });
        tracing::debug!(%id, fee, "Waiting for fee approval");
        Ok((id, response))
    }

    fn finish(id: ApprovalId, answer: Result<bool, oneshot::error::RecvError>) -> ApprovalOutcome {
        let outcome = match answer {
            Ok(true) => ApprovalOutcome::Approved,
            Ok(false) => ApprovalOutcome::Declined,
            Err(_) => ApprovalOutcome::Cancelled,
        };
        tracing::debug!(%id, ?outcome, "Fee approval finished");
        outcome
    }

    /// Live request, if any.
    pub fn pending(&self) -> Option<PendingView> {
        self.state.lock().pending.as_ref().map(|p| p.view)
    }

    /// Answer the live request.
    pub fn resolve(&self, decision: bool) -> Result<ApprovalId, GateError> {
        self.answer(None, decision)
    }

    /// Answer request `id`, only if it is still the live request.
    pub fn resolve_id(&self, id: ApprovalId, decision: bool) -> Result<ApprovalId, GateError> {
        self.answer(Some(id), decision)
    }

    fn answer(&self, expected: Option<ApprovalId>, decision: bool) -> Result<ApprovalId, GateError> {
        let pending = {
            let mut state = self.state.lock();
            let live = state.pending.as_ref().map(|p| p.view.id).ok_or(GateError::NothingPending)?;
            if let Some(expected) = expected
                && expected != live
            {
                return Err(GateError::NotLive { id: expected, live });
            }
            let outcome =
                if decision { ApprovalOutcome::Approved } else { ApprovalOutcome::Declined };
            state.last = Some((live, outcome));
            state.pending.take().ok_or(GateError::NothingPending)?
        };

        let id = pending.view.id;
        if pending.responder.send(decision).is_err() {
            tracing::warn!(%id, "Fee requester went away before the answer arrived");
        }
        Ok(id)
    }

    /// Abandon the live request (the backend sees a decline) and move to
    /// `generation`.
    ///
    /// Requests still carrying the old generation are refused from now on.
    pub(crate) fn advance(&self, generation: Generation) -> Option<ApprovalId> {
        let mut state = self.state.lock();
        state.generation = generation;
        Self::abandon(&mut state, "binding replaced")
    }

    /// Abandon the live request, if any. The backend sees a decline.
    pub fn flush(&self) -> Option<ApprovalId> {
        Self::abandon(&mut self.state.lock(), "flushed")
    }

    /// Abandon the live request and refuse all future ones.
    ///
    /// Idempotent.
    pub fn shutdown(&self) -> Option<ApprovalId> {
        let mut state = self.state.lock();
        state.closed = true;
        Self::abandon(&mut state, "shutdown")
    }

    fn abandon(state: &mut GateState, reason: &'static str) -> Option<ApprovalId> {
        let pending = state.pending.take()?;
        let id = pending.view.id;
        state.last = Some((id, ApprovalOutcome::Cancelled));
        tracing::info!(%id, fee = pending.view.fee, reason, "Declining pending fee request");
        drop(pending.responder);
        Some(id)
    }

    /// Snapshot of the gate for diagnostics.
    pub fn diagnostics(&self) -> GateDiagnostics {
        let state = self.state.lock();
        GateDiagnostics {
            pending: state.pending.as_ref().map(|p| p.view),
            last: state.last,
            issued: state.next_id - 1,
            generation: state.generation,
            closed: state.closed,
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Backend-side handle for fee approvals, scoped to one model binding.
///
/// Once the binding that issued it is replaced or detached, every request
/// returns [`ApprovalOutcome::Superseded`] without blocking.
#[derive(Clone)]
pub struct ApprovalRequester {
    gate: Arc<ConfirmationGate>,
    generation: Generation,
}

impl ApprovalRequester {
    pub(crate) fn new(gate: Arc<ConfirmationGate>, generation: Generation) -> Self {
        Self { gate, generation }
    }

    /// Ask the user to approve `fee`. `false` unless explicitly approved.
    ///
    /// Blocks with the runtime rules of [`ConfirmationGate::request_approval`].
    pub fn request_approval(&self, fee: i64) -> bool {
        self.request(fee).is_approved()
    }

    /// Ask the user to approve `fee`, returning the detailed outcome.
    pub fn request(&self, fee: i64) -> ApprovalOutcome {
        self.gate.request_in(self.generation, fee)
    }

    /// Ask the user to approve `fee` from async code.
    pub async fn request_async(&self, fee: i64) -> ApprovalOutcome {
        self.gate.request_in_async(self.generation, fee).await
    }

    /// Binding this requester belongs to.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl std::fmt::Debug for ApprovalRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalRequester").field("generation", &self.generation).finish()
    }
}

impl std::fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationGate").field("diagnostics", &self.diagnostics()).finish()
    }
}
