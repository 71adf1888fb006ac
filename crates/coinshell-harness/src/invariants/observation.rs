//! Observable shell state for invariant checking.
//!
//! Observations are captured between steps. Invariants operate on them rather
//! than on the live shell so each check sees one consistent state.

use coinshell_app::{GateDiagnostics, Generation, NavigationTarget, Shell, StateSnapshot};

/// Observable state of a shell at one point in time.
#[derive(Debug, Clone)]
pub struct ShellObservation {
    /// Published snapshot.
    pub snapshot: StateSnapshot,
    /// Snapshot read directly from the attached models. `None` if detached.
    pub model: Option<StateSnapshot>,
    /// Whether the backend was quiet and the queue drained when observed.
    pub settled: bool,
    /// Active navigation target.
    pub active: NavigationTarget,
    /// Entries in the back history.
    pub history_len: usize,
    /// Configured history bound.
    pub history_limit: usize,
    /// Binding generation.
    pub generation: Generation,
    /// Gate state.
    pub gate: GateDiagnostics,
}

impl ShellObservation {
    /// Capture `shell` while the backend may still be publishing.
    pub fn capture(shell: &Shell) -> Self {
        Self {
            snapshot: shell.snapshot(),
            model: shell.model_snapshot(),
            settled: false,
            active: shell.active().clone(),
            history_len: shell.router().history().count(),
            history_limit: shell.config().history_limit,
            generation: shell.generation(),
            gate: shell.gate_diagnostics(),
        }
    }

    /// Capture `shell` after the backend went quiet and a cycle drained the
    /// queue.
    pub fn settled(shell: &Shell) -> Self {
        Self { settled: true, ..Self::capture(shell) }
    }
}

/// Ordered observations of one shell run.
#[derive(Debug, Clone, Default)]
pub struct ShellTrace {
    /// Observations, oldest first.
    pub observations: Vec<ShellObservation>,
}

impl ShellTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unsettled observation of `shell`.
    pub fn record(&mut self, shell: &Shell) {
        self.observations.push(ShellObservation::capture(shell));
    }

    /// Append a settled observation of `shell`.
    pub fn record_settled(&mut self, shell: &Shell) {
        self.observations.push(ShellObservation::settled(shell));
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<&ShellObservation> {
        self.observations.last()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
