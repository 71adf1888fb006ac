//! Invariant checking for shell simulation tests.
//!
//! Invariants are properties that must always hold while the shell runs.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! Observable shell state is captured into a [`ShellObservation`] after each
//! step and appended to a [`ShellTrace`]. Registered [`Invariant`]s run against
//! the whole trace, so properties over time (monotonic ids and generations)
//! are checked the same way as point-in-time ones.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let mut trace = ShellTrace::new();
//! trace.record(&shell);
//! registry.assert_all(&trace, "after step 3");
//! ```

mod checks;
mod observation;

pub use checks::{
    ApprovalIdsMonotonic, GenerationsAgree, HistoryBounded, SingleLiveRequest,
    SnapshotConvergence,
};
pub use observation::{ShellObservation, ShellTrace};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a shell trace.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the recorded trace.
    fn check(&self, trace: &ShellTrace) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard shell invariants.
    ///
    /// Includes:
    /// - [`SnapshotConvergence`]: settled snapshots equal the model getters
    /// - [`HistoryBounded`]: back history never exceeds its limit
    /// - [`SingleLiveRequest`]: the live fee request is the newest one
    /// - [`ApprovalIdsMonotonic`]: approval ids are never reused
    /// - [`GenerationsAgree`]: gate and binding share one generation
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SnapshotConvergence);
        registry.add(HistoryBounded);
        registry.add(SingleLiveRequest);
        registry.add(ApprovalIdsMonotonic);
        registry.add(GenerationsAgree);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the trace.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, trace: &ShellTrace) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(trace).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on violation.
    #[allow(clippy::panic, reason = "test helper, fails the calling test")]
    pub fn assert_all(&self, trace: &ShellTrace, context: &str) {
        if let Err(violations) = self.check_all(trace) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
