//! Deterministic simulation harness for the wallet shell.
//!
//! In-memory implementations of the backend model traits, a seeded node that
//! drives them, and a scripted [`coinshell_app::Driver`] so the production
//! [`coinshell_app::Runtime`] runs unchanged in tests.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks over a recorded [`ShellTrace`]. Use [`InvariantRegistry::standard()`]
//! for the common shell invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod node;
pub mod recorder;
pub mod sim_driver;

pub use invariants::{
    ApprovalIdsMonotonic, GenerationsAgree, HistoryBounded, Invariant, InvariantRegistry,
    InvariantResult, ShellObservation, ShellTrace, SingleLiveRequest, SnapshotConvergence,
    Violation,
};
pub use model::{SimClient, SimWallet, expected_snapshot, is_sim_address};
pub use node::{NodeHandle, NodeStep, SimNode};
pub use recorder::RecordingNotifier;
pub use sim_driver::{FeePolicy, Frame, SimDriver, SimDriverError};
