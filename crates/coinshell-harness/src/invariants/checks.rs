//! Standard invariant checks.

use super::{Invariant, InvariantResult, ShellTrace, Violation};

/// Once settled, the published snapshot equals the attached models' getters.
///
/// A mismatch means an event was lost, applied out of order, or applied from
/// a superseded binding.
pub struct SnapshotConvergence;

impl Invariant for SnapshotConvergence {
    fn name(&self) -> &'static str {
        "snapshot_convergence"
    }

    fn check(&self, trace: &ShellTrace) -> InvariantResult {
        for (step, obs) in trace.observations.iter().enumerate() {
            if !obs.settled {
                continue;
            }
            if let Some(model) = obs.model
                && model != obs.snapshot
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {step}: published {:?} but models report {:?}",
                        obs.snapshot, model
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Back history never grows past its configured bound.
pub struct HistoryBounded;

impl Invariant for HistoryBounded {
    fn name(&self) -> &'static str {
        "history_bounded"
    }

    fn check(&self, trace: &ShellTrace) -> InvariantResult {
        for (step, obs) in trace.observations.iter().enumerate() {
            if obs.history_len > obs.history_limit {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {step}: {} history entries, limit {}",
                        obs.history_len, obs.history_limit
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The live fee request, if any, is the most recently issued one and belongs
/// to the current generation.
pub struct SingleLiveRequest;

impl Invariant for SingleLiveRequest {
    fn name(&self) -> &'static str {
        "single_live_request"
    }

    fn check(&self, trace: &ShellTrace) -> InvariantResult {
        for (step, obs) in trace.observations.iter().enumerate() {
            let Some(pending) = obs.gate.pending else {
                continue;
            };
            if pending.id.value() != obs.gate.issued {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {step}: live request {} but {} issued",
                        pending.id, obs.gate.issued
                    ),
                });
            }
            if pending.generation != obs.gate.generation {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {step}: live request from generation {}, gate at {}",
                        pending.generation, obs.gate.generation
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Approval ids are never reused: the issued count never decreases and the
/// last finished request was issued already.
pub struct ApprovalIdsMonotonic;

impl Invariant for ApprovalIdsMonotonic {
    fn name(&self) -> &'static str {
        "approval_ids_monotonic"
    }

    fn check(&self, trace: &ShellTrace) -> InvariantResult {
        for (step, obs) in trace.observations.iter().enumerate() {
            if let Some((id, _)) = obs.gate.last
                && id.value() > obs.gate.issued
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("step {step}: finished {id} but {} issued", obs.gate.issued),
                });
            }
        }

        for (step, pair) in trace.observations.windows(2).enumerate() {
            if pair[1].gate.issued < pair[0].gate.issued {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {}: issued count decreased {} → {}",
                        step + 1,
                        pair[0].gate.issued,
                        pair[1].gate.issued
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Gate and binding agree on the generation, and it never decreases.
pub struct GenerationsAgree;

impl Invariant for GenerationsAgree {
    fn name(&self) -> &'static str {
        "generations_agree"
    }

    fn check(&self, trace: &ShellTrace) -> InvariantResult {
        for (step, obs) in trace.observations.iter().enumerate() {
            if obs.generation != obs.gate.generation {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {step}: binding at {}, gate at {}",
                        obs.generation, obs.gate.generation
                    ),
                });
            }
        }

        for (step, pair) in trace.observations.windows(2).enumerate() {
            if pair[1].generation < pair[0].generation {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "step {}: generation decreased {} → {}",
                        step + 1,
                        pair[0].generation,
                        pair[1].generation
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use coinshell_app::{LogNotifier, Shell, ShellConfig};

    use super::*;
    use crate::ShellObservation;

    fn observation() -> ShellObservation {
        let shell = Shell::new(ShellConfig::default(), Box::new(LogNotifier));
        ShellObservation::settled(&shell)
    }

    #[test]
    fn history_over_limit_is_flagged() {
        let mut obs = observation();
        obs.history_len = obs.history_limit + 1;
        let trace = ShellTrace { observations: vec![obs] };

        assert!(HistoryBounded.check(&trace).is_err());
    }

    #[test]
    fn decreasing_issued_count_is_flagged() {
        let mut first = observation();
        first.gate.issued = 3;
        let second = observation();
        let trace = ShellTrace { observations: vec![first, second] };

        let violation = ApprovalIdsMonotonic.check(&trace).unwrap_err();
        assert_eq!(violation.invariant, "approval_ids_monotonic");
    }

    #[test]
    fn diverged_snapshot_is_flagged_only_when_settled() {
        let mut obs = observation();
        let mut model = obs.snapshot;
        model.balance += 1;
        obs.model = Some(model);

        let settled = ShellTrace { observations: vec![obs.clone()] };
        assert!(SnapshotConvergence.check(&settled).is_err());

        obs.settled = false;
        let unsettled = ShellTrace { observations: vec![obs] };
        assert!(SnapshotConvergence.check(&unsettled).is_ok());
    }
}
