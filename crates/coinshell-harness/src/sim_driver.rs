//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` replays scripted input, answers fee prompts from a
//! [`FeePolicy`] and records every render, so the same
//! [`coinshell_app::Runtime`] orchestration code runs in tests.

use std::collections::VecDeque;

use coinshell_app::{Driver, NavigationTarget, PaymentRequest, Shell, StateSnapshot, UserInput};
use thiserror::Error;

use crate::SimNode;

/// Error type for simulation driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("sim driver: {0}")]
pub struct SimDriverError(pub String);

/// How fee prompts are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeePolicy {
    /// Approve every fee.
    Approve,
    /// Decline every fee.
    #[default]
    Decline,
    /// Approve fees up to and including the limit.
    ApproveUpTo(i64),
}

impl FeePolicy {
    /// Answer for `fee`.
    pub fn decide(self, fee: i64) -> bool {
        match self {
            Self::Approve => true,
            Self::Decline => false,
            Self::ApproveUpTo(limit) => fee <= limit,
        }
    }
}

/// What the driver saw on one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Published snapshot.
    pub snapshot: StateSnapshot,
    /// Active target.
    pub active: NavigationTarget,
    /// Status line, if any.
    pub status: Option<String>,
}

/// Simulation driver for deterministic testing.
pub struct SimDriver {
    script: VecDeque<UserInput>,
    idle_cycles: usize,
    node: Option<SimNode>,
    policy: FeePolicy,
    fail_render_at: Option<usize>,
    frames: Vec<Frame>,
    prompts: Vec<(i64, bool)>,
    prefills: Vec<PaymentRequest>,
    stopped: bool,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Driver with an empty script that quits on its first poll.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            idle_cycles: 0,
            node: None,
            policy: FeePolicy::default(),
            fail_render_at: None,
            frames: Vec::new(),
            prompts: Vec::new(),
            prefills: Vec::new(),
            stopped: false,
        }
    }

    /// Queue scripted input, delivered one item per poll.
    #[must_use]
    pub fn with_script(mut self, inputs: impl IntoIterator<Item = UserInput>) -> Self {
        self.script.extend(inputs);
        self
    }

    /// Refresh ticks to run after the script before quitting.
    #[must_use]
    pub fn with_idle_cycles(mut self, cycles: usize) -> Self {
        self.idle_cycles = cycles;
        self
    }

    /// Step `node` once on every poll that does not quit.
    #[must_use]
    pub fn with_node(mut self, node: SimNode) -> Self {
        self.node = Some(node);
        self
    }

    /// Answer fee prompts with `policy`.
    #[must_use]
    pub fn with_policy(mut self, policy: FeePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fail the render with index `index` (0-based).
    #[must_use]
    pub fn fail_render_at(mut self, index: usize) -> Self {
        self.fail_render_at = Some(index);
        self
    }

    /// Every render so far.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Fee prompts shown and how they were answered.
    pub fn prompts(&self) -> &[(i64, bool)] {
        &self.prompts
    }

    /// Payment requests the send page was filled from.
    pub fn prefills(&self) -> &[PaymentRequest] {
        &self.prefills
    }

    /// Whether [`Driver::stop`] ran.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_input(&mut self) -> Result<Option<UserInput>, Self::Error> {
        let input = if let Some(input) = self.script.pop_front() {
            Some(input)
        } else if self.idle_cycles > 0 {
            self.idle_cycles -= 1;
            None
        } else {
            return Ok(Some(UserInput::Quit));
        };

        if let Some(node) = &mut self.node {
            node.step();
        }
        Ok(input)
    }

    fn render(&mut self, shell: &Shell) -> Result<(), Self::Error> {
        if self.fail_render_at == Some(self.frames.len()) {
            return Err(SimDriverError(format!("render {} failed", self.frames.len())));
        }
        self.frames.push(Frame {
            snapshot: shell.snapshot(),
            active: shell.active().clone(),
            status: shell.status_message().map(str::to_string),
        });
        Ok(())
    }

    async fn confirm_fee(&mut self, fee: i64) -> Result<bool, Self::Error> {
        let decision = self.policy.decide(fee);
        self.prompts.push((fee, decision));
        Ok(decision)
    }

    fn prefill_send(&mut self, request: &PaymentRequest) -> Result<(), Self::Error> {
        self.prefills.push(request.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_policy_limits() {
        assert!(FeePolicy::Approve.decide(i64::MAX));
        assert!(!FeePolicy::Decline.decide(0));
        assert!(FeePolicy::ApproveUpTo(10).decide(10));
        assert!(!FeePolicy::ApproveUpTo(10).decide(11));
    }
}
