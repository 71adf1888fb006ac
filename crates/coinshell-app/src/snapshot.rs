//! Backend-derived UI state.
//!
//! [`StateSnapshot`] is the view model the renderer reads: everything shown in
//! the status bar and overview page that originates in the client or wallet
//! model. Snapshots are values. The bridge builds a fresh one for every drain
//! and publishes it whole, so a reader on any thread sees either the previous
//! state or the next one, never a mix.

use crate::IncomingEvent;

/// Wallet encryption state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncryptionState {
    /// Wallet is not encrypted.
    #[default]
    Unencrypted,
    /// Wallet is encrypted and locked.
    Locked,
    /// Wallet is encrypted and currently unlocked.
    Unlocked,
}

/// Staking state reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StakingState {
    /// Not attempting to produce blocks.
    #[default]
    Off,
    /// Actively staking.
    On,
}

/// Immutable snapshot of backend-derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Number of connected peers.
    pub connection_count: u32,
    /// Height of the local chain tip.
    pub block_height: u64,
    /// Estimated height of the network chain tip.
    pub block_total: u64,
    /// Spendable balance in base units.
    pub balance: i64,
    /// Wallet encryption state.
    pub encryption: EncryptionState,
    /// Staking state.
    pub staking: StakingState,
    /// Result of the last version check. `true` if the client is current.
    pub version_ok: bool,
    /// Whether the backend currently accepts a blockchain reload.
    pub reload_enabled: bool,
    /// Whether the backend currently accepts an update check.
    pub update_check_enabled: bool,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            connection_count: 0,
            block_height: 0,
            block_total: 0,
            balance: 0,
            encryption: EncryptionState::Unencrypted,
            staking: StakingState::Off,
            version_ok: true,
            reload_enabled: true,
            update_check_enabled: true,
        }
    }
}

impl StateSnapshot {
    /// Return a new snapshot with `event` applied.
    ///
    /// Only the fields covered by the event's tag change; every other field is
    /// carried over. Events with no state component (inserted transactions,
    /// URIs, alerts) return an identical snapshot.
    #[must_use]
    pub fn apply(self, event: &IncomingEvent) -> Self {
        match *event {
            IncomingEvent::BalanceChanged(balance) => Self { balance, ..self },
            IncomingEvent::BlockHeightChanged { height, total } => {
                Self { block_height: height, block_total: total, ..self }
            },
            IncomingEvent::ConnectionCountChanged(count) => {
                Self { connection_count: count, ..self }
            },
            IncomingEvent::EncryptionStatusChanged(encryption) => Self { encryption, ..self },
            IncomingEvent::StakingStatusChanged(staking) => Self { staking, ..self },
            IncomingEvent::VersionCheckResult(version_ok) => Self { version_ok, ..self },
            IncomingEvent::ReloadAvailabilityChanged(reload_enabled) => {
                Self { reload_enabled, ..self }
            },
            IncomingEvent::UpdateCheckAvailabilityChanged(update_check_enabled) => {
                Self { update_check_enabled, ..self }
            },
            IncomingEvent::TransactionsInserted { .. }
            | IncomingEvent::UriReceived(_)
            | IncomingEvent::Alert { .. } => self,
        }
    }

    /// Whether the local chain is still behind the network estimate.
    pub fn is_syncing(&self) -> bool {
        self.block_height < self.block_total
    }

    /// Blocks remaining until the local tip reaches the network estimate.
    pub fn blocks_behind(&self) -> u64 {
        self.block_total.saturating_sub(self.block_height)
    }

    /// Sync progress in the range `0.0..=1.0`.
    pub fn sync_progress(&self) -> f64 {
        if self.block_total == 0 || !self.is_syncing() {
            return 1.0;
        }
        self.block_height as f64 / self.block_total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_touches_only_tagged_fields() {
        let before = StateSnapshot { balance: 5, connection_count: 3, ..Default::default() };

        let after = before.apply(&IncomingEvent::BlockHeightChanged { height: 10, total: 12 });

        assert_eq!(after.block_height, 10);
        assert_eq!(after.block_total, 12);
        assert_eq!(after.balance, 5);
        assert_eq!(after.connection_count, 3);
    }

    #[test]
    fn effect_only_events_leave_state_unchanged() {
        let before = StateSnapshot { balance: 7, ..Default::default() };

        assert_eq!(before.apply(&IncomingEvent::UriReceived("x".into())), before);
        assert_eq!(before.apply(&IncomingEvent::TransactionsInserted { start: 0, end: 2 }), before);
    }

    #[test]
    fn sync_progress_caps_at_one() {
        let snapshot = StateSnapshot { block_height: 50, block_total: 100, ..Default::default() };
        assert!(snapshot.is_syncing());
        assert_eq!(snapshot.blocks_behind(), 50);
        assert!((snapshot.sync_progress() - 0.5).abs() < f64::EPSILON);

        let ahead = StateSnapshot { block_height: 120, block_total: 100, ..Default::default() };
        assert!(!ahead.is_syncing());
        assert_eq!(ahead.blocks_behind(), 0);
        assert!((ahead.sync_progress() - 1.0).abs() < f64::EPSILON);
    }
}
