//! Backend push events.
//!
//! [`IncomingEvent`] is everything the client and wallet models report to the
//! shell. Backend threads publish them through an
//! [`EventPublisher`](crate::EventPublisher); the consumer applies them in
//! [`NotificationBridge::drain`](crate::NotificationBridge::drain).

use crate::{EncryptionState, StakingState};

/// Events emitted by the client or wallet model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    /// Wallet balance changed (base units).
    BalanceChanged(i64),

    /// Chain tip or network estimate changed.
    BlockHeightChanged {
        /// Local chain height.
        height: u64,
        /// Estimated network chain height.
        total: u64,
    },

    /// Peer count changed.
    ConnectionCountChanged(u32),

    /// Wallet encryption state changed.
    EncryptionStatusChanged(EncryptionState),

    /// Staking state changed.
    StakingStatusChanged(StakingState),

    /// Transactions were inserted into the history model.
    ///
    /// `start..=end` is the contiguous index range of the new rows.
    TransactionsInserted {
        /// First inserted row.
        start: usize,
        /// Last inserted row (inclusive).
        end: usize,
    },

    /// Result of a version check. `true` if the client is current.
    VersionCheckResult(bool),

    /// Raw payment-request identifier received from outside the process.
    UriReceived(String),

    /// Error or informational message from network or transaction handling.
    Alert {
        /// Short title.
        title: String,
        /// Message body.
        message: String,
        /// Backend asked for a modal presentation.
        modal: bool,
    },

    /// Backend enabled or disabled the reload-blockchain command.
    ReloadAvailabilityChanged(bool),

    /// Backend enabled or disabled the check-for-update command.
    UpdateCheckAvailabilityChanged(bool),
}

impl IncomingEvent {
    /// Short tag used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BalanceChanged(_) => "balance",
            Self::BlockHeightChanged { .. } => "block_height",
            Self::ConnectionCountChanged(_) => "connections",
            Self::EncryptionStatusChanged(_) => "encryption",
            Self::StakingStatusChanged(_) => "staking",
            Self::TransactionsInserted { .. } => "transactions",
            Self::VersionCheckResult(_) => "version",
            Self::UriReceived(_) => "uri",
            Self::Alert { .. } => "alert",
            Self::ReloadAvailabilityChanged(_) => "reload_availability",
            Self::UpdateCheckAvailabilityChanged(_) => "update_check_availability",
        }
    }
}
