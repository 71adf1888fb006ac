//! Commands forwarded to the backend models.
//!
//! Every command is fire-and-forget: the shell hands it to the owning model
//! and learns about the result, if any, through later [`crate::IncomingEvent`]s.

use std::path::PathBuf;

use zeroize::Zeroizing;

/// Wallet passphrase, wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    /// Wrap a passphrase.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Borrow the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Passphrase(..)")
    }
}

/// Commands handled by the wallet model.
#[derive(Debug, Clone)]
pub enum WalletCommand {
    /// Encrypt an unencrypted wallet.
    Encrypt {
        /// New passphrase.
        passphrase: Passphrase,
    },
    /// Copy the wallet file to `destination`.
    Backup {
        /// Target path.
        destination: PathBuf,
    },
    /// Replace the wallet passphrase.
    ChangePassphrase {
        /// Current passphrase.
        old: Passphrase,
        /// Replacement passphrase.
        new: Passphrase,
    },
    /// Unlock the wallet temporarily.
    Unlock {
        /// Current passphrase.
        passphrase: Passphrase,
        /// Unlock for staking only; spending stays locked.
        staking_only: bool,
    },
    /// Rescan the chain for wallet transactions.
    Rescan,
}

/// Commands handled by the client model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Discard and re-download the block chain.
    ReloadBlockchain,
    /// Ask the update service whether a newer client exists.
    CheckForUpdate,
}

/// Any command the shell can forward.
#[derive(Debug, Clone)]
pub enum Command {
    /// Wallet-level command.
    Wallet(WalletCommand),
    /// Client-level command.
    Client(ClientCommand),
}

impl Command {
    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wallet(WalletCommand::Encrypt { .. }) => "encrypt_wallet",
            Self::Wallet(WalletCommand::Backup { .. }) => "backup_wallet",
            Self::Wallet(WalletCommand::ChangePassphrase { .. }) => "change_passphrase",
            Self::Wallet(WalletCommand::Unlock { .. }) => "unlock_wallet",
            Self::Wallet(WalletCommand::Rescan) => "rescan_blockchain",
            Self::Client(ClientCommand::ReloadBlockchain) => "reload_blockchain",
            Self::Client(ClientCommand::CheckForUpdate) => "check_for_update",
        }
    }
}

impl From<WalletCommand> for Command {
    fn from(command: WalletCommand) -> Self {
        Self::Wallet(command)
    }
}

impl From<ClientCommand> for Command {
    fn from(command: ClientCommand) -> Self {
        Self::Client(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passphrase_is_redacted() {
        let command = WalletCommand::Unlock { passphrase: Passphrase::new("hunter2"), staking_only: true };
        let printed = format!("{command:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("staking_only: true"));
    }
}
