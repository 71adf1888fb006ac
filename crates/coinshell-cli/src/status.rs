//! One-line rendering of the shell state.

use std::fmt::Write;

use coinshell_app::{EncryptionState, Page, StakingState, StateSnapshot, format_amount};

/// Status line for `snapshot` shown on `page`.
pub fn status_line(
    snapshot: &StateSnapshot,
    page: Page,
    ticker: &str,
    message: Option<&str>,
) -> String {
    let mut line = format!("{page:?} | {} peers | ", snapshot.connection_count);

    if snapshot.is_syncing() {
        let _ = write!(
            line,
            "syncing {}/{} ({:.1}%)",
            snapshot.block_height,
            snapshot.block_total,
            snapshot.sync_progress() * 100.0
        );
    } else {
        let _ = write!(line, "synced at {}", snapshot.block_height);
    }

    let _ = write!(line, " | {} {ticker}", format_amount(snapshot.balance));

    line.push_str(match snapshot.encryption {
        EncryptionState::Unencrypted => " | unencrypted",
        EncryptionState::Locked => " | locked",
        EncryptionState::Unlocked => " | unlocked",
    });
    if snapshot.staking == StakingState::On {
        line.push_str(" | staking");
    }
    if !snapshot.version_ok {
        line.push_str(" | update available");
    }
    if let Some(message) = message {
        let _ = write!(line, " | {message}");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_shell() {
        let line = status_line(&StateSnapshot::default(), Page::Overview, "BTCD", None);
        insta::assert_snapshot!(line, @"Overview | 0 peers | synced at 0 | 0.00000000 BTCD | unencrypted");
    }

    #[test]
    fn syncing_locked_staking_wallet() {
        let snapshot = StateSnapshot {
            connection_count: 8,
            block_height: 100,
            block_total: 120,
            balance: 150_000_000,
            encryption: EncryptionState::Locked,
            staking: StakingState::On,
            version_ok: false,
            ..StateSnapshot::default()
        };
        let line = status_line(&snapshot, Page::SendCoins, "BTCD", Some("Invalid payment request"));
        insta::assert_snapshot!(line, @"SendCoins | 8 peers | syncing 100/120 (83.3%) | 1.50000000 BTCD | locked | staking | update available | Invalid payment request");
    }
}
