//! Shell configuration.

use std::time::Duration;

/// Tunables for [`Shell`](crate::Shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// URI scheme accepted for payment requests (compared case-insensitively).
    pub uri_scheme: String,
    /// Ticker shown next to amounts.
    pub ticker: String,
    /// Backlog size at which the notification queue logs a warning.
    pub queue_high_watermark: usize,
    /// Number of previous pages kept for back navigation.
    pub history_limit: usize,
    /// Notify about incoming transactions while the chain is still syncing.
    pub notify_during_sync: bool,
    /// Approve fee requests at or below this amount without prompting.
    pub auto_approve_fee: Option<i64>,
    /// Ask the client to check for a newer release this often while models
    /// are attached. `None` disables the periodic check.
    pub update_check_interval: Option<Duration>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            uri_scheme: "bitcoindark".to_string(),
            ticker: "BTCD".to_string(),
            queue_high_watermark: 1024,
            history_limit: 16,
            notify_during_sync: false,
            auto_approve_fee: None,
            update_check_interval: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}
