//! Headless driver: commands from stdin, status line to the log.

use std::{
    io::{self, BufRead},
    thread,
    time::Duration,
};

use coinshell_app::{Driver, PaymentRequest, Shell, UserInput, format_amount};
use coinshell_harness::FeePolicy;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{commands::parse_line, status::status_line};

/// Headless driver errors.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// Reading standard input failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Driver implementing the [`Driver`] trait without a display.
///
/// Input lines are read on a dedicated thread and parsed with
/// [`parse_line`]. Renders log the status line when it changes.
pub struct HeadlessDriver {
    lines: mpsc::UnboundedReceiver<io::Result<String>>,
    refresh: Duration,
    policy: FeePolicy,
    ticker: String,
    cycles_left: Option<usize>,
    eof: bool,
    last_status: Option<String>,
}

impl HeadlessDriver {
    /// Read commands from standard input.
    pub fn stdin(refresh: Duration, policy: FeePolicy, ticker: String) -> Self {
        let (tx, lines) = mpsc::unbounded_channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });
        Self::new(lines, refresh, policy, ticker)
    }

    /// Read commands from `lines`.
    pub fn new(
        lines: mpsc::UnboundedReceiver<io::Result<String>>,
        refresh: Duration,
        policy: FeePolicy,
        ticker: String,
    ) -> Self {
        Self { lines, refresh, policy, ticker, cycles_left: None, eof: false, last_status: None }
    }

    /// Quit after `cycles` refresh cycles.
    #[must_use]
    pub fn with_cycle_limit(mut self, cycles: usize) -> Self {
        self.cycles_left = Some(cycles);
        self
    }

    /// Last status line rendered.
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    fn input_from(line: &str) -> Option<UserInput> {
        match parse_line(line) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring input");
                None
            },
        }
    }
}

impl Driver for HeadlessDriver {
    type Error = HeadlessError;

    async fn poll_input(&mut self) -> Result<Option<UserInput>, Self::Error> {
        if let Some(left) = &mut self.cycles_left {
            if *left == 0 {
                return Ok(Some(UserInput::Quit));
            }
            *left -= 1;
        }

        if self.eof {
            tokio::time::sleep(self.refresh).await;
            return Ok(None);
        }

        tokio::select! {
            biased;

            line = self.lines.recv() => match line {
                Some(Ok(line)) => Ok(Self::input_from(&line)),
                Some(Err(e)) => Err(HeadlessError::Io(e)),
                None => {
                    tracing::debug!("Input closed");
                    self.eof = true;
                    Ok(None)
                },
            },

            () = tokio::time::sleep(self.refresh) => Ok(None),
        }
    }

    fn render(&mut self, shell: &Shell) -> Result<(), Self::Error> {
        let line = status_line(
            &shell.snapshot(),
            shell.router().page(),
            &self.ticker,
            shell.status_message(),
        );
        if self.last_status.as_deref() != Some(line.as_str()) {
            tracing::info!(target: "coinshell::status", "{line}");
            self.last_status = Some(line);
        }
        Ok(())
    }

    async fn confirm_fee(&mut self, fee: i64) -> Result<bool, Self::Error> {
        let decision = self.policy.decide(fee);
        tracing::info!(fee = %format_amount(fee), ticker = %self.ticker, decision, "Fee prompt");
        Ok(decision)
    }

    fn prefill_send(&mut self, request: &PaymentRequest) -> Result<(), Self::Error> {
        tracing::info!(
            address = %request.address,
            amount = ?request.amount.map(format_amount),
            label = ?request.label,
            message = ?request.message,
            "Send page filled"
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.lines.close();
        tracing::debug!("Headless driver stopped");
    }
}

#[cfg(test)]
mod tests {
    use coinshell_app::{LogNotifier, Runtime, ShellConfig};

    use super::*;

    #[tokio::test]
    async fn scripted_lines_drive_the_shell() {
        let (tx, rx) = mpsc::unbounded_channel();
        for line in ["go history", "bogus", "go sign RAddr", "quit"] {
            tx.send(Ok(line.to_string())).unwrap();
        }

        let driver =
            HeadlessDriver::new(rx, Duration::from_millis(1), FeePolicy::Decline, "BTCD".into());
        let shell = Shell::new(ShellConfig::default(), Box::new(LogNotifier));
        let mut runtime = Runtime::new(driver, shell);
        runtime.run().await.unwrap();

        let status = runtime.driver().last_status().unwrap();
        assert!(status.starts_with("MessageTools |"), "{status}");
    }

    #[tokio::test]
    async fn cycle_limit_quits() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let driver =
            HeadlessDriver::new(rx, Duration::from_millis(1), FeePolicy::Decline, "BTCD".into())
                .with_cycle_limit(3);
        let shell = Shell::new(ShellConfig::default(), Box::new(LogNotifier));
        let mut runtime = Runtime::new(driver, shell);

        runtime.run().await.unwrap();
        assert!(runtime.shell().is_closed());
    }
}
