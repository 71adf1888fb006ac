//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the shell runtime from any particular
//! frontend. A desktop toolkit, a terminal UI and a headless test harness each
//! implement it, while the generic [`crate::Runtime`] handles orchestration.

use std::future::Future;

use crate::{PaymentRequest, Shell, UserInput};

/// Abstracts I/O operations for the shell runtime.
///
/// # Implementations
///
/// - **Headless**: logs the status line and answers fee prompts from a policy
/// - **Simulation**: scripted input with recorded renders
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input or the next refresh tick, whichever is first.
    ///
    /// Returns `None` when a refresh is due and no input arrived.
    fn poll_input(&mut self) -> impl Future<Output = Result<Option<UserInput>, Self::Error>> + Send;

    /// Render the shell state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, shell: &Shell) -> Result<(), Self::Error>;

    /// Ask the user whether to pay `fee` base units.
    fn confirm_fee(&mut self, fee: i64) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Fill in the send page from a validated payment request.
    fn prefill_send(&mut self, request: &PaymentRequest) -> Result<(), Self::Error>;

    /// Release frontend resources.
    fn stop(&mut self);
}
