//! Shell side-effects.
//!
//! This module defines the [`ShellAction`] enum, which represents instructions
//! produced by the [`crate::Shell`] for the runtime to execute.

use crate::{ApprovalId, PaymentRequest};

/// Actions produced by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    /// Re-render from the current snapshot and page.
    Render,

    /// Ask the user whether to pay a fee.
    ///
    /// The answer goes back through [`crate::Shell::resolve_fee`].
    PromptFee {
        /// Request being asked about.
        id: ApprovalId,
        /// Required fee in base units.
        fee: i64,
    },

    /// Pre-fill the send page from a payment request.
    PrefillSend(PaymentRequest),

    /// Quit the application.
    Quit,
}
