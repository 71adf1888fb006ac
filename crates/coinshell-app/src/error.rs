//! Error types for the shell core.
//!
//! One enum per layer: [`GateError`] for misuse of the fee-approval slot,
//! [`UriError`] for rejected payment requests, and [`ShellError`] for
//! operations on the composed shell. None of these ever crosses from the
//! consumer to a backend thread; the backend only ever sees declines.

use thiserror::Error;

use crate::ApprovalId;

/// Errors answering a fee-approval request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// No request is waiting for an answer.
    #[error("no fee approval is pending")]
    NothingPending,

    /// The answered request is no longer the live one.
    #[error("fee approval {id} is not live (live request is {live})")]
    NotLive {
        /// Request the caller tried to answer.
        id: ApprovalId,
        /// Request currently waiting.
        live: ApprovalId,
    },
}

/// Reasons a payment-request identifier is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// Identifier was empty or whitespace.
    #[error("payment request is empty")]
    Empty,

    /// Identifier has no `scheme:` prefix.
    #[error("payment request has no scheme")]
    MissingScheme,

    /// Identifier uses a scheme this wallet does not handle.
    #[error("unsupported scheme {found:?}, expected {expected:?}")]
    UnknownScheme {
        /// Scheme the wallet accepts.
        expected: String,
        /// Scheme found in the identifier.
        found: String,
    },

    /// No recipient address after the scheme.
    #[error("payment request has no address")]
    MissingAddress,

    /// Recipient address rejected by the wallet.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// Amount is not a valid coin amount.
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    /// A required (`req-`) parameter the wallet does not understand.
    #[error("unsupported required parameter {0:?}")]
    UnsupportedParameter(String),

    /// Identifier could not be parsed at all.
    #[error("malformed payment request: {0}")]
    Malformed(String),
}

/// Errors from shell operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// Operation requires bound models.
    #[error("no wallet is attached")]
    NotBound,

    /// Shell has been shut down.
    #[error("shell is shut down")]
    Closed,

    /// Payment request rejected.
    #[error(transparent)]
    Uri(#[from] UriError),

    /// Fee approval answer rejected.
    #[error(transparent)]
    Gate(#[from] GateError),
}
