//! Wallet shell core.
//!
//! Thread-safe plumbing between a wallet backend and whatever renders it,
//! free of any GUI toolkit so it can be driven headless or in simulation.
//!
//! # Components
//!
//! - [`NotificationBridge`]: backend events in, whole [`StateSnapshot`]s out
//! - [`ConfirmationGate`]: blocking fee approval answered by the consumer
//! - [`PageRouter`]: active page, back history and payment-request dispatch
//! - [`ModelBinding`]: attach and detach of backend models
//! - [`Shell`]: the four composed behind one input/action interface
//! - [`Driver`]: trait for frontend I/O
//! - [`Runtime`]: generic event loop using a Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod binding;
mod command;
mod config;
mod driver;
mod error;
mod event;
mod gate;
mod input;
mod notifier;
mod notify;
mod router;
mod runtime;
mod shell;
mod snapshot;
mod uri;

pub use action::ShellAction;
pub use binding::{ClientModel, ModelBinding, WalletLink, WalletModel};
pub use command::{ClientCommand, Command, Passphrase, WalletCommand};
pub use config::ShellConfig;
pub use driver::Driver;
pub use error::{GateError, ShellError, UriError};
pub use event::IncomingEvent;
pub use gate::{
    ApprovalId, ApprovalOutcome, ApprovalRequester, ConfirmationGate, GateDiagnostics, PendingView,
};
pub use input::UserInput;
pub use notifier::{LogNotifier, Notification, NotificationClass, Notifier};
pub use notify::{Drained, Effect, EventPublisher, Generation, NotificationBridge};
pub use router::{Navigation, NavigationTarget, Page, PageRouter};
pub use runtime::Runtime;
pub use shell::Shell;
pub use snapshot::{EncryptionState, StakingState, StateSnapshot};
pub use uri::{AddressValidator, COIN, PaymentRequest, format_amount, parse_amount};
