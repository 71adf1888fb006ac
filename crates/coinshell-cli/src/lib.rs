//! Headless frontend for the wallet shell.
//!
//! A thin shell over [`coinshell_app::Driver`] that reads commands from
//! standard input and logs a status line. All orchestration logic lives in the
//! generic [`coinshell_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod headless;
pub mod status;

pub use commands::{CommandError, parse_line};
pub use headless::{HeadlessDriver, HeadlessError};
pub use status::status_line;
