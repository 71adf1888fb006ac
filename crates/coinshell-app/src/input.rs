//! Renderer-agnostic user input.

use crate::{Command, NavigationTarget};

/// User intent delivered by a [`Driver`](crate::Driver).
///
/// Decouples the shell from any particular toolkit's widgets and events.
#[derive(Debug, Clone)]
pub enum UserInput {
    /// Open a page or tab.
    Navigate(NavigationTarget),
    /// Return to the previous page.
    Back,
    /// Payment-request identifier typed, pasted or dropped by the user.
    OpenUri(String),
    /// Forward a command to the backend.
    Command(Command),
    /// Quit the application.
    Quit,
}
