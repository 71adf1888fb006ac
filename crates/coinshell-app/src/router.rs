//! Page navigation state machine.
//!
//! The [`PageRouter`] always has exactly one active [`NavigationTarget`]. It
//! starts on the overview page and lives as long as the process.
//!
//! Some targets share a page: sign, verify and access-Nxt are tabs of one
//! message-tools page. Navigating between them, or re-selecting the active tab
//! with a different address, is a retarget rather than a page change.
//! Navigating to the exact active target is a no-op.

use std::collections::VecDeque;

use crate::{
    error::UriError,
    uri::{AddressValidator, PaymentRequest},
};

/// Pages of the wallet shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Balance and recent activity.
    Overview,
    /// Transaction history.
    History,
    /// Address book of send addresses.
    AddressBook,
    /// Own receiving addresses.
    ReceiveCoins,
    /// Send coins.
    SendCoins,
    /// Send other currencies through a gateway.
    SendAltCoins,
    /// News feed.
    News,
    /// Chat.
    Chat,
    /// Block explorer.
    Explorer,
    /// SuperNET services.
    SuperNet,
    /// Fiat gateway.
    Fiat,
    /// Sign, verify and access-Nxt tabs.
    MessageTools,
}

/// Navigation target, including the sub-target for tabbed pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NavigationTarget {
    /// Overview page.
    Overview,
    /// History page.
    History,
    /// Address book page.
    AddressBook,
    /// Receive page.
    ReceiveCoins,
    /// Send page.
    SendCoins,
    /// Alt-coin send page.
    SendAltCoins,
    /// News page.
    News,
    /// Chat page.
    Chat,
    /// Explorer page.
    Explorer,
    /// SuperNET page.
    SuperNet,
    /// Fiat page.
    Fiat,
    /// Sign-message tab, optionally pre-filled with an address.
    SignMessage(Option<String>),
    /// Verify-message tab, optionally pre-filled with an address.
    VerifyMessage(Option<String>),
    /// Access-Nxt tab, optionally pre-filled with an address.
    AccessNxt(Option<String>),
}

impl NavigationTarget {
    /// Page this target lives on.
    pub fn page(&self) -> Page {
        match self {
            Self::Overview => Page::Overview,
            Self::History => Page::History,
            Self::AddressBook => Page::AddressBook,
            Self::ReceiveCoins => Page::ReceiveCoins,
            Self::SendCoins => Page::SendCoins,
            Self::SendAltCoins => Page::SendAltCoins,
            Self::News => Page::News,
            Self::Chat => Page::Chat,
            Self::Explorer => Page::Explorer,
            Self::SuperNet => Page::SuperNet,
            Self::Fiat => Page::Fiat,
            Self::SignMessage(_) | Self::VerifyMessage(_) | Self::AccessNxt(_) => {
                Page::MessageTools
            },
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Moved to a different page.
    Changed {
        /// Previously active target.
        from: NavigationTarget,
        /// Newly active target.
        to: NavigationTarget,
    },
    /// Stayed on the same page with a different tab or address.
    Retargeted {
        /// Previously active target.
        from: NavigationTarget,
        /// Newly active target.
        to: NavigationTarget,
    },
    /// Target was already active.
    Unchanged,
}

/// Finite-state page router.
#[derive(Debug, Clone)]
pub struct PageRouter {
    active: NavigationTarget,
    history: VecDeque<NavigationTarget>,
    history_limit: usize,
    uri_scheme: String,
}

impl PageRouter {
    /// Create a router on the overview page.
    pub fn new(uri_scheme: impl Into<String>, history_limit: usize) -> Self {
        Self {
            active: NavigationTarget::Overview,
            history: VecDeque::new(),
            history_limit,
            uri_scheme: uri_scheme.into(),
        }
    }

    /// Navigate to `target`.
    pub fn navigate(&mut self, target: NavigationTarget) -> Navigation {
        if target == self.active {
            return Navigation::Unchanged;
        }

        let from = std::mem::replace(&mut self.active, target.clone());
        if from.page() == target.page() {
            tracing::debug!(?from, to = ?target, "Retargeted page");
            return Navigation::Retargeted { from, to: target };
        }

        tracing::debug!(?from, to = ?target, "Navigated");
        self.push_history(from.clone());
        Navigation::Changed { from, to: target }
    }

    /// Validate a payment-request identifier and open the send page.
    ///
    /// On error the active target is left untouched.
    pub fn dispatch_uri(
        &mut self,
        uri: &str,
        validator: &dyn AddressValidator,
    ) -> Result<(PaymentRequest, Navigation), UriError> {
        let request = PaymentRequest::parse(uri, &self.uri_scheme, validator)?;
        let navigation = self.navigate(NavigationTarget::SendCoins);
        Ok((request, navigation))
    }

    /// Return to the previous page, if there is one.
    pub fn back(&mut self) -> Option<Navigation> {
        let previous = self.history.pop_back()?;
        let from = std::mem::replace(&mut self.active, previous.clone());
        Some(Navigation::Changed { from, to: previous })
    }

    fn push_history(&mut self, target: NavigationTarget) {
        if self.history_limit == 0 {
            return;
        }
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(target);
    }

    /// Currently active target.
    pub fn active(&self) -> &NavigationTarget {
        &self.active
    }

    /// Page of the active target.
    pub fn page(&self) -> Page {
        self.active.page()
    }

    /// Previously visited targets, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &NavigationTarget> {
        self.history.iter()
    }

    /// Scheme accepted by [`dispatch_uri`](Self::dispatch_uri).
    pub fn uri_scheme(&self) -> &str {
        &self.uri_scheme
    }
}
