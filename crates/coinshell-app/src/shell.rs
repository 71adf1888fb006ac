//! Composed wallet shell.
//!
//! The [`Shell`] wires the independent services together for one consumer:
//! the [`NotificationBridge`] and [`ConfirmationGate`] face the backend, the
//! [`PageRouter`] tracks navigation, the [`ModelBinding`] owns the models, and
//! an injected [`Notifier`] shows messages.
//!
//! Like the services it composes, the shell performs no I/O. It consumes
//! [`UserInput`] and refresh cycles and returns [`ShellAction`]s for a runtime
//! to execute.
//!
//! # Teardown
//!
//! [`Shell::shutdown`] (also run on drop) declines any blocked fee request,
//! closes the event queue and releases the models. The last snapshot and the
//! gate diagnostics stay readable afterwards.

use std::{sync::Arc, time::Instant};

use tokio::sync::watch;

use crate::{
    ApprovalId, ClientCommand, ClientModel, Command, ConfirmationGate, Effect, EventPublisher, GateDiagnostics,
    Generation, ModelBinding, Navigation, NavigationTarget, Notification, NotificationBridge,
    NotificationClass, Notifier, PageRouter, ShellAction, ShellConfig, StateSnapshot, UserInput,
    WalletModel, error::ShellError,
};

/// Wallet shell: notification bridge, confirmation gate, router and binding.
pub struct Shell {
    config: ShellConfig,
    bridge: NotificationBridge,
    gate: Arc<ConfirmationGate>,
    router: PageRouter,
    binding: ModelBinding,
    notifier: Box<dyn Notifier>,
    /// Last fee request a prompt was issued for.
    prompted: Option<ApprovalId>,
    /// Transient status line. `None` if no message.
    status_message: Option<String>,
    /// When the next periodic update check is due.
    next_update_check: Option<Instant>,
    closed: bool,
}

impl Shell {
    /// Create a shell with nothing attached, on the overview page.
    pub fn new(config: ShellConfig, notifier: Box<dyn Notifier>) -> Self {
        let bridge = NotificationBridge::new(config.queue_high_watermark);
        let router = PageRouter::new(config.uri_scheme.clone(), config.history_limit);
        Self {
            config,
            bridge,
            gate: Arc::new(ConfirmationGate::new()),
            router,
            binding: ModelBinding::new(),
            notifier,
            prompted: None,
            status_message: None,
            next_update_check: None,
            closed: false,
        }
    }

    /// Attach backend models, replacing any previous ones.
    pub fn attach(
        &mut self,
        client: Arc<dyn ClientModel>,
        wallet: Arc<dyn WalletModel>,
    ) -> Result<Vec<ShellAction>, ShellError> {
        if self.closed {
            return Err(ShellError::Closed);
        }
        self.binding.attach(client, wallet, &mut self.bridge, &self.gate);
        self.prompted = None;
        self.next_update_check = None;
        Ok(vec![ShellAction::Render])
    }

    /// Release the attached models. No-op if nothing is attached.
    pub fn detach(&mut self) -> Vec<ShellAction> {
        if self.binding.detach(&mut self.bridge, &self.gate) {
            self.prompted = None;
            vec![ShellAction::Render]
        } else {
            vec![]
        }
    }

    /// Process user input.
    pub fn handle(&mut self, input: UserInput) -> Vec<ShellAction> {
        match input {
            UserInput::Navigate(target) => self.navigate(target),
            UserInput::Back => self.back(),
            UserInput::OpenUri(uri) => self.open_uri(&uri),
            UserInput::Command(command) => self.command(command),
            UserInput::Quit => vec![ShellAction::Quit],
        }
    }

    /// One refresh cycle: apply queued backend events and surface any new fee
    /// request.
    ///
    /// Returns at most one [`ShellAction::Render`], last.
    pub fn cycle(&mut self) -> Vec<ShellAction> {
        let drained = self.bridge.drain();
        let mut render = drained.render;
        let mut actions = Vec::new();

        for effect in drained.effects {
            match effect {
                Effect::TransactionsInserted { start, end, syncing } => {
                    self.incoming_transactions(start, end, syncing);
                },
                Effect::UriReceived(uri) => {
                    if let Some(action) = self.route_uri(&uri) {
                        actions.push(action);
                    }
                },
                Effect::Alert { title, message, modal } => {
                    self.notifier.notify(Notification {
                        class: NotificationClass::Critical,
                        title,
                        message,
                        modal,
                    });
                },
            }
        }

        if let Some(view) = self.gate.pending()
            && self.prompted != Some(view.id)
        {
            self.prompted = Some(view.id);
            match self.config.auto_approve_fee {
                Some(limit) if view.fee <= limit => {
                    tracing::debug!(id = %view.id, fee = view.fee, limit, "Auto-approving fee");
                    if let Err(e) = self.gate.resolve_id(view.id, true) {
                        tracing::debug!(error = %e, "Fee request ended before auto-approval");
                    }
                },
                _ => actions.push(ShellAction::PromptFee { id: view.id, fee: view.fee }),
            }
        }

        if actions.iter().any(|a| matches!(a, ShellAction::PrefillSend(_))) {
            render = true;
        }
        if render {
            actions.push(ShellAction::Render);
        }
        actions
    }

    /// Advance timers to `now`.
    ///
    /// The first tick after an attach schedules the periodic update check one
    /// interval out; later ticks forward [`ClientCommand::CheckForUpdate`]
    /// whenever it falls due.
    pub fn tick(&mut self, now: Instant) {
        let Some(interval) = self.config.update_check_interval else {
            return;
        };
        if self.closed || !self.binding.is_attached() {
            return;
        }

        match self.next_update_check {
            Some(due) if now < due => {},
            Some(_) => {
                tracing::debug!("Periodic update check");
                if let Err(e) = self.binding.submit(ClientCommand::CheckForUpdate.into()) {
                    tracing::debug!(error = %e, "Update check not forwarded");
                }
                self.next_update_check = now.checked_add(interval);
            },
            None => self.next_update_check = now.checked_add(interval),
        }
    }

    /// Navigate to `target`.
    pub fn navigate(&mut self, target: NavigationTarget) -> Vec<ShellAction> {
        match self.router.navigate(target) {
            Navigation::Unchanged => vec![],
            Navigation::Changed { .. } | Navigation::Retargeted { .. } => vec![ShellAction::Render],
        }
    }

    /// Return to the previous page.
    pub fn back(&mut self) -> Vec<ShellAction> {
        match self.router.back() {
            Some(_) => vec![ShellAction::Render],
            None => vec![],
        }
    }

    /// Validate a payment request and open the send page.
    ///
    /// Malformed requests leave the page unchanged and produce a warning
    /// notification.
    pub fn open_uri(&mut self, uri: &str) -> Vec<ShellAction> {
        match self.route_uri(uri) {
            Some(action) => vec![action, ShellAction::Render],
            None => vec![ShellAction::Render],
        }
    }

    fn route_uri(&mut self, uri: &str) -> Option<ShellAction> {
        let Some(wallet) = self.binding.wallet().cloned() else {
            self.warn("Payment request", ShellError::NotBound.to_string());
            return None;
        };

        let validator = |address: &str| wallet.validate_address(address);
        match self.router.dispatch_uri(uri, &validator) {
            Ok((request, _)) => {
                tracing::info!(address = %request.address, amount = ?request.amount, "Payment request accepted");
                self.status_message = None;
                Some(ShellAction::PrefillSend(request))
            },
            Err(e) => {
                tracing::debug!(error = %e, "Payment request rejected");
                self.warn("Invalid payment request", e.to_string());
                None
            },
        }
    }

    /// Forward a command to the backend.
    pub fn command(&mut self, command: Command) -> Vec<ShellAction> {
        let name = command.name();
        match self.binding.submit(command) {
            Ok(()) => vec![],
            Err(e) => {
                tracing::debug!(command = name, error = %e, "Command not forwarded");
                self.warn("Command failed", e.to_string());
                vec![ShellAction::Render]
            },
        }
    }

    /// Answer the fee prompt for request `id`.
    pub fn resolve_fee(&mut self, id: ApprovalId, decision: bool) -> Result<(), ShellError> {
        self.gate.resolve_id(id, decision)?;
        tracing::info!(%id, decision, "Fee prompt answered");
        Ok(())
    }

    /// Decline any blocked fee request, close the event queue and release the
    /// models. Idempotent.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.gate.shutdown();
        self.bridge.close();
        self.binding.detach(&mut self.bridge, &self.gate);
        tracing::info!("Shell shut down");
    }

    fn incoming_transactions(&mut self, start: usize, end: usize, syncing: bool) {
        if syncing && !self.config.notify_during_sync {
            tracing::debug!(start, end, "Skipping transaction notification while syncing");
            return;
        }
        let count = end.saturating_sub(start).saturating_add(1);
        self.notifier.notify(Notification::new(
            NotificationClass::Information,
            "Incoming transaction",
            format!("{count} new transaction(s)"),
        ));
    }

    fn warn(&mut self, title: &str, message: String) {
        self.status_message = Some(format!("{title}: {message}"));
        self.notifier.notify(Notification::new(NotificationClass::Warning, title, message));
    }

    /// Unscoped publisher for backend code not managed through a model
    /// binding. Stays valid across attach and detach.
    pub fn publisher(&self) -> EventPublisher {
        self.bridge.publisher()
    }

    /// Fee-approval gate shared with the backend.
    pub fn gate(&self) -> &Arc<ConfirmationGate> {
        &self.gate
    }

    /// Gate state for diagnostics.
    pub fn gate_diagnostics(&self) -> GateDiagnostics {
        self.gate.diagnostics()
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> StateSnapshot {
        self.bridge.snapshot()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.bridge.subscribe()
    }

    /// Snapshot computed directly from the attached models.
    pub fn model_snapshot(&self) -> Option<StateSnapshot> {
        self.binding.refresh()
    }

    /// Active navigation target.
    pub fn active(&self) -> &NavigationTarget {
        self.router.active()
    }

    /// Page router.
    pub fn router(&self) -> &PageRouter {
        &self.router
    }

    /// Whether models are attached.
    pub fn is_attached(&self) -> bool {
        self.binding.is_attached()
    }

    /// Current binding generation.
    pub fn generation(&self) -> Generation {
        self.binding.generation()
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Configuration in use.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("active", self.router.active())
            .field("binding", &self.binding)
            .field("bridge", &self.bridge)
            .field("gate", &self.gate)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::{IncomingEvent, LogNotifier};

    fn shell() -> Shell {
        Shell::new(ShellConfig::default(), Box::new(LogNotifier))
    }

    #[derive(Clone, Default)]
    struct Shown(Arc<Mutex<Vec<Notification>>>);

    impl Notifier for Shown {
        fn notify(&mut self, notification: Notification) {
            self.0.lock().push(notification);
        }
    }

    #[test]
    fn cycle_without_events_is_quiet() {
        let mut shell = shell();
        assert!(shell.cycle().is_empty());
    }

    #[test]
    fn cycle_renders_once_for_many_events() {
        let mut shell = shell();
        let publisher = shell.publisher();
        for balance in 0..10 {
            publisher.publish(IncomingEvent::BalanceChanged(balance));
        }

        assert_eq!(shell.cycle(), vec![ShellAction::Render]);
        assert_eq!(shell.snapshot().balance, 9);
    }

    #[test]
    fn huge_transaction_range_saturates() {
        let shown = Shown::default();
        let mut shell = Shell::new(ShellConfig::default(), Box::new(shown.clone()));
        shell
            .publisher()
            .publish(IncomingEvent::TransactionsInserted { start: 0, end: usize::MAX });

        assert_eq!(shell.cycle(), vec![ShellAction::Render]);
        let shown = shown.0.lock();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].message, format!("{} new transaction(s)", usize::MAX));
    }

    #[test]
    fn uri_without_wallet_is_rejected() {
        let mut shell = shell();
        let actions = shell.open_uri("bitcoindark:RAddr");

        assert_eq!(actions, vec![ShellAction::Render]);
        assert_eq!(shell.active(), &NavigationTarget::Overview);
        assert!(shell.status_message().is_some());
    }

    #[test]
    fn navigation_to_active_page_does_not_render() {
        let mut shell = shell();
        assert!(shell.navigate(NavigationTarget::Overview).is_empty());
        assert_eq!(shell.navigate(NavigationTarget::History), vec![ShellAction::Render]);
        assert_eq!(shell.back(), vec![ShellAction::Render]);
        assert_eq!(shell.active(), &NavigationTarget::Overview);
    }

    #[test]
    fn quit_input_yields_quit() {
        let mut shell = shell();
        assert_eq!(shell.handle(UserInput::Quit), vec![ShellAction::Quit]);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut shell = shell();
        shell.shutdown();
        shell.shutdown();
        assert!(shell.is_closed());
        assert!(shell.gate_diagnostics().closed);
        assert!(!shell.publisher().is_live());
    }
}
