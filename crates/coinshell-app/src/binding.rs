//! Attachment of backend models to the shell.
//!
//! [`ModelBinding`] owns the subscription lifetime of one client model and one
//! wallet model. Every attach or detach starts a new [`Generation`]: publishers
//! and approval requesters handed to the previous models become inert, queued
//! events from them are discarded, and a fee request they left pending is
//! declined.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    ApprovalRequester, ClientCommand, Command, ConfirmationGate, EncryptionState, EventPublisher,
    Generation, NotificationBridge, StakingState, StateSnapshot, WalletCommand,
    error::ShellError,
};

/// Network-side backend model, independent of any wallet.
pub trait ClientModel: Send + Sync {
    /// Number of connected peers.
    fn connection_count(&self) -> u32;

    /// Local chain height and estimated network height.
    fn block_height(&self) -> (u64, u64);

    /// Whether the last version check found the client current.
    fn version_ok(&self) -> bool {
        true
    }

    /// Whether a blockchain reload is currently allowed.
    fn reload_enabled(&self) -> bool {
        true
    }

    /// Whether an update check is currently allowed.
    fn update_check_enabled(&self) -> bool {
        true
    }

    /// Start reporting changes to `events`.
    fn bind(&self, events: EventPublisher);

    /// Stop reporting changes. Called before the model is released.
    fn unbind(&self);

    /// Execute a client command.
    fn execute(&self, command: ClientCommand);
}

/// Handles given to a wallet model on bind.
#[derive(Debug, Clone)]
pub struct WalletLink {
    /// Event sink for wallet state changes.
    pub events: EventPublisher,
    /// Fee-approval requests.
    pub approvals: ApprovalRequester,
}

/// Wallet-side backend model.
pub trait WalletModel: Send + Sync {
    /// Spendable balance in base units.
    fn balance(&self) -> i64;

    /// Encryption state.
    fn encryption_state(&self) -> EncryptionState;

    /// Staking state.
    fn staking_state(&self) -> StakingState;

    /// Whether `address` is a valid recipient for this wallet's chain.
    fn validate_address(&self, address: &str) -> bool;

    /// Start reporting changes through `link`.
    fn bind(&self, link: WalletLink);

    /// Stop reporting changes. Called before the model is released.
    fn unbind(&self);

    /// Execute a wallet command.
    fn execute(&self, command: WalletCommand);
}

struct Bound {
    client: Arc<dyn ClientModel>,
    wallet: Arc<dyn WalletModel>,
    live: Arc<AtomicBool>,
}

impl Bound {
    fn release(self) {
        self.live.store(false, Ordering::Release);
        self.client.unbind();
        self.wallet.unbind();
    }
}

/// Owner of the current model subscription.
pub struct ModelBinding {
    bound: Option<Bound>,
    generation: Generation,
}

impl Default for ModelBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBinding {
    /// Create a binding with no models attached.
    pub fn new() -> Self {
        Self { bound: None, generation: Generation::INITIAL }
    }

    /// Attach `client` and `wallet`, replacing any previous models.
    ///
    /// Subscribes both models, then refreshes the snapshot synchronously from
    /// their getters so the consumer never shows stale or empty state.
    pub fn attach(
        &mut self,
        client: Arc<dyn ClientModel>,
        wallet: Arc<dyn WalletModel>,
        bridge: &mut NotificationBridge,
        gate: &Arc<ConfirmationGate>,
    ) -> Generation {
        self.detach(bridge, gate);

        let generation = self.advance(bridge, gate);
        let live = Arc::new(AtomicBool::new(true));

        client.bind(bridge.scoped_publisher(Arc::clone(&live)));
        wallet.bind(WalletLink {
            events: bridge.scoped_publisher(Arc::clone(&live)),
            approvals: ApprovalRequester::new(Arc::clone(gate), generation),
        });

        bridge.replace(snapshot_of(client.as_ref(), wallet.as_ref()));
        self.bound = Some(Bound { client, wallet, live });

        tracing::info!(%generation, "Models attached");
        generation
    }

    /// Release the attached models.
    ///
    /// Returns `false` if nothing was attached. Safe to call repeatedly.
    pub fn detach(&mut self, bridge: &mut NotificationBridge, gate: &ConfirmationGate) -> bool {
        let Some(bound) = self.bound.take() else {
            return false;
        };

        bound.release();
        let generation = self.advance(bridge, gate);
        tracing::info!(%generation, "Models detached");
        true
    }

    fn advance(&mut self, bridge: &mut NotificationBridge, gate: &ConfirmationGate) -> Generation {
        self.generation = self.generation.next();
        bridge.advance(self.generation);
        gate.advance(self.generation);
        self.generation
    }

    /// Forward `command` to the model that owns it.
    pub fn submit(&self, command: Command) -> Result<(), ShellError> {
        let bound = self.bound.as_ref().ok_or(ShellError::NotBound)?;
        tracing::debug!(command = command.name(), "Forwarding command");
        match command {
            Command::Wallet(command) => bound.wallet.execute(command),
            Command::Client(command) => bound.client.execute(command),
        }
        Ok(())
    }

    /// Snapshot computed directly from the attached models.
    pub fn refresh(&self) -> Option<StateSnapshot> {
        self.bound.as_ref().map(|b| snapshot_of(b.client.as_ref(), b.wallet.as_ref()))
    }

    /// Attached wallet model.
    pub fn wallet(&self) -> Option<&Arc<dyn WalletModel>> {
        self.bound.as_ref().map(|b| &b.wallet)
    }

    /// Attached client model.
    pub fn client(&self) -> Option<&Arc<dyn ClientModel>> {
        self.bound.as_ref().map(|b| &b.client)
    }

    /// Whether models are attached.
    pub fn is_attached(&self) -> bool {
        self.bound.is_some()
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl Drop for ModelBinding {
    fn drop(&mut self) {
        if let Some(bound) = self.bound.take() {
            bound.release();
        }
    }
}

impl std::fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBinding")
            .field("generation", &self.generation)
            .field("attached", &self.is_attached())
            .finish()
    }
}

fn snapshot_of(client: &dyn ClientModel, wallet: &dyn WalletModel) -> StateSnapshot {
    let (block_height, block_total) = client.block_height();
    StateSnapshot {
        connection_count: client.connection_count(),
        block_height,
        block_total,
        balance: wallet.balance(),
        encryption: wallet.encryption_state(),
        staking: wallet.staking_state(),
        version_ok: client.version_ok(),
        reload_enabled: client.reload_enabled(),
        update_check_enabled: client.update_check_enabled(),
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::IncomingEvent;

    #[derive(Default)]
    struct StubClient {
        events: Mutex<Option<EventPublisher>>,
        commands: Mutex<Vec<ClientCommand>>,
    }

    impl ClientModel for StubClient {
        fn connection_count(&self) -> u32 {
            3
        }

        fn block_height(&self) -> (u64, u64) {
            (10, 20)
        }

        fn bind(&self, events: EventPublisher) {
            *self.events.lock() = Some(events);
        }

        fn unbind(&self) {
            *self.events.lock() = None;
        }

        fn execute(&self, command: ClientCommand) {
            self.commands.lock().push(command);
        }
    }

    struct StubWallet {
        balance: i64,
        link: Mutex<Option<WalletLink>>,
    }

    impl StubWallet {
        fn new(balance: i64) -> Self {
            Self { balance, link: Mutex::new(None) }
        }
    }

    impl WalletModel for StubWallet {
        fn balance(&self) -> i64 {
            self.balance
        }

        fn encryption_state(&self) -> EncryptionState {
            EncryptionState::Locked
        }

        fn staking_state(&self) -> StakingState {
            StakingState::On
        }

        fn validate_address(&self, address: &str) -> bool {
            !address.is_empty()
        }

        fn bind(&self, link: WalletLink) {
            *self.link.lock() = Some(link);
        }

        fn unbind(&self) {
            *self.link.lock() = None;
        }

        fn execute(&self, _command: WalletCommand) {}
    }

    #[test]
    fn attach_refreshes_snapshot() {
        let mut bridge = NotificationBridge::new(64);
        let gate = Arc::new(ConfirmationGate::new());
        let mut binding = ModelBinding::new();

        binding.attach(
            Arc::new(StubClient::default()),
            Arc::new(StubWallet::new(42)),
            &mut bridge,
            &gate,
        );

        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.balance, 42);
        assert_eq!(snapshot.connection_count, 3);
        assert_eq!((snapshot.block_height, snapshot.block_total), (10, 20));
        assert_eq!(snapshot.encryption, EncryptionState::Locked);
        assert_eq!(snapshot.staking, StakingState::On);
    }

    #[test]
    fn detach_is_idempotent_and_unbinds() {
        let mut bridge = NotificationBridge::new(64);
        let gate = Arc::new(ConfirmationGate::new());
        let mut binding = ModelBinding::new();
        let client = Arc::new(StubClient::default());

        binding.attach(client.clone(), Arc::new(StubWallet::new(1)), &mut bridge, &gate);
        let publisher = client.events.lock().clone().unwrap();

        assert!(binding.detach(&mut bridge, &gate));
        assert!(!binding.detach(&mut bridge, &gate));
        assert!(client.events.lock().is_none());

        publisher.publish(IncomingEvent::ConnectionCountChanged(99));
        assert_eq!(bridge.drain().applied, 0);
    }

    #[test]
    fn submit_routes_by_owner() {
        let mut bridge = NotificationBridge::new(64);
        let gate = Arc::new(ConfirmationGate::new());
        let mut binding = ModelBinding::new();
        let client = Arc::new(StubClient::default());

        assert_eq!(binding.submit(ClientCommand::CheckForUpdate.into()), Err(ShellError::NotBound));

        binding.attach(client.clone(), Arc::new(StubWallet::new(1)), &mut bridge, &gate);
        binding.submit(ClientCommand::ReloadBlockchain.into()).unwrap();
        binding.submit(WalletCommand::Rescan.into()).unwrap();

        assert_eq!(*client.commands.lock(), vec![ClientCommand::ReloadBlockchain]);
    }

    #[test]
    fn reattach_discards_previous_models() {
        let mut bridge = NotificationBridge::new(64);
        let gate = Arc::new(ConfirmationGate::new());
        let mut binding = ModelBinding::new();
        let first = Arc::new(StubClient::default());

        let a = binding.attach(first.clone(), Arc::new(StubWallet::new(1)), &mut bridge, &gate);
        let stale = first.events.lock().clone().unwrap();
        stale.publish(IncomingEvent::BalanceChanged(1_000));

        let b = binding.attach(
            Arc::new(StubClient::default()),
            Arc::new(StubWallet::new(7)),
            &mut bridge,
            &gate,
        );

        assert!(b > a);
        assert_eq!(bridge.drain().applied, 0);
        assert_eq!(bridge.snapshot().balance, 7);
    }
}
