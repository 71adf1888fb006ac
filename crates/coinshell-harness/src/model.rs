//! In-memory backend models.
//!
//! [`SimClient`] and [`SimWallet`] implement the shell's model traits over
//! plain state. Every setter updates the state first and then publishes the
//! matching event, so a drained shell converges on the getters.

use std::sync::Arc;

use coinshell_app::{
    ApprovalOutcome, ClientCommand, ClientModel, EncryptionState, EventPublisher, IncomingEvent,
    StakingState, StateSnapshot, WalletCommand, WalletLink, WalletModel,
};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct ClientState {
    connections: u32,
    height: u64,
    total: u64,
    version_ok: bool,
    reload_enabled: bool,
    update_check_enabled: bool,
    events: Option<EventPublisher>,
    commands: Vec<ClientCommand>,
    binds: usize,
}

/// Simulated network-side model.
#[derive(Debug)]
pub struct SimClient {
    state: Mutex<ClientState>,
}

impl Default for SimClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClient {
    /// Client with no peers and an empty chain.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClientState {
                version_ok: true,
                reload_enabled: true,
                update_check_enabled: true,
                ..ClientState::default()
            }),
        }
    }

    /// Shared handle, ready for [`coinshell_app::Shell::attach`].
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn publish(state: &ClientState, event: IncomingEvent) {
        if let Some(events) = &state.events {
            events.publish(event);
        }
    }

    /// Change the peer count.
    pub fn set_connections(&self, count: u32) {
        let mut state = self.state.lock();
        state.connections = count;
        Self::publish(&state, IncomingEvent::ConnectionCountChanged(count));
    }

    /// Change local and estimated network height.
    pub fn set_height(&self, height: u64, total: u64) {
        let mut state = self.state.lock();
        state.height = height;
        state.total = total;
        Self::publish(&state, IncomingEvent::BlockHeightChanged { height, total });
    }

    /// Report a version check result.
    pub fn set_version_ok(&self, ok: bool) {
        let mut state = self.state.lock();
        state.version_ok = ok;
        Self::publish(&state, IncomingEvent::VersionCheckResult(ok));
    }

    /// Enable or disable blockchain reload.
    pub fn set_reload_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.reload_enabled = enabled;
        Self::publish(&state, IncomingEvent::ReloadAvailabilityChanged(enabled));
    }

    /// Raise a backend alert.
    pub fn alert(&self, title: &str, message: &str, modal: bool) {
        let state = self.state.lock();
        Self::publish(&state, IncomingEvent::Alert {
            title: title.to_string(),
            message: message.to_string(),
            modal,
        });
    }

    /// Deliver a payment request received from outside the shell.
    pub fn receive_uri(&self, uri: &str) {
        let state = self.state.lock();
        Self::publish(&state, IncomingEvent::UriReceived(uri.to_string()));
    }

    /// Commands executed so far.
    pub fn commands(&self) -> Vec<ClientCommand> {
        self.state.lock().commands.clone()
    }

    /// Whether a publisher is currently bound.
    pub fn is_bound(&self) -> bool {
        self.state.lock().events.is_some()
    }

    /// Number of times the model was bound.
    pub fn binds(&self) -> usize {
        self.state.lock().binds
    }
}

impl ClientModel for SimClient {
    fn connection_count(&self) -> u32 {
        self.state.lock().connections
    }

    fn block_height(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.height, state.total)
    }

    fn version_ok(&self) -> bool {
        self.state.lock().version_ok
    }

    fn reload_enabled(&self) -> bool {
        self.state.lock().reload_enabled
    }

    fn update_check_enabled(&self) -> bool {
        self.state.lock().update_check_enabled
    }

    fn bind(&self, events: EventPublisher) {
        let mut state = self.state.lock();
        state.events = Some(events);
        state.binds += 1;
    }

    fn unbind(&self) {
        self.state.lock().events = None;
    }

    fn execute(&self, command: ClientCommand) {
        tracing::debug!(?command, "Sim client executing command");
        let mut state = self.state.lock();
        state.commands.push(command);
        if command == ClientCommand::ReloadBlockchain {
            state.height = 0;
            let total = state.total;
            Self::publish(&state, IncomingEvent::BlockHeightChanged { height: 0, total });
        }
    }
}

#[derive(Debug, Default)]
struct WalletState {
    balance: i64,
    encryption: EncryptionState,
    staking: StakingState,
    transactions: usize,
    link: Option<WalletLink>,
    commands: Vec<&'static str>,
}

/// Simulated wallet model.
#[derive(Debug, Default)]
pub struct SimWallet {
    state: Mutex<WalletState>,
}

impl SimWallet {
    /// Empty unencrypted wallet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, ready for [`coinshell_app::Shell::attach`].
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn publish(state: &WalletState, event: IncomingEvent) {
        if let Some(link) = &state.link {
            link.events.publish(event);
        }
    }

    /// Change the balance.
    pub fn set_balance(&self, balance: i64) {
        let mut state = self.state.lock();
        state.balance = balance;
        Self::publish(&state, IncomingEvent::BalanceChanged(balance));
    }

    /// Change the encryption state.
    pub fn set_encryption(&self, encryption: EncryptionState) {
        let mut state = self.state.lock();
        state.encryption = encryption;
        Self::publish(&state, IncomingEvent::EncryptionStatusChanged(encryption));
    }

    /// Change the staking state.
    pub fn set_staking(&self, staking: StakingState) {
        let mut state = self.state.lock();
        state.staking = staking;
        Self::publish(&state, IncomingEvent::StakingStatusChanged(staking));
    }

    /// Append `count` transactions to the history and announce them.
    pub fn receive_transactions(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut state = self.state.lock();
        let start = state.transactions;
        state.transactions += count;
        let end = state.transactions - 1;
        Self::publish(&state, IncomingEvent::TransactionsInserted { start, end });
    }

    /// Ask the user to approve `fee`, blocking the calling thread.
    ///
    /// Returns [`ApprovalOutcome::Superseded`] when the wallet is not bound.
    pub fn request_fee(&self, fee: i64) -> ApprovalOutcome {
        let approvals = self.state.lock().link.as_ref().map(|l| l.approvals.clone());
        match approvals {
            Some(approvals) => approvals.request(fee),
            None => ApprovalOutcome::Superseded,
        }
    }

    /// Names of the commands executed so far.
    pub fn commands(&self) -> Vec<&'static str> {
        self.state.lock().commands.clone()
    }

    /// Whether the wallet is currently bound.
    pub fn is_bound(&self) -> bool {
        self.state.lock().link.is_some()
    }
}

/// Base58 addresses starting with `R`, 26 to 35 characters.
pub fn is_sim_address(address: &str) -> bool {
    const BASE58: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
    (26..=35).contains(&address.len())
        && address.starts_with('R')
        && address.chars().all(|c| BASE58.contains(c))
}

impl WalletModel for SimWallet {
    fn balance(&self) -> i64 {
        self.state.lock().balance
    }

    fn encryption_state(&self) -> EncryptionState {
        self.state.lock().encryption
    }

    fn staking_state(&self) -> StakingState {
        self.state.lock().staking
    }

    fn validate_address(&self, address: &str) -> bool {
        is_sim_address(address)
    }

    fn bind(&self, link: WalletLink) {
        self.state.lock().link = Some(link);
    }

    fn unbind(&self) {
        self.state.lock().link = None;
    }

    fn execute(&self, command: WalletCommand) {
        let name = coinshell_app::Command::from(command.clone()).name();
        tracing::debug!(command = name, "Sim wallet executing command");
        let mut state = self.state.lock();
        state.commands.push(name);
        let encryption = match command {
            WalletCommand::Encrypt { .. } => Some(EncryptionState::Locked),
            WalletCommand::Unlock { staking_only, .. } => {
                if staking_only {
                    state.staking = StakingState::On;
                    Self::publish(&state, IncomingEvent::StakingStatusChanged(StakingState::On));
                }
                Some(EncryptionState::Unlocked)
            },
            WalletCommand::Backup { .. }
            | WalletCommand::ChangePassphrase { .. }
            | WalletCommand::Rescan => None,
        };
        if let Some(encryption) = encryption {
            state.encryption = encryption;
            Self::publish(&state, IncomingEvent::EncryptionStatusChanged(encryption));
        }
    }
}

/// Snapshot the shell should converge on once every event is drained.
pub fn expected_snapshot(client: &SimClient, wallet: &SimWallet) -> StateSnapshot {
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
