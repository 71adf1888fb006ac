//! Integration tests for the composed shell.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - The published snapshot reflects what the backend reported
//! - Exactly one render follows a burst of events
//! - A blocked backend thread is always released

use std::{
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use coinshell_app::{
    ApprovalOutcome, ClientCommand, ClientModel, EncryptionState, EventPublisher, IncomingEvent,
    LogNotifier, NavigationTarget, Notification, NotificationClass, Notifier, Shell, ShellAction,
    ShellConfig, StakingState, WalletCommand, WalletLink, WalletModel,
};
use parking_lot::Mutex;

#[derive(Default)]
struct TestClient {
    peers: u32,
    events: Mutex<Option<EventPublisher>>,
}

impl TestClient {
    fn with_peers(peers: u32) -> Self {
        Self { peers, events: Mutex::new(None) }
    }

    fn publisher(&self) -> EventPublisher {
        self.events.lock().clone().unwrap()
    }
}

impl ClientModel for TestClient {
    fn connection_count(&self) -> u32 {
        self.peers
    }

    fn block_height(&self) -> (u64, u64) {
        (0, 0)
    }

    fn bind(&self, events: EventPublisher) {
        *self.events.lock() = Some(events);
    }

    fn unbind(&self) {}

    fn execute(&self, _command: ClientCommand) {}
}

#[derive(Default)]
struct TestWallet {
    balance: i64,
    link: Mutex<Option<WalletLink>>,
}

impl TestWallet {
    fn with_balance(balance: i64) -> Self {
        Self { balance, link: Mutex::new(None) }
    }

    fn link(&self) -> WalletLink {
        self.link.lock().clone().unwrap()
    }
}

impl WalletModel for TestWallet {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn encryption_state(&self) -> EncryptionState {
        EncryptionState::Unencrypted
    }

    fn staking_state(&self) -> StakingState {
        StakingState::Off
    }

    fn validate_address(&self, address: &str) -> bool {
        address.starts_with('R') && address.len() >= 26
    }

    fn bind(&self, link: WalletLink) {
        *self.link.lock() = Some(link);
    }

    fn unbind(&self) {}

    fn execute(&self, _command: WalletCommand) {}
}

#[derive(Clone, Default)]
struct Collected(Arc<Mutex<Vec<Notification>>>);

impl Notifier for Collected {
    fn notify(&mut self, notification: Notification) {
        self.0.lock().push(notification);
    }
}

const ADDRESS: &str = "RNnVqgJ9ZbzJnBqn4kMYjJx7uJ3X4YnfTd";

fn attached(config: ShellConfig) -> (Shell, Arc<TestClient>, Arc<TestWallet>, Collected) {
    let notes = Collected::default();
    let mut shell = Shell::new(config, Box::new(notes.clone()));
    let client = Arc::new(TestClient::with_peers(0));
    let wallet = Arc::new(TestWallet::with_balance(0));
    shell.attach(client.clone(), wallet.clone()).unwrap();
    (shell, client, wallet, notes)
}

#[test]
fn burst_of_events_renders_once() {
    let (mut shell, client, _wallet, _notes) = attached(ShellConfig::default());
    let events = client.publisher();

    events.publish(IncomingEvent::ConnectionCountChanged(0));
    events.publish(IncomingEvent::ConnectionCountChanged(8));
    events.publish(IncomingEvent::BlockHeightChanged { height: 100, total: 120 });

    let actions = shell.cycle();
    assert_eq!(actions, vec![ShellAction::Render]);

    let snapshot = shell.snapshot();
    assert_eq!(snapshot.connection_count, 8);
    assert_eq!((snapshot.block_height, snapshot.block_total), (100, 120));
    assert!(snapshot.is_syncing());
    assert!(shell.cycle().is_empty());
}

#[test]
fn fee_request_round_trip() {
    let (mut shell, _client, wallet, _notes) = attached(ShellConfig::default());
    let approvals = wallet.link().approvals;

    let (done_tx, done_rx) = mpsc::channel();
    let backend = thread::spawn(move || {
        done_tx.send(approvals.request(10_000)).unwrap();
    });

    let id = loop {
        let actions = shell.cycle();
        if let Some(ShellAction::PromptFee { id, fee }) = actions.first() {
            assert_eq!(*fee, 10_000);
            break *id;
        }
        thread::sleep(Duration::from_millis(1));
    };

    // The prompt is issued once per request.
    assert!(!shell.cycle().iter().any(|a| matches!(a, ShellAction::PromptFee { .. })));

    shell.resolve_fee(id, true).unwrap();
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), ApprovalOutcome::Approved);
    backend.join().unwrap();
    assert!(shell.gate().pending().is_none());
}

#[test]
fn small_fees_are_auto_approved() {
    let config = ShellConfig { auto_approve_fee: Some(1_000), ..ShellConfig::default() };
    let (mut shell, _client, wallet, _notes) = attached(config);
    let approvals = wallet.link().approvals;

    let backend = thread::spawn(move || approvals.request_approval(500));
    while shell.gate().pending().is_none() {
        thread::sleep(Duration::from_millis(1));
    }

    assert!(shell.cycle().is_empty());
    assert!(backend.join().unwrap());
}

#[test]
fn reattach_declines_pending_request_and_shows_new_models() {
    let (mut shell, client_a, wallet_a, _notes) = attached(ShellConfig::default());
    let stale_events = client_a.publisher();
    let approvals = wallet_a.link().approvals;

    let backend = thread::spawn(move || approvals.request(2_500));
    while shell.gate().pending().is_none() {
        thread::sleep(Duration::from_millis(1));
    }
    stale_events.publish(IncomingEvent::ConnectionCountChanged(42));

    let client_b = Arc::new(TestClient::with_peers(5));
    let wallet_b = Arc::new(TestWallet::with_balance(7 * coinshell_app::COIN));
    shell.attach(client_b, wallet_b).unwrap();

    assert_eq!(backend.join().unwrap(), ApprovalOutcome::Cancelled);
    assert!(shell.cycle().is_empty());

    let snapshot = shell.snapshot();
    assert_eq!(snapshot.connection_count, 5);
    assert_eq!(snapshot.balance, 7 * coinshell_app::COIN);
    assert!(!stale_events.is_live());
}

#[test]
fn detach_then_attach_cancels_pending_request() {
    let (mut shell, client_a, wallet_a, _notes) = attached(ShellConfig::default());
    let stale_events = client_a.publisher();
    let approvals = wallet_a.link().approvals;

    let backend = thread::spawn(move || approvals.request(4_000));
    while shell.gate().pending().is_none() {
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(shell.detach(), vec![ShellAction::Render]);
    assert_eq!(backend.join().unwrap(), ApprovalOutcome::Cancelled);
    assert!(shell.gate().pending().is_none());
    assert!(!shell.is_attached());

    stale_events.publish(IncomingEvent::BalanceChanged(1));

    let client_b = Arc::new(TestClient::with_peers(3));
    let wallet_b = Arc::new(TestWallet::with_balance(2 * coinshell_app::COIN));
    shell.attach(client_b, wallet_b.clone()).unwrap();
    assert!(shell.cycle().is_empty());

    let snapshot = shell.snapshot();
    assert_eq!(snapshot.connection_count, 3);
    assert_eq!(snapshot.balance, 2 * coinshell_app::COIN);
    assert_eq!(
        shell.gate_diagnostics().last.map(|(_, outcome)| outcome),
        Some(ApprovalOutcome::Cancelled)
    );

    let fresh = wallet_b.link().approvals;
    let backend = thread::spawn(move || fresh.request(100));
    let id = loop {
        if let Some(ShellAction::PromptFee { id, .. }) = shell.cycle().first() {
            break *id;
        }
        thread::sleep(Duration::from_millis(1));
    };
    shell.resolve_fee(id, false).unwrap();
    assert_eq!(backend.join().unwrap(), ApprovalOutcome::Declined);
}

#[test]
fn shell_publisher_survives_attach() {
    let notes = Collected::default();
    let mut shell = Shell::new(ShellConfig::default(), Box::new(notes));
    let events = shell.publisher();

    let client = Arc::new(TestClient::with_peers(1));
    shell.attach(client, Arc::new(TestWallet::with_balance(0))).unwrap();
    events.publish(IncomingEvent::BalanceChanged(77));

    assert!(events.is_live());
    assert_eq!(shell.cycle(), vec![ShellAction::Render]);
    assert_eq!(shell.snapshot().balance, 77);

    shell.detach();
    events.publish(IncomingEvent::BalanceChanged(78));
    assert_eq!(shell.cycle(), vec![ShellAction::Render]);
    assert_eq!(shell.snapshot().balance, 78);
}

#[test]
fn dropping_shell_releases_blocked_backend() {
    let (shell, _client, wallet, _notes) = attached(ShellConfig::default());
    let approvals = wallet.link().approvals;

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        done_tx.send(approvals.request_approval(99)).unwrap();
    });
    while shell.gate().pending().is_none() {
        thread::sleep(Duration::from_millis(1));
    }

    drop(shell);
    assert!(!done_rx.recv_timeout(Duration::from_secs(5)).unwrap());
}

#[test]
fn requests_after_shutdown_are_refused_without_blocking() {
    let (mut shell, _client, wallet, _notes) = attached(ShellConfig::default());
    let approvals = wallet.link().approvals;
    let gate = Arc::clone(shell.gate());

    shell.shutdown();

    assert_eq!(gate.request(1), ApprovalOutcome::Closed);
    assert_ne!(approvals.request(1), ApprovalOutcome::Approved);
    assert!(gate.diagnostics().closed);
}

#[test]
fn received_uri_opens_send_page() {
    let (mut shell, client, _wallet, _notes) = attached(ShellConfig::default());
    client.publisher().publish(IncomingEvent::UriReceived(format!("bitcoindark:{ADDRESS}?amount=1.5")));

    let actions = shell.cycle();
    let Some(ShellAction::PrefillSend(request)) = actions.first() else {
        panic!("expected prefill, got {actions:?}");
    };
    assert_eq!(request.address, ADDRESS);
    assert_eq!(request.amount, Some(150_000_000));
    assert_eq!(actions.last(), Some(&ShellAction::Render));
    assert_eq!(shell.active(), &NavigationTarget::SendCoins);
}

#[test]
fn malformed_uri_keeps_page_and_warns() {
    let (mut shell, _client, _wallet, notes) = attached(ShellConfig::default());
    shell.navigate(NavigationTarget::History);

    shell.open_uri("bitcoindark:not-an-address");
    shell.open_uri("litecoin:RNnVqgJ9ZbzJnBqn4kMYjJx7uJ3X4YnfTd");

    assert_eq!(shell.active(), &NavigationTarget::History);
    let notes = notes.0.lock();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n.class == NotificationClass::Warning));
}

#[derive(Clone, Default)]
struct Warnings(Arc<Mutex<usize>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Warnings {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() == tracing::Level::WARN {
            *self.0.lock() += 1;
        }
    }
}

#[test]
fn rejected_uri_is_logged_once() {
    use tracing_subscriber::layer::SubscriberExt;

    let warnings = Warnings::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());

    tracing::subscriber::with_default(subscriber, || {
        let mut shell = Shell::new(ShellConfig::default(), Box::new(LogNotifier));
        let client = Arc::new(TestClient::with_peers(0));
        shell.attach(client, Arc::new(TestWallet::with_balance(0))).unwrap();

        shell.open_uri("bitcoindark:not-an-address");
        assert_eq!(*warnings.0.lock(), 1);

        shell.detach();
        shell.command(ClientCommand::CheckForUpdate.into());
        assert_eq!(*warnings.0.lock(), 2);
    });
}

#[test]
fn incoming_transactions_are_quiet_while_syncing() {
    let (mut shell, client, wallet, notes) = attached(ShellConfig::default());
    let chain = client.publisher();
    let events = wallet.link().events;

    chain.publish(IncomingEvent::BlockHeightChanged { height: 10, total: 500 });
    events.publish(IncomingEvent::TransactionsInserted { start: 0, end: 3 });
    shell.cycle();
    assert!(notes.0.lock().is_empty());

    chain.publish(IncomingEvent::BlockHeightChanged { height: 500, total: 500 });
    events.publish(IncomingEvent::TransactionsInserted { start: 4, end: 4 });
    shell.cycle();

    let notes = notes.0.lock();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].class, NotificationClass::Information);
}

#[test]
fn backend_alert_is_critical() {
    let (mut shell, client, _wallet, notes) = attached(ShellConfig::default());
    client.publisher().publish(IncomingEvent::Alert {
        title: "Wallet".into(),
        message: "disk full".into(),
        modal: true,
    });

    shell.cycle();

    let notes = notes.0.lock();
    assert_eq!(notes[0].class, NotificationClass::Critical);
    assert!(notes[0].modal);
}

#[test]
fn commands_without_models_warn() {
    let mut shell = Shell::new(ShellConfig::default(), Box::new(LogNotifier));
    let actions = shell.command(ClientCommand::ReloadBlockchain.into());

    assert_eq!(actions, vec![ShellAction::Render]);
    assert!(shell.status_message().is_some());
}

#[tokio::test]
async fn subscriber_sees_latest_snapshot() {
    let (mut shell, client, _wallet, _notes) = attached(ShellConfig::default());
    let mut rx = shell.subscribe();

    client.publisher().publish(IncomingEvent::BalanceChanged(1));
    client.publisher().publish(IncomingEvent::BalanceChanged(2));
    shell.cycle();

    tokio::time::timeout(Duration::from_secs(1), rx.changed()).await.unwrap().unwrap();
    assert_eq!(rx.borrow().balance, 2);
}
