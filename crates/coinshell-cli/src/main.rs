//! Headless wallet shell against a simulated node.
//!
//! # Usage
//!
//! ```bash
//! # Interactive: type `go history`, `open bitcoindark:R...`, `quit`
//! coinshell --seed 7
//!
//! # Scripted run with a backend fee request approved up to 0.001 coins
//! coinshell --cycles 20 --request-fee 0.0005 --max-fee 0.001 < /dev/null
//! ```

use std::{thread, time::Duration};

use clap::Parser;
use coinshell_app::{LogNotifier, Runtime, Shell, ShellConfig, parse_amount};
use coinshell_cli::HeadlessDriver;
use coinshell_harness::{FeePolicy, SimClient, SimNode, SimWallet};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Headless wallet shell
#[derive(Parser, Debug)]
#[command(name = "coinshell")]
#[command(about = "Headless wallet shell driven from stdin against a simulated node")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Refresh interval in milliseconds
    #[arg(long, default_value = "250")]
    refresh_ms: u64,

    /// Interval between simulated backend steps in milliseconds
    #[arg(long, default_value = "100")]
    node_interval_ms: u64,

    /// Seed for the simulated node. Random if omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Quit after this many refresh cycles
    #[arg(long)]
    cycles: Option<usize>,

    /// Payment-request URI scheme
    #[arg(long, default_value = "bitcoindark")]
    scheme: String,

    /// Ticker shown next to amounts
    #[arg(long, default_value = "BTCD")]
    ticker: String,

    /// Notify about incoming transactions while still syncing
    #[arg(long)]
    notify_during_sync: bool,

    /// Approve fees up to this amount without prompting (coins)
    #[arg(long, value_parser = parse_coins)]
    auto_approve: Option<i64>,

    /// Answer fee prompts with yes up to this amount (coins); decline otherwise
    #[arg(long, value_parser = parse_coins)]
    max_fee: Option<i64>,

    /// Have the backend request approval for this fee at startup (coins)
    #[arg(long, value_parser = parse_coins)]
    request_fee: Option<i64>,

    /// Payment request delivered by the backend at startup
    #[arg(long)]
    uri: Option<String>,

    /// Seconds between periodic update checks (0 disables)
    #[arg(long, default_value = "86400")]
    update_check_secs: u64,
}

fn parse_coins(text: &str) -> Result<i64, String> {
    parse_amount(text).ok_or_else(|| format!("invalid amount: {text}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "Coinshell starting");

    let config = ShellConfig {
        uri_scheme: args.scheme,
        ticker: args.ticker.clone(),
        notify_during_sync: args.notify_during_sync,
        auto_approve_fee: args.auto_approve,
        update_check_interval: (args.update_check_secs > 0)
            .then(|| Duration::from_secs(args.update_check_secs)),
        ..ShellConfig::default()
    };

    let client = SimClient::shared();
    let wallet = SimWallet::shared();
    let mut shell = Shell::new(config, Box::new(LogNotifier));
    shell.attach(client.clone(), wallet.clone())?;

    let node = SimNode::new(seed, client.clone(), wallet.clone())
        .spawn(Duration::from_millis(args.node_interval_ms));

    if let Some(uri) = &args.uri {
        client.receive_uri(uri);
    }

    let fee_request = args.request_fee.map(|fee| {
        let wallet = wallet.clone();
        thread::spawn(move || {
            let outcome = wallet.request_fee(fee);
            tracing::info!(?outcome, "Backend fee request finished");
        })
    });

    let policy = args.max_fee.map_or(FeePolicy::Decline, FeePolicy::ApproveUpTo);
    let mut driver =
        HeadlessDriver::stdin(Duration::from_millis(args.refresh_ms), policy, args.ticker);
    if let Some(cycles) = args.cycles {
        driver = driver.with_cycle_limit(cycles);
    }

    let mut runtime = Runtime::new(driver, shell);
    let result = runtime.run().await;

    let steps = node.stop();
    if let Some(handle) = fee_request
        && handle.join().is_err()
    {
        tracing::error!("Fee request thread panicked");
    }
    tracing::info!(steps, "Coinshell stopped");

    Ok(result?)
}
