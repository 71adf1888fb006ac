//! Seeded backend activity.
//!
//! A [`SimNode`] mutates a [`SimClient`]/[`SimWallet`] pair with random but
//! reproducible steps: peers come and go, blocks arrive, coins are received.
//! Run it inline with [`SimNode::step`] for deterministic tests, or on a
//! background thread with [`SimNode::spawn`] to exercise cross-thread hand-off.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use coinshell_app::{COIN, ClientModel, WalletModel};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{SimClient, SimWallet};

/// One backend mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStep {
    /// Peer count changed.
    Peers(u32),
    /// New blocks arrived.
    Blocks(u64),
    /// Network height estimate moved.
    NetworkHeight(u64),
    /// Coins received in `count` transactions.
    Received {
        /// Amount in base units.
        amount: i64,
        /// Number of transactions.
        count: usize,
    },
}

/// Random backend driver for a simulated client and wallet.
pub struct SimNode {
    client: Arc<SimClient>,
    wallet: Arc<SimWallet>,
    rng: ChaCha8Rng,
}

impl SimNode {
    /// Create a node whose steps are fully determined by `seed`.
    pub fn new(seed: u64, client: Arc<SimClient>, wallet: Arc<SimWallet>) -> Self {
        Self { client, wallet, rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Apply one random step and return it.
    pub fn step(&mut self) -> NodeStep {
        let step = match self.rng.gen_range(0..10) {
            0..=1 => NodeStep::Peers(self.rng.gen_range(0..=16)),
            2..=6 => NodeStep::Blocks(self.rng.gen_range(1..=5)),
            7 => NodeStep::NetworkHeight(self.rng.gen_range(1..=20)),
            _ => NodeStep::Received {
                amount: self.rng.gen_range(1..=10) * COIN / 10,
                count: self.rng.gen_range(1..=3),
            },
        };

        match step {
            NodeStep::Peers(count) => self.client.set_connections(count),
            NodeStep::Blocks(count) => {
                let (height, total) = self.client.block_height();
                let height = height + count;
                self.client.set_height(height, total.max(height));
            },
            NodeStep::NetworkHeight(ahead) => {
                let (height, total) = self.client.block_height();
                self.client.set_height(height, total.max(height) + ahead);
            },
            NodeStep::Received { amount, count } => {
                self.wallet.set_balance(self.wallet.balance().saturating_add(amount));
                self.wallet.receive_transactions(count);
            },
        }

        tracing::trace!(?step, "Sim node step");
        step
    }

    /// Run steps on a background thread every `interval` until stopped.
    pub fn spawn(mut self, interval: Duration) -> NodeHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::spawn(move || {
            let mut steps = 0usize;
            while !flag.load(Ordering::Acquire) {
                self.step();
                steps += 1;
                thread::sleep(interval);
            }
            steps
        });
        NodeHandle { stop, thread: Some(thread) }
    }
}

/// Handle to a node running on a background thread.
pub struct NodeHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<usize>>,
}

impl NodeHandle {
    /// Stop the node and return the number of steps it ran.
    pub fn stop(mut self) -> usize {
        self.halt()
    }

    fn halt(&mut self) -> usize {
        self.stop.store(true, Ordering::Release);
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(steps)) => steps,
            Some(Err(_)) => {
                tracing::error!("Sim node thread panicked");
                0
            },
            None => 0,
        }
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.halt();
    }
}
