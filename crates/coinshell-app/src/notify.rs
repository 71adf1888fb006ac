//! Backend-to-consumer notification bridge.
//!
//! The [`NotificationBridge`] is the only path by which backend threads change
//! what the UI shows.
//!
//! # Responsibilities
//!
//! - Hands out cloneable [`EventPublisher`]s that backend threads call without
//!   ever blocking or failing.
//! - Preserves publish order per producer: the queue is a single FIFO channel.
//! - On [`NotificationBridge::drain`], folds every queued event into a fresh
//!   [`StateSnapshot`] and publishes it whole through a watch channel.
//! - Coalesces re-render: one drain reports at most one render regardless of
//!   how many events it applied.
//! - Drops events stamped with a superseded binding [`Generation`], so a
//!   re-attached shell never shows state from the previous models.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use tokio::sync::{mpsc, watch};

use crate::{IncomingEvent, StateSnapshot};

/// Identifies one model binding.
///
/// Incremented on every attach. Events and approval requests carry the
/// generation they were issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Generation in effect before any model is attached.
    pub const INITIAL: Self = Self(0);

    /// The generation following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-state consequence of a drained event, in publish order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// New transaction rows `start..=end`.
    TransactionsInserted {
        /// First inserted row.
        start: usize,
        /// Last inserted row (inclusive).
        end: usize,
        /// Whether the chain was still catching up when the rows arrived.
        syncing: bool,
    },
    /// Raw payment-request identifier to hand to the router.
    UriReceived(String),
    /// Backend alert to surface as a notification.
    Alert {
        /// Short title.
        title: String,
        /// Message body.
        message: String,
        /// Backend asked for a modal presentation.
        modal: bool,
    },
}

/// Result of one [`NotificationBridge::drain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drained {
    /// Events applied from the current generation.
    pub applied: usize,
    /// Events discarded because their generation was superseded.
    pub discarded: usize,
    /// Whether the consumer should re-render. Set at most once per drain.
    pub render: bool,
    /// Side effects in the order their events were published.
    pub effects: Vec<Effect>,
}

struct Envelope {
    generation: Option<Generation>,
    event: IncomingEvent,
}

struct Shared {
    closed: AtomicBool,
    backlog: AtomicUsize,
    high_watermark: usize,
}

/// Backend-side handle for publishing [`IncomingEvent`]s.
///
/// Cheap to clone and safe to move to any thread. Publishing never blocks and
/// never fails: after the bridge closes, or after the binding that issued this
/// publisher is revoked, events are discarded.
///
/// Publishers issued by a model binding are scoped to that binding's
/// generation. Unscoped publishers follow whichever generation is current
/// when their events are drained.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<Envelope>,
    shared: Arc<Shared>,
    generation: Option<Generation>,
    live: Arc<AtomicBool>,
}

impl EventPublisher {
    /// Enqueue an event for the consumer.
    pub fn publish(&self, event: IncomingEvent) {
        if !self.is_live() {
            tracing::trace!(kind = event.kind(), "Dropping event from inactive publisher");
            return;
        }

        let depth = self.shared.backlog.fetch_add(1, Ordering::AcqRel) + 1;
        let envelope = Envelope { generation: self.generation, event };
        if let Err(mpsc::error::SendError(envelope)) = self.tx.send(envelope) {
            self.shared.backlog.fetch_sub(1, Ordering::AcqRel);
            tracing::trace!(kind = envelope.event.kind(), "Dropping event after bridge closed");
            return;
        }

        if depth == self.shared.high_watermark {
            tracing::warn!(depth, "Event backlog reached high watermark");
        }
    }

    /// Whether published events can still reach the consumer.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire) && !self.shared.closed.load(Ordering::Acquire)
    }

    /// Generation this publisher stamps on its events, `None` if unscoped.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("generation", &self.generation)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Consumer side of the notification queue and owner of the current snapshot.
pub struct NotificationBridge {
    rx: mpsc::UnboundedReceiver<Envelope>,
    tx: mpsc::UnboundedSender<Envelope>,
    shared: Arc<Shared>,
    snapshot: watch::Sender<StateSnapshot>,
    generation: Generation,
}

impl NotificationBridge {
    /// Create a bridge that warns once the backlog reaches `high_watermark`.
    pub fn new(high_watermark: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(StateSnapshot::default());
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            backlog: AtomicUsize::new(0),
            high_watermark: high_watermark.max(1),
        });
        Self { rx, tx, shared, snapshot, generation: Generation::INITIAL }
    }

    /// Unscoped publisher that is never revoked.
    ///
    /// Its events are applied under whatever generation is current at drain
    /// time, so it keeps working across attach and detach.
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
            generation: None,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Publisher for the current generation, live while `live` is set.
    pub(crate) fn scoped_publisher(&self, live: Arc<AtomicBool>) -> EventPublisher {
        EventPublisher {
            tx: self.tx.clone(),
            shared: Arc::clone(&self.shared),
            generation: Some(self.generation),
            live,
        }
    }

    /// Apply every event queued at the time of the call.
    ///
    /// Events published while the drain runs are left for the next call, so a
    /// busy backend cannot keep the consumer in this loop.
    pub fn drain(&mut self) -> Drained {
        let mut state = *self.snapshot.borrow();
        let mut drained = Drained::default();

        for _ in 0..self.rx.len() {
            let Ok(Envelope { generation, event }) = self.rx.try_recv() else {
                break;
            };
            self.shared.backlog.fetch_sub(1, Ordering::AcqRel);

            if generation.is_some_and(|generation| generation != self.generation) {
                drained.discarded += 1;
                continue;
            }

            if let IncomingEvent::BlockHeightChanged { height, .. } = event
                && height < state.block_height
            {
                tracing::debug!(from = state.block_height, to = height, "Block height decreased");
            }

            tracing::trace!(kind = event.kind(), "Applying event");
            state = state.apply(&event);
            drained.applied += 1;

            match event {
                IncomingEvent::TransactionsInserted { start, end } => {
                    drained.effects.push(Effect::TransactionsInserted {
                        start,
                        end,
                        syncing: state.is_syncing(),
                    });
                },
                IncomingEvent::UriReceived(uri) => drained.effects.push(Effect::UriReceived(uri)),
                IncomingEvent::Alert { title, message, modal } => {
                    drained.effects.push(Effect::Alert { title, message, modal });
                },
                _ => {},
            }
        }

        if drained.discarded > 0 {
            tracing::debug!(
                discarded = drained.discarded,
                generation = %self.generation,
                "Discarded events from superseded binding"
            );
        }

        if drained.applied > 0 {
            self.snapshot.send_replace(state);
            drained.render = true;
        }

        drained
    }

    /// Move to `generation`.
    ///
    /// Publishers issued afterwards stamp the new generation; events still
    /// queued from earlier generations are discarded by the next drain.
    pub(crate) fn advance(&mut self, generation: Generation) {
        self.generation = generation;
    }

    /// Replace the snapshot wholesale.
    pub(crate) fn replace(&mut self, snapshot: StateSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> StateSnapshot {
        *self.snapshot.borrow()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.snapshot.subscribe()
    }

    /// Generation whose events are currently applied.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Events published but not yet drained.
    pub fn backlog(&self) -> usize {
        self.shared.backlog.load(Ordering::Acquire)
    }

    /// Stop accepting events.
    ///
    /// Later publishes are discarded without error. Events already queued can
    /// still be drained, so the final snapshot stays inspectable.
    pub fn close(&mut self) {
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(backlog = self.backlog(), "Notification bridge closed");
        }
        self.rx.close();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for NotificationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBridge")
            .field("generation", &self.generation)
            .field("backlog", &self.backlog())
            .field("closed", &self.is_closed())
            .finish()
    }
}
