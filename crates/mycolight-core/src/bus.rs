//! Typed publish/subscribe transport
//!
//! Every subscriber owns a bounded tokio mpsc queue. Publishing never waits:
//! a full queue drops the newest event and bumps a counter, so a slow
//! consumer cannot stall input collaborators or the render loop. Lighting
//! favours fresh state over complete history.

use crate::event::{Event, EventFilter, EventPayload};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

/// Default per-subscriber queue depth
pub const DEFAULT_CAPACITY: usize = 256;

struct Subscriber {
    id: u64,
    filter: EventFilter,
    tx: mpsc::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

struct BusInner {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    dropped: AtomicU64,
    capacity: usize,
}

/// Cloneable handle to the event bus
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

/// Receiving end of a bus subscription
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Event>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Register a consumer for the kinds in `filter`
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let dropped = Arc::new(AtomicU64::new(0));
        self.inner.subscribers.lock().push(Subscriber {
            id,
            filter,
            tx,
            dropped: dropped.clone(),
        });
        tracing::debug!("Event bus subscriber {} registered", id);
        Subscription { id, rx, dropped }
    }

    /// Enqueue `event` for every matching subscriber
    ///
    /// Returns the number of subscribers that accepted the event.
    pub fn publish(&self, event: Event) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        let mut subscribers = self.inner.subscribers.lock();

        subscribers.retain(|sub| {
            if !sub.filter.contains(kind) {
                return true;
            }
            match sub.tx.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    sub.dropped.fetch_add(1, Ordering::Relaxed);
                    self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("Subscriber {} queue full, dropping {:?}", sub.id, kind);
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("Subscriber {} closed, removing", sub.id);
                    false
                }
            }
        });

        delivered
    }

    /// Stamp `payload` with the current time and publish it
    pub fn emit(&self, payload: EventPayload) -> usize {
        self.publish(Event::new(payload))
    }

    /// Detach every subscriber; their receivers drain and then end
    pub fn close(&self) {
        let mut subscribers = self.inner.subscribers.lock();
        tracing::debug!("Closing event bus ({} subscribers)", subscribers.len());
        subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Total events dropped across all subscribers
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Subscription {
    /// Wait for the next event; `None` once the bus is closed and drained
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next queued event without waiting
    pub fn try_recv(&mut self) -> Option<Event> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Events dropped because this subscriber's queue was full
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}
