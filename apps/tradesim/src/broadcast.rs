use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tradesim_domain::events::desk_event::DeskEvent;
use tracing::debug;

pub const MARKET_DATA_CHANNEL: &str = "market-data";
pub const ALERTS_CHANNEL: &str = "alerts";

/// Handle returned to a subscriber. Dropping the receiver is a valid way to
/// leave; the next publish on the channel prunes the dead sender.
pub struct Subscription {
    pub id: u64,
    pub channel: String,
    pub rx: UnboundedReceiver<DeskEvent>,
}

/// Named-channel fan-out. Every subscriber gets its own unbounded queue, so
/// one slow or departed consumer never blocks the publisher or its peers.
#[derive(Default)]
pub struct Broadcaster {
    channels: Mutex<HashMap<String, HashMap<u64, UnboundedSender<DeskEvent>>>>,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, channel: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.channels
            .lock()
            .entry(channel.to_string())
            .or_default()
            .insert(id, tx);
        debug!(channel, subscriber_id = id, "subscriber joined");
        Subscription {
            id,
            channel: channel.to_string(),
            rx,
        }
    }

    /// Idempotent; unsubscribing an unknown id is a no-op.
    pub fn unsubscribe(&self, channel: &str, id: u64) {
        let mut channels = self.channels.lock();
        if let Some(subscribers) = channels.get_mut(channel) {
            if subscribers.remove(&id).is_some() {
                debug!(channel, subscriber_id = id, "subscriber left");
            }
            if subscribers.is_empty() {
                channels.remove(channel);
            }
        }
    }

    /// Delivers the event to every live subscriber on the channel and prunes
    /// the ones whose receiver is gone. Returns the delivered count.
    pub fn publish(&self, channel: &str, event: &DeskEvent) -> usize {
        let mut channels = self.channels.lock();
        let Some(subscribers) = channels.get_mut(channel) else {
            return 0;
        };

        let mut dead = Vec::new();
        let mut delivered = 0usize;
        for (id, tx) in subscribers.iter() {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }
        for id in dead {
            subscribers.remove(&id);
            debug!(channel, subscriber_id = id, "pruned dead subscriber");
        }
        if subscribers.is_empty() {
            channels.remove(channel);
        }

        metrics::counter!("broadcast_events_delivered_total").increment(delivered as u64);
        delivered
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .get(channel)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}
