//! Event bus broadcasting committed change events to subscribers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::types::{Event, EventMessage};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let room_code = message.event.room_code().map(String::from);

        match self.sender.send(message) {
            Ok(count) => {
                debug!(event_type, ?room_code, subscribers = count, "Event published");
            }
            Err(_) => {
                debug!(event_type, ?room_code, "Event published (no subscribers)");
            }
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(total = count, "New event subscriber");

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

/// Outcome of a non-blocking receive
#[derive(Debug)]
pub enum TryRecv {
    Message(EventMessage),
    Empty,
    /// The subscriber fell behind and missed events; readers should rebuild.
    Lagged(u64),
    Closed,
}

impl EventSubscriber {
    /// Waits for the next event. Lag is logged and skipped; callers that must
    /// not miss events use [`EventSubscriber::try_recv`] and rebuild on lag.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Like [`EventSubscriber::recv`], but reports lag as `Err(missed)` so
    /// the caller can resynchronise.
    pub async fn recv_or_lag(&mut self) -> Option<Result<EventMessage, u64>> {
        match self.receiver.recv().await {
            Ok(msg) => Some(Ok(msg)),
            Err(broadcast::error::RecvError::Lagged(count)) => Some(Err(count)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    pub fn try_recv(&mut self) -> TryRecv {
        match self.receiver.try_recv() {
            Ok(msg) => TryRecv::Message(msg),
            Err(broadcast::error::TryRecvError::Empty) => TryRecv::Empty,
            Err(broadcast::error::TryRecvError::Lagged(count)) => TryRecv::Lagged(count),
            Err(broadcast::error::TryRecvError::Closed) => TryRecv::Closed,
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        debug!(remaining = prev.saturating_sub(1), "Event subscriber dropped");
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
