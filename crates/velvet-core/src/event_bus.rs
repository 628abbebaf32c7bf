//! Event Bus - delivers registry and session changes to the presentation layer
//!
//! ```text
//!  ConnectorRegistry ──┐                      ┌── lobby view (registry list)
//!                      ├─► broadcast channel ─┤
//!  SessionManager  ────┘                      └── selection modal (session state)
//! ```
//!
//! Every subscriber sees every event emitted after it subscribed. Emitting with
//! nobody listening is normal (headless refreshes, tests) and is not an error.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::DomainEvent;

const DEFAULT_CAPACITY: usize = 128;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Handle for components that publish events
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct EventSender {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventSender {
    /// Publish an event; returns how many subscribers received it.
    pub fn emit(&self, event: DomainEvent) -> usize {
        let event_type = event.type_name();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event_type, receivers, "[EventBus] Emitted");
                receivers
            }
            Err(_) => {
                debug!(event_type, "[EventBus] Emitted with no subscribers");
                0
            }
        }
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    /// Next event, or `None` once every sender is gone.
    ///
    /// A lagging receiver skips what it missed and keeps going; the presentation
    /// only needs the latest snapshot and session state.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "[EventBus] Receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "[EventBus] Receiver lagged on try_recv");
                }
                Err(_) => return None,
            }
        }
    }

    /// Drain everything currently queued without waiting
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
