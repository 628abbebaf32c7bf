//! Connector registry
//!
//! Aggregates every [`ConnectorSource`] into one [`RegistrySnapshot`]. A refresh
//! loads all sources concurrently and folds each batch in the moment it arrives,
//! so injected wallets show up before the network-backed sources resolve.
//!
//! Sources are listed in priority order; that order decides where a batch lands
//! in the snapshot, independent of when it arrives. During a re-refresh, a
//! source's entries from the previous cycle stay listed until its new batch lands.

mod snapshot;

pub use snapshot::{RegistrySnapshot, RegistryStatus};

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{ConnectorDescriptor, DomainEvent};
use crate::event_bus::EventSender;
use crate::source::ConnectorSource;

pub struct ConnectorRegistry {
    /// Sources in priority order
    sources: Vec<Arc<dyn ConnectorSource>>,
    snapshot: RwLock<RegistrySnapshot>,
    events: Option<EventSender>,
}

impl ConnectorRegistry {
    pub fn new(sources: Vec<Arc<dyn ConnectorSource>>) -> Self {
        let snapshot = RegistrySnapshot::start_cycle(0, sources.len());
        Self {
            sources,
            snapshot: RwLock::new(snapshot),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn emit(&self, event: DomainEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    /// Start a new cycle and load every source concurrently.
    ///
    /// Entries already listed stay visible and selectable while the new cycle runs.
    ///
    /// The snapshot is published after each batch is folded. Resolves with the
    /// snapshot once all sources have settled, or early if a newer refresh took over.
    pub async fn refresh(&self) -> RegistrySnapshot {
        let generation = {
            let mut snapshot = self.snapshot.write().await;
            let generation = snapshot.generation() + 1;
            *snapshot = snapshot.next_cycle(generation);
            generation
        };
        info!(generation, sources = self.sources.len(), "[Registry] Refresh started");
        self.emit(DomainEvent::RegistryRefreshStarted { generation });
        self.emit(DomainEvent::RegistryChanged {
            snapshot: self.snapshot().await,
        });

        let mut pending: FuturesUnordered<_> = self
            .sources
            .iter()
            .enumerate()
            .map(|(priority, source)| async move {
                (priority, source.kind(), source.load().await)
            })
            .collect();

        while let Some((priority, kind, result)) = pending.next().await {
            let batch = match result {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(source = %kind, error = %e, "[Registry] Source unavailable");
                    self.emit(DomainEvent::SourceUnavailable {
                        source: kind,
                        reason: e.to_string(),
                    });
                    Vec::new()
                }
            };

            let updated = {
                let mut snapshot = self.snapshot.write().await;
                if snapshot.generation() != generation {
                    debug!(generation, "[Registry] Refresh superseded, discarding batch");
                    return snapshot.clone();
                }
                let received = batch.len();
                let kept = snapshot.fold(priority, batch);
                snapshot.source_resolved();
                debug!(source = %kind, received, kept, "[Registry] Folded batch");
                snapshot.clone()
            };

            if !updated.refreshing() {
                info!(
                    generation,
                    connectors = updated.len(),
                    status = ?updated.status(),
                    "[Registry] All sources resolved"
                );
            }
            self.emit(DomainEvent::RegistryChanged { snapshot: updated });
        }

        self.snapshot().await
    }

    /// Run a refresh in the background; the snapshot updates as sources resolve.
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<RegistrySnapshot> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.refresh().await })
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot.read().await.clone()
    }

    /// Entries whose name contains `query` (case-insensitive), in registry order
    pub async fn filter(&self, query: &str) -> Vec<ConnectorDescriptor> {
        self.snapshot.read().await.filter(query)
    }

    pub async fn get(&self, id: &str) -> Option<ConnectorDescriptor> {
        self.snapshot.read().await.get(id).cloned()
    }

    /// Descriptor for `id` only if it is available; selecting anything else is a no-op
    pub async fn select(&self, id: &str) -> Option<ConnectorDescriptor> {
        self.snapshot.read().await.selectable(id).cloned()
    }

    pub async fn status(&self) -> RegistryStatus {
        self.snapshot.read().await.status()
    }
}
