use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ConnectorDescriptor, ConnectorView, Theme};

/// What the selection surface should show overall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryStatus {
    /// Sources have not all resolved at least once yet
    Loading,
    /// At least one selectable connector
    Ready,
    /// Everything resolved, but nothing can be selected (empty-state message)
    NoConnectorsAvailable,
}

/// Descriptors kept sorted by source priority, with the priority of each alongside.
#[derive(Debug, Clone, Default)]
struct Slotted {
    entries: Vec<ConnectorDescriptor>,
    priorities: Vec<usize>,
}

impl Slotted {
    fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|d| d.id == id)
    }

    /// Place after everything of equal or higher priority
    fn insert(&mut self, priority: usize, descriptor: ConnectorDescriptor) {
        let at = self.priorities.partition_point(|p| *p <= priority);
        self.entries.insert(at, descriptor);
        self.priorities.insert(at, priority);
    }
}

/// Merged, deduplicated view of every source's descriptors.
///
/// Entries are ordered by source priority, then by order within the source.
/// Ids are unique: the first descriptor to arrive for an id wins.
///
/// A refresh stages the new cycle's batches separately. Until a source has
/// resolved again, its entries from the previous cycle stay visible.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    /// What the presentation sees
    visible: Slotted,
    /// Batches folded in during the current cycle
    staged: Slotted,
    /// Previous cycle's entries, shown for sources not yet resolved again
    carried: Slotted,
    /// Per source slot: resolved during the current cycle
    resolved: Vec<bool>,
    generation: u64,
    pending: usize,
    /// Every source has resolved at least once
    settled: bool,
}

impl RegistrySnapshot {
    pub(crate) fn start_cycle(generation: u64, sources: usize) -> Self {
        Self {
            resolved: vec![false; sources],
            generation,
            pending: sources,
            settled: sources == 0,
            ..Self::default()
        }
    }

    /// Begin the next cycle, carrying over what is currently visible.
    pub(crate) fn next_cycle(&self, generation: u64) -> Self {
        let sources = self.resolved.len();
        Self {
            visible: self.visible.clone(),
            staged: Slotted::default(),
            carried: self.visible.clone(),
            resolved: vec![false; sources],
            generation,
            pending: sources,
            settled: self.settled || sources == 0,
        }
    }

    /// Fold one source's batch in, replacing whatever that source showed before.
    /// Returns how many descriptors were kept.
    pub(crate) fn fold(&mut self, priority: usize, batch: Vec<ConnectorDescriptor>) -> usize {
        let mut kept = 0;
        for descriptor in batch {
            if self.staged.contains(&descriptor.id) {
                debug!(connector_id = %descriptor.id, "[Registry] Dropping duplicate connector");
                continue;
            }
            self.staged.insert(priority, descriptor);
            kept += 1;
        }
        if let Some(resolved) = self.resolved.get_mut(priority) {
            *resolved = true;
        }
        self.rebuild_visible();
        kept
    }

    pub(crate) fn source_resolved(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 {
            self.settled = true;
        }
    }

    fn rebuild_visible(&mut self) {
        let mut visible = self.staged.clone();
        for (descriptor, priority) in self.carried.entries.iter().zip(&self.carried.priorities) {
            let stale = self.resolved.get(*priority).copied().unwrap_or(true);
            if !stale && !visible.contains(&descriptor.id) {
                visible.insert(*priority, descriptor.clone());
            }
        }
        self.visible = visible;
    }

    pub fn entries(&self) -> &[ConnectorDescriptor] {
        &self.visible.entries
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True until every source has resolved at least once. Later refreshes
    /// never turn it back on.
    pub fn loading(&self) -> bool {
        !self.settled
    }

    /// True while some source of the current cycle has not resolved
    pub fn refreshing(&self) -> bool {
        self.pending > 0
    }

    pub fn len(&self) -> usize {
        self.visible.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&ConnectorDescriptor> {
        self.visible.entries.iter().find(|d| d.id == id)
    }

    /// The descriptor for `id` if it may be selected right now
    pub fn selectable(&self, id: &str) -> Option<&ConnectorDescriptor> {
        self.get(id).filter(|d| d.is_available())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.visible.entries.iter().map(|d| d.id.as_str()).collect()
    }

    /// Entries whose name contains `query`, ignoring case. An empty query keeps all.
    pub fn filter(&self, query: &str) -> Vec<ConnectorDescriptor> {
        if query.is_empty() {
            return self.visible.entries.clone();
        }
        let query_lower = query.to_lowercase();
        self.visible
            .entries
            .iter()
            .filter(|d| d.name_matches(&query_lower))
            .cloned()
            .collect()
    }

    pub fn status(&self) -> RegistryStatus {
        if self.loading() {
            RegistryStatus::Loading
        } else if self.visible.entries.iter().any(|d| d.is_available()) {
            RegistryStatus::Ready
        } else {
            RegistryStatus::NoConnectorsAvailable
        }
    }

    pub fn views(&self, theme: Theme) -> Vec<ConnectorView> {
        self.visible.entries.iter().map(|d| d.view(theme)).collect()
    }
}
