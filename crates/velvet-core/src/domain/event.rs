//! Domain events published to the presentation layer.
//!
//! The registry and the session manager emit these after every state change;
//! whatever renders the lobby subscribes through the [`EventBus`](crate::EventBus)
//! and never polls.

use uuid::Uuid;

use super::{Account, SessionState, SourceKind};
use crate::registry::RegistrySnapshot;

#[derive(Debug, Clone)]
pub enum DomainEvent {
    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------
    /// A new refresh cycle started; previous entries stay listed meanwhile
    RegistryRefreshStarted { generation: u64 },

    /// The merged snapshot changed (a batch was folded in or loading finished)
    RegistryChanged { snapshot: RegistrySnapshot },

    /// A source failed to load and contributed nothing
    SourceUnavailable { source: SourceKind, reason: String },

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------
    SessionStateChanged {
        session_id: Uuid,
        connector_id: String,
        state: SessionState,
    },

    /// The user dismissed the selection surface while connecting
    SessionAbandoned {
        session_id: Uuid,
        connector_id: String,
    },

    /// A failed session was dismissed or auto-cleared
    SessionCleared { session_id: Uuid },

    /// The committed account changed (connected or disconnected)
    AccountChanged { account: Option<Account> },
}

impl DomainEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RegistryRefreshStarted { .. } => "registry_refresh_started",
            Self::RegistryChanged { .. } => "registry_changed",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::SessionStateChanged { .. } => "session_state_changed",
            Self::SessionAbandoned { .. } => "session_abandoned",
            Self::SessionCleared { .. } => "session_cleared",
            Self::AccountChanged { .. } => "account_changed",
        }
    }

    /// Session this event concerns, if any
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Self::SessionStateChanged { session_id, .. }
            | Self::SessionAbandoned { session_id, .. }
            | Self::SessionCleared { session_id } => Some(*session_id),
            _ => None,
        }
    }

    pub fn is_registry_event(&self) -> bool {
        matches!(
            self,
            Self::RegistryRefreshStarted { .. }
                | Self::RegistryChanged { .. }
                | Self::SourceUnavailable { .. }
        )
    }
}
