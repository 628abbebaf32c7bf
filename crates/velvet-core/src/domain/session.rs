use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Account, ConnectorDescriptor};

/// Connection session state
///
/// `Connected` and `Failed` are terminal: a session never leaves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connecting,
    Connected(Account),
    Failed(String),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected(_) => "connected",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Connected(_) | Self::Failed(_))
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            Self::Connected(account) => Some(account),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// The bounded, single-use process of turning a descriptor into a connected account.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    pub id: Uuid,
    descriptor: ConnectorDescriptor,
    state: SessionState,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ConnectionSession {
    pub fn new(descriptor: ConnectorDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            descriptor,
            state: SessionState::Idle,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn descriptor(&self) -> &ConnectorDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// `Idle -> Connecting`. Returns false when the session already left `Idle`.
    pub(crate) fn begin(&mut self) -> bool {
        if self.state != SessionState::Idle {
            return false;
        }
        self.state = SessionState::Connecting;
        self.started_at = Some(Utc::now());
        true
    }

    /// `Connecting -> Connected | Failed`. Returns false unless the session is connecting.
    pub(crate) fn finish(&mut self, outcome: SessionState) -> bool {
        if !self.state.is_connecting() || !outcome.is_terminal() {
            return false;
        }
        self.state = outcome;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Inline failure view: descriptor name plus reason, while `Failed`.
    pub fn failure(&self) -> Option<SessionFailure> {
        self.state.failure_reason().map(|reason| SessionFailure {
            connector_id: self.descriptor.id.clone(),
            connector_name: self.descriptor.name.clone(),
            reason: reason.to_string(),
        })
    }
}

/// A rejected connection as the selection UI shows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub connector_id: String,
    pub connector_name: String,
    pub reason: String,
}
