//! Connection session manager - the account context of the process.
//!
//! Drives one [`ConnectionSession`] at a time through `Idle -> Connecting ->
//! Connected | Failed` and owns the committed account.
//!
//! # Guards
//!
//! - An account is already connected → selection ignored
//! - Another session is connecting → selection ignored
//! - Unknown or unavailable connector → selection ignored
//!
//! # Cancellation
//!
//! [`SessionManager::cancel`] abandons a connecting session. The handshake keeps
//! running; when it eventually resolves its result is discarded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    Account, ConnectionSession, Connector, DomainEvent, SessionConfig, SessionFailure,
    SessionState,
};
use crate::error::ConnectorError;
use crate::event_bus::EventSender;
use crate::registry::ConnectorRegistry;

/// Why a selection did not start a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    AlreadyConnected,
    AlreadyConnecting,
    UnknownConnector,
    Unavailable,
}

/// Result of a `connect` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// No session was started; nothing changed
    Ignored(IgnoreReason),
    Connected(Account),
    Failed(SessionFailure),
    /// The session was cancelled while connecting; its result was dropped
    Abandoned,
}

#[derive(Default)]
struct AccountContext {
    account: Option<Account>,
    session: Option<ConnectionSession>,
}

pub struct SessionManager {
    registry: Arc<ConnectorRegistry>,
    config: SessionConfig,
    context: Arc<Mutex<AccountContext>>,
    events: Option<EventSender>,
}

impl SessionManager {
    pub fn new(registry: Arc<ConnectorRegistry>, config: SessionConfig) -> Self {
        Self {
            registry,
            config,
            context: Arc::new(Mutex::new(AccountContext::default())),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn emit(&self, event: DomainEvent) {
        emit(self.events.as_ref(), event);
    }

    /// Select `connector_id` and run its handshake to a terminal state.
    ///
    /// The handshake runs on its own task. Dropping the returned future does not
    /// strand the session in `Connecting`; it still settles and is published.
    pub async fn connect(&self, connector_id: &str) -> ConnectOutcome {
        let (session_id, descriptor) = {
            let mut context = self.context.lock().await;

            if context.account.is_some() {
                debug!(connector_id, "[Session] Already connected, ignoring selection");
                return ConnectOutcome::Ignored(IgnoreReason::AlreadyConnected);
            }
            if context
                .session
                .as_ref()
                .is_some_and(|s| s.state().is_connecting())
            {
                debug!(connector_id, "[Session] Another session is connecting, ignoring selection");
                return ConnectOutcome::Ignored(IgnoreReason::AlreadyConnecting);
            }

            let Some(descriptor) = self.registry.get(connector_id).await else {
                debug!(connector_id, "[Session] Unknown connector");
                return ConnectOutcome::Ignored(IgnoreReason::UnknownConnector);
            };
            if !descriptor.is_available() {
                debug!(connector_id, "[Session] Connector unavailable, ignoring selection");
                return ConnectOutcome::Ignored(IgnoreReason::Unavailable);
            }

            let mut session = ConnectionSession::new(descriptor.clone());
            publish_state(self.events.as_ref(), &session);
            session.begin();
            publish_state(self.events.as_ref(), &session);

            info!(session_id = %session.id, connector_id, "[Session] Connecting");
            let session_id = session.id;
            context.session = Some(session);
            (session_id, descriptor)
        };

        let handshake = Handshake {
            context: Arc::clone(&self.context),
            events: self.events.clone(),
            config: self.config.clone(),
            session_id,
            connector_id: connector_id.to_string(),
        };
        match tokio::spawn(handshake.run(descriptor.connector())).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%session_id, connector_id, error = %e, "[Session] Handshake task failed");
                ConnectOutcome::Abandoned
            }
        }
    }

    /// Abandon a connecting session. Returns false if nothing was connecting.
    pub async fn cancel(&self) -> bool {
        let mut context = self.context.lock().await;
        let connecting = context
            .session
            .as_ref()
            .is_some_and(|s| s.state().is_connecting());
        if !connecting {
            return false;
        }
        let Some(session) = context.session.take() else {
            return false;
        };
        info!(session_id = %session.id, connector_id = %session.descriptor().id, "[Session] Abandoned");
        self.emit(DomainEvent::SessionAbandoned {
            session_id: session.id,
            connector_id: session.descriptor().id.clone(),
        });
        true
    }

    /// Dismiss a failed session. Returns false if there was none.
    pub async fn dismiss(&self) -> bool {
        let mut context = self.context.lock().await;
        let Some(session_id) = context.session.as_ref().map(|s| s.id) else {
            return false;
        };
        if !clear_failed(&mut context, session_id) {
            return false;
        }
        self.emit(DomainEvent::SessionCleared { session_id });
        true
    }

    /// Drop the committed account so a new session may start
    pub async fn disconnect(&self) -> Option<Account> {
        let mut context = self.context.lock().await;
        let account = context.account.take()?;
        info!(address = %account.address, "[Session] Disconnected");
        self.emit(DomainEvent::AccountChanged { account: None });
        Some(account)
    }

    pub async fn current_account(&self) -> Option<Account> {
        self.context.lock().await.account.clone()
    }

    /// Current state as the selection surface sees it.
    ///
    /// A committed account reads as `Connected`; no session at all reads as `Idle`.
    pub async fn state(&self) -> SessionState {
        let context = self.context.lock().await;
        match (&context.session, &context.account) {
            (Some(session), _) => session.state().clone(),
            (None, Some(account)) => SessionState::Connected(account.clone()),
            (None, None) => SessionState::Idle,
        }
    }

    pub async fn session(&self) -> Option<ConnectionSession> {
        self.context.lock().await.session.clone()
    }

    pub async fn failure(&self) -> Option<SessionFailure> {
        self.context
            .lock()
            .await
            .session
            .as_ref()
            .and_then(|s| s.failure())
    }
}

fn emit(events: Option<&EventSender>, event: DomainEvent) {
    if let Some(events) = events {
        events.emit(event);
    }
}

fn publish_state(events: Option<&EventSender>, session: &ConnectionSession) {
    debug!(
        session_id = %session.id,
        connector_id = %session.descriptor().id,
        state = session.state().as_str(),
        "[Session] State changed"
    );
    emit(
        events,
        DomainEvent::SessionStateChanged {
            session_id: session.id,
            connector_id: session.descriptor().id.clone(),
            state: session.state().clone(),
        },
    );
}

/// One connecting session's handshake, detached from the caller
struct Handshake {
    context: Arc<Mutex<AccountContext>>,
    events: Option<EventSender>,
    config: SessionConfig,
    session_id: Uuid,
    connector_id: String,
}

impl Handshake {
    async fn run(self, connector: Arc<dyn Connector>) -> ConnectOutcome {
        if let Some(delay) = self.config.connect_delay() {
            tokio::time::sleep(delay).await;
        }

        let result = match self.config.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, connector.connect())
                .await
                .unwrap_or(Err(ConnectorError::Timeout(limit))),
            None => connector.connect().await,
        };

        let session_id = self.session_id;
        let connector_id = self.connector_id.as_str();
        let mut context = self.context.lock().await;
        let Some(session) = context.session.as_mut().filter(|s| s.id == session_id) else {
            info!(%session_id, connector_id, "[Session] Result arrived for abandoned session, discarding");
            return ConnectOutcome::Abandoned;
        };

        match result {
            Ok(account) => {
                session.finish(SessionState::Connected(account.clone()));
                publish_state(self.events.as_ref(), session);
                info!(%session_id, address = %account.address, "[Session] Connected");

                // Committed to the account context; the session itself is done.
                context.session = None;
                context.account = Some(account.clone());
                emit(
                    self.events.as_ref(),
                    DomainEvent::AccountChanged {
                        account: Some(account.clone()),
                    },
                );
                ConnectOutcome::Connected(account)
            }
            Err(e) => {
                session.finish(SessionState::Failed(e.to_string()));
                publish_state(self.events.as_ref(), session);
                warn!(%session_id, connector_id, error = %e, "[Session] Connection rejected");

                let failure = session.failure();
                drop(context);
                self.schedule_auto_clear();
                match failure {
                    Some(failure) => ConnectOutcome::Failed(failure),
                    None => ConnectOutcome::Abandoned,
                }
            }
        }
    }

    fn schedule_auto_clear(self) {
        let Some(after) = self.config.auto_clear_after() else {
            return;
        };
        let session_id = self.session_id;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let mut context = self.context.lock().await;
            if clear_failed(&mut context, session_id) {
                debug!(%session_id, "[Session] Failed session auto-cleared");
                emit(self.events.as_ref(), DomainEvent::SessionCleared { session_id });
            }
        });
    }
}

fn clear_failed(context: &mut AccountContext, session_id: Uuid) -> bool {
    let is_failed = context
        .session
        .as_ref()
        .is_some_and(|s| s.id == session_id && s.state().failure_reason().is_some());
    if is_failed {
        context.session = None;
    }
    is_failed
}
