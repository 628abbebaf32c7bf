//! Connection session tests
//!
//! The selection-to-account lifecycle driven through a resolved registry:
//! state sequences, the single-session guards, cancellation and failure handling.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tests::events::{collect_events, session_states};
use tests::fixtures::{descriptor, unavailable};
use tests::{init_test_tracing, MockConnector, MockSource};
use velvet_core::{
    Account, ConnectOutcome, Connector, ConnectorDescriptor, ConnectorRegistry, ConnectorSource,
    DomainEvent, EventBus, EventReceiver, FailurePolicy, IgnoreReason, SessionConfig,
    SessionManager, SessionState, SourceKind,
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn with_connector(id: &str, name: &str, connector: Arc<MockConnector>) -> ConnectorDescriptor {
    let connector: Arc<dyn Connector> = connector;
    ConnectorDescriptor::new(id, name, SourceKind::Injected, connector)
}

/// Session manager over a registry already holding `entries`, plus a receiver
/// that only sees session events.
async fn harness(
    entries: Vec<ConnectorDescriptor>,
    config: SessionConfig,
) -> (Arc<SessionManager>, EventReceiver) {
    init_test_tracing();
    let bus = EventBus::new();
    let source: Arc<dyn ConnectorSource> =
        MockSource::new(SourceKind::Injected, Duration::ZERO, entries);
    let registry = Arc::new(ConnectorRegistry::new(vec![source]).with_events(bus.sender()));
    registry.refresh().await;

    let rx = bus.subscribe();
    let sessions = SessionManager::new(registry, config).with_events(bus.sender());
    (Arc::new(sessions), rx)
}

#[tokio::test(start_paused = true)]
async fn test_connect_commits_account_and_blocks_further_selection() {
    let argent = MockConnector::approving("argent", "0xABC", ms(30));
    let katana = MockConnector::approving("katana", "0xDEF", ms(0));
    let (sessions, mut rx) = harness(
        vec![
            with_connector("argent", "Argent", argent.clone()),
            with_connector("katana", "Katana", katana.clone()),
        ],
        SessionConfig::default(),
    )
    .await;

    let account = Account::new("0xABC", "argent");
    assert_eq!(
        sessions.connect("argent").await,
        ConnectOutcome::Connected(account.clone())
    );

    assert_eq!(
        sessions.connect("katana").await,
        ConnectOutcome::Ignored(IgnoreReason::AlreadyConnected)
    );
    assert_eq!(katana.calls(), 0);
    assert_eq!(sessions.current_account().await, Some(account.clone()));
    assert_eq!(sessions.state().await, SessionState::Connected(account.clone()));

    let events = collect_events(&mut rx, ms(10)).await;
    assert_eq!(
        session_states(&events, "argent"),
        vec![
            SessionState::Idle,
            SessionState::Connecting,
            SessionState::Connected(account.clone()),
        ]
    );
    assert!(session_states(&events, "katana").is_empty());
    assert!(events.iter().any(|e| matches!(
        e,
        DomainEvent::AccountChanged { account: Some(a) } if a.address == "0xABC"
    )));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_connect_fails_and_allows_retry() {
    let argent = MockConnector::rejecting("argent", "user declined", ms(20));
    let (sessions, mut rx) = harness(
        vec![with_connector("argent", "Argent", argent.clone())],
        SessionConfig::default(),
    )
    .await;

    match sessions.connect("argent").await {
        ConnectOutcome::Failed(failure) => {
            assert_eq!(failure.connector_name, "Argent");
            assert_eq!(failure.reason, "user declined");
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(
        sessions.state().await,
        SessionState::Failed("user declined".to_string())
    );
    assert!(sessions.current_account().await.is_none());

    assert!(matches!(
        sessions.connect("argent").await,
        ConnectOutcome::Failed(_)
    ));
    assert_eq!(argent.calls(), 2);

    let events = collect_events(&mut rx, ms(10)).await;
    let failed = SessionState::Failed("user declined".to_string());
    assert_eq!(
        session_states(&events, "argent"),
        vec![
            SessionState::Idle,
            SessionState::Connecting,
            failed.clone(),
            SessionState::Idle,
            SessionState::Connecting,
            failed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_selection_while_connecting_is_ignored() {
    let argent = MockConnector::approving("argent", "0xABC", ms(100));
    let braavos = MockConnector::approving("braavos", "0xB0B", ms(0));
    let (sessions, _rx) = harness(
        vec![
            with_connector("argent", "Argent", argent.clone()),
            with_connector("braavos", "Braavos", braavos.clone()),
        ],
        SessionConfig::default(),
    )
    .await;

    let pending = {
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move { sessions.connect("argent").await })
    };
    tokio::time::sleep(ms(10)).await;
    assert_eq!(sessions.state().await, SessionState::Connecting);

    for id in ["argent", "braavos"] {
        assert_eq!(
            sessions.connect(id).await,
            ConnectOutcome::Ignored(IgnoreReason::AlreadyConnecting)
        );
    }
    assert_eq!(braavos.calls(), 0);

    let outcome = pending.await.unwrap();
    assert_eq!(outcome, ConnectOutcome::Connected(Account::new("0xABC", "argent")));
    assert_eq!(argent.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_or_unknown_selection_stays_idle() {
    let (sessions, mut rx) = harness(
        vec![unavailable("argentX", "Argent X")],
        SessionConfig::default(),
    )
    .await;

    assert_eq!(
        sessions.connect("argentX").await,
        ConnectOutcome::Ignored(IgnoreReason::Unavailable)
    );
    assert_eq!(
        sessions.connect("metamask").await,
        ConnectOutcome::Ignored(IgnoreReason::UnknownConnector)
    );
    assert_eq!(sessions.state().await, SessionState::Idle);
    assert!(sessions.session().await.is_none());
    assert!(collect_events(&mut rx, ms(10)).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_discards_late_result() {
    let argent = MockConnector::approving("argent", "0xABC", ms(200));
    let (sessions, mut rx) = harness(
        vec![
            with_connector("argent", "Argent", argent.clone()),
            descriptor("katana-0", "Katana 0", SourceKind::Predeployed),
        ],
        SessionConfig::default(),
    )
    .await;

    let pending = {
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move { sessions.connect("argent").await })
    };
    tokio::time::sleep(ms(20)).await;
    assert!(sessions.cancel().await);
    assert_eq!(sessions.state().await, SessionState::Idle);
    assert!(!sessions.cancel().await);

    assert_eq!(pending.await.unwrap(), ConnectOutcome::Abandoned);
    assert!(sessions.current_account().await.is_none());

    let events = collect_events(&mut rx, ms(10)).await;
    assert!(events
        .iter()
        .any(|e| matches!(e, DomainEvent::SessionAbandoned { connector_id, .. } if connector_id == "argent")));
    assert_eq!(
        session_states(&events, "argent"),
        vec![SessionState::Idle, SessionState::Connecting]
    );

    // A fresh selection is accepted once the abandoned session is gone.
    assert!(matches!(
        sessions.connect("katana-0").await,
        ConnectOutcome::Connected(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_handshake_timeout_fails_session() {
    let argent = MockConnector::approving("argent", "0xABC", Duration::from_secs(60));
    let config = SessionConfig {
        connect_timeout_ms: Some(5_000),
        ..SessionConfig::default()
    };
    let (sessions, _rx) = harness(vec![with_connector("argent", "Argent", argent)], config).await;

    match sessions.connect("argent").await {
        ConnectOutcome::Failed(failure) => {
            assert_eq!(failure.reason, "connection timed out after 5s");
        }
        other => panic!("expected timeout failure, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_development_delay_holds_connecting_state() {
    let katana = MockConnector::approving("katana-0", "0x1", Duration::ZERO);
    let (sessions, _rx) = harness(
        vec![with_connector("katana-0", "Katana 0", katana.clone())],
        SessionConfig::development(),
    )
    .await;

    let pending = {
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move { sessions.connect("katana-0").await })
    };
    tokio::time::sleep(ms(1_500)).await;
    assert_eq!(sessions.state().await, SessionState::Connecting);
    assert_eq!(katana.calls(), 0);

    assert!(matches!(pending.await.unwrap(), ConnectOutcome::Connected(_)));
    assert_eq!(katana.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_policy_controls_clearing() {
    let config = SessionConfig {
        failure_policy: FailurePolicy::AutoClear { after_ms: 3_000 },
        ..SessionConfig::default()
    };
    let argent = MockConnector::rejecting("argent", "user declined", ms(10));
    let (sessions, mut rx) =
        harness(vec![with_connector("argent", "Argent", argent.clone())], config).await;

    sessions.connect("argent").await;
    assert!(sessions.failure().await.is_some());

    tokio::time::sleep(ms(3_100)).await;
    assert!(sessions.failure().await.is_none());
    assert_eq!(sessions.state().await, SessionState::Idle);
    assert!(collect_events(&mut rx, ms(10))
        .await
        .iter()
        .any(|e| matches!(e, DomainEvent::SessionCleared { .. })));

    let argent = MockConnector::rejecting("argent", "user declined", ms(10));
    let (sessions, _rx) = harness(
        vec![with_connector("argent", "Argent", argent)],
        SessionConfig::default(),
    )
    .await;
    sessions.connect("argent").await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(sessions.failure().await.is_some());
    assert!(sessions.dismiss().await);
    assert_eq!(sessions.state().await, SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_connect_while_registry_refreshes() {
    let source: Arc<dyn ConnectorSource> = MockSource::new(
        SourceKind::Predeployed,
        ms(500),
        vec![descriptor("katana-0", "Katana 0", SourceKind::Predeployed)],
    );
    let registry = Arc::new(ConnectorRegistry::new(vec![source]));
    registry.refresh().await;
    let sessions = SessionManager::new(Arc::clone(&registry), SessionConfig::default());

    let refresh = registry.spawn_refresh();
    tokio::time::sleep(ms(10)).await;
    assert!(registry.snapshot().await.refreshing());

    assert!(matches!(
        sessions.connect("katana-0").await,
        ConnectOutcome::Connected(_)
    ));
    refresh.await.unwrap();
}
