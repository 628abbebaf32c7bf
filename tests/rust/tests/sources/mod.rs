//! Network-backed source tests
//!
//! Predeployed accounts and the hosted controller against a mocked Starknet
//! JSON-RPC endpoint, plus the full wallet service wiring.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tests::fixtures::ADDRESS;
use tests::{MockConnector, MockKeychain, MockWalletEnvironment};
use velvet_core::{
    ChainId, ConnectOutcome, ConnectorSource, ControllerConfig, HostedControllerSource,
    PredeployedConfig, PredeployedSource, RegistryStatus, RpcControllerLoader, SourceError,
    SourceKind, Theme, VelvetConfig, WalletService,
};

const SN_MAIN_HEX: &str = "0x534e5f4d41494e";
const SN_SEPOLIA_HEX: &str = "0x534e5f5345504f4c4941";

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

async fn mount_predeployed_accounts(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "dev_predeployedAccounts"})))
        .respond_with(rpc_result(json!([
            {
                "address": "0x6162896d1d7ab204c7ccac6dd5f8e9e7c25ecd5ae4fcb4ad32e57786bb46e03",
                "publicKey": "0x2b191c2f3ecf685a91af7cf72a43e7b90e2e41220175de5c4f7498981b10053",
                "privateKey": "0x1800000000300000180000000000030000000000003006001800006600",
                "balance": null
            },
            {
                "address": "0x7e00d496e324876bbc8531f2d9a82bf154d1a04a50218ee74cdd372f75a551a",
                "publicKey": "0x4c0f884b8e5b4f00d97a3aad26b2e5de0c0c76a555060c837da2e287403c01d",
                "privateKey": "0x1c9053c053edf324aec366a34c6901b1095b07af69495bffec7d7fe21effb1b"
            }
        ])))
        .mount(server)
        .await;
}

async fn mount_chain_id(server: &MockServer, hex: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "starknet_chainId"})))
        .respond_with(rpc_result(json!(hex)))
        .mount(server)
        .await;
}

fn predeployed_config(server: &MockServer) -> PredeployedConfig {
    PredeployedConfig {
        rpc_url: server.uri(),
        ..PredeployedConfig::default()
    }
}

fn controller_config(server: &MockServer) -> ControllerConfig {
    ControllerConfig {
        rpc_url: server.uri(),
        ..ControllerConfig::default()
    }
}

// =============================================================================
// Predeployed accounts
// =============================================================================

#[tokio::test]
async fn test_predeployed_accounts_become_indexed_descriptors() {
    let server = MockServer::start().await;
    mount_predeployed_accounts(&server).await;

    let source = PredeployedSource::new(predeployed_config(&server));
    let batch = source.load().await.unwrap();

    let ids: Vec<_> = batch.iter().map(|d| d.id.as_str()).collect();
    let names: Vec<_> = batch.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(ids, vec!["katana-0", "katana-1"]);
    assert_eq!(names, vec!["Katana 0", "Katana 1"]);
    assert!(batch.iter().all(|d| d.is_available()));
    assert!(batch.iter().all(|d| d.source == SourceKind::Predeployed));
    assert_eq!(batch[0].view(Theme::Dark).icon, "/wallets/katana.svg");

    let account = batch[1].connector().connect().await.unwrap();
    assert_eq!(
        account.address,
        "0x7e00d496e324876bbc8531f2d9a82bf154d1a04a50218ee74cdd372f75a551a"
    );
    assert_eq!(account.connector_id, "katana-1");
}

#[tokio::test]
async fn test_predeployed_node_down_contributes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = PredeployedSource::new(predeployed_config(&server));
    match source.load().await {
        Err(SourceError::Rpc { source_kind, .. }) => {
            assert_eq!(source_kind, SourceKind::Predeployed)
        }
        other => panic!("expected rpc error, got {:?}", other.map(|b| b.len())),
    }
    assert!(source.load_or_empty().await.is_empty());
}

#[tokio::test]
async fn test_predeployed_remote_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        })))
        .mount(&server)
        .await;

    let source = PredeployedSource::new(predeployed_config(&server));
    let err = source.load().await.unwrap_err();
    assert_eq!(err.source_kind(), SourceKind::Predeployed);
    assert!(err.to_string().contains("Method not found"), "{}", err);
}

// =============================================================================
// Hosted controller
// =============================================================================

#[tokio::test]
async fn test_controller_loads_once_when_chain_matches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "starknet_chainId"})))
        .respond_with(rpc_result(json!(SN_MAIN_HEX)))
        .expect(1)
        .mount(&server)
        .await;

    let keychain = MockKeychain::approving(ADDRESS);
    let source = HostedControllerSource::new(
        controller_config(&server),
        Arc::new(RpcControllerLoader::new(keychain.clone())),
    );
    assert!(!source.is_loaded());

    let batch = source.load().await.unwrap();
    assert!(source.is_loaded());
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, "controller");
    assert_eq!(batch[0].view(Theme::Light).icon, "/wallets/controller-light.svg");

    // Cached: a second load does not refetch.
    assert_eq!(source.load().await.unwrap().len(), 1);

    let account = batch[0].connector().connect().await.unwrap();
    assert_eq!(account.address, ADDRESS);
    assert_eq!(account.connector_id, "controller");
    assert_eq!(
        keychain.last_prompt(),
        Some((server.uri(), ChainId::Mainnet))
    );
}

#[tokio::test]
async fn test_controller_chain_mismatch_is_unavailable_then_retried() {
    let server = MockServer::start().await;
    mount_chain_id(&server, SN_SEPOLIA_HEX).await;

    let source = HostedControllerSource::new(
        controller_config(&server),
        Arc::new(RpcControllerLoader::new(MockKeychain::declining())),
    );
    match source.load().await {
        Err(SourceError::Unavailable { reason, .. }) => {
            assert!(reason.contains("SN_SEPOLIA"), "{}", reason);
            assert!(reason.contains("SN_MAIN"), "{}", reason);
        }
        other => panic!("expected unavailable, got {:?}", other.map(|b| b.len())),
    }
    assert!(!source.is_loaded());

    server.reset().await;
    mount_chain_id(&server, SN_MAIN_HEX).await;
    assert_eq!(source.load().await.unwrap().len(), 1);
    assert!(source.is_loaded());
}

#[tokio::test]
async fn test_declined_keychain_rejects_handshake() {
    let server = MockServer::start().await;
    mount_chain_id(&server, SN_MAIN_HEX).await;

    let source = HostedControllerSource::new(
        controller_config(&server),
        Arc::new(RpcControllerLoader::new(MockKeychain::declining())),
    );
    let batch = source.load().await.unwrap();
    let err = batch[0].connector().connect().await.unwrap_err();
    assert_eq!(err.to_string(), "user declined");
}

// =============================================================================
// Wallet service wiring
// =============================================================================

#[tokio::test]
async fn test_wallet_service_merges_all_sources() {
    let server = MockServer::start().await;
    mount_chain_id(&server, SN_MAIN_HEX).await;
    mount_predeployed_accounts(&server).await;

    let mut config = VelvetConfig::default();
    config.controller.rpc_url = server.uri();
    config.predeployed.rpc_url = server.uri();

    let braavos = MockConnector::approving("braavos", "0xB0B", std::time::Duration::ZERO);
    let environment = MockWalletEnvironment::new().with_wallet("braavos", "Braavos", true, braavos);

    let wallet = WalletService::builder(config)
        .with_wallet_environment(Arc::new(environment))
        .with_keychain_prompt(MockKeychain::approving(ADDRESS))
        .build();

    let snapshot = wallet.refresh().await;
    assert_eq!(
        snapshot.ids(),
        vec!["controller", "braavos", "argentX", "katana-0", "katana-1"]
    );
    assert_eq!(snapshot.status(), RegistryStatus::Ready);

    let braavos = snapshot.get("braavos").unwrap();
    assert!(braavos.is_available());
    assert!(!braavos.recommended);
    let argent = snapshot.get("argentX").unwrap();
    assert!(!argent.is_available());
    assert!(argent.recommended);

    match wallet.connect("braavos").await {
        ConnectOutcome::Connected(account) => assert_eq!(account.short(), "0xB0B"),
        other => panic!("expected connected, got {:?}", other),
    }
    assert_eq!(
        wallet.current_account().await.map(|a| a.connector_id),
        Some("braavos".to_string())
    );
}

#[tokio::test]
async fn test_wallet_service_survives_unreachable_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = VelvetConfig::default();
    config.controller.rpc_url = server.uri();
    config.predeployed.rpc_url = server.uri();

    let wallet = WalletService::builder(config)
        .with_keychain_prompt(MockKeychain::approving(ADDRESS))
        .build();

    let snapshot = wallet.refresh().await;
    assert_eq!(snapshot.ids(), vec!["argentX", "braavos"]);
    assert_eq!(snapshot.status(), RegistryStatus::NoConnectorsAvailable);
}
