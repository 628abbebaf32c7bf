//! Hosted controller source.
//!
//! The controller connector is not built at startup. The first `load()` fetches it
//! through a [`ControllerLoader`]; a successful fetch is cached for the life of
//! the process, a failed one is retried on the next refresh.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::ConnectorSource;
use crate::domain::{
    Account, ChainId, Connector, ConnectorDescriptor, ControllerConfig, Icon, SourceKind,
};
use crate::error::{ConnectorError, RpcError, SourceError};
use crate::rpc::JsonRpcClient;

pub const CONTROLLER_ID: &str = "controller";
pub const CONTROLLER_NAME: &str = "Controller";

/// Fetches and constructs the controller connector on demand
#[async_trait]
pub trait ControllerLoader: Send + Sync {
    async fn load(&self, config: &ControllerConfig) -> Result<Arc<dyn Connector>, SourceError>;
}

/// Keychain surface owned by the host: asks the user to authorize a controller
/// session and yields the account address.
#[async_trait]
pub trait KeychainPrompt: Send + Sync {
    async fn authorize(&self, rpc_url: &str, chain_id: &ChainId) -> Result<String, ConnectorError>;
}

/// Connector bound to one controller endpoint and network
pub struct ControllerConnector {
    rpc_url: String,
    chain_id: ChainId,
    prompt: Arc<dyn KeychainPrompt>,
}

#[async_trait]
impl Connector for ControllerConnector {
    async fn connect(&self) -> Result<Account, ConnectorError> {
        let address = self.prompt.authorize(&self.rpc_url, &self.chain_id).await?;
        Ok(Account::new(address, CONTROLLER_ID))
    }
}

/// Loader that checks the endpoint serves the configured chain before handing out
/// a connector for it.
///
/// The endpoint client is built by the first load and reused by retries.
pub struct RpcControllerLoader {
    prompt: Arc<dyn KeychainPrompt>,
    client: OnceCell<JsonRpcClient>,
}

impl RpcControllerLoader {
    pub fn new(prompt: Arc<dyn KeychainPrompt>) -> Self {
        Self {
            prompt,
            client: OnceCell::new(),
        }
    }

    async fn client(&self, rpc_url: &str) -> Result<&JsonRpcClient, RpcError> {
        self.client
            .get_or_try_init(|| async { JsonRpcClient::new(rpc_url) })
            .await
    }
}

#[async_trait]
impl ControllerLoader for RpcControllerLoader {
    async fn load(&self, config: &ControllerConfig) -> Result<Arc<dyn Connector>, SourceError> {
        let rpc_failure = |error| SourceError::Rpc {
            source_kind: SourceKind::HostedController,
            error,
        };

        let client = self.client(&config.rpc_url).await.map_err(rpc_failure)?;
        let served = client.chain_id().await.map_err(rpc_failure)?;
        if served != config.chain_id {
            return Err(SourceError::unavailable(
                SourceKind::HostedController,
                format!(
                    "{} serves {}, expected {}",
                    config.rpc_url, served, config.chain_id
                ),
            ));
        }

        Ok(Arc::new(ControllerConnector {
            rpc_url: config.rpc_url.clone(),
            chain_id: config.chain_id.clone(),
            prompt: Arc::clone(&self.prompt),
        }))
    }
}

pub struct HostedControllerSource {
    config: ControllerConfig,
    loader: Arc<dyn ControllerLoader>,
    connector: OnceCell<Arc<dyn Connector>>,
}

impl HostedControllerSource {
    pub fn new(config: ControllerConfig, loader: Arc<dyn ControllerLoader>) -> Self {
        Self {
            config,
            loader,
            connector: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.connector.initialized()
    }

    fn icon() -> Icon {
        Icon::Themed {
            dark: "/wallets/controller-dark.svg".to_string(),
            light: "/wallets/controller-light.svg".to_string(),
        }
    }
}

#[async_trait]
impl ConnectorSource for HostedControllerSource {
    fn kind(&self) -> SourceKind {
        SourceKind::HostedController
    }

    async fn load(&self) -> Result<Vec<ConnectorDescriptor>, SourceError> {
        let connector = self
            .connector
            .get_or_try_init(|| async {
                info!(
                    rpc_url = %self.config.rpc_url,
                    chain_id = %self.config.chain_id,
                    "[Controller] Fetching controller connector"
                );
                self.loader.load(&self.config).await
            })
            .await?;
        debug!("[Controller] Connector ready");

        let descriptor = ConnectorDescriptor::new(
            CONTROLLER_ID,
            CONTROLLER_NAME,
            SourceKind::HostedController,
            Arc::clone(connector),
        )
        .with_icon(Self::icon());

        Ok(vec![descriptor])
    }
}
