//! Predeployed development accounts served by a local Katana node.
//!
//! Optional by nature: when the node is not running the source is simply empty.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use super::ConnectorSource;
use crate::domain::{Account, Connector, ConnectorDescriptor, PredeployedConfig, SourceKind};
use crate::error::{ConnectorError, RpcError, SourceError};
use crate::rpc::{JsonRpcClient, PredeployedAccount};

/// Connector for an account that needs no wallet: the handshake resolves at once.
pub struct PredeployedConnector {
    connector_id: String,
    account: PredeployedAccount,
}

#[async_trait]
impl Connector for PredeployedConnector {
    async fn connect(&self) -> Result<Account, ConnectorError> {
        Ok(Account::new(self.account.address.clone(), self.connector_id.clone()))
    }
}

pub struct PredeployedSource {
    config: PredeployedConfig,
    client: OnceCell<JsonRpcClient>,
}

impl PredeployedSource {
    pub fn new(config: PredeployedConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// The node client, built on first use and shared by every later load
    async fn client(&self) -> Result<&JsonRpcClient, RpcError> {
        self.client
            .get_or_try_init(|| async { JsonRpcClient::new(self.config.rpc_url.clone()) })
            .await
    }

    fn descriptors(&self, accounts: Vec<PredeployedAccount>) -> Vec<ConnectorDescriptor> {
        accounts
            .into_iter()
            .enumerate()
            .map(|(index, account)| {
                let id = format!("{}-{}", self.config.source_id, index);
                let name = format!("{} {}", self.config.source_name, index);
                let connector = Arc::new(PredeployedConnector {
                    connector_id: id.clone(),
                    account,
                });
                ConnectorDescriptor::new(id, name, SourceKind::Predeployed, connector)
                    .with_icon(format!("/wallets/{}.svg", self.config.source_id))
            })
            .collect()
    }
}

#[async_trait]
impl ConnectorSource for PredeployedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Predeployed
    }

    async fn load(&self) -> Result<Vec<ConnectorDescriptor>, SourceError> {
        let rpc_failure = |error| SourceError::Rpc {
            source_kind: SourceKind::Predeployed,
            error,
        };

        let client = self.client().await.map_err(rpc_failure)?;
        let accounts = client.predeployed_accounts().await.map_err(rpc_failure)?;
        info!(
            rpc_url = %self.config.rpc_url,
            accounts = accounts.len(),
            "[Predeployed] Loaded development accounts"
        );

        Ok(self.descriptors(accounts))
    }
}
