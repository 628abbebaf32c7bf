//! Minimal Starknet JSON-RPC client.
//!
//! Only the two calls the wallet core needs: `starknet_chainId` to verify the
//! controller endpoint, and Katana's `dev_predeployedAccounts` for local
//! development accounts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::ChainId;
use crate::error::RpcError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Account returned by `dev_predeployedAccounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredeployedAccount {
    pub address: String,
    #[serde(default, alias = "public_key")]
    pub public_key: Option<String>,
    #[serde(default, alias = "private_key")]
    pub private_key: Option<String>,
    #[serde(default)]
    pub balance: Option<Value>,
}

pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("VelvetAce/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method` with positional `params` and decode its result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(url = %self.url, method, id, "[Rpc] Request");

        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status(status));
        }

        let body: RpcResponse = response.json().await?;
        if let Some(err) = body.error {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            });
        }

        let result = body.result.ok_or_else(|| RpcError::MissingResult {
            method: method.to_string(),
        })?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn chain_id(&self) -> Result<ChainId, RpcError> {
        let hex: String = self.call("starknet_chainId", json!([])).await?;
        hex.parse().map_err(|_| RpcError::Remote {
            code: 0,
            message: format!("endpoint returned malformed chain id '{}'", hex),
        })
    }

    pub async fn predeployed_accounts(&self) -> Result<Vec<PredeployedAccount>, RpcError> {
        self.call("dev_predeployedAccounts", json!([])).await
    }
}
