//! Error types for connector sources, JSON-RPC and connect handshakes.

use std::time::Duration;

use thiserror::Error;

use crate::domain::SourceKind;

/// Errors from a Starknet JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC endpoint returned status: {0}")]
    Status(reqwest::StatusCode),

    /// JSON-RPC error object in the response
    #[error("RPC error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("RPC response for '{method}' carried neither result nor error")]
    MissingResult { method: String },

    #[error("Failed to decode RPC result: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A connector source failed to load.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_kind} source unavailable: {reason}")]
    Unavailable {
        source_kind: SourceKind,
        reason: String,
    },

    #[error("{source_kind} source RPC failure: {error}")]
    Rpc {
        source_kind: SourceKind,
        #[source]
        error: RpcError,
    },
}

impl SourceError {
    pub fn unavailable(source_kind: SourceKind, reason: impl Into<String>) -> Self {
        SourceError::Unavailable {
            source_kind,
            reason: reason.into(),
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        match self {
            SourceError::Unavailable { source_kind, .. } | SourceError::Rpc { source_kind, .. } => {
                *source_kind
            }
        }
    }
}

/// A connect handshake did not produce an account.
///
/// The `Display` text is what a failed session keeps as its reason.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The wallet or the user refused the request
    #[error("{0}")]
    Rejected(String),

    #[error("wallet is not installed")]
    NotInstalled,

    #[error("connection timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ConnectorError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        ConnectorError::Rejected(reason.into())
    }
}

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}
