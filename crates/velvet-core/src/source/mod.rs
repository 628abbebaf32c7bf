//! Connector sources
//!
//! Every provenance of wallet connectors sits behind [`ConnectorSource`]:
//!
//! - [`HostedControllerSource`] - remote controller connector, fetched on first use
//! - [`InjectedSource`] - wallets present in the environment plus a recommended set
//! - [`PredeployedSource`] - Katana development accounts over JSON-RPC
//!
//! Sources are stateless with respect to the registry: each `load()` returns a
//! fresh batch and never touches the merged snapshot.

mod controller;
mod injected;
mod predeployed;

pub use controller::*;
pub use injected::*;
pub use predeployed::*;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{ConnectorDescriptor, SourceKind};
use crate::error::SourceError;

#[async_trait]
pub trait ConnectorSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Query the environment and produce this source's descriptors, in display order.
    async fn load(&self) -> Result<Vec<ConnectorDescriptor>, SourceError>;

    /// `load()` with failures recovered locally: logged, then an empty batch.
    async fn load_or_empty(&self) -> Vec<ConnectorDescriptor> {
        match self.load().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!(source = %self.kind(), error = %e, "[Source] Unavailable, contributing nothing");
                Vec::new()
            }
        }
    }
}
