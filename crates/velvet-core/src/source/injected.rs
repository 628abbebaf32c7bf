//! Injected wallets (browser extensions) plus an always-included recommended set.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::ConnectorSource;
use crate::domain::{Account, Availability, Connector, ConnectorDescriptor, Icon, SourceKind};
use crate::error::{ConnectorError, SourceError};

/// A wallet the execution environment exposes
pub struct InjectedWallet {
    pub id: String,
    pub name: String,
    pub icon: Icon,
    pub availability: Availability,
    pub connector: Arc<dyn Connector>,
}

/// Host hook that enumerates the wallets injected into the current environment
pub trait WalletEnvironment: Send + Sync {
    fn injected_wallets(&self) -> Vec<InjectedWallet>;
}

/// Environment without any injected wallets (headless shells, tests)
pub struct NoInjectedWallets;

impl WalletEnvironment for NoInjectedWallets {
    fn injected_wallets(&self) -> Vec<InjectedWallet> {
        Vec::new()
    }
}

/// A wallet always offered, whether or not it is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendedWallet {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

pub const ARGENT: RecommendedWallet = RecommendedWallet {
    id: "argentX",
    name: "Argent X",
    icon: "/wallets/argent.svg",
};

pub const BRAAVOS: RecommendedWallet = RecommendedWallet {
    id: "braavos",
    name: "Braavos",
    icon: "/wallets/braavos.svg",
};

/// Stand-in for a recommended wallet that is not installed
struct NotInstalled;

#[async_trait]
impl Connector for NotInstalled {
    async fn connect(&self) -> Result<Account, ConnectorError> {
        Err(ConnectorError::NotInstalled)
    }
}

pub struct InjectedSource {
    environment: Arc<dyn WalletEnvironment>,
    recommended: Vec<RecommendedWallet>,
}

impl InjectedSource {
    /// Source with the default recommended set (Argent X, Braavos)
    pub fn new(environment: Arc<dyn WalletEnvironment>) -> Self {
        Self::with_recommended(environment, vec![ARGENT, BRAAVOS])
    }

    pub fn with_recommended(
        environment: Arc<dyn WalletEnvironment>,
        recommended: Vec<RecommendedWallet>,
    ) -> Self {
        Self {
            environment,
            recommended,
        }
    }
}

#[async_trait]
impl ConnectorSource for InjectedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Injected
    }

    async fn load(&self) -> Result<Vec<ConnectorDescriptor>, SourceError> {
        let detected = self.environment.injected_wallets();
        debug!(detected = detected.len(), "[Injected] Enumerated wallets");

        // Detected first so a real extension shadows its recommended placeholder.
        let mut batch: Vec<ConnectorDescriptor> = detected
            .into_iter()
            .map(|wallet| {
                ConnectorDescriptor::new(wallet.id, wallet.name, SourceKind::Injected, wallet.connector)
                    .with_icon(wallet.icon)
                    .with_availability(wallet.availability)
            })
            .collect();

        let not_installed: Arc<dyn Connector> = Arc::new(NotInstalled);
        batch.extend(self.recommended.iter().map(|wallet| {
            ConnectorDescriptor::new(
                wallet.id,
                wallet.name,
                SourceKind::Injected,
                Arc::clone(&not_installed),
            )
            .with_icon(wallet.icon)
            .with_availability(false)
            .recommended()
        }));

        Ok(batch)
    }
}
