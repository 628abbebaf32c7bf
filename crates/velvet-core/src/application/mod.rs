//! Application service - the surface the lobby presentation talks to
//!
//! ```text
//! Lobby presentation (selection modal, nav bar)
//!         │  connect(id) / current_account() / subscribe()
//!         ▼
//! ┌──────────────────────────────────────────┐
//! │ WalletService                            │
//! │   ConnectorRegistry ◄── sources          │
//! │   SessionManager                         │
//! │         │                                │
//! │         ▼                                │
//! │     Event Bus ──► RegistryChanged,       │
//! │                   SessionStateChanged …  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let wallet = WalletService::builder(VelvetConfig::from_env()?)
//!     .with_wallet_environment(Arc::new(BrowserWallets::detect()))
//!     .with_keychain_prompt(Arc::new(KeychainPopup::new()))
//!     .build();
//!
//! let mut events = wallet.subscribe();
//! wallet.mount();                       // sources resolve in the background
//! let outcome = wallet.connect("braavos").await;
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::{Account, SessionState, VelvetConfig};
use crate::event_bus::{EventBus, EventReceiver};
use crate::registry::{ConnectorRegistry, RegistrySnapshot};
use crate::service::{ConnectOutcome, SessionManager};
use crate::source::{
    ConnectorSource, ControllerLoader, HostedControllerSource, InjectedSource, KeychainPrompt,
    NoInjectedWallets, PredeployedSource, RpcControllerLoader, WalletEnvironment,
};

/// Builder wiring sources, registry and session manager around one event bus
pub struct WalletServiceBuilder {
    config: VelvetConfig,
    event_bus: Option<EventBus>,
    environment: Option<Arc<dyn WalletEnvironment>>,
    controller_loader: Option<Arc<dyn ControllerLoader>>,
    extra_sources: Vec<Arc<dyn ConnectorSource>>,
}

impl WalletServiceBuilder {
    pub fn new(config: VelvetConfig) -> Self {
        Self {
            config,
            event_bus: None,
            environment: None,
            controller_loader: None,
            extra_sources: Vec::new(),
        }
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn with_wallet_environment(mut self, environment: Arc<dyn WalletEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_controller_loader(mut self, loader: Arc<dyn ControllerLoader>) -> Self {
        self.controller_loader = Some(loader);
        self
    }

    /// Use the RPC-verified controller loader with the host's keychain prompt
    pub fn with_keychain_prompt(self, prompt: Arc<dyn KeychainPrompt>) -> Self {
        self.with_controller_loader(Arc::new(RpcControllerLoader::new(prompt)))
    }

    /// Append a source after the built-in ones (lowest priority)
    pub fn with_source(mut self, source: Arc<dyn ConnectorSource>) -> Self {
        self.extra_sources.push(source);
        self
    }

    /// Sources in priority order: controller, injected, predeployed, extras.
    fn sources(&mut self) -> Vec<Arc<dyn ConnectorSource>> {
        let mut sources: Vec<Arc<dyn ConnectorSource>> = Vec::new();

        if self.config.controller.enabled {
            match self.controller_loader.take() {
                Some(loader) => sources.push(Arc::new(HostedControllerSource::new(
                    self.config.controller.clone(),
                    loader,
                ))),
                None => warn!("[WalletService] No controller loader configured, controller source disabled"),
            }
        }

        let environment = self
            .environment
            .take()
            .unwrap_or_else(|| Arc::new(NoInjectedWallets));
        sources.push(Arc::new(InjectedSource::new(environment)));

        if self.config.predeployed.enabled {
            sources.push(Arc::new(PredeployedSource::new(
                self.config.predeployed.clone(),
            )));
        }

        sources.append(&mut self.extra_sources);
        sources
    }

    pub fn build(mut self) -> WalletService {
        let bus = self.event_bus.take().unwrap_or_default();
        let sources = self.sources();
        info!(sources = sources.len(), "[WalletService] Built");

        let registry =
            Arc::new(ConnectorRegistry::new(sources).with_events(bus.sender()));
        let sessions = SessionManager::new(Arc::clone(&registry), self.config.session.clone())
            .with_events(bus.sender());

        WalletService {
            bus,
            registry,
            sessions,
        }
    }
}

pub struct WalletService {
    bus: EventBus,
    registry: Arc<ConnectorRegistry>,
    sessions: SessionManager,
}

impl WalletService {
    pub fn builder(config: VelvetConfig) -> WalletServiceBuilder {
        WalletServiceBuilder::new(config)
    }

    /// Presentation callbacks: registry and session changes arrive here
    pub fn subscribe(&self) -> EventReceiver {
        self.bus.subscribe()
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Start loading every source without waiting for them
    pub fn mount(&self) -> JoinHandle<RegistrySnapshot> {
        self.registry.spawn_refresh()
    }

    /// Load every source and wait until all have settled
    pub async fn refresh(&self) -> RegistrySnapshot {
        self.registry.refresh().await
    }

    pub async fn connect(&self, connector_id: &str) -> ConnectOutcome {
        self.sessions.connect(connector_id).await
    }

    pub async fn cancel(&self) -> bool {
        self.sessions.cancel().await
    }

    pub async fn current_account(&self) -> Option<Account> {
        self.sessions.current_account().await
    }

    pub async fn session_state(&self) -> SessionState {
        self.sessions.state().await
    }
}
