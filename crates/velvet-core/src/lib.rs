//! # Velvet Core
//!
//! Wallet-connector discovery and connection lifecycle for the Velvet Ace lobby.
//!
//! ## Modules
//!
//! - `domain` - Connector descriptors, accounts, sessions, configuration, events
//! - `source` - Connector sources (hosted controller, injected, predeployed)
//! - `registry` - Merged, deduplicated connector snapshot
//! - `service` - Connection session manager (account context)
//! - `application` - `WalletService` facade for the presentation layer
//! - `event_bus` - Event distribution to the presentation layer
//! - `rpc` - Starknet JSON-RPC client

pub mod application;
pub mod domain;
pub mod error;
pub mod event_bus;
pub mod registry;
pub mod rpc;
pub mod service;
pub mod source;

pub use domain::*;
pub use error::*;
pub use registry::{ConnectorRegistry, RegistrySnapshot, RegistryStatus};
pub use service::*;
pub use source::*;

pub use application::{WalletService, WalletServiceBuilder};
pub use event_bus::{EventBus, EventReceiver, EventSender};
