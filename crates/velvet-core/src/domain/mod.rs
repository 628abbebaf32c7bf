//! Domain types and events
//!
//! - Connector descriptors and the `Connector` handshake seam
//! - Accounts and connection sessions
//! - Configuration
//! - Domain events for the presentation layer

mod account;
pub mod config;
mod connector;
mod event;
mod session;

pub use account::Account;
pub use config::*;
pub use connector::*;
pub use event::DomainEvent;
pub use session::{ConnectionSession, SessionFailure, SessionState};
