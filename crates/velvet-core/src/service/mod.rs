//! Domain services
//!
//! Stateful logic that sits on top of the registry.

mod session_manager;

pub use session_manager::*;
