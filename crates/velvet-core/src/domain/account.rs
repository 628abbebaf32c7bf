use serde::{Deserialize, Serialize};
use std::fmt;

/// A connected account session: the address a connector authorized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Account contract address (hex, `0x`-prefixed)
    pub address: String,

    /// Connector that produced this account
    pub connector_id: String,
}

impl Account {
    pub fn new(address: impl Into<String>, connector_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connector_id: connector_id.into(),
        }
    }

    /// Truncated address for compact display, e.g. `0x0123…cdef`.
    ///
    /// Addresses too short to truncate are returned unchanged.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 10 {
            return self.address.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
