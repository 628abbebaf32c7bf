//! Runtime configuration: chain endpoints, source identities and session policy.
//!
//! Values come from serde (embedding shells) or from `VELVET_*` environment
//! variables, with a `.env` file honoured in development.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_RPC_URL: &str = "http://localhost:5050";
pub const DEFAULT_CONTROLLER_RPC_URL: &str = "https://api.cartridge.gg/x/starknet/mainnet";
pub const DEFAULT_PREDEPLOYED_ID: &str = "katana";
pub const DEFAULT_PREDEPLOYED_NAME: &str = "Katana";

/// Simulated "connecting" delay used by the development variant
pub const DEV_CONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Target network identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChainId {
    #[default]
    Mainnet,
    Sepolia,
    Katana,
    /// Any other chain, as a `0x`-prefixed lowercase hex felt
    Custom(String),
}

impl ChainId {
    /// Short-string name as Starknet encodes it (`SN_MAIN`, ...)
    pub fn name(&self) -> Option<&'static str> {
        match self {
            ChainId::Mainnet => Some("SN_MAIN"),
            ChainId::Sepolia => Some("SN_SEPOLIA"),
            ChainId::Katana => Some("KATANA"),
            ChainId::Custom(_) => None,
        }
    }

    /// Hex felt value returned by `starknet_chainId`
    pub fn as_hex(&self) -> String {
        match self {
            ChainId::Custom(hex) => hex.clone(),
            known => encode_short_string(known.name().unwrap_or_default()),
        }
    }

    fn from_hex(hex: &str) -> Self {
        let normalized = normalize_hex(hex);
        [ChainId::Mainnet, ChainId::Sepolia, ChainId::Katana]
            .into_iter()
            .find(|known| known.as_hex() == normalized)
            .unwrap_or(ChainId::Custom(normalized))
    }
}

impl FromStr for ChainId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "SN_MAIN" | "MAINNET" => return Ok(ChainId::Mainnet),
            "SN_SEPOLIA" | "SEPOLIA" => return Ok(ChainId::Sepolia),
            "KATANA" => return Ok(ChainId::Katana),
            _ => {}
        }

        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ConfigError::Invalid {
                key: "chain_id".to_string(),
                reason: format!("'{}' is neither a known network nor a hex felt", s),
            })?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::Invalid {
                key: "chain_id".to_string(),
                reason: format!("'{}' is not valid hex", s),
            });
        }
        Ok(ChainId::from_hex(trimmed))
    }
}

impl TryFrom<String> for ChainId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainId> for String {
    fn from(chain: ChainId) -> Self {
        match chain.name() {
            Some(name) => name.to_string(),
            None => chain.as_hex(),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => f.write_str(&self.as_hex()),
        }
    }
}

fn encode_short_string(s: &str) -> String {
    let hex: String = s.bytes().map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}

fn normalize_hex(hex: &str) -> String {
    let digits = hex
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .trim_start_matches('0')
        .to_ascii_lowercase();
    if digits.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", digits)
    }
}

/// Hosted controller connector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub enabled: bool,
    pub rpc_url: String,
    pub chain_id: ChainId,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_url: DEFAULT_CONTROLLER_RPC_URL.to_string(),
            chain_id: ChainId::Mainnet,
        }
    }
}

/// Local development identity served by a Katana node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredeployedConfig {
    pub enabled: bool,
    pub rpc_url: String,
    pub source_id: String,
    pub source_name: String,
}

impl Default for PredeployedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            source_id: DEFAULT_PREDEPLOYED_ID.to_string(),
            source_name: DEFAULT_PREDEPLOYED_NAME.to_string(),
        }
    }
}

/// What happens to a session left in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stays visible until the user dismisses it or selects again
    #[default]
    RequireDismissal,
    /// Cleared automatically after the given delay
    AutoClear { after_ms: u64 },
}

/// Connection session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed visual "connecting" delay before the handshake starts (0 in production)
    pub connect_delay_ms: u64,
    /// Hard handshake timeout; none unless configured
    pub connect_timeout_ms: Option<u64>,
    pub failure_policy: FailurePolicy,
}

impl SessionConfig {
    pub fn development() -> Self {
        Self {
            connect_delay_ms: DEV_CONNECT_DELAY.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn connect_delay(&self) -> Option<Duration> {
        (self.connect_delay_ms > 0).then(|| Duration::from_millis(self.connect_delay_ms))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn auto_clear_after(&self) -> Option<Duration> {
        match self.failure_policy {
            FailurePolicy::RequireDismissal => None,
            FailurePolicy::AutoClear { after_ms } => Some(Duration::from_millis(after_ms)),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VelvetConfig {
    pub controller: ControllerConfig,
    pub predeployed: PredeployedConfig,
    pub session: SessionConfig,
}

impl VelvetConfig {
    /// Development defaults: local Katana plus the simulated connecting delay.
    pub fn development() -> Self {
        Self {
            session: SessionConfig::development(),
            ..Self::default()
        }
    }

    /// Load from `VELVET_*` environment variables, reading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Build from an arbitrary variable lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if parse_bool(&lookup, "VELVET_DEV")?.unwrap_or(false) {
            Self::development()
        } else {
            Self::default()
        };

        if let Some(url) = lookup("VELVET_RPC_URL") {
            config.predeployed.rpc_url = validate_url("VELVET_RPC_URL", &url)?;
        }
        if let Some(url) = lookup("VELVET_CONTROLLER_RPC_URL") {
            config.controller.rpc_url = validate_url("VELVET_CONTROLLER_RPC_URL", &url)?;
        }
        if let Some(chain) = lookup("VELVET_CHAIN_ID") {
            config.controller.chain_id = chain.parse()?;
        }
        if let Some(enabled) = parse_bool(&lookup, "VELVET_ENABLE_CONTROLLER")? {
            config.controller.enabled = enabled;
        }
        if let Some(enabled) = parse_bool(&lookup, "VELVET_ENABLE_PREDEPLOYED")? {
            config.predeployed.enabled = enabled;
        }
        if let Some(id) = lookup("VELVET_PREDEPLOYED_ID") {
            config.predeployed.source_id = id;
        }
        if let Some(name) = lookup("VELVET_PREDEPLOYED_NAME") {
            config.predeployed.source_name = name;
        }
        if let Some(ms) = parse_millis(&lookup, "VELVET_CONNECT_DELAY_MS")? {
            config.session.connect_delay_ms = ms;
        }
        if let Some(ms) = parse_millis(&lookup, "VELVET_CONNECT_TIMEOUT_MS")? {
            config.session.connect_timeout_ms = Some(ms);
        }
        if let Some(ms) = parse_millis(&lookup, "VELVET_FAILED_SESSION_CLEAR_MS")? {
            config.session.failure_policy = FailurePolicy::AutoClear { after_ms: ms };
        }

        Ok(config)
    }
}

fn validate_url(key: &str, value: &str) -> Result<String, ConfigError> {
    Url::parse(value)
        .map(|_| value.to_string())
        .map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

fn parse_millis<F>(lookup: &F, key: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Invalid {
                key: key.to_string(),
                reason: format!("'{}' is not a boolean", other),
            }),
        })
        .transpose()
}
