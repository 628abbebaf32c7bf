use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Account;
use crate::error::ConnectorError;

/// Adapter exposing a uniform connect interface over a wallet or account provider.
///
/// Implementations wrap whatever SDK the wallet speaks; the core only ever sees the
/// resulting [`Account`] or a [`ConnectorError`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Run the connect handshake and resolve with the authorized account.
    async fn connect(&self) -> Result<Account, ConnectorError>;
}

/// Which source produced a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Remote-hosted controller connector, fetched on demand
    HostedController,
    /// Wallets injected into the execution environment (browser extensions)
    Injected,
    /// Locally predeployed development accounts
    Predeployed,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostedController => "hosted_controller",
            Self::Injected => "injected",
            Self::Predeployed => "predeployed",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display theme used to pick one side of a themed icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Wallet icon: a single image reference, or a pair for dark and light surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Icon {
    Single(String),
    Themed { dark: String, light: String },
}

impl Icon {
    /// Resolve the image reference to display on a surface of the given theme.
    pub fn resolve(&self, theme: Theme) -> &str {
        match (self, theme) {
            (Icon::Single(src), _) => src,
            (Icon::Themed { dark, .. }, Theme::Dark) => dark,
            (Icon::Themed { light, .. }, Theme::Light) => light,
        }
    }
}

impl From<&str> for Icon {
    fn from(src: &str) -> Self {
        Icon::Single(src.to_string())
    }
}

impl From<String> for Icon {
    fn from(src: String) -> Self {
        Icon::Single(src)
    }
}

/// Whether a wallet is usable in the current context.
///
/// Either a fixed answer known at load time, or a probe evaluated every time the
/// question is asked (an extension can be enabled after the list was built).
#[derive(Clone)]
pub enum Availability {
    Fixed(bool),
    Probe(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl Availability {
    pub fn probe<F>(check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Availability::Probe(Arc::new(check))
    }

    pub fn is_available(&self) -> bool {
        match self {
            Availability::Fixed(available) => *available,
            Availability::Probe(check) => check(),
        }
    }
}

impl fmt::Debug for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Fixed(available) => f.debug_tuple("Fixed").field(available).finish(),
            Availability::Probe(_) => f.write_str("Probe(..)"),
        }
    }
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        Availability::Fixed(available)
    }
}

/// Lightweight, displayable representation of a connector before it is selected.
#[derive(Clone)]
pub struct ConnectorDescriptor {
    /// Stable identifier, unique within a registry snapshot
    pub id: String,

    /// Human-readable label
    pub name: String,

    pub icon: Icon,

    pub availability: Availability,

    /// Where this descriptor came from
    pub source: SourceKind,

    /// Part of the injected source's always-included set
    pub recommended: bool,

    connector: Arc<dyn Connector>,
}

impl ConnectorDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: SourceKind,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let id = id.into();
        Self {
            icon: Icon::Single(format!("/wallets/{}.svg", id)),
            id,
            name: name.into(),
            availability: Availability::Fixed(true),
            source,
            recommended: false,
            connector,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<Icon>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_availability(mut self, availability: impl Into<Availability>) -> Self {
        self.availability = availability.into();
        self
    }

    pub fn recommended(mut self) -> Self {
        self.recommended = true;
        self
    }

    pub fn is_available(&self) -> bool {
        self.availability.is_available()
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::clone(&self.connector)
    }

    /// Case-insensitive match of `query` against the display name.
    ///
    /// `query_lower` must already be lowercased.
    pub(crate) fn name_matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
    }

    /// Serializable view for presentation layers
    pub fn view(&self, theme: Theme) -> ConnectorView {
        ConnectorView {
            id: self.id.clone(),
            name: self.name.clone(),
            icon: self.icon.resolve(theme).to_string(),
            source: self.source,
            available: self.is_available(),
            recommended: self.recommended,
        }
    }
}

impl fmt::Debug for ConnectorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("icon", &self.icon)
            .field("availability", &self.availability)
            .field("source", &self.source)
            .field("recommended", &self.recommended)
            .finish_non_exhaustive()
    }
}

/// What the selection UI needs to draw one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorView {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub source: SourceKind,
    pub available: bool,
    pub recommended: bool,
}
