//! Configuration types for zonebot
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Default Cloudflare API v4 base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Main zonebot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Credential store configuration
    #[serde(default)]
    pub credentials: CredentialStoreConfig,

    /// Operator identities allowed to talk to the bot
    pub access: AccessConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl BotConfig {
    /// Create a configuration for the given operators with defaults elsewhere
    pub fn new(operator_ids: Vec<i64>) -> Self {
        Self {
            provider: ProviderConfig::default(),
            credentials: CredentialStoreConfig::default(),
            access: AccessConfig { operator_ids },
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.credentials.validate()?;
        self.access.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API, without a trailing slash
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout applied to every provider request (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_base_url.is_empty() {
            return Err(crate::Error::config("Provider API base URL cannot be empty"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "Provider API base URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Provider request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialStoreConfig {
    /// JSON file on disk
    File {
        /// Path to the accounts file
        path: String,
    },

    /// In-memory store (not persistent)
    Memory,
}

impl CredentialStoreConfig {
    /// Validate the credential store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CredentialStoreConfig::File { path } if path.is_empty() => Err(crate::Error::config(
                "Credential store path cannot be empty",
            )),
            _ => Ok(()),
        }
    }
}

impl Default for CredentialStoreConfig {
    fn default() -> Self {
        CredentialStoreConfig::File {
            path: "accounts.json".to_string(),
        }
    }
}

/// Identity policy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Numeric user ids allowed to operate the bot
    pub operator_ids: Vec<i64>,
}

impl AccessConfig {
    /// Validate the access configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.operator_ids.is_empty() {
            return Err(crate::Error::config("At least one operator id is required"));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `per_page` used when listing zones
    ///
    /// Only the first page is fetched. Accounts with more zones than this
    /// see a truncated list.
    #[serde(default = "default_zones_fetch_size")]
    pub zones_fetch_size: u32,

    /// `per_page` used when listing the records of a zone
    #[serde(default = "default_records_fetch_size")]
    pub records_fetch_size: u32,

    /// Number of zones shown per page of the zone menu
    #[serde(default = "default_zones_page_size")]
    pub zones_page_size: usize,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(5..=50).contains(&self.zones_fetch_size) {
            return Err(crate::Error::config(format!(
                "zones_fetch_size must be between 5 and 50. Got: {}",
                self.zones_fetch_size
            )));
        }
        if !(5..=5000).contains(&self.records_fetch_size) {
            return Err(crate::Error::config(format!(
                "records_fetch_size must be between 5 and 5000. Got: {}",
                self.records_fetch_size
            )));
        }
        if self.zones_page_size == 0 {
            return Err(crate::Error::config("zones_page_size must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zones_fetch_size: default_zones_fetch_size(),
            records_fetch_size: default_records_fetch_size(),
            zones_page_size: default_zones_page_size(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    25
}

fn default_zones_fetch_size() -> u32 {
    50
}

fn default_records_fetch_size() -> u32 {
    100
}

fn default_zones_page_size() -> usize {
    6
}

fn default_event_channel_capacity() -> usize {
    100
}
