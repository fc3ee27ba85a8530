//! Configuration types
//!
//! Configuration is plain serde data so hosts can embed it in their own
//! config files (JSON field names match the provider's credential names).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Default zone to operate on
    #[serde(default)]
    pub zone: Option<String>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ZoneSyncConfig {
    /// Create a configuration for a provider with default engine settings
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            zone: None,
            engine: EngineConfig::default(),
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;

        if let Some(zone) = &self.zone
            && crate::normalize::clean_zone(zone).is_empty()
        {
            return Err(crate::Error::config("zone cannot be empty"));
        }

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// GleSYS DNS API
    Glesys {
        /// Project (account) name, used as the basic-auth user
        project: String,
        /// API key, used as the basic-auth password
        api_key: String,
        /// API base URL
        #[serde(default = "default_glesys_base_url")]
        base_url: String,
        /// HTTP timeout per request (in seconds)
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ProviderConfig {
    /// GleSYS configuration with default endpoint and timeout
    pub fn glesys(project: impl Into<String>, api_key: impl Into<String>) -> Self {
        ProviderConfig::Glesys {
            project: project.into(),
            api_key: api_key.into(),
            base_url: default_glesys_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Glesys {
                project,
                api_key,
                base_url,
                timeout_secs,
            } => {
                if project.is_empty() {
                    return Err(crate::Error::config("GleSYS project cannot be empty"));
                }
                if api_key.is_empty() {
                    return Err(crate::Error::config("GleSYS API key cannot be empty"));
                }
                if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "GleSYS base URL must use HTTP or HTTPS scheme. Got: {}",
                        base_url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("GleSYS timeout must be > 0"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Glesys { .. } => "glesys",
        }
    }
}

// API keys never show up in logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Glesys {
                project,
                base_url,
                timeout_secs,
                ..
            } => f
                .debug_struct("Glesys")
                .field("project", project)
                .field("api_key", &"<REDACTED>")
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the reconciliation event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_glesys_base_url() -> String {
    "https://api.glesys.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    100
}
