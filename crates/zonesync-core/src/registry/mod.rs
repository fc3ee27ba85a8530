//! Plugin-based transport registry
//!
//! Provider crates register a [`TransportFactory`] under their type name,
//! and hosts build transports from [`ProviderConfig`] without knowing
//! which provider crates are linked in.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::TransportRegistry;
//! use zonesync_core::config::ProviderConfig;
//!
//! let registry = TransportRegistry::new();
//! zonesync_provider_glesys::register(&registry);
//!
//! let config = ProviderConfig::glesys("cl12345", "api-key");
//! let transport = registry.create_transport(&config)?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{ProviderTransport, TransportFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of transport factories keyed by provider type name
///
/// ## Thread Safety
///
/// Interior mutability with RwLock: registration takes `&self`, so a shared
/// registry can be filled from several provider crates.
#[derive(Default)]
pub struct TransportRegistry {
    factories: RwLock<HashMap<String, Box<dyn TransportFactory>>>,
}

impl TransportRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport factory
    ///
    /// A later registration under the same name replaces the earlier one.
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name, as returned by [`ProviderConfig::type_name`]
    /// - `factory`: Factory object for creating transport instances
    pub fn register_transport(&self, name: impl Into<String>, factory: Box<dyn TransportFactory>) {
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        factories.insert(name.into(), factory);
    }

    /// Create a transport from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ProviderTransport>)`: Created transport instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_transport(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderTransport>> {
        let provider_type = config.type_name();
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);

        let factory = factories
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_transports(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_transport(&self, name: &str) -> bool {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.contains_key(name)
    }
}
