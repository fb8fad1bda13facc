//! Provider registry
//!
//! Runtime map from country code/name to a provider instance. The registry
//! is an explicit dependency owned by whoever composes the reconciler;
//! tests override entries by registering doubles into the instance under
//! test.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::CourtProvider;

/// A registered provider instance, shared across lookups.
pub type SharedProvider = Arc<dyn CourtProvider>;

/// Runtime-mutable mapping from normalized country key to provider.
///
/// Resolution is case-insensitive and a provider may be registered under
/// several aliases ("CO", "Colombia"). A lookup miss means "no adapter for
/// this jurisdiction yet" and is surfaced as `None`, never as an error.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, SharedProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Normalize a country key for lookup.
    fn normalize(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Register a provider under one or more country aliases, replacing
    /// any previous entry for those aliases.
    pub async fn register<I, S>(&self, aliases: I, provider: SharedProvider)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut providers = self.providers.write().await;
        for alias in aliases {
            let key = Self::normalize(alias.as_ref());
            debug!(
                country = %key,
                jurisdiction = provider.jurisdiction(),
                "registered court provider"
            );
            providers.insert(key, Arc::clone(&provider));
        }
    }

    /// Resolve the provider for a country, if one is registered.
    pub async fn resolve(&self, country: &str) -> Option<SharedProvider> {
        let providers = self.providers.read().await;
        providers.get(&Self::normalize(country)).cloned()
    }

    /// Remove the entry for one alias. Returns the removed provider.
    pub async fn deregister(&self, country: &str) -> Option<SharedProvider> {
        let mut providers = self.providers.write().await;
        providers.remove(&Self::normalize(country))
    }

    /// All registered aliases, sorted. Mainly for startup logging.
    pub async fn jurisdictions(&self) -> Vec<String> {
        let providers = self.providers.read().await;
        let mut keys: Vec<String> = providers.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
