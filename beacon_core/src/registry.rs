/**
 * The client registry — resolves the active client for the process.
 *
 * A `ClientRegistry` is created once by the application's composition point
 * and passed by reference to whatever needs a client. It holds:
 *
 * - a settings provider, called on every resolution so configuration changes
 *   are observed;
 * - a factory table mapping implementation identifiers to constructors;
 * - a single cache entry `(identifier, client)`.
 *
 * The cache is invalidated only when the resolved *identifier* changes. Other
 * settings (endpoint, timeout, token) changing under a stable identifier keep
 * returning the cached client built from the old values.
 *
 * Concurrent resolutions during an identifier change may each construct a
 * client; whichever stores last becomes the cached one.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::{Client, CooperativeClient, ThreadedClient};
use crate::config::Config;
use crate::error::{Error, Result};

/// Builds a client from freshly resolved settings.
pub type ClientFactory = Arc<dyn Fn(Config) -> Result<Arc<dyn Client>> + Send + Sync>;

type SettingsProvider = Box<dyn Fn() -> Config + Send + Sync>;

type CacheEntry = Option<(String, Arc<dyn Client>)>;

pub struct ClientRegistry {
    settings: SettingsProvider,
    factories: HashMap<String, ClientFactory>,
    cached: Mutex<CacheEntry>,
}

impl ClientRegistry {
    /**
     * Creates an empty-cache registry reading settings from `settings`.
     *
     * `"threaded"` and `"cooperative"` are registered up front.
     */
    pub fn new<F>(settings: F) -> Self
    where
        F: Fn() -> Config + Send + Sync + 'static,
    {
        let mut registry = Self {
            settings: Box::new(settings),
            factories: HashMap::new(),
            cached: Mutex::new(None),
        };

        registry.register(ThreadedClient::IDENTIFIER, |config| {
            let client: Arc<dyn Client> = Arc::new(ThreadedClient::new(config)?);
            Ok(client)
        });
        registry.register(CooperativeClient::IDENTIFIER, |config| {
            let client: Arc<dyn Client> = Arc::new(CooperativeClient::new(config)?);
            Ok(client)
        });

        registry
    }

    /// Adds (or replaces) the constructor for `identifier`.
    pub fn register<F>(&mut self, identifier: &str, factory: F) -> &mut Self
    where
        F: Fn(Config) -> Result<Arc<dyn Client>> + Send + Sync + 'static,
    {
        self.factories.insert(identifier.to_string(), Arc::new(factory));
        self
    }

    /**
     * Returns the client to use.
     *
     * - `explicit` is returned as-is; the cache is neither read nor written.
     * - Otherwise the identifier is resolved from the current settings. If it
     *   matches the cached one, the cached client is returned (same `Arc`).
     * - If not, a new client is constructed from the current settings,
     *   replaces the cache entry, and is returned.
     *
     * Fails with `Error::UnknownClient` when no factory is registered for the
     * identifier, or with the factory's own error.
     */
    pub fn get_client(&self, explicit: Option<Arc<dyn Client>>) -> Result<Arc<dyn Client>> {
        if let Some(client) = explicit {
            return Ok(client);
        }

        let config = self.settings();
        let identifier = config.client_identifier().to_string();

        if let Some((cached_id, client)) = self.cache().as_ref() {
            if *cached_id == identifier {
                return Ok(client.clone());
            }
        }

        /*
         * The lock is not held while constructing: a factory may spawn
         * threads or build HTTP sessions.
         */
        let factory = self
            .factories
            .get(&identifier)
            .cloned()
            .ok_or_else(|| Error::UnknownClient(identifier.clone()))?;
        let client = factory(config)?;

        tracing::debug!(client = %identifier, "constructed client");
        *self.cache() = Some((identifier, client.clone()));

        Ok(client)
    }

    /// The settings as the provider currently reports them.
    pub fn settings(&self) -> Config {
        (self.settings)()
    }

    /// Identifier of the cached client, if one has been constructed.
    pub fn cached_identifier(&self) -> Option<String> {
        self.cache().as_ref().map(|(identifier, _)| identifier.clone())
    }

    fn cache(&self) -> MutexGuard<'_, CacheEntry> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
