//! Credential-keyed pool of Compass clients.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::client::CompassClient;
use crate::error::CompassResult;
use crate::models::Credentials;

/// Pools one [`CompassClient`] per credential triple.
///
/// Entries live for the process lifetime; there is no eviction. Lookup and
/// insertion go through the map's sharded locks, so concurrent sends with
/// identical credentials converge on a single client instance.
#[derive(Default)]
pub struct CompassClientFactory {
    pool: DashMap<String, Arc<CompassClient>>,
}

impl CompassClientFactory {
    pub fn new() -> Self {
        Self {
            pool: DashMap::new(),
        }
    }

    /// Returns the pooled client for the credential triple, building one on
    /// first use.
    pub fn make(&self, credentials: Credentials) -> CompassResult<Arc<CompassClient>> {
        let key = credentials.pool_key();

        if let Some(pooled) = self.pool.get(&key) {
            return Ok(pooled.value().clone());
        }

        debug!(base_url = credentials.base_url(), "building Compass client");
        let client = Arc::new(CompassClient::new(credentials)?);

        // A concurrent make for the same triple may have won the race; the
        // entry API keeps whichever instance landed first.
        let entry = self.pool.entry(key).or_insert(client);
        Ok(entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
