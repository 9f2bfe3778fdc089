pub mod cache;
pub mod departments;
pub mod normalize;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use carte_common::{CarteError, LatLng, Result};
use nominatim_client::{NominatimClient, SearchOptions};

use crate::traits::{GeoCache, GeocodeProvider};

pub use cache::{JsonFileCache, MemoryCache};
pub use departments::department_name;
pub use normalize::{normalize_query, normalize_query_for, DEFAULT_COUNTRY};

/// Courtesy delay after every uncached lookup against the shared public service.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(900);

// ---------------------------------------------------------------------------
// NominatimProvider
// ---------------------------------------------------------------------------

pub struct NominatimProvider {
    client: NominatimClient,
}

impl NominatimProvider {
    pub fn new(base_url: &str, user_agent: &str, language: &str) -> Self {
        let client = NominatimClient::new(base_url, user_agent).with_options(SearchOptions {
            limit: 1,
            language: language.to_string(),
        });
        Self { client }
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    async fn search(&self, query: &str) -> Result<Option<LatLng>> {
        let found = self
            .client
            .lookup(query)
            .await
            .map_err(|e| CarteError::Geocode(e.to_string()))?;
        Ok(found.map(LatLng::from))
    }
}

// ---------------------------------------------------------------------------
// Geocoder
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GeocodeStats {
    pub cache_hits: u32,
    pub misses: u32,
    pub requests: u32,
    pub not_found: u32,
    pub failed: u32,
}

impl fmt::Display for GeocodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache hits: {}, misses: {}, requests: {}, not found: {}, failed: {}",
            self.cache_hits, self.misses, self.requests, self.not_found, self.failed
        )
    }
}

/// Cache-first address resolver.
///
/// Lookups take `&mut self`, so at most one request is in flight and each
/// one (throttle included) completes before the next starts.
pub struct Geocoder {
    provider: Box<dyn GeocodeProvider>,
    cache: Box<dyn GeoCache>,
    throttle: Duration,
    country: String,
    stats: GeocodeStats,
}

impl Geocoder {
    pub fn new(provider: Box<dyn GeocodeProvider>, cache: Box<dyn GeoCache>) -> Self {
        Self {
            provider,
            cache,
            throttle: DEFAULT_THROTTLE,
            country: DEFAULT_COUNTRY.to_string(),
            stats: GeocodeStats::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = country.to_string();
        self
    }

    pub fn stats(&self) -> GeocodeStats {
        self.stats
    }

    pub fn cache(&self) -> &dyn GeoCache {
        self.cache.as_ref()
    }

    /// Resolve free text to coordinates.
    ///
    /// Blank text resolves to `None` without touching the cache or network.
    /// Provider errors are returned as-is after the throttle; there is no retry.
    pub async fn resolve(&mut self, text: &str) -> Result<Option<LatLng>> {
        let Some(query) = normalize_query_for(text, &self.country) else {
            return Ok(None);
        };

        if let Some(hit) = self.cache.get(&query) {
            self.stats.cache_hits += 1;
            debug!(query = query.as_str(), "Geocode cache hit");
            return Ok(Some(hit));
        }

        debug!(query = query.as_str(), "Geocode cache miss, querying provider");
        self.stats.misses += 1;
        self.stats.requests += 1;
        let found = self.provider.search(&query).await;

        // Every request, failed or not, is followed by the full delay.
        match found {
            Ok(Some(ll)) => {
                self.cache.put(&query, ll).await;
                tokio::time::sleep(self.throttle).await;
                Ok(Some(ll))
            }
            Ok(None) => {
                self.stats.not_found += 1;
                tokio::time::sleep(self.throttle).await;
                warn!(query = query.as_str(), "No coordinates found");
                Ok(None)
            }
            Err(e) => {
                self.stats.failed += 1;
                tokio::time::sleep(self.throttle).await;
                Err(e)
            }
        }
    }
}
