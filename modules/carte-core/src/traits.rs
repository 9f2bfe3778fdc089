// Seams between the map pipeline and the outside world.
//
// DataSource: where the four JSON datasets come from (directory or HTTP).
// GeocodeProvider: the remote address lookup (Nominatim in production).
// GeoCache: persisted query -> coordinates store.
//
// Mocks for all three live in `testing`.

use async_trait::async_trait;

use carte_common::{LatLng, Result};

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Raw bytes of a named resource, e.g. `meta.json`.
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>>;

    /// Human-readable location of a resource, for logs and error messages.
    fn describe(&self, resource: &str) -> String;
}

#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Best match for an already-normalized query, or `None` when the service
    /// found nothing.
    async fn search(&self, query: &str) -> Result<Option<LatLng>>;
}

/// Key-value store of resolved queries. No expiry and no eviction.
#[async_trait]
pub trait GeoCache: Send + Sync {
    fn get(&self, key: &str) -> Option<LatLng>;

    async fn put(&mut self, key: &str, value: LatLng);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
