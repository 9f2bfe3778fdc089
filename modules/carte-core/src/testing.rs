// Test mocks for the map pipeline.
//
// - MockProvider (GeocodeProvider): query -> coordinates, records every request
// - MockSource (DataSource): resource name -> JSON body, records every fetch
//
// Both are cheap to clone and share their recordings, so a test can hand one
// copy to the code under test and keep another for assertions.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use carte_common::{CarteError, LatLng, Result};

use crate::geocode::{Geocoder, MemoryCache};
use crate::traits::{DataSource, GeocodeProvider};

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// Unregistered queries resolve to `None`, like an empty Nominatim response.
#[derive(Clone, Default)]
pub struct MockProvider {
    answers: HashMap<String, LatLng>,
    failures: HashSet<String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, query: &str, ll: LatLng) -> Self {
        self.answers.insert(query.to_string(), ll);
        self
    }

    /// Make `query` fail with a geocoding error.
    pub fn failing(mut self, query: &str) -> Self {
        self.failures.insert(query.to_string());
        self
    }

    /// Every query received so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeocodeProvider for MockProvider {
    async fn search(&self, query: &str) -> Result<Option<LatLng>> {
        self.requests.lock().unwrap().push(query.to_string());
        if self.failures.contains(query) {
            return Err(CarteError::Geocode(format!(
                "MockProvider: simulated failure for {query}"
            )));
        }
        Ok(self.answers.get(query).copied())
    }
}

/// Geocoder over `provider` with an empty in-memory cache and no throttle.
pub fn instant_geocoder(provider: &MockProvider) -> Geocoder {
    Geocoder::new(Box::new(provider.clone()), Box::new(MemoryCache::new()))
        .with_throttle(std::time::Duration::ZERO)
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// In-memory dataset source. Unregistered resources fail like a 404.
#[derive(Clone, Default)]
pub struct MockSource {
    bodies: HashMap<String, Vec<u8>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, resource: &str, body: &str) -> Self {
        self.bodies
            .insert(resource.to_string(), body.as_bytes().to_vec());
        self
    }

    /// All four resources with empty lists and an empty meta object.
    pub fn empty() -> Self {
        Self::new()
            .on(crate::loader::META, "{}")
            .on(crate::loader::CATEGORIES, "[]")
            .on(crate::loader::PLACES, "[]")
            .on(crate::loader::PROVENANCE, "[]")
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>> {
        self.fetches.lock().unwrap().push(resource.to_string());
        self.bodies
            .get(resource)
            .cloned()
            .ok_or_else(|| CarteError::load(self.describe(resource), "HTTP 404"))
    }

    fn describe(&self, resource: &str) -> String {
        format!("mock://{resource}")
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const PARIS_VENDOME: LatLng = LatLng::new(48.8675, 2.3294);
pub const LYON: LatLng = LatLng::new(45.7640, 4.8357);
pub const RODEZ: LatLng = LatLng::new(44.3506, 2.5750);

pub const CATEGORIES_JSON: &str = r##"[
    {"id": "salle", "libelle": "Salles", "couleur": "#DC2626"},
    {"id": "gite", "libelle": "Gîtes", "couleur": "#16A34A"}
]"##;
