use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::info;

use carte_common::{CarteError, Category, MapMeta, Place, ProvenanceEntry, Result};

use crate::traits::DataSource;

pub const META: &str = "meta.json";
pub const CATEGORIES: &str = "categories.json";
pub const PLACES: &str = "lieux.json";
pub const PROVENANCE: &str = "provenances.json";

/// Everything the map is built from. Loaded once, never mutated.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub meta: MapMeta,
    pub categories: Vec<Category>,
    pub places: Vec<Place>,
    pub provenance: Vec<ProvenanceEntry>,
}

/// Fetch the four datasets concurrently, then parse them.
///
/// Any fetch or parse failure aborts the whole load.
pub async fn load_datasets(source: &dyn DataSource) -> Result<Datasets> {
    let (meta, categories, places, provenance) = tokio::try_join!(
        source.fetch(META),
        source.fetch(CATEGORIES),
        source.fetch(PLACES),
        source.fetch(PROVENANCE),
    )?;

    let datasets = Datasets {
        meta: parse(source, META, &meta)?,
        categories: parse_list(source, CATEGORIES, &categories)?,
        places: parse_list(source, PLACES, &places)?,
        provenance: parse_list(source, PROVENANCE, &provenance)?,
    };

    info!(
        categories = datasets.categories.len(),
        places = datasets.places.len(),
        provenance = datasets.provenance.len(),
        "Datasets loaded"
    );
    Ok(datasets)
}

fn parse<T: DeserializeOwned>(source: &dyn DataSource, resource: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CarteError::parse(source.describe(resource), e))
}

/// A `null` list is treated as empty.
fn parse_list<T: DeserializeOwned>(
    source: &dyn DataSource,
    resource: &str,
    bytes: &[u8],
) -> Result<Vec<T>> {
    let list: Option<Vec<T>> = parse(source, resource, bytes)?;
    Ok(list.unwrap_or_default())
}

/// Pick a source for a location string: `http(s)://` URLs are fetched over
/// HTTP, anything else is a directory.
pub fn source_for(location: &str) -> Box<dyn DataSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location))
    } else {
        Box::new(DirSource::new(location))
    }
}

// ---------------------------------------------------------------------------
// DirSource
// ---------------------------------------------------------------------------

pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for DirSource {
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>> {
        let path = self.root.join(resource);
        tokio::fs::read(&path)
            .await
            .map_err(|e| CarteError::load(self.describe(resource), e))
    }

    fn describe(&self, resource: &str) -> String {
        self.root.join(resource).display().to_string()
    }
}

// ---------------------------------------------------------------------------
// HttpSource
// ---------------------------------------------------------------------------

pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, resource: &str) -> Result<Vec<u8>> {
        let url = self.describe(resource);
        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| CarteError::load(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CarteError::load(&url, format!("HTTP {}", status.as_u16())));
        }

        let body = resp.bytes().await.map_err(|e| CarteError::load(&url, e))?;
        Ok(body.to_vec())
    }

    fn describe(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSource, CATEGORIES_JSON};

    #[tokio::test]
    async fn loads_all_four_resources() {
        let source = MockSource::empty()
            .on(CATEGORIES, CATEGORIES_JSON)
            .on(META, r#"{"titre": "Salles", "zoom": 7}"#)
            .on(PROVENANCE, "null");

        let datasets = load_datasets(&source).await.unwrap();

        assert_eq!(datasets.categories.len(), 2);
        assert_eq!(datasets.meta.title.as_deref(), Some("Salles"));
        assert!(datasets.provenance.is_empty());
        let mut fetched = source.fetches();
        fetched.sort();
        assert_eq!(fetched, vec![CATEGORIES, PLACES, META, PROVENANCE]);
    }

    #[tokio::test]
    async fn missing_resource_is_fatal_and_named() {
        let source = MockSource::new()
            .on(META, "{}")
            .on(CATEGORIES, "[]")
            .on(PLACES, "[]");

        let err = load_datasets(&source).await.unwrap_err();

        match err {
            CarteError::Load { resource, .. } => assert_eq!(resource, "mock://provenances.json"),
            other => panic!("expected Load error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_fatal() {
        let source = MockSource::empty().on(PLACES, "[{");

        let err = load_datasets(&source).await.unwrap_err();
        assert!(matches!(err, CarteError::Parse { ref resource, .. } if resource == "mock://lieux.json"));
    }

    #[tokio::test]
    async fn dir_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [(META, "{}"), (CATEGORIES, CATEGORIES_JSON), (PLACES, "[]"), (PROVENANCE, "[]")] {
            std::fs::write(dir.path().join(name), body).unwrap();
        }

        let source = DirSource::new(dir.path());
        let datasets = load_datasets(&source).await.unwrap();
        assert_eq!(datasets.categories[1].label, "Gîtes");
    }

    #[tokio::test]
    async fn http_source_rejects_non_success_status() {
        use axum::{http::StatusCode, routing::get, Router};

        let router = Router::new()
            .route("/data/meta.json", get(|| async { "{}" }))
            .route("/data/categories.json", get(|| async { "[]" }))
            .route("/data/lieux.json", get(|| async { "[]" }))
            .route(
                "/data/provenances.json",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let source = HttpSource::new(&format!("http://{addr}/data/"));
        let err = load_datasets(&source).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("Erreur de chargement: http://{addr}/data/provenances.json: HTTP 500")
        );
    }

    #[test]
    fn source_for_picks_by_scheme() {
        assert_eq!(
            source_for("https://example.org/data").describe(META),
            "https://example.org/data/meta.json"
        );
        assert!(source_for("data").describe(META).ends_with("meta.json"));
    }
}
