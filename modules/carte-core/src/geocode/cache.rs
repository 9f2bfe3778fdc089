use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use carte_common::LatLng;

use crate::traits::GeoCache;

/// Process-lifetime cache. Nothing is persisted.
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: HashMap<String, LatLng>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: LatLng) -> Self {
        self.entries.insert(key.to_string(), value);
        self
    }
}

#[async_trait]
impl GeoCache for MemoryCache {
    fn get(&self, key: &str) -> Option<LatLng> {
        self.entries.get(key).copied()
    }

    async fn put(&mut self, key: &str, value: LatLng) {
        self.entries.insert(key.to_string(), value);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cache persisted as one JSON object, `{ "<query>": [lat, lon], ... }`.
///
/// The whole file is rewritten after every insert. Read and write failures
/// are logged and otherwise ignored.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: BTreeMap<String, LatLng>,
}

impl JsonFileCache {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, LatLng>>(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Geocode cache is unreadable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read geocode cache, starting empty");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "Geocode cache opened");
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await
    }
}

#[async_trait]
impl GeoCache for JsonFileCache {
    fn get(&self, key: &str) -> Option<LatLng> {
        self.entries.get(key).copied()
    }

    async fn put(&mut self, key: &str, value: LatLng) {
        self.entries.insert(key.to_string(), value);
        if let Err(e) = self.persist().await {
            warn!(path = %self.path.display(), error = %e, "Failed to write geocode cache");
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
