use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CarteError, Result};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_THROTTLE_MS: u64 = 900;

/// Runtime configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Dataset location: a directory path or an `http(s)://` base URL.
    pub data: String,
    pub out_dir: PathBuf,
    pub cache_path: PathBuf,

    // Geocoding
    pub nominatim_url: String,
    pub user_agent: String,
    pub throttle: Duration,
    pub country: String,
    pub language: String,

    // serve
    pub addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: "data".to_string(),
            out_dir: PathBuf::from("dist"),
            cache_path: PathBuf::from("geocode-cache.json"),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: concat!("carte/", env!("CARGO_PKG_VERSION")).to_string(),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            country: "France".to_string(),
            language: "fr".to_string(),
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment. Every variable is optional.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let throttle = match lookup("GEOCODE_THROTTLE_MS") {
            Some(raw) => Duration::from_millis(raw.trim().parse().map_err(|_| {
                CarteError::Config(format!("GEOCODE_THROTTLE_MS must be a number, got {raw:?}"))
            })?),
            None => defaults.throttle,
        };

        Ok(Self {
            data: lookup("CARTE_DATA").unwrap_or(defaults.data),
            out_dir: lookup("CARTE_OUT").map(PathBuf::from).unwrap_or(defaults.out_dir),
            cache_path: lookup("CARTE_CACHE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            nominatim_url: lookup("NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            user_agent: lookup("NOMINATIM_USER_AGENT").unwrap_or(defaults.user_agent),
            throttle,
            country: lookup("GEOCODE_COUNTRY").unwrap_or(defaults.country),
            language: lookup("GEOCODE_LANGUAGE").unwrap_or(defaults.language),
            addr: lookup("CARTE_ADDR").unwrap_or(defaults.addr),
        })
    }

    pub fn log_redacted(&self) {
        tracing::info!(
            data = self.data.as_str(),
            out_dir = %self.out_dir.display(),
            cache = %self.cache_path.display(),
            nominatim_url = self.nominatim_url.as_str(),
            throttle_ms = self.throttle.as_millis() as u64,
            country = self.country.as_str(),
            language = self.language.as_str(),
            "Configuration loaded"
        );
    }
}
