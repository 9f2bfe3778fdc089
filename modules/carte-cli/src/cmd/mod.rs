pub mod build;
pub mod geocode;
pub mod serve;

use carte_common::Config;
use carte_core::geocode::JsonFileCache;
use carte_core::{Geocoder, NominatimProvider};

/// Nominatim-backed geocoder with the persisted cache from `config`.
pub fn geocoder(config: &Config) -> Geocoder {
    let provider = NominatimProvider::new(&config.nominatim_url, &config.user_agent, &config.language);
    let cache = JsonFileCache::open(&config.cache_path);
    Geocoder::new(Box::new(provider), Box::new(cache))
        .with_throttle(config.throttle)
        .with_country(&config.country)
}
