use anyhow::Result;
use tracing::info;

use carte_common::{Config, LatLng};

pub async fn run(config: &Config, text: &str) -> Result<()> {
    let mut geocoder = super::geocoder(config);
    let found = geocoder.resolve(text).await?;
    println!("{}", output_line(found));
    info!(stats = %geocoder.stats(), "Geocode finished");
    Ok(())
}

/// `lat,lon`, or `not found`.
fn output_line(found: Option<LatLng>) -> String {
    match found {
        Some(ll) => ll.to_string(),
        None => "not found".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn prints_coordinates_or_not_found() {
        assert_eq!(output_line(Some(LatLng::new(44.35, 2.57))), "44.35,2.57");
        assert_eq!(output_line(None), "not found");
    }

    #[tokio::test]
    async fn cached_query_resolves_offline() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");
        std::fs::write(&cache_path, r#"{"Rodez, Aveyron, France": [44.35, 2.57]}"#).unwrap();
        let config = Config {
            cache_path,
            nominatim_url: "http://127.0.0.1:9".to_string(),
            throttle: Duration::ZERO,
            ..Config::default()
        };

        let mut geocoder = crate::cmd::geocoder(&config);
        let found = geocoder.resolve("Rodez (12)").await.unwrap();

        assert_eq!(output_line(found), "44.35,2.57");
        assert_eq!(geocoder.stats().requests, 0);
        run(&config, "Rodez (12)").await.unwrap();
    }
}
