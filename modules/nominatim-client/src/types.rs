use serde::{Deserialize, Serialize};

use crate::error::{NominatimError, Result};

/// One entry of a `/search?format=json` response.
///
/// Nominatim returns coordinates as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub place_id: Option<u64>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default)]
    pub importance: Option<f64>,
}

impl SearchResult {
    /// Parse the string coordinates into a `(lat, lon)` pair.
    pub fn coordinates(&self) -> Result<(f64, f64)> {
        let lat = parse_coord("lat", &self.lat)?;
        let lon = parse_coord("lon", &self.lon)?;
        Ok((lat, lon))
    }
}

fn parse_coord(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| NominatimError::Parse(format!("invalid {field}: {raw:?}")))
}

/// Query options sent with every search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results (`limit`).
    pub limit: u32,
    /// Preferred result language (`accept-language`).
    pub language: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 1,
            language: "fr".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_coordinates() {
        let results: Vec<SearchResult> = serde_json::from_str(
            r#"[{"place_id": 42, "lat": "48.8675", "lon": "2.3294", "display_name": "Place Vendôme, Paris", "type": "square"}]"#,
        )
        .unwrap();

        let (lat, lon) = results[0].coordinates().unwrap();
        assert!((lat - 48.8675).abs() < 1e-9);
        assert!((lon - 2.3294).abs() < 1e-9);
        assert_eq!(results[0].place_type.as_deref(), Some("square"));
    }

    #[test]
    fn rejects_garbage_coordinates() {
        let result = SearchResult {
            lat: "north".to_string(),
            lon: "2.0".to_string(),
            display_name: None,
            place_id: None,
            place_type: None,
            importance: None,
        };

        let err = result.coordinates().unwrap_err();
        assert!(matches!(err, NominatimError::Parse(_)));
    }
}
