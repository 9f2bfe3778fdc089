use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Coordinates ---

/// A latitude/longitude pair. Serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build from two loosely-typed JSON values (numbers or numeric strings).
    /// Both must parse to finite numbers.
    pub fn from_lenient(lat: Option<&Value>, lon: Option<&Value>) -> Option<Self> {
        let lat = lenient_number(lat?)?;
        let lon = lenient_number(lon?)?;
        Some(Self { lat, lon })
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(ll: LatLng) -> Self {
        [ll.lat, ll.lon]
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// --- Categories ---

/// Fallback for places whose `categorie` does not match any known category.
pub const FALLBACK_CATEGORY_ID: &str = "autre";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(rename = "libelle", alias = "label")]
    pub label: String,
    #[serde(rename = "couleur", alias = "color")]
    pub color: String,
}

impl Category {
    pub fn fallback() -> Self {
        Self {
            id: FALLBACK_CATEGORY_ID.to_string(),
            label: "Autre".to_string(),
            color: "#2563EB".to_string(),
        }
    }
}

// --- Places ---

/// A site shown on the map, coloured by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "opt_text")]
    pub id: Option<String>,
    #[serde(default, rename = "nom", alias = "name", deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(default, rename = "categorie", alias = "category", deserialize_with = "opt_text")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<Value>,
    #[serde(default, rename = "adresse", alias = "address", deserialize_with = "opt_text")]
    pub address: Option<String>,
    /// "<city> (<department code>)", used when the address does not resolve.
    #[serde(default, rename = "ville_dept", alias = "city", deserialize_with = "opt_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "lien",
        alias = "link",
        alias = "links",
        deserialize_with = "one_or_many"
    )]
    pub links: Vec<String>,
    #[serde(default, rename = "prix", alias = "price", deserialize_with = "opt_text")]
    pub price: Option<String>,
    #[serde(default, rename = "capacite", alias = "capacity", deserialize_with = "opt_text")]
    pub capacity: Option<String>,
}

impl Place {
    pub fn explicit_coords(&self) -> Option<LatLng> {
        LatLng::from_lenient(self.lat.as_ref(), self.lon.as_ref())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Sans nom")
    }

    /// Text describing where the place is: the address, else the city line.
    pub fn location_line(&self) -> &str {
        self.address
            .as_deref()
            .or(self.city.as_deref())
            .unwrap_or("")
    }
}

// --- Provenance ---

/// Participation status of a provenance point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProvenanceStatus {
    #[default]
    Confirmed,
    Uncertain,
    Declined,
}

impl ProvenanceStatus {
    pub const ALL: [ProvenanceStatus; 3] = [
        ProvenanceStatus::Confirmed,
        ProvenanceStatus::Uncertain,
        ProvenanceStatus::Declined,
    ];

    /// Case-insensitive. Anything unrecognized is treated as confirmed.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "incertain" | "uncertain" => ProvenanceStatus::Uncertain,
            "non" | "declined" | "no" => ProvenanceStatus::Declined,
            _ => ProvenanceStatus::Confirmed,
        }
    }

    /// Key used in the data files and in layer ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvenanceStatus::Confirmed => "oui",
            ProvenanceStatus::Uncertain => "incertain",
            ProvenanceStatus::Declined => "non",
        }
    }

    /// Popup label for a single entry.
    pub fn label(&self) -> &'static str {
        match self {
            ProvenanceStatus::Confirmed => "Participant",
            ProvenanceStatus::Uncertain => "Incertain",
            ProvenanceStatus::Declined => "Non participant",
        }
    }

    /// Filter chip label for the whole group.
    pub fn filter_label(&self) -> &'static str {
        match self {
            ProvenanceStatus::Confirmed => "Participants",
            ProvenanceStatus::Uncertain => "Incertains",
            ProvenanceStatus::Declined => "Non participants",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ProvenanceStatus::Confirmed => "prov-oui",
            ProvenanceStatus::Uncertain => "prov-incertain",
            ProvenanceStatus::Declined => "prov-non",
        }
    }
}

impl fmt::Display for ProvenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProvenanceStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProvenanceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(ProvenanceStatus::parse_lenient)
            .unwrap_or_default())
    }
}

/// A participant's place of origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    #[serde(default, deserialize_with = "opt_text")]
    pub id: Option<String>,
    #[serde(default, rename = "nom", alias = "name", deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(default, rename = "etat", alias = "status")]
    pub status: ProvenanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<Value>,
    #[serde(default, rename = "adresse", alias = "address", deserialize_with = "opt_text")]
    pub address: Option<String>,
}

impl ProvenanceEntry {
    pub fn explicit_coords(&self) -> Option<LatLng> {
        LatLng::from_lenient(self.lat.as_ref(), self.lon.as_ref())
    }

    /// Upper-cased id shown in the marker badge.
    pub fn badge(&self) -> String {
        self.id.as_deref().unwrap_or("").to_uppercase()
    }
}

// --- Map metadata ---

pub const DEFAULT_CENTER: LatLng = LatLng::new(48.8566, 2.3522);
pub const DEFAULT_ZOOM: f64 = 6.0;
pub const DEFAULT_ATTRIBUTION: &str = "© OpenStreetMap";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapMeta {
    #[serde(default, rename = "centre", alias = "center")]
    pub center: Option<LatLng>,
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default, rename = "titre", alias = "title", deserialize_with = "opt_text")]
    pub title: Option<String>,
    #[serde(default, rename = "source", alias = "attribution", deserialize_with = "opt_text")]
    pub attribution: Option<String>,
}

impl MapMeta {
    pub fn center_or_default(&self) -> LatLng {
        self.center.unwrap_or(DEFAULT_CENTER)
    }

    pub fn zoom_or_default(&self) -> f64 {
        self.zoom.unwrap_or(DEFAULT_ZOOM)
    }

    pub fn attribution_or_default(&self) -> &str {
        self.attribution.as_deref().unwrap_or(DEFAULT_ATTRIBUTION)
    }
}

// --- Serde helpers ---

/// Accept a string or a number, treat blank strings and null as absent.
fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let links = match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    };
    Ok(links
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_reads_french_fields() {
        let place: Place = serde_json::from_str(
            r#"{
                "id": 7,
                "nom": "Salle des fêtes",
                "categorie": "salle",
                "adresse": "",
                "ville_dept": "Rodez (12)",
                "lien": "https://example.org/annonce",
                "prix": 450,
                "capacite": "120 personnes"
            }"#,
        )
        .unwrap();

        assert_eq!(place.id.as_deref(), Some("7"));
        assert_eq!(place.display_name(), "Salle des fêtes");
        assert_eq!(place.address, None, "blank address is absent");
        assert_eq!(place.location_line(), "Rodez (12)");
        assert_eq!(place.links, vec!["https://example.org/annonce"]);
        assert_eq!(place.price.as_deref(), Some("450"));
        assert_eq!(place.capacity.as_deref(), Some("120 personnes"));
    }

    #[test]
    fn place_accepts_link_list_and_english_aliases() {
        let place: Place = serde_json::from_str(
            r#"{"name": "Gîte", "category": "gite", "links": ["https://a.example", " "]}"#,
        )
        .unwrap();

        assert_eq!(place.category.as_deref(), Some("gite"));
        assert_eq!(place.links, vec!["https://a.example"]);
    }

    #[test]
    fn missing_name_falls_back() {
        let place = Place::default();
        assert_eq!(place.display_name(), "Sans nom");
        assert_eq!(place.location_line(), "");
    }

    #[test]
    fn explicit_coords_accept_numeric_strings() {
        let entry: ProvenanceEntry =
            serde_json::from_str(r#"{"id": "ly", "lat": "45.76", "lon": 4.84}"#).unwrap();
        assert_eq!(entry.explicit_coords(), Some(LatLng::new(45.76, 4.84)));
    }

    #[test]
    fn explicit_coords_reject_partial_or_garbage() {
        let only_lat: ProvenanceEntry = serde_json::from_str(r#"{"lat": 45.0}"#).unwrap();
        assert_eq!(only_lat.explicit_coords(), None);

        let garbage: ProvenanceEntry =
            serde_json::from_str(r#"{"lat": "north", "lon": "east"}"#).unwrap();
        assert_eq!(garbage.explicit_coords(), None);

        let empty: ProvenanceEntry = serde_json::from_str(r#"{"lat": "", "lon": ""}"#).unwrap();
        assert_eq!(empty.explicit_coords(), None);
    }

    #[test]
    fn status_is_case_insensitive_with_confirmed_default() {
        let parse = |json: &str| serde_json::from_str::<ProvenanceEntry>(json).unwrap().status;

        assert_eq!(parse(r#"{"etat": "NON"}"#), ProvenanceStatus::Declined);
        assert_eq!(parse(r#"{"etat": "Incertain"}"#), ProvenanceStatus::Uncertain);
        assert_eq!(parse(r#"{"etat": "oui"}"#), ProvenanceStatus::Confirmed);
        assert_eq!(parse(r#"{"etat": "peut-être"}"#), ProvenanceStatus::Confirmed);
        assert_eq!(parse(r#"{"etat": null}"#), ProvenanceStatus::Confirmed);
        assert_eq!(parse(r#"{}"#), ProvenanceStatus::Confirmed);
    }

    #[test]
    fn badge_is_uppercased_id() {
        let entry: ProvenanceEntry = serde_json::from_str(r#"{"id": "bzh"}"#).unwrap();
        assert_eq!(entry.badge(), "BZH");
    }

    #[test]
    fn meta_defaults() {
        let meta: MapMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta.center_or_default(), DEFAULT_CENTER);
        assert_eq!(meta.zoom_or_default(), 6.0);
        assert_eq!(meta.attribution_or_default(), "© OpenStreetMap");

        let meta: MapMeta =
            serde_json::from_str(r#"{"centre": [45.0, 1.5], "zoom": 8, "titre": "Carte"}"#).unwrap();
        assert_eq!(meta.center_or_default(), LatLng::new(45.0, 1.5));
        assert_eq!(meta.zoom_or_default(), 8.0);
        assert_eq!(meta.title.as_deref(), Some("Carte"));
    }

    #[test]
    fn latlng_serializes_as_pair() {
        let json = serde_json::to_string(&LatLng::new(48.5, 2.25)).unwrap();
        assert_eq!(json, "[48.5,2.25]");
    }
}
