use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use carte_common::{Category, LatLng, Place, ProvenanceEntry, ProvenanceStatus};

use crate::filters::LayerKey;
use crate::geocode::Geocoder;
use crate::loader::Datasets;
use crate::render::html_escape;

// --- Output types ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerIcon {
    /// Coloured dot used for places.
    Dot { color: String },
    /// Round badge with the provenance id.
    Badge { text: String, class: &'static str },
}

impl MarkerIcon {
    /// Icon size in pixels (square).
    pub fn size(&self) -> u32 {
        match self {
            MarkerIcon::Dot { .. } => 16,
            MarkerIcon::Badge { .. } => 26,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLng,
    pub layer: LayerKey,
    pub name: String,
    /// Pre-escaped HTML.
    pub popup: String,
    pub icon: MarkerIcon,
}

/// A named collection of markers shown or hidden together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureGroup {
    pub key: LayerKey,
    pub label: String,
    pub color: Option<String>,
    pub markers: Vec<Marker>,
}

impl FeatureGroup {
    fn new(key: LayerKey, label: &str, color: Option<&str>) -> Self {
        Self {
            key,
            label: label.to_string(),
            color: color.map(String::from),
            markers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Place,
    Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No explicit coordinates and nothing to geocode.
    NoLocation,
    /// Every geocoding attempt came back empty.
    NotFound,
    /// The geocoding request itself failed.
    GeocodeFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub kind: EntityKind,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Placed(Marker),
    Skipped(Skipped),
}

/// All marker groups of a map: one per category, one per provenance status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapLayers {
    pub categories: Vec<FeatureGroup>,
    pub provenance: Vec<FeatureGroup>,
    pub skipped: Vec<Skipped>,
}

impl MapLayers {
    /// Empty groups for every category (input order) and every status.
    pub fn new(categories: &[Category]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|c| FeatureGroup::new(LayerKey::category(&c.id), &c.label, Some(&c.color)))
                .collect(),
            provenance: ProvenanceStatus::ALL
                .iter()
                .map(|s| FeatureGroup::new(LayerKey::Provenance(*s), s.filter_label(), None))
                .collect(),
            skipped: Vec::new(),
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &FeatureGroup> {
        self.categories.iter().chain(self.provenance.iter())
    }

    pub fn group(&self, key: &LayerKey) -> Option<&FeatureGroup> {
        self.groups().find(|g| &g.key == key)
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.groups().flat_map(|g| g.markers.iter())
    }

    pub fn marker_count(&self) -> usize {
        self.groups().map(|g| g.markers.len()).sum()
    }

    fn ensure_category(&mut self, category: &Category) {
        let key = LayerKey::category(&category.id);
        if !self.categories.iter().any(|g| g.key == key) {
            self.categories
                .push(FeatureGroup::new(key, &category.label, Some(&category.color)));
        }
    }

    fn add(&mut self, placement: Placement) {
        match placement {
            Placement::Placed(marker) => {
                let group = match &marker.layer {
                    LayerKey::Category(_) => self.categories.iter_mut().find(|g| g.key == marker.layer),
                    LayerKey::Provenance(_) => self.provenance.iter_mut().find(|g| g.key == marker.layer),
                };
                if let Some(group) = group {
                    group.markers.push(marker);
                }
            }
            Placement::Skipped(skipped) => self.skipped.push(skipped),
        }
    }
}

// --- Placement ---

/// Lookup table of categories by id, with the fallback for unknown ids.
pub struct CategoryIndex {
    by_id: HashMap<String, Category>,
    fallback: Category,
}

impl CategoryIndex {
    pub fn new(categories: &[Category]) -> Self {
        Self {
            by_id: categories.iter().map(|c| (c.id.clone(), c.clone())).collect(),
            fallback: Category::fallback(),
        }
    }

    pub fn resolve(&self, id: Option<&str>) -> &Category {
        id.and_then(|id| self.by_id.get(id)).unwrap_or(&self.fallback)
    }
}

/// Position a provenance entry: explicit coordinates, else its address.
pub async fn place_provenance(geocoder: &mut Geocoder, entry: &ProvenanceEntry) -> Placement {
    let name = entry.name.clone().unwrap_or_default();

    let position = match entry.explicit_coords() {
        Some(ll) => ll,
        None => {
            let Some(address) = entry.address.as_deref() else {
                return skip(EntityKind::Provenance, name, SkipReason::NoLocation);
            };
            match geocoder.resolve(address).await {
                Ok(Some(ll)) => ll,
                Ok(None) => return skip(EntityKind::Provenance, name, SkipReason::NotFound),
                Err(e) => {
                    return skip(EntityKind::Provenance, name, SkipReason::GeocodeFailed(e.to_string()))
                }
            }
        }
    };

    let status = entry.status;
    Placement::Placed(Marker {
        position,
        layer: LayerKey::Provenance(status),
        popup: provenance_popup(entry),
        icon: MarkerIcon::Badge {
            text: entry.badge(),
            class: status.css_class(),
        },
        name,
    })
}

/// Position a place: explicit coordinates, else its address, else its
/// city/department line.
pub async fn place_site(
    geocoder: &mut Geocoder,
    place: &Place,
    categories: &CategoryIndex,
) -> Placement {
    let name = place.display_name().to_string();

    let position = match place.explicit_coords() {
        Some(ll) => ll,
        None => {
            let candidates: Vec<&str> = [place.address.as_deref(), place.city.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if candidates.is_empty() {
                return skip(EntityKind::Place, name, SkipReason::NoLocation);
            }

            let mut found = None;
            for text in candidates {
                match geocoder.resolve(text).await {
                    Ok(Some(ll)) => {
                        found = Some(ll);
                        break;
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        return skip(EntityKind::Place, name, SkipReason::GeocodeFailed(e.to_string()))
                    }
                }
            }
            match found {
                Some(ll) => ll,
                None => return skip(EntityKind::Place, name, SkipReason::NotFound),
            }
        }
    };

    let category = categories.resolve(place.category.as_deref());
    Placement::Placed(Marker {
        position,
        layer: LayerKey::category(&category.id),
        popup: place_popup(place),
        icon: MarkerIcon::Dot {
            color: category.color.clone(),
        },
        name,
    })
}

/// Place every provenance entry, then every place, one at a time.
pub async fn place_all(geocoder: &mut Geocoder, datasets: &Datasets) -> MapLayers {
    let mut layers = MapLayers::new(&datasets.categories);
    let index = CategoryIndex::new(&datasets.categories);

    for entry in &datasets.provenance {
        let placement = place_provenance(geocoder, entry).await;
        layers.add(placement);
    }

    for place in &datasets.places {
        let category = index.resolve(place.category.as_deref()).clone();
        let placement = place_site(geocoder, place, &index).await;
        if matches!(placement, Placement::Placed(_)) {
            layers.ensure_category(&category);
        }
        layers.add(placement);
    }

    info!(
        placed = layers.marker_count(),
        skipped = layers.skipped.len(),
        "Placement complete"
    );
    layers
}

/// Every skipped entity goes through here and logs exactly one warning.
fn skip(kind: EntityKind, name: String, reason: SkipReason) -> Placement {
    warn!(?kind, name = name.as_str(), ?reason, "Entity skipped");
    Placement::Skipped(Skipped { kind, name, reason })
}

// --- Popups ---

fn place_popup(place: &Place) -> String {
    let mut html = format!(
        "<strong>{}</strong><div>{}</div>",
        html_escape(place.display_name()),
        html_escape(place.location_line()),
    );
    if let Some(desc) = &place.description {
        html.push_str(&format!("<div>{}</div>", html_escape(desc)));
    }
    if let Some(price) = &place.price {
        html.push_str(&format!("<div>Prix : {}</div>", html_escape(price)));
    }
    if let Some(capacity) = &place.capacity {
        html.push_str(&format!("<div>Capacité : {}</div>", html_escape(capacity)));
    }
    for link in &place.links {
        html.push_str(&format!(
            r#"<div style="margin-top:6px"><a href="{}" target="_blank" rel="noopener">Voir l’annonce</a></div>"#,
            html_escape(link)
        ));
    }
    html
}

fn provenance_popup(entry: &ProvenanceEntry) -> String {
    let prefix = match entry.id.as_deref() {
        Some(id) => format!("{id} – "),
        None => String::new(),
    };
    format!(
        r#"<strong>{}{}</strong><div>{}</div><div style="margin-top:6px"><em>{}</em></div>"#,
        html_escape(&prefix),
        html_escape(entry.name.as_deref().unwrap_or("")),
        html_escape(entry.address.as_deref().unwrap_or("")),
        entry.status.label(),
    )
}
