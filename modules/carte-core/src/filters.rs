use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use carte_common::{Category, ProvenanceStatus};

use crate::placement::{MapLayers, Marker};

/// Identifies one feature group on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKey {
    Category(String),
    Provenance(ProvenanceStatus),
}

impl LayerKey {
    pub fn category(id: &str) -> Self {
        LayerKey::Category(id.to_string())
    }

    /// Stable id used in the rendered page (`cat:<id>` / `prov:<status>`).
    pub fn id(&self) -> String {
        match self {
            LayerKey::Category(id) => format!("cat:{id}"),
            LayerKey::Provenance(status) => format!("prov:{}", status.as_str()),
        }
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl Serialize for LayerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id())
    }
}

/// One checkbox of the toolbar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterChip {
    pub key: LayerKey,
    pub label: String,
    /// Swatch colour for categories; provenance chips use a CSS class instead.
    pub color: Option<String>,
    pub css_class: Option<&'static str>,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSection {
    pub title: &'static str,
    pub chips: Vec<FilterChip>,
}

/// Checkbox state of the legend/filter toolbar.
///
/// Only visibility lives here. Markers stay in `MapLayers`, so hiding and
/// showing a group never re-fetches or re-geocodes anything.
#[derive(Debug, Clone)]
pub struct FilterPanel {
    categories: Vec<(Category, bool)>,
    provenance: BTreeMap<ProvenanceStatus, bool>,
}

impl FilterPanel {
    /// Everything starts checked. Categories follow `layers` order, so a
    /// fallback group added during placement gets a chip too.
    pub fn new(layers: &MapLayers) -> Self {
        Self {
            categories: layers
                .categories
                .iter()
                .filter_map(|g| match &g.key {
                    LayerKey::Category(id) => Some((
                        Category {
                            id: id.clone(),
                            label: g.label.clone(),
                            color: g.color.clone().unwrap_or_default(),
                        },
                        true,
                    )),
                    LayerKey::Provenance(_) => None,
                })
                .collect(),
            provenance: ProvenanceStatus::ALL.iter().map(|s| (*s, true)).collect(),
        }
    }

    pub fn is_visible(&self, key: &LayerKey) -> bool {
        match key {
            LayerKey::Category(id) => self
                .categories
                .iter()
                .any(|(c, checked)| &c.id == id && *checked),
            LayerKey::Provenance(status) => self.provenance.get(status).copied().unwrap_or(false),
        }
    }

    /// Set a checkbox. Returns `false` when the key has no checkbox.
    pub fn set(&mut self, key: &LayerKey, checked: bool) -> bool {
        let slot = match key {
            LayerKey::Category(id) => self
                .categories
                .iter_mut()
                .find(|(c, _)| &c.id == id)
                .map(|(_, flag)| flag),
            LayerKey::Provenance(status) => self.provenance.get_mut(status),
        };
        match slot {
            Some(flag) => {
                *flag = checked;
                true
            }
            None => false,
        }
    }

    /// Flip a checkbox. Returns the new state, or `None` for unknown keys.
    pub fn toggle(&mut self, key: &LayerKey) -> Option<bool> {
        let next = !self.is_visible(key);
        self.set(key, next).then_some(next)
    }

    /// Markers of every checked group, in group order. The markers borrow
    /// only `layers`, so the panel can be changed while they are held.
    pub fn visible_markers<'p, 'a: 'p>(
        &'p self,
        layers: &'a MapLayers,
    ) -> impl Iterator<Item = &'a Marker> + 'p {
        layers
            .groups()
            .filter(move |g| self.is_visible(&g.key))
            .flat_map(|g| g.markers.iter())
    }

    /// The toolbar: categories first, then provenance statuses.
    pub fn sections(&self) -> Vec<FilterSection> {
        let categories = self
            .categories
            .iter()
            .map(|(c, checked)| FilterChip {
                key: LayerKey::category(&c.id),
                label: c.label.clone(),
                color: Some(c.color.clone()),
                css_class: None,
                checked: *checked,
            })
            .collect();

        let provenance = ProvenanceStatus::ALL
            .iter()
            .map(|s| FilterChip {
                key: LayerKey::Provenance(*s),
                label: s.filter_label().to_string(),
                color: None,
                css_class: Some(s.css_class()),
                checked: self.provenance.get(s).copied().unwrap_or(false),
            })
            .collect();

        vec![
            FilterSection {
                title: "Catégories",
                chips: categories,
            },
            FilterSection {
                title: "Provenances",
                chips: provenance,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use carte_common::LatLng;

    use super::*;
    use crate::placement::{FeatureGroup, MarkerIcon};

    fn marker(layer: LayerKey, name: &str) -> Marker {
        Marker {
            position: LatLng::new(45.0, 3.0),
            layer,
            name: name.to_string(),
            popup: format!("<strong>{name}</strong>"),
            icon: MarkerIcon::Dot {
                color: "#000".to_string(),
            },
        }
    }

    fn layers() -> MapLayers {
        let categories: Vec<Category> = serde_json::from_str(crate::testing::CATEGORIES_JSON).unwrap();
        let mut layers = MapLayers::new(&categories);
        layers.categories[0].markers = vec![
            marker(LayerKey::category("salle"), "Salle A"),
            marker(LayerKey::category("salle"), "Salle B"),
        ];
        layers.categories[1].markers = vec![marker(LayerKey::category("gite"), "Gîte C")];
        layers.provenance[0].markers =
            vec![marker(LayerKey::Provenance(ProvenanceStatus::Confirmed), "Origine D")];
        layers
    }

    fn names<'a>(markers: impl Iterator<Item = &'a Marker>) -> Vec<&'a str> {
        markers.map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn everything_visible_initially() {
        let layers = layers();
        let panel = FilterPanel::new(&layers);
        assert_eq!(panel.visible_markers(&layers).count(), 4);
    }

    #[test]
    fn unchecking_category_hides_only_that_group() {
        let layers = layers();
        let mut panel = FilterPanel::new(&layers);

        assert!(panel.set(&LayerKey::category("salle"), false));

        assert_eq!(
            names(panel.visible_markers(&layers)),
            vec!["Gîte C", "Origine D"]
        );
    }

    #[test]
    fn toggle_round_trip_restores_same_markers() {
        let layers = layers();
        let mut panel = FilterPanel::new(&layers);
        let before = names(panel.visible_markers(&layers));

        assert_eq!(panel.toggle(&LayerKey::category("gite")), Some(false));
        assert_eq!(panel.toggle(&LayerKey::category("gite")), Some(true));

        assert_eq!(names(panel.visible_markers(&layers)), before);
    }

    #[test]
    fn provenance_status_filters_independently() {
        let layers = layers();
        let mut panel = FilterPanel::new(&layers);

        panel.set(&LayerKey::Provenance(ProvenanceStatus::Confirmed), false);

        assert!(!panel.is_visible(&LayerKey::Provenance(ProvenanceStatus::Confirmed)));
        assert!(panel.is_visible(&LayerKey::Provenance(ProvenanceStatus::Declined)));
        assert_eq!(panel.visible_markers(&layers).count(), 3);
    }

    #[test]
    fn unknown_key_is_ignored() {
        let layers = layers();
        let mut panel = FilterPanel::new(&layers);

        assert!(!panel.set(&LayerKey::category("piscine"), false));
        assert_eq!(panel.toggle(&LayerKey::category("piscine")), None);
        assert_eq!(panel.visible_markers(&layers).count(), 4);
    }

    #[test]
    fn sections_list_categories_then_statuses() {
        let mut layers = layers();
        layers.categories.push(FeatureGroup {
            key: LayerKey::category("autre"),
            label: "Autre".to_string(),
            color: Some("#2563EB".to_string()),
            markers: Vec::new(),
        });
        let mut panel = FilterPanel::new(&layers);
        panel.set(&LayerKey::Provenance(ProvenanceStatus::Declined), false);

        let sections = panel.sections();

        assert_eq!(sections[0].title, "Catégories");
        let labels: Vec<_> = sections[0].chips.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Salles", "Gîtes", "Autre"]);

        assert_eq!(sections[1].title, "Provenances");
        let labels: Vec<_> = sections[1].chips.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Participants", "Incertains", "Non participants"]);
        assert!(!sections[1].chips[2].checked);
    }

    #[test]
    fn layer_key_ids() {
        assert_eq!(LayerKey::category("gite").id(), "cat:gite");
        assert_eq!(LayerKey::Provenance(ProvenanceStatus::Uncertain).id(), "prov:incertain");
    }
}
