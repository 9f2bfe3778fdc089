use serde::Serialize;

use carte_common::{LatLng, MapMeta};

use crate::filters::{FilterPanel, FilterSection};
use crate::placement::{MapLayers, Marker, MarkerIcon};
use crate::view::MapView;

const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Render the complete map page.
///
/// Markers are embedded as a JSON payload and turned into Leaflet feature
/// groups by the inline script, one group per toolbar checkbox.
pub fn render_page(meta: &MapMeta, filters: &FilterPanel, layers: &MapLayers, view: &MapView) -> String {
    let payload = PagePayload {
        attribution: meta.attribution_or_default(),
        tile_url: TILE_URL,
        view,
        layers: layers
            .groups()
            .map(|g| PageLayer {
                id: g.key.id(),
                visible: filters.is_visible(&g.key),
                markers: g.markers.iter().map(PageMarker::from).collect(),
            })
            .collect(),
    };

    let title_bar = match &meta.title {
        Some(title) => format!(
            r#"<div class="titlebar"><div class="title">{}</div></div>"#,
            html_escape(title)
        ),
        None => String::new(),
    };

    let toolbar: String = filters.sections().iter().map(render_section).collect();

    let content = format!(
        r#"<div id="map"></div>
{title_bar}
<button id="toggleToolbar" type="button" aria-controls="toolbar" aria-expanded="false">Légende &amp; filtres</button>
<div id="toolbar">{toolbar}</div>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script type="application/json" id="carte-data">{data}</script>
<script>{script}</script>"#,
        data = json_for_script(&payload),
        script = MAP_SCRIPT,
    );

    build_page(meta.title.as_deref().unwrap_or("Carte"), &content)
}

/// Static error panel shown when the datasets could not be loaded.
pub fn render_error_page(error: &str) -> String {
    let content = format!(
        r#"<div id="map"><div class="error-panel">
    <strong>Erreur de chargement des données.</strong><br>
    <small>{}</small>
</div></div>"#,
        html_escape(error)
    );
    build_page("Erreur", &content)
}

/// All placed markers as a GeoJSON FeatureCollection.
pub fn to_geojson(layers: &MapLayers) -> serde_json::Value {
    let features: Vec<serde_json::Value> = layers
        .markers()
        .map(|m| {
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [m.position.lon, m.position.lat],
                },
                "properties": {
                    "layer": m.layer.id(),
                    "name": m.name,
                    "popup": m.popup,
                },
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

// --- Payload ---

#[derive(Serialize)]
struct PagePayload<'a> {
    attribution: &'a str,
    tile_url: &'a str,
    view: &'a MapView,
    layers: Vec<PageLayer>,
}

#[derive(Serialize)]
struct PageLayer {
    id: String,
    visible: bool,
    markers: Vec<PageMarker>,
}

#[derive(Serialize)]
struct PageMarker {
    position: LatLng,
    popup: String,
    class_name: &'static str,
    icon_html: String,
    size: u32,
}

impl From<&Marker> for PageMarker {
    fn from(m: &Marker) -> Self {
        let (class_name, icon_html) = match &m.icon {
            MarkerIcon::Dot { color } => (
                "mk",
                format!(r#"<span class="dot" style="background:{}"></span>"#, html_escape(color)),
            ),
            MarkerIcon::Badge { text, class } => (
                "mk-provenance",
                format!(r#"<span class="icon-badge {class}">{}</span>"#, html_escape(text)),
            ),
        };
        Self {
            position: m.position,
            popup: m.popup.clone(),
            class_name,
            icon_html,
            size: m.icon.size(),
        }
    }
}

/// Serialize for embedding inside a `<script>` element.
fn json_for_script<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

// --- Toolbar ---

fn render_section(section: &FilterSection) -> String {
    let chips: String = section
        .chips
        .iter()
        .map(|chip| {
            let swatch = match (&chip.color, chip.css_class) {
                (_, Some(class)) => {
                    format!(r#"<span class="swatch {class}" style="background:transparent;"></span>"#)
                }
                (Some(color), None) => {
                    format!(r#"<span class="swatch" style="background:{}"></span>"#, html_escape(color))
                }
                (None, None) => r#"<span class="swatch"></span>"#.to_string(),
            };
            format!(
                r#"<label class="label-chip"><input type="checkbox" data-layer="{id}"{checked}> {swatch} {label}</label>"#,
                id = html_escape(&chip.key.id()),
                checked = if chip.checked { " checked" } else { "" },
                label = html_escape(&chip.label),
            )
        })
        .collect();

    format!(
        r#"<div class="section"><span class="ttl">{}</span><div class="row">{chips}</div></div>"#,
        html_escape(section.title)
    )
}

// --- Helpers ---

fn build_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
<style>{style}</style>
</head>
<body>
{content}
</body>
</html>"#,
        title = html_escape(title),
        style = PAGE_STYLE,
    )
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PAGE_STYLE: &str = r#"
*{margin:0;padding:0;box-sizing:border-box;}
html,body{height:100%;}
body{font-family:system-ui,"Segoe UI",Roboto,Arial,sans-serif;color:#1a1a1a;}
#map{position:absolute;inset:0;}
.error-panel{padding:12px;}
.titlebar{position:absolute;top:10px;left:56px;z-index:1000;background:#fff;border-radius:6px;padding:6px 12px;box-shadow:0 1px 4px rgba(0,0,0,.3);}
.titlebar .title{font-weight:600;font-size:16px;}
#toolbar{position:absolute;top:10px;right:10px;z-index:1000;max-width:320px;background:#fff;border-radius:6px;padding:8px 12px;box-shadow:0 1px 4px rgba(0,0,0,.3);font-size:13px;}
#toolbar.hidden{display:none;}
#toolbar .section{margin-bottom:6px;}
#toolbar .ttl{display:block;font-weight:600;margin-bottom:4px;}
#toolbar .row{display:flex;flex-wrap:wrap;gap:4px 10px;}
.label-chip{display:inline-flex;align-items:center;gap:4px;cursor:pointer;}
.swatch{display:inline-block;width:12px;height:12px;border-radius:50%;border:2px solid transparent;}
.swatch.prov-oui{border-color:#16A34A;}
.swatch.prov-incertain{border-color:#F59E0B;}
.swatch.prov-non{border-color:#9CA3AF;}
#toggleToolbar{display:none;position:absolute;bottom:24px;right:10px;z-index:1001;padding:6px 10px;border:0;border-radius:6px;background:#1a1a1a;color:#fff;}
.mk .dot{display:block;width:16px;height:16px;border-radius:50%;border:2px solid #fff;box-shadow:0 0 2px rgba(0,0,0,.6);}
.icon-badge{display:flex;align-items:center;justify-content:center;width:26px;height:26px;border-radius:50%;background:#fff;border:3px solid;font-size:9px;font-weight:700;}
.icon-badge.prov-oui{border-color:#16A34A;}
.icon-badge.prov-incertain{border-color:#F59E0B;}
.icon-badge.prov-non{border-color:#9CA3AF;color:#6B7280;}
@media (max-width:767px){#toggleToolbar{display:block;}#toolbar{top:auto;bottom:64px;left:10px;max-width:none;}}
"#;

const MAP_SCRIPT: &str = r#"
(function () {
  const data = JSON.parse(document.getElementById('carte-data').textContent);
  const map = L.map('map');
  if (data.view.mode === 'fit') {
    map.fitBounds([data.view.bounds.south_west, data.view.bounds.north_east]);
  } else {
    map.setView(data.view.center, data.view.zoom);
  }
  L.tileLayer(data.tile_url, { attribution: data.attribution }).addTo(map);

  const groups = {};
  data.layers.forEach(layer => {
    const group = L.featureGroup();
    layer.markers.forEach(m => {
      const half = m.size / 2;
      const icon = L.divIcon({
        className: m.class_name,
        html: m.icon_html,
        iconSize: [m.size, m.size],
        iconAnchor: [half, half],
        popupAnchor: [0, -half],
      });
      L.marker(m.position, { icon }).addTo(group).bindPopup(m.popup);
    });
    if (layer.visible) group.addTo(map);
    groups[layer.id] = group;
  });

  const toolbar = document.getElementById('toolbar');
  function applyFilters() {
    toolbar.querySelectorAll('input[data-layer]').forEach(cb => {
      const group = groups[cb.dataset.layer];
      if (!group) return;
      if (cb.checked) map.addLayer(group); else map.removeLayer(group);
    });
  }
  toolbar.querySelectorAll('input[type="checkbox"]').forEach(cb => cb.addEventListener('change', applyFilters));
  applyFilters();

  const btn = document.getElementById('toggleToolbar');
  function setExpanded(expanded) {
    btn.setAttribute('aria-expanded', expanded ? 'true' : 'false');
    toolbar.classList.toggle('hidden', !expanded && window.matchMedia('(max-width: 767px)').matches);
  }
  btn.addEventListener('click', () => setExpanded(btn.getAttribute('aria-expanded') !== 'true'));
  setExpanded(false);
})();
"#;

#[cfg(test)]
mod tests {
    use carte_common::{Category, ProvenanceStatus};

    use super::*;
    use crate::filters::LayerKey;

    fn layers_with_marker(popup: &str) -> MapLayers {
        let categories = vec![Category {
            id: "salle".to_string(),
            label: "Salles <grandes>".to_string(),
            color: "#DC2626".to_string(),
        }];
        let mut layers = MapLayers::new(&categories);
        layers.categories[0].markers.push(Marker {
            position: LatLng::new(48.8675, 2.3294),
            layer: LayerKey::category("salle"),
            name: "Vendôme".to_string(),
            popup: popup.to_string(),
            icon: MarkerIcon::Dot {
                color: "#DC2626".to_string(),
            },
        });
        layers
    }

    #[test]
    fn escapes_html_special_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn page_embeds_markers_and_toolbar() {
        let layers = layers_with_marker("<strong>Vendôme</strong>");
        let filters = FilterPanel::new(&layers);
        let meta: MapMeta = serde_json::from_str(r#"{"titre": "Nos salles"}"#).unwrap();
        let view = crate::view::initial_view(&meta, &layers);

        let html = render_page(&meta, &filters, &layers, &view);

        assert!(html.contains("<title>Nos salles</title>"));
        assert!(html.contains(r#"<div class="title">Nos salles</div>"#));
        assert!(html.contains(r#"data-layer="cat:salle" checked"#));
        assert!(html.contains("Salles &lt;grandes&gt;"));
        assert!(html.contains(r#"data-layer="prov:incertain" checked"#));
        assert!(html.contains("Non participants"));
        assert!(html.contains(r#""mode":"fit""#));
        // Closing tags inside the payload cannot end the script element.
        assert!(html.contains(r#"<strong>Vendôme<\/strong>"#));
        assert!(!html.contains("<strong>Vendôme</strong>"));
    }

    #[test]
    fn unchecked_layers_start_hidden() {
        let layers = layers_with_marker("x");
        let mut filters = FilterPanel::new(&layers);
        filters.set(&LayerKey::Provenance(ProvenanceStatus::Declined), false);
        let meta = MapMeta::default();
        let view = crate::view::initial_view(&meta, &layers);

        let html = render_page(&meta, &filters, &layers, &view);

        assert!(html.contains(r#"{"id":"prov:non","visible":false"#));
        assert!(html.contains(r#"<input type="checkbox" data-layer="prov:non"> "#));
    }

    #[test]
    fn page_without_title_has_no_title_bar() {
        let layers = MapLayers::default();
        let filters = FilterPanel::new(&layers);
        let meta = MapMeta::default();
        let view = crate::view::initial_view(&meta, &layers);

        let html = render_page(&meta, &filters, &layers, &view);

        assert!(!html.contains("titlebar\">"));
        assert!(html.contains(r#""mode":"center""#));
        assert!(html.contains("© OpenStreetMap"));
    }

    #[test]
    fn error_page_shows_escaped_message() {
        let html = render_error_page("Erreur de chargement: data/meta.json: <404>");
        assert!(html.contains("<strong>Erreur de chargement des données.</strong>"));
        assert!(html.contains("<small>Erreur de chargement: data/meta.json: &lt;404&gt;</small>"));
    }

    #[test]
    fn geojson_uses_lon_lat_order() {
        let layers = layers_with_marker("p");
        let geojson = to_geojson(&layers);

        assert_eq!(geojson["type"], "FeatureCollection");
        let feature = &geojson["features"][0];
        assert_eq!(feature["geometry"]["coordinates"], serde_json::json!([2.3294, 48.8675]));
        assert_eq!(feature["properties"]["layer"], "cat:salle");
        assert_eq!(feature["properties"]["name"], "Vendôme");
    }
}
