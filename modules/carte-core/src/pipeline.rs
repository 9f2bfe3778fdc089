use tracing::info;

use carte_common::Result;

use crate::filters::FilterPanel;
use crate::geocode::{GeocodeStats, Geocoder};
use crate::loader::{load_datasets, Datasets};
use crate::placement::{place_all, MapLayers};
use crate::render::{render_page, to_geojson};
use crate::traits::DataSource;
use crate::view::{initial_view, MapView};

/// A fully placed map, ready to render.
pub struct BuiltMap {
    pub datasets: Datasets,
    pub layers: MapLayers,
    pub filters: FilterPanel,
    pub view: MapView,
    pub geocode_stats: GeocodeStats,
}

impl BuiltMap {
    pub fn html(&self) -> String {
        render_page(&self.datasets.meta, &self.filters, &self.layers, &self.view)
    }

    pub fn geojson(&self) -> serde_json::Value {
        to_geojson(&self.layers)
    }
}

/// Load the datasets, then geocode and place every entity.
///
/// Only a load failure is an error; entities that cannot be placed are
/// recorded in `layers.skipped`.
pub async fn build_map(source: &dyn DataSource, geocoder: &mut Geocoder) -> Result<BuiltMap> {
    let datasets = load_datasets(source).await?;
    let layers = place_all(geocoder, &datasets).await;
    let filters = FilterPanel::new(&layers);
    let view = initial_view(&datasets.meta, &layers);
    let geocode_stats = geocoder.stats();

    info!(
        markers = layers.marker_count(),
        skipped = layers.skipped.len(),
        %geocode_stats,
        "Map built"
    );

    Ok(BuiltMap {
        datasets,
        layers,
        filters,
        view,
        geocode_stats,
    })
}
