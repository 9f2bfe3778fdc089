pub mod filters;
pub mod geocode;
pub mod loader;
pub mod pipeline;
pub mod placement;
pub mod render;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod view;

pub use filters::{FilterPanel, FilterSection, LayerKey};
pub use geocode::{Geocoder, GeocodeStats, NominatimProvider};
pub use loader::{load_datasets, source_for, Datasets, DirSource, HttpSource};
pub use pipeline::{build_map, BuiltMap};
pub use placement::{FeatureGroup, MapLayers, Marker, MarkerIcon, Placement, SkipReason, Skipped};
pub use traits::{DataSource, GeoCache, GeocodeProvider};
pub use view::{Bounds, MapView};
