use serde::Serialize;

use carte_common::{LatLng, MapMeta};

use crate::placement::MapLayers;

/// Padding ratio applied around the markers when fitting the view.
pub const FIT_PADDING: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn from_point(p: LatLng) -> Self {
        Self {
            south_west: p,
            north_east: p,
        }
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lon = self.south_west.lon.min(p.lon);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lon = self.north_east.lon.max(p.lon);
    }

    /// Grow by `ratio` of the span on every side (Leaflet's `LatLngBounds.pad`).
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buf = (self.north_east.lat - self.south_west.lat).abs() * ratio;
        let lon_buf = (self.north_east.lon - self.south_west.lon).abs() * ratio;
        Self {
            south_west: LatLng::new(self.south_west.lat - lat_buf, self.south_west.lon - lon_buf),
            north_east: LatLng::new(self.north_east.lat + lat_buf, self.north_east.lon + lon_buf),
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lon + self.north_east.lon) / 2.0,
        )
    }
}

/// How the page opens: either fit to the markers, or the configured centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MapView {
    Fit { bounds: Bounds },
    Center { center: LatLng, zoom: f64 },
}

pub fn bounds_of<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Bounds> {
    let mut iter = points.into_iter();
    let mut bounds = Bounds::from_point(*iter.next()?);
    for p in iter {
        bounds.extend(*p);
    }
    Some(bounds)
}

pub fn initial_view(meta: &MapMeta, layers: &MapLayers) -> MapView {
    match bounds_of(layers.markers().map(|m| &m.position)) {
        Some(bounds) => MapView::Fit {
            bounds: bounds.pad(FIT_PADDING),
        },
        None => MapView::Center {
            center: meta.center_or_default(),
            zoom: meta.zoom_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn bounds_cover_all_points() {
        let points = [
            LatLng::new(45.0, 2.0),
            LatLng::new(47.0, -1.0),
            LatLng::new(44.0, 5.0),
        ];
        let bounds = bounds_of(points.iter()).unwrap();
        assert_eq!(bounds.south_west, LatLng::new(44.0, -1.0));
        assert_eq!(bounds.north_east, LatLng::new(47.0, 5.0));
    }

    #[test]
    fn pad_grows_each_side_by_ratio_of_span() {
        let bounds = Bounds {
            south_west: LatLng::new(40.0, 0.0),
            north_east: LatLng::new(50.0, 10.0),
        }
        .pad(0.2);

        assert!(approx(bounds.south_west.lat, 38.0));
        assert!(approx(bounds.south_west.lon, -2.0));
        assert!(approx(bounds.north_east.lat, 52.0));
        assert!(approx(bounds.north_east.lon, 12.0));
    }

    #[test]
    fn no_markers_uses_meta_centre() {
        let meta: MapMeta = serde_json::from_str(r#"{"centre": [46.6, 1.9], "zoom": 5}"#).unwrap();
        let view = initial_view(&meta, &MapLayers::default());
        assert_eq!(
            view,
            MapView::Center {
                center: LatLng::new(46.6, 1.9),
                zoom: 5.0
            }
        );
    }

    #[test]
    fn empty_bounds_is_none() {
        assert_eq!(bounds_of(std::iter::empty()), None);
    }
}
