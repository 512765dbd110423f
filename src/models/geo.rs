//! Geographic primitives

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in marker order (latitude first).
///
/// GeoJSON stores positions as `[lng, lat]`; use [`LatLng::from_lng_lat`]
/// when reading them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON `[lng, lat]` position
    pub fn from_lng_lat(position: [f64; 2]) -> Self {
        Self {
            lat: position[1],
            lng: position[0],
        }
    }
}

/// A user's saved home coordinate. Both fields are always set together.
pub type HomeLocation = LatLng;

/// Rectangular bounding box given by its south-west and north-east corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Check whether a point lies inside (edges included)
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lng_lat_swaps_order() {
        let point = LatLng::from_lng_lat([12.9209, 50.8282]);
        assert_eq!(point.lat, 50.8282);
        assert_eq!(point.lng, 12.9209);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::new(LatLng::new(50.75, 12.75), LatLng::new(50.90, 13.00));
        assert!(bounds.contains(LatLng::new(50.83, 12.92)));
        assert!(bounds.contains(LatLng::new(50.75, 13.00)));
        assert!(!bounds.contains(LatLng::new(51.05, 13.73)));
    }

    #[test]
    fn test_lat_lng_json_shape() {
        let json = serde_json::to_value(LatLng::new(50.83, 12.92)).unwrap();
        assert_eq!(json, serde_json::json!({"lat": 50.83, "lng": 12.92}));
    }
}
