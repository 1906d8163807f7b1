//! Point-in-region tests for named geofences.
//!
//! Circle regions measure great-circle distance with geo's [`Haversine`] metric space, which
//! models the earth as a sphere with the IUGG mean radius [`MEAN_EARTH_RADIUS_METERS`]. Airport
//! radii are several kilometers, where flat lat/lon distances would be noticeably off.

use crate::types::region::{BoundingBox, Region, Shape};
use crate::types::Coordinate;
use geo::{Distance, Haversine, Point};

pub const MEAN_EARTH_RADIUS_METERS: f64 = 6_371_008.8;

pub fn in_bounding_box(coordinate: &Coordinate, bbox: &BoundingBox) -> bool {
    bbox.contains(coordinate)
}

pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    Haversine::distance(Point::from(*a), Point::from(*b))
}

pub fn in_shape(coordinate: &Coordinate, shape: &Shape) -> bool {
    match shape {
        Shape::Box(bbox) => in_bounding_box(coordinate, bbox),
        Shape::Circle { center, radius } => distance_meters(coordinate, center) <= radius.0,
    }
}

/// Returns the name of the first region containing `coordinate`, or `None` if no region does.
pub fn classify<'r, N>(coordinate: &Coordinate, regions: &'r [Region<N>]) -> Option<&'r N> {
    regions
        .iter()
        .find(|region| in_shape(coordinate, &region.shape))
        .map(|region| &region.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::airport::Airport;
    use crate::types::region::{default_airports, default_metro_box};
    use crate::util::distance::Distance as Meters;

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Coordinate { lat: 40.0, lon: -74.0 };
        let b = Coordinate { lat: 41.0, lon: -74.0 };
        let expected = MEAN_EARTH_RADIUS_METERS * 1f64.to_radians();
        assert!((distance_meters(&a, &b) - expected).abs() < 1.0);
    }

    #[test]
    fn test_jfk_centroid_is_jfk() {
        let jfk = Coordinate { lat: 40.6413, lon: -73.7781 };
        assert_eq!(Some(&Airport::Jfk), classify(&jfk, &default_airports()));
    }

    #[test]
    fn test_offshore_is_no_airport() {
        // roughly 50km south east of JFK, in the Atlantic
        let offshore = Coordinate { lat: 40.3, lon: -73.35 };
        assert!(distance_meters(&offshore, &Coordinate { lat: 40.6413, lon: -73.7781 }) > 45_000.0);
        assert_eq!(None, classify(&offshore, &default_airports()));
        assert!(!in_bounding_box(&offshore, &default_metro_box()));
    }

    #[test]
    fn test_circle_boundary_uses_great_circle_distance() {
        let center = Coordinate { lat: 40.6895, lon: -74.1745 };
        let circle = Shape::circle(center, Meters::kilometers(5.0)).unwrap();
        // 0.04 degrees of latitude are ~4.4km, 0.05 degrees ~5.6km
        assert!(in_shape(&Coordinate { lat: 40.7295, lon: -74.1745 }, &circle));
        assert!(!in_shape(&Coordinate { lat: 40.7395, lon: -74.1745 }, &circle));
    }

    #[test]
    fn test_first_matching_region_wins() {
        let center = Coordinate { lat: 40.7, lon: -73.9 };
        let regions = vec![
            Region { name: "small", shape: Shape::circle(center, Meters(100.0)).unwrap() },
            Region { name: "large", shape: Shape::circle(center, Meters(10_000.0)).unwrap() },
        ];
        assert_eq!(Some(&"small"), classify(&center, &regions));
        assert_eq!(Some(&"large"), classify(&Coordinate { lat: 40.75, lon: -73.9 }, &regions));
    }
}
