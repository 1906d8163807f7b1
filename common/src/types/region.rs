use crate::types::airport::Airport;
use crate::types::errors::ShapeError;
use crate::types::Coordinate;
use crate::util::distance::{Distance, Radius};
use serde::Deserialize;

/// An axis aligned latitude/longitude rectangle. Both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "SerializedBoundingBox")]
pub struct BoundingBox {
    south_west: Coordinate,
    north_east: Coordinate,
}

impl BoundingBox {
    pub fn new(south_west: Coordinate, north_east: Coordinate) -> Result<Self, ShapeError> {
        if south_west.lat > north_east.lat || south_west.lon > north_east.lon {
            return Err(ShapeError::InvertedBox);
        }
        Ok(Self { south_west, north_east })
    }

    pub fn south_west(&self) -> Coordinate {
        self.south_west
    }

    pub fn north_east(&self) -> Coordinate {
        self.north_east
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&coordinate.lat)
            && (self.south_west.lon..=self.north_east.lon).contains(&coordinate.lon)
    }
}

#[derive(Deserialize)]
struct SerializedBoundingBox {
    south_west: Coordinate,
    north_east: Coordinate,
}

impl TryFrom<SerializedBoundingBox> for BoundingBox {
    type Error = ShapeError;

    fn try_from(value: SerializedBoundingBox) -> Result<Self, Self::Error> {
        BoundingBox::new(value.south_west, value.north_east)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SerializedShape")]
pub enum Shape {
    Box(BoundingBox),
    Circle { center: Coordinate, radius: Radius },
}

impl Shape {
    pub fn circle(center: Coordinate, radius: Radius) -> Result<Self, ShapeError> {
        if radius.0 <= 0.0 || radius.0.is_nan() {
            return Err(ShapeError::NonPositiveRadius(radius.0));
        }
        Ok(Shape::Circle { center, radius })
    }
}

#[derive(Deserialize)]
#[serde(
    untagged,
    expecting = "Invalid region shape. Specify either a box with `south_west:` and `north_east:` or a circle with `center:` and `radius:`"
)]
enum SerializedShape {
    Box(BoundingBox),
    Circle { center: Coordinate, radius: Radius },
}

impl TryFrom<SerializedShape> for Shape {
    type Error = ShapeError;

    fn try_from(value: SerializedShape) -> Result<Self, Self::Error> {
        match value {
            SerializedShape::Box(bbox) => Ok(Shape::Box(bbox)),
            SerializedShape::Circle { center, radius } => Shape::circle(center, radius),
        }
    }
}

/// A named geofence. Lists of regions are evaluated in order, so the position of a region in
/// its list is its priority.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Region<N> {
    pub name: N,
    pub shape: Shape,
}

/// Fare based airport attribution for yellow taxis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxiAirportRule {
    #[serde(default = "default_jfk_rate_code")]
    pub jfk_rate_code: i64,
    #[serde(default = "default_newark_rate_code")]
    pub newark_rate_code: i64,
    /// LaGuardia has no rate code of its own. Trips are attributed to it by the airport fee,
    /// which has changed over time, so it is configurable.
    #[serde(default = "default_lga_airport_fee")]
    pub lga_airport_fee: f64,
}

fn default_jfk_rate_code() -> i64 { 2 }
fn default_newark_rate_code() -> i64 { 3 }
fn default_lga_airport_fee() -> f64 { 1.75 }

impl Default for TaxiAirportRule {
    fn default() -> Self {
        Self {
            jfk_rate_code: default_jfk_rate_code(),
            newark_rate_code: default_newark_rate_code(),
            lga_airport_fee: default_lga_airport_fee(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionConfig {
    /// Trips with a pickup or dropoff outside of this box are dropped
    #[serde(default = "default_metro_box")]
    pub metro: BoundingBox,
    #[serde(default = "default_airports")]
    pub airports: Vec<Region<Airport>>,
    #[serde(default)]
    pub taxi_airport_rule: TaxiAirportRule,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            metro: default_metro_box(),
            airports: default_airports(),
            taxi_airport_rule: TaxiAirportRule::default(),
        }
    }
}

pub fn default_metro_box() -> BoundingBox {
    BoundingBox {
        south_west: Coordinate { lat: 40.560445, lon: -74.242330 },
        north_east: Coordinate { lat: 40.908524, lon: -73.717047 },
    }
}

pub fn default_airports() -> Vec<Region<Airport>> {
    let airport = |name, lat, lon| Region {
        name,
        shape: Shape::Circle {
            center: Coordinate { lat, lon },
            radius: Distance::kilometers(5.0),
        },
    };

    vec![
        airport(Airport::Jfk, 40.6413, -73.7781),
        airport(Airport::Lga, 40.7769, -73.8740),
        airport(Airport::Ewr, 40.6895, -74.1745),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_rejects_swapped_corners() {
        let sw = Coordinate::new(40.9, -74.2).unwrap();
        let ne = Coordinate::new(40.5, -73.7).unwrap();
        assert_eq!(Err(ShapeError::InvertedBox), BoundingBox::new(sw, ne));
    }

    #[test]
    fn test_box_edges_are_inclusive() {
        let metro = default_metro_box();
        assert!(metro.contains(&metro.south_west()));
        assert!(metro.contains(&metro.north_east()));
        assert!(!metro.contains(&Coordinate { lat: 40.56, lon: -74.0 }));
    }

    #[test]
    fn test_deserialize_regions() {
        let yaml = r#"
metro:
  south_west: { lat: 40.5, lon: -74.3 }
  north_east: { lat: 41.0, lon: -73.7 }
airports:
  - name: LGA
    shape:
      south_west: { lat: 40.763589, lon: -73.891745 }
      north_east: { lat: 40.778865, lon: -73.854838 }
  - name: JFK
    shape:
      center: { lat: 40.6413, lon: -73.7781 }
      radius: 3km
taxi_airport_rule:
  lga_airport_fee: 1.25
"#;
        let config: RegionConfig = serde_yml::from_str(yaml).unwrap();

        assert_eq!(Airport::Lga, config.airports[0].name);
        assert!(matches!(config.airports[0].shape, Shape::Box(_)));
        assert_eq!(
            Shape::Circle { center: Coordinate { lat: 40.6413, lon: -73.7781 }, radius: Distance(3_000.0) },
            config.airports[1].shape
        );
        assert_eq!(1.25, config.taxi_airport_rule.lga_airport_fee);
        assert_eq!(2, config.taxi_airport_rule.jfk_rate_code);
    }

    #[test]
    fn test_deserialize_rejects_zero_radius() {
        let yaml = "center: { lat: 40.6, lon: -73.7 }\nradius: 0\n";
        assert!(serde_yml::from_str::<Shape>(yaml).is_err());
    }

    #[test]
    fn test_defaults_when_empty() {
        let config: RegionConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(RegionConfig::default(), config);
        assert_eq!(
            vec![Airport::Jfk, Airport::Lga, Airport::Ewr],
            config.airports.iter().map(|region| region.name).collect::<Vec<_>>()
        );
    }
}
