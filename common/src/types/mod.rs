use crate::types::errors::ShapeError;
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod airport;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod region;
pub mod sampling;
pub mod tables;
pub mod weather;

// Taxi zone id as published by the TLC (`PULocationID`, `DOLocationID`). Ids are positive, but
// the raw columns are signed integers, so conversion from those is fallible.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct ZoneId(pub u32);

impl TryFrom<i64> for ZoneId {
    type Error = ();

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self).map_err(|_| ())
    }
}

impl Display for ZoneId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A WGS84 position in degrees.
///
/// Canonical tables store coordinates as a single `"lat,lon"` string, which is what the
/// [`Display`] implementation produces.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "SerializedCoordinate")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ShapeError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ShapeError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ShapeError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(value: Coordinate) -> Self {
        Point::new(value.lon, value.lat)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(value: Point<f64>) -> Self {
        Self { lat: value.y(), lon: value.x() }
    }
}

#[derive(Deserialize)]
struct SerializedCoordinate {
    lat: f64,
    lon: f64,
}

impl TryFrom<SerializedCoordinate> for Coordinate {
    type Error = ShapeError;

    fn try_from(value: SerializedCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(value.lat, value.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_display_is_lat_first() {
        let coordinate = Coordinate::new(40.6413, -73.7781).unwrap();
        assert_eq!("40.6413,-73.7781", coordinate.to_string());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range_values() {
        assert!(matches!(Coordinate::new(91.0, 0.0), Err(ShapeError::LatitudeOutOfRange(_))));
        assert!(matches!(Coordinate::new(0.0, -181.0), Err(ShapeError::LongitudeOutOfRange(_))));
    }

    #[test]
    fn test_zone_id_from_signed_column_values() {
        assert_eq!(Ok(ZoneId(132)), ZoneId::try_from(132i64));
        assert_eq!(Err(()), ZoneId::try_from(-1i64));
    }

    #[test]
    fn test_point_uses_lon_as_x() {
        let point: Point<f64> = Coordinate { lat: 1.0, lon: 2.0 }.into();
        assert_eq!(2.0, point.x());
        assert_eq!(1.0, point.y());
    }
}
