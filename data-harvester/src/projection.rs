//! Reprojection of the zone reference file to WGS84.
//!
//! The TLC publishes taxi zones in NAD83 / New York Long Island (EPSG:2263), measured in US
//! survey feet. The NAD83 to WGS84 datum shift is below a meter and ignored.

use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use std::fmt;
use std::fmt::Display;

const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

/// EPSG:2263 in meters, zone files carry feet which are converted before projecting
const NEW_YORK_LONG_ISLAND: &str = "+proj=lcc +lat_0=40.16666666666666 +lon_0=-74 \
    +lat_1=41.03333333333333 +lat_2=40.66666666666666 +x_0=300000 +y_0=0 \
    +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs";
const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Coordinate reference systems the zone loader accepts
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SourceCrs {
    Wgs84,
    NewYorkLongIsland,
}

impl SourceCrs {
    /// Accepts `EPSG:<code>`, OGC URNs and `CRS84`
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_uppercase();
        let code = name.rsplit(':').next().unwrap_or_default();

        match code {
            "4326" | "CRS84" => Some(SourceCrs::Wgs84),
            "2263" => Some(SourceCrs::NewYorkLongIsland),
            _ => None,
        }
    }

    pub fn reprojection(&self) -> Result<Reprojection, ProjectionError> {
        match self {
            SourceCrs::Wgs84 => Ok(Reprojection::Identity),
            SourceCrs::NewYorkLongIsland => Ok(Reprojection::Projected {
                source: Proj::from_proj_string(NEW_YORK_LONG_ISLAND)?,
                target: Proj::from_proj_string(WGS84)?,
                unit: US_SURVEY_FOOT,
            }),
        }
    }
}

/// Maps coordinates of a [`SourceCrs`] to WGS84 `(lon, lat)` in degrees
pub enum Reprojection {
    Identity,
    Projected {
        source: Proj,
        target: Proj,
        /// Meters per unit of the source coordinates
        unit: f64,
    },
}

impl Reprojection {
    pub fn to_wgs84(&self, coord: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        match self {
            Reprojection::Identity => Ok(coord),
            Reprojection::Projected { source, target, unit } => {
                let mut point = (coord.x * unit, coord.y * unit, 0.0);
                transform(source, target, &mut point)?;
                // Geographic output is in radians
                Ok(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
            }
        }
    }

    pub fn geometry_to_wgs84(&self, geometry: MultiPolygon<f64>) -> Result<MultiPolygon<f64>, ProjectionError> {
        match self {
            Reprojection::Identity => Ok(geometry),
            Reprojection::Projected { .. } => geometry.try_map_coords(|coord| self.to_wgs84(coord)),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_wgs84(&self, coord: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        match self {
            Reprojection::Identity => Ok(coord),
            Reprojection::Projected { source, target, unit } => {
                let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
                transform(target, source, &mut point)?;
                Ok(Coord { x: point.0 / unit, y: point.1 / unit })
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProjectionError {
    Proj(#[from] proj4rs::errors::Error),
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProjectionError::Proj(err) => write!(f, "Reprojection to WGS84 failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(expected: f64, actual: f64, tolerance: f64) {
        assert!((expected - actual).abs() < tolerance, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_parse_crs_names() {
        assert_eq!(Some(SourceCrs::Wgs84), SourceCrs::parse("EPSG:4326"));
        assert_eq!(Some(SourceCrs::Wgs84), SourceCrs::parse("urn:ogc:def:crs:OGC:1.3:CRS84"));
        assert_eq!(Some(SourceCrs::NewYorkLongIsland), SourceCrs::parse("urn:ogc:def:crs:EPSG::2263"));
        assert_eq!(Some(SourceCrs::NewYorkLongIsland), SourceCrs::parse("epsg:2263"));
        assert_eq!(None, SourceCrs::parse("EPSG:3857"));
    }

    #[test]
    fn test_false_origin_maps_to_projection_origin() {
        let reprojection = SourceCrs::NewYorkLongIsland.reprojection().unwrap();
        let origin = reprojection.to_wgs84(Coord { x: 300_000.0 / US_SURVEY_FOOT, y: 0.0 }).unwrap();

        assert_close(-74.0, origin.x, 1e-6);
        assert_close(40.0 + 10.0 / 60.0, origin.y, 1e-6);
    }

    #[test]
    fn test_wgs84_is_left_untouched() {
        let reprojection = SourceCrs::Wgs84.reprojection().unwrap();
        let coord = Coord { x: -73.9857, y: 40.7484 };

        assert_eq!(coord, reprojection.to_wgs84(coord).unwrap());
    }

    #[test]
    fn test_round_trip_through_state_plane() {
        let reprojection = SourceCrs::NewYorkLongIsland.reprojection().unwrap();

        for (lon, lat) in [(-73.7781, 40.6413), (-73.9857, 40.7484), (-74.1745, 40.6895), (-73.75, 40.90)] {
            let projected = reprojection.from_wgs84(Coord { x: lon, y: lat }).unwrap();
            let back = reprojection.to_wgs84(projected).unwrap();
            assert_close(lon, back.x, 1e-7);
            assert_close(lat, back.y, 1e-7);
        }
    }

    #[test]
    fn test_midtown_state_plane_feet() {
        let reprojection = SourceCrs::NewYorkLongIsland.reprojection().unwrap();
        // Published state plane feet are roughly (988 000, 212 000) for midtown
        let empire_state = reprojection.to_wgs84(Coord { x: 988_000.0, y: 212_000.0 }).unwrap();

        assert_close(-73.9857, empire_state.x, 0.01);
        assert_close(40.7484, empire_state.y, 0.01);
    }
}
