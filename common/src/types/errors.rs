use std::fmt;
use std::fmt::Formatter;

/// A geometry given in the configuration that cannot describe a region on earth.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ShapeError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    InvertedBox,
    NonPositiveRadius(f64),
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::LatitudeOutOfRange(lat) => write!(f, "Latitude {lat} is outside of [-90, 90]"),
            ShapeError::LongitudeOutOfRange(lon) => write!(f, "Longitude {lon} is outside of [-180, 180]"),
            ShapeError::InvertedBox => write!(f, "The south west corner of a box must lie south west of its north east corner"),
            ShapeError::NonPositiveRadius(radius) => write!(f, "Radius must be positive, got {radius}m"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub struct UnsupportedConfidenceLevel(pub f64);

impl fmt::Display for UnsupportedConfidenceLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported confidence level {}. Supported levels are 0.90, 0.95 and 0.99", self.0)
    }
}
