use either::Either;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

/// Distance in meters
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, PartialOrd)]
#[serde(try_from = "SerializedDistance")]
pub struct Distance(pub f64);

impl Distance {
    pub fn kilometers(km: f64) -> Self {
        Self(km * 1_000.0)
    }
}

/// Serialized representation of a Distance
/// Either 10.42 (float, meters), "10.42m" or "5km" (String)
#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
struct SerializedDistance {
    #[serde(with = "either::serde_untagged")]
    value: Either<f64, String>
}

static DISTANCE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+\.?\d*)\s*(m|km)?\s*$").expect("distance pattern is valid")
});

#[derive(thiserror::Error, Debug)]
pub struct DistanceError;

impl Display for DistanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wrong distance format. Examples of valid formats: 42.1m, 5km")
    }
}

impl FromStr for Distance {
    type Err = DistanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let caps = DISTANCE_FORMAT.captures(value).ok_or(DistanceError)?;
        let amount = f64::from_str(&caps[1]).map_err(|_| DistanceError)?;

        match caps.get(2).map(|unit| unit.as_str()) {
            Some("km") => Ok(Self::kilometers(amount)),
            _ => Ok(Self(amount)),
        }
    }
}

impl TryFrom<SerializedDistance> for Distance {
    type Error = DistanceError;

    fn try_from(value: SerializedDistance) -> Result<Self, Self::Error> {
        match value.value {
            Either::Right(value) => Distance::from_str(&value),
            Either::Left(value) if value.is_finite() => Ok(Self(value)),
            Either::Left(_) => Err(DistanceError),
        }
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.0)
    }
}

pub type Radius = Distance;
