use serde::Deserialize;
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Deserialize)]
pub enum Airport {
    #[serde(rename = "JFK")]
    Jfk,
    #[serde(rename = "LGA")]
    Lga,
    #[serde(rename = "EWR")]
    Ewr,
}

impl Airport {
    pub fn code(&self) -> &'static str {
        match self {
            Airport::Jfk => "JFK",
            Airport::Lga => "LGA",
            Airport::Ewr => "EWR",
        }
    }
}

/// Airport tag of a canonical trip. There is no "unset" state: a trip that could not be
/// attributed to an airport is explicitly [`AirportTag::NotAirport`].
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum AirportTag {
    Airport(Airport),
    NotAirport,
}

pub const NOT_AIRPORT: &str = "not airport";

impl AirportTag {
    pub fn label(&self) -> &'static str {
        match self {
            AirportTag::Airport(airport) => airport.code(),
            AirportTag::NotAirport => NOT_AIRPORT,
        }
    }
}

impl From<Option<Airport>> for AirportTag {
    fn from(value: Option<Airport>) -> Self {
        value.map_or(AirportTag::NotAirport, AirportTag::Airport)
    }
}

impl Display for AirportTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
