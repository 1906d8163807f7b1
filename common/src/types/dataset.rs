use crate::types::tables::CanonicalTable;
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Dataset {
    pub id: String,
    pub kind: DatasetKind,
    #[serde(rename = "src")]
    pub sources: Vec<DataSource>,
    /// Overrides whether batches of this dataset are sampled before normalization
    #[serde(default)]
    pub sample: Option<bool>,
}

impl Dataset {
    pub fn is_sampled(&self) -> bool {
        self.sample.unwrap_or(self.kind.sampled_by_default())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Eq, PartialEq)]
pub enum DatasetKind {
    /// Yellow taxi trip records
    #[serde(rename = "taxi")]
    Taxi,
    /// High volume for-hire vehicle trip records, of which Uber trips are kept
    #[serde(rename = "rideshare")]
    Rideshare,
    /// NOAA Local Climatological Data, hourly observations
    #[serde(rename = "weather")]
    Weather,
}

impl DatasetKind {
    pub fn sampled_by_default(&self) -> bool {
        match self {
            DatasetKind::Taxi | DatasetKind::Rideshare => true,
            DatasetKind::Weather => false,
        }
    }

    pub fn tables(&self) -> &'static [CanonicalTable] {
        match self {
            DatasetKind::Taxi => &[CanonicalTable::TaxiTrips],
            DatasetKind::Rideshare => &[CanonicalTable::UberTrips],
            DatasetKind::Weather => &[CanonicalTable::HourlyWeather, CanonicalTable::DailyWeather],
        }
    }

    /// Pattern selecting this kind's monthly files from the TLC listing page
    pub fn default_link_pattern(&self) -> Option<&'static str> {
        match self {
            DatasetKind::Taxi => Some(r"(?i)yellow_trip[-]?data_202[0-4]-(0[1-9]|1[0-2])\.parquet$"),
            DatasetKind::Rideshare => Some(r"(?i)fhvhv_trip[-]?data_202[0-4]-(0[1-9]|1[0-2])\.parquet$"),
            DatasetKind::Weather => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(
    untagged,
    expecting = "Invalid or missing data source. Specify either a remote file with `url:`, a listing page with `listing:` (and optionally `pattern:`) or a local path with `path:` under `src:` of this dataset"
)]
pub enum DataSource {
    Listing {
        listing: Url,
        #[serde(default)]
        pattern: Option<String>,
    },
    URL {
        url: Url,
    },
    File {
        path: PathBuf,
    },
}
