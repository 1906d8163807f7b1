use crate::types::dataset::Dataset;
use crate::types::region::RegionConfig;
use crate::types::sampling::SamplingConfig;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1")]
    Version1 {
        datasets: Vec<Dataset>,
        zones: ZoneSource,
        #[serde(default)]
        paths: PathConfig,
        #[serde(default)]
        sampling: SamplingConfig,
        #[serde(default)]
        regions: RegionConfig,
        #[serde(default)]
        queries: QueryConfig,
    }
}

/// Reference file with one polygon per taxi zone
#[derive(Debug, Deserialize, Clone)]
pub struct ZoneSource {
    pub path: PathBuf,
    /// Overrides the CRS declared in the file, e.g. `EPSG:2263`
    #[serde(default)]
    pub crs: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathConfig {
    /// Downloaded raw batches, keyed by file name
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_warehouse_dir")]
    pub warehouse_dir: PathBuf,
    #[serde(default = "default_query_dir")]
    pub query_dir: PathBuf,
}

fn default_cache_dir() -> PathBuf { "./data/raw".into() }
fn default_warehouse_dir() -> PathBuf { "./data/warehouse".into() }
fn default_query_dir() -> PathBuf { "./data/queries".into() }

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            warehouse_dir: default_warehouse_dir(),
            query_dir: default_query_dir(),
        }
    }
}

/// Time windows of the analytical queries
#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    /// Window of the popularity queries (end exclusive)
    #[serde(default = "default_popularity_window")]
    pub popularity: (NaiveDate, NaiveDate),
    /// Window of the trip distance percentile (end exclusive)
    #[serde(default = "default_distance_window")]
    pub distance: (NaiveDate, NaiveDate),
    /// Hour grid of the rides vs. weather query (both ends inclusive)
    #[serde(default = "default_weather_window")]
    pub weather: (NaiveDateTime, NaiveDateTime),
    #[serde(default = "default_snowiest_days")]
    pub snowiest_days: u32,
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn default_popularity_window() -> (NaiveDate, NaiveDate) {
    (date(2020, 1, 1), date(2024, 9, 1))
}

fn default_distance_window() -> (NaiveDate, NaiveDate) {
    (date(2024, 1, 1), date(2024, 2, 1))
}

fn default_weather_window() -> (NaiveDateTime, NaiveDateTime) {
    (
        date(2023, 9, 25).and_hms_opt(0, 0, 0).unwrap_or_default(),
        date(2023, 10, 3).and_hms_opt(23, 0, 0).unwrap_or_default(),
    )
}

fn default_snowiest_days() -> u32 { 10 }

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            popularity: default_popularity_window(),
            distance: default_distance_window(),
            weather: default_weather_window(),
            snowiest_days: default_snowiest_days(),
        }
    }
}
