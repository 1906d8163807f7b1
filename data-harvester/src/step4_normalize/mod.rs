mod rideshare;
mod taxi;
mod trips;
mod weather;

pub use rideshare::{RideshareNormalizer, UBER_LICENSE};
pub use taxi::TaxiNormalizer;
pub use weather::{DailyWeatherNormalizer, HourlyWeatherNormalizer};

use crate::zones::ZoneTable;
use chrono::{Datelike, NaiveDateTime};
use common::types::dataset::DatasetKind;
use common::types::region::RegionConfig;
use common::types::tables::CanonicalTable;
use common::util::df::has_column;
use polars::frame::DataFrame;
use std::fmt;
use std::fmt::Display;

/// Reference data every normalizer may consult
pub struct NormalizeContext<'a> {
    pub zones: &'a ZoneTable,
    pub regions: &'a RegionConfig,
}

/// Turns one raw batch into rows of a canonical table. Records that cannot be cleaned are
/// dropped; an error means the whole batch is unusable.
pub trait Normalizer {
    fn table(&self) -> CanonicalTable;

    fn required_columns(&self) -> &'static [&'static str];

    fn normalize(&self, batch: &DataFrame, context: &NormalizeContext) -> Result<DataFrame, NormalizeError>;

    fn check_schema(&self, batch: &DataFrame) -> Result<(), NormalizeError> {
        let missing: Vec<String> = self.required_columns().iter()
            .filter(|column| !has_column(batch, column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(NormalizeError::MissingColumns { table: self.table(), columns: missing })
        }
    }
}

/// Normalizers producing the canonical tables of a dataset kind
pub fn normalizers_for(kind: DatasetKind) -> Vec<Box<dyn Normalizer + Send + Sync>> {
    match kind {
        DatasetKind::Taxi => vec![Box::new(TaxiNormalizer)],
        DatasetKind::Rideshare => vec![Box::new(RideshareNormalizer)],
        DatasetKind::Weather => vec![Box::new(HourlyWeatherNormalizer), Box::new(DailyWeatherNormalizer)],
    }
}

/// Monday = 1 ... Sunday = 7
pub fn weekday_num(timestamp: &NaiveDateTime) -> i32 {
    timestamp.weekday().number_from_monday() as i32
}

#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    Polars(#[from] polars::error::PolarsError),
    MissingColumns { table: CanonicalTable, columns: Vec<String> },
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NormalizeError::Polars(err) => err.fmt(f),
            NormalizeError::MissingColumns { table, columns } => {
                write!(f, "Batch is missing columns required for {}: {}", table, columns.join(", "))
            }
        }
    }
}
