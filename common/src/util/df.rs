use chrono::{DateTime, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use polars::datatypes::{DataType, TimeUnit};
use polars::error::{ErrString, PolarsError, PolarsResult};
use polars::frame::DataFrame;
use polars::io::SerWriter;
use polars::prelude::{col, CsvWriter, IntoLazy, ParquetWriter, SortMultipleOptions};
use std::fs::{create_dir_all, File};
use std::path::Path;

/// Compare two dataframes without regard to the ordering of columns and/or rows
pub fn equivalent(lhs: &DataFrame, rhs: &DataFrame, ignore_col_order: bool, ignore_row_order: bool) -> PolarsResult<bool> {
    fn normalize_col_order(frame: &DataFrame) -> PolarsResult<DataFrame> {
        frame.clone().lazy()
            .select( // Select all columns, but with a specific order
                frame.get_column_names().into_iter()
                    .sorted() // This sorting step ensures the same ordering
                    .map(|n| col(n.clone()))
                    .collect_vec(),
            )
            .collect()
    }

    fn normalize_row_order(frame: &DataFrame) -> PolarsResult<DataFrame> {
        frame.clone().lazy()
            // Sort by all columns
            .sort(
                frame.get_column_names().into_iter().cloned().collect_vec(),
                SortMultipleOptions::default()
            )
            .collect()
    }

    let (lhs, rhs) = if ignore_col_order {
        (&normalize_col_order(lhs)?, &normalize_col_order(rhs)?)
    } else { (lhs, rhs) };

    let (lhs, rhs) = if ignore_row_order {
        (&normalize_row_order(lhs)?, &normalize_row_order(rhs)?)
    } else { (lhs, rhs) };

    Ok(lhs.equals_missing(rhs))
}

pub enum FileType {
    CSV,
    PARQUET,
}

pub fn write_df_to_file(
    path: &Path,
    format: FileType,
    df: &mut DataFrame
) -> Result<(), PolarsError> {
    let mut file = prepare_file(path)?;

    match format {
        FileType::CSV => {
            CsvWriter::new(&mut file).finish(df)?;
        },
        FileType::PARQUET => {
            ParquetWriter::new(&mut file).finish(df)?;
        },
    };

    Ok(())
}

fn prepare_file(
    path: &Path,
) -> Result<File, std::io::Error> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    File::create(path)
}

pub fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.get_column_index(name).is_some()
}

/// Values of a numeric column as floats. Strings are coerced, unparseable values become null.
pub fn f64_values(frame: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = frame.column(name)?.as_materialized_series();

    if series.dtype() == &DataType::String {
        return Ok(series.str()?
            .into_iter()
            .map(|value| value.and_then(|value| value.trim().parse::<f64>().ok()))
            .collect());
    }

    let floats = series.cast(&DataType::Float64)?;
    let values = floats.f64()?.into_iter().collect();
    Ok(values)
}

pub fn i64_values(frame: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let ints = frame.column(name)?.as_materialized_series().cast(&DataType::Int64)?;
    let values = ints.i64()?.into_iter().collect();
    Ok(values)
}

pub fn string_values(frame: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let strings = frame.column(name)?.as_materialized_series().cast(&DataType::String)?;
    let values = strings.str()?
        .into_iter()
        .map(|value| value.map(str::to_owned))
        .collect();
    Ok(values)
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Values of a timestamp column. Accepts native datetime and date columns as well as
/// ISO-8601-like strings; strings that match none of the known formats become null.
pub fn datetime_values(frame: &DataFrame, name: &str) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    let series = frame.column(name)?.as_materialized_series();

    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let ticks = series.cast(&DataType::Int64)?;
            let values = ticks.i64()?
                .into_iter()
                .map(|tick| tick.and_then(|tick| from_ticks(tick, unit)))
                .collect();
            Ok(values)
        }
        DataType::Date => {
            let days = series.cast(&DataType::Int32)?;
            let values = days.i32()?
                .into_iter()
                .map(|days| days.and_then(|days| {
                    NaiveDate::default().checked_add_signed(chrono::Duration::days(days as i64))
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                }))
                .collect();
            Ok(values)
        }
        DataType::String => {
            let values = series.str()?
                .into_iter()
                .map(|value| value.and_then(parse_datetime))
                .collect();
            Ok(values)
        }
        other => Err(PolarsError::SchemaMismatch(ErrString::from(
            format!("Expected a timestamp in column '{name}', found {other}")
        ))),
    }
}

fn from_ticks(tick: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let datetime = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(tick)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(tick),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(tick),
    };
    datetime.map(|datetime| datetime.naive_utc())
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS.iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}
