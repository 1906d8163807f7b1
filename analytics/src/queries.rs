//! Analytical questions answered over the warehouse.
//!
//! Every query returns a flat frame which [`run_queries`] writes as CSV into the query
//! directory.

use crate::warehouse::{Warehouse, WarehouseError};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use common::types::config::QueryConfig;
use common::types::tables::CanonicalTable;
use common::util::df::{datetime_values, f64_values, write_df_to_file, FileType};
use common::util::logging;
use hashbrown::HashMap;
use log::{debug, info};
use polars::datatypes::DataType;
use polars::frame::DataFrame;
use polars::prelude::{col, concat, len, lit, Column, IntoLazy, JoinArgs, JoinType, LazyFrame, SortMultipleOptions, UnionArgs};
use std::fmt;
use std::fmt::Display;
use std::path::{Path, PathBuf};

const PICKUP: &str = "pickup_datetime";

pub const HOURLY_TAXI_POPULARITY: &str = "hourly_taxi_popularity";
pub const DAILY_UBER_POPULARITY: &str = "daily_uber_popularity";
pub const RIDE_DISTANCE_PERCENTILE: &str = "ride_distance_percentile";
pub const SNOWIEST_DAYS_RIDES: &str = "snowiest_days_rides";
pub const HOURLY_RIDES_WEATHER: &str = "hourly_rides_weather";

/// Runs every query and writes its result to `<out_dir>/<name>.csv`
pub fn run_queries(warehouse: &Warehouse, config: &QueryConfig, out_dir: &Path) -> Result<Vec<PathBuf>, QueryError> {
    let results = [
        (HOURLY_TAXI_POPULARITY, hourly_taxi_popularity(warehouse, config.popularity)?),
        (DAILY_UBER_POPULARITY, daily_uber_popularity(warehouse, config.popularity)?),
        (RIDE_DISTANCE_PERCENTILE, ride_distance_percentile(warehouse, config.distance, 95.0)?),
        (SNOWIEST_DAYS_RIDES, snowiest_days_rides(warehouse, config.snowiest_days)?),
        (HOURLY_RIDES_WEATHER, hourly_rides_weather(warehouse, config.weather)?),
    ];

    info!(target: "queries", "Writing query results to {}", out_dir.display());
    logging::run_with_pb("queries", "Writing query results", results.len() as u64, true, |pb| {
        results.into_iter()
            .map(|(name, mut frame)| {
                let path = out_dir.join(format!("{}.csv", name));
                write_df_to_file(&path, FileType::CSV, &mut frame)?;
                debug!(target: "queries", "Wrote {} rows to {}", frame.height(), path.display());
                pb.inc(1);
                Ok::<PathBuf, QueryError>(path)
            })
            .collect()
    })
}

/// Share of taxi pickups per hour of the day
pub fn hourly_taxi_popularity(warehouse: &Warehouse, window: (NaiveDate, NaiveDate)) -> Result<DataFrame, QueryError> {
    let trips = in_window(warehouse.scan(CanonicalTable::TaxiTrips)?, window);
    let by_hour = trips.group_by([col(PICKUP).dt().hour().cast(DataType::Int32).alias("hour")]);

    Ok(with_percentage(by_hour.agg([len().cast(DataType::Int64).alias("rides")]))
        .sort(["hour"], SortMultipleOptions::default())
        .collect()?)
}

/// Share of Uber trips per weekday, busiest first
pub fn daily_uber_popularity(warehouse: &Warehouse, window: (NaiveDate, NaiveDate)) -> Result<DataFrame, QueryError> {
    let trips = in_window(warehouse.scan(CanonicalTable::UberTrips)?, window);
    let by_weekday = trips.group_by([col("weekday_num")]);

    Ok(with_percentage(by_weekday.agg([len().cast(DataType::Int64).alias("rides")]))
        .sort(
            ["rides", "weekday_num"],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?)
}

/// Distance of taxi and Uber trips below which `percentile` percent of them lie. A single
/// column `percentile_<p>` with one row, or none if fewer than two trips qualify.
pub fn ride_distance_percentile(
    warehouse: &Warehouse,
    window: (NaiveDate, NaiveDate),
    percentile: f64,
) -> Result<DataFrame, QueryError> {
    let distances = concat([
        in_window(warehouse.scan(CanonicalTable::TaxiTrips)?, window).select([col("trip_distance").alias("distance")]),
        in_window(warehouse.scan(CanonicalTable::UberTrips)?, window).select([col("trip_miles").alias("distance")]),
    ], UnionArgs::default())?.collect()?;

    let mut distances: Vec<f64> = f64_values(&distances, "distance")?.into_iter().flatten().collect();
    distances.sort_by(f64::total_cmp);

    let value = rank_percentile(&distances, percentile).map(|distance| (distance * 100.0).round() / 100.0);
    let name = format!("percentile_{}", percentile);

    Ok(DataFrame::new(vec![Column::new(name.into(), value.into_iter().collect::<Vec<f64>>())])?)
}

/// First value whose rank percentile `(row - 1) / (count - 1) * 100` reaches `percentile`
pub fn rank_percentile(sorted: &[f64], percentile: f64) -> Option<f64> {
    if sorted.len() < 2 {
        return None;
    }
    let last = (sorted.len() - 1) as f64;

    sorted.iter()
        .enumerate()
        .find(|(row, _)| *row as f64 / last * 100.0 >= percentile)
        .map(|(_, value)| *value)
}

/// Snow days with the most precipitation and the number of rides started on them
pub fn snowiest_days_rides(warehouse: &Warehouse, limit: u32) -> Result<DataFrame, QueryError> {
    let snow_days = warehouse.scan(CanonicalTable::DailyWeather)?
        .filter(col("daily_weather_type").eq(lit("snow")))
        .select([col("date"), col("avg_precipitation").alias("total_precipitation")]);

    let rides_per_day = all_pickups(warehouse)?
        .group_by([col(PICKUP).dt().date().alias("date")])
        .agg([len().cast(DataType::Int64).alias("total_rides")]);

    Ok(snow_days
        .join(rides_per_day, [col("date")], [col("date")], JoinArgs::new(JoinType::Left))
        .with_column(col("total_rides").fill_null(lit(0i64)))
        .sort(
            ["total_precipitation"],
            SortMultipleOptions::default().with_order_descending(true).with_nulls_last(true),
        )
        .limit(limit)
        .collect()?)
}

/// Rides, precipitation and wind speed for every hour between the two timestamps (both
/// inclusive). Hours without data are 0.
pub fn hourly_rides_weather(
    warehouse: &Warehouse,
    window: (NaiveDateTime, NaiveDateTime),
) -> Result<DataFrame, QueryError> {
    let (start, end) = (truncate_hour(window.0), truncate_hour(window.1));
    if start > end {
        return Err(QueryError::InvalidWindow(window.0, window.1));
    }
    let grid: Vec<NaiveDateTime> = std::iter::successors(Some(start), |hour| Some(*hour + Duration::hours(1)))
        .take_while(|hour| *hour <= end)
        .collect();
    let until = end + Duration::hours(1);

    let pickups = all_pickups(warehouse)?
        .filter(col(PICKUP).gt_eq(lit(start)).and(col(PICKUP).lt(lit(until))))
        .collect()?;
    let mut rides: HashMap<NaiveDateTime, i64> = HashMap::new();
    for pickup in datetime_values(&pickups, PICKUP)?.into_iter().flatten() {
        *rides.entry(truncate_hour(pickup)).or_default() += 1;
    }

    let observations = warehouse.scan(CanonicalTable::HourlyWeather)?
        .filter(col("date").gt_eq(lit(start)).and(col("date").lt(lit(until))))
        .collect()?;
    let mut weather: HashMap<NaiveDateTime, (Mean, Mean)> = HashMap::new();
    let dates = datetime_values(&observations, "date")?;
    let raw_precipitation = f64_values(&observations, "hourly_precipitation")?;
    let raw_wind_speed = f64_values(&observations, "hourly_windspeed")?;
    for (i, date) in dates.iter().enumerate() {
        let Some(date) = date else { continue };
        let (precipitation_mean, wind_mean) = weather.entry(truncate_hour(*date)).or_default();
        precipitation_mean.add(raw_precipitation[i]);
        wind_mean.add(raw_wind_speed[i]);
    }

    let mean = |hour: &NaiveDateTime, pick: usize| weather.get(hour)
        .and_then(|(precipitation, wind)| [precipitation, wind][pick].value())
        .unwrap_or(0.0);
    let total_rides: Vec<i64> = grid.iter().map(|hour| rides.get(hour).copied().unwrap_or(0)).collect();
    let precipitation: Vec<f64> = grid.iter().map(|hour| mean(hour, 0)).collect();
    let wind_speed: Vec<f64> = grid.iter().map(|hour| mean(hour, 1)).collect();

    Ok(DataFrame::new(vec![
        Column::new("datetime".into(), grid),
        Column::new("total_rides".into(), total_rides),
        Column::new("precipitation".into(), precipitation),
        Column::new("windspeed".into(), wind_speed),
    ])?)
}

fn in_window(trips: LazyFrame, (start, end): (NaiveDate, NaiveDate)) -> LazyFrame {
    let start = start.and_time(NaiveTime::MIN);
    let end = end.and_time(NaiveTime::MIN);
    trips.filter(col(PICKUP).gt_eq(lit(start)).and(col(PICKUP).lt(lit(end))))
}

fn with_percentage(counts: LazyFrame) -> LazyFrame {
    counts.with_column(
        (col("rides").cast(DataType::Float64) * lit(100.0) / col("rides").sum().cast(DataType::Float64))
            .round(2)
            .alias("percentage")
    )
}

fn all_pickups(warehouse: &Warehouse) -> Result<LazyFrame, QueryError> {
    Ok(concat([
        warehouse.scan(CanonicalTable::TaxiTrips)?.select([col(PICKUP)]),
        warehouse.scan(CanonicalTable::UberTrips)?.select([col(PICKUP)]),
    ], UnionArgs::default())?)
}

fn truncate_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.date().and_hms_opt(timestamp.hour(), 0, 0).unwrap_or(timestamp)
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|value| !value.is_nan()) {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    Warehouse(#[from] WarehouseError),
    Polars(#[from] polars::error::PolarsError),
    InvalidWindow(NaiveDateTime, NaiveDateTime),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryError::Warehouse(err) => err.fmt(f),
            QueryError::Polars(err) => err.fmt(f),
            QueryError::InvalidWindow(start, end) => {
                write!(f, "Query window starts at {} which is after its end {}", start, end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{complete, timestamp};
    use common::types::tables::SOURCE_FILE;
    use common::util::df::{i64_values, string_values};
    use polars::df;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Taxi and Uber trips around the turn of 2024 plus a few days of weather
    fn warehouse(dir: &Path) -> Warehouse {
        let warehouse = Warehouse::open(dir).unwrap();
        warehouse.create_tables().unwrap();

        let taxi = complete(CanonicalTable::TaxiTrips, df![
            PICKUP => [
                timestamp("2023-12-31 23:30:00"),
                timestamp("2024-01-01 08:05:00"),
                timestamp("2024-01-01 08:40:00"),
                timestamp("2024-01-02 08:10:00"),
                timestamp("2024-01-02 17:00:00"),
            ],
            "trip_distance" => [100.0, 1.0, 2.0, 3.0, 4.0],
            SOURCE_FILE => ["yellow_tripdata_2024-01.parquet"; 5],
        ].unwrap());
        warehouse.append(CanonicalTable::TaxiTrips, taxi).unwrap();

        let uber = complete(CanonicalTable::UberTrips, df![
            PICKUP => [
                timestamp("2024-01-01 08:15:00"),
                timestamp("2024-01-02 09:00:00"),
                timestamp("2024-01-08 09:30:00"),
                timestamp("2024-01-09 10:00:00"),
            ],
            "weekday_num" => [1i64, 2, 1, 2],
            "trip_miles" => [5.0, 6.0, 7.0, 8.0],
            SOURCE_FILE => ["fhvhv_tripdata_2024-01.parquet"; 4],
        ].unwrap());
        warehouse.append(CanonicalTable::UberTrips, uber).unwrap();

        let daily = complete(CanonicalTable::DailyWeather, df![
            "date" => [date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)],
            "daily_weather_type" => ["snow", "snow", "rain", "snow"],
            "avg_precipitation" => [Some(0.1), Some(0.3), Some(0.9), None],
            SOURCE_FILE => ["2024_weather.csv"; 4],
        ].unwrap());
        warehouse.append(CanonicalTable::DailyWeather, daily).unwrap();

        let hourly = complete(CanonicalTable::HourlyWeather, df![
            "date" => [timestamp("2024-01-01 08:51:00"), timestamp("2024-01-01 08:59:00"), timestamp("2024-01-01 10:51:00")],
            "hourly_precipitation" => [Some(0.5), Some(0.25), None],
            "hourly_windspeed" => [Some(10.0), Some(6.0), Some(3.0)],
            SOURCE_FILE => ["2024_weather.csv"; 3],
        ].unwrap());
        warehouse.append(CanonicalTable::HourlyWeather, hourly).unwrap();

        warehouse
    }

    #[test]
    fn test_hourly_taxi_popularity() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = warehouse(dir.path());

        let popularity = hourly_taxi_popularity(&warehouse, (date(2024, 1, 1), date(2024, 2, 1))).unwrap();

        assert_eq!(vec![Some(8i64), Some(17)], i64_values(&popularity, "hour").unwrap());
        assert_eq!(vec![Some(3i64), Some(1)], i64_values(&popularity, "rides").unwrap());
        assert_eq!(vec![Some(75.0), Some(25.0)], f64_values(&popularity, "percentage").unwrap());
    }

    #[test]
    fn test_daily_uber_popularity() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = warehouse(dir.path());

        let popularity = daily_uber_popularity(&warehouse, (date(2024, 1, 1), date(2024, 1, 9))).unwrap();

        assert_eq!(vec![Some(1i64), Some(2)], i64_values(&popularity, "weekday_num").unwrap());
        assert_eq!(vec![Some(2i64), Some(1)], i64_values(&popularity, "rides").unwrap());
        assert_eq!(vec![Some(66.67), Some(33.33)], f64_values(&popularity, "percentage").unwrap());
    }

    #[test]
    fn test_rank_percentile() {
        let distances: Vec<f64> = (1..=21).map(f64::from).collect();
        assert_eq!(Some(20.0), rank_percentile(&distances, 95.0));
        assert_eq!(Some(1.0), rank_percentile(&distances, 0.0));
        assert_eq!(Some(3.0), rank_percentile(&[1.0, 2.0, 3.0], 95.0));
        assert_eq!(None, rank_percentile(&[1.0], 95.0));
        assert_eq!(None, rank_percentile(&[], 95.0));
    }

    #[test]
    fn test_ride_distance_percentile() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = warehouse(dir.path());

        // 100 miles was driven in 2023
        let january = ride_distance_percentile(&warehouse, (date(2024, 1, 1), date(2024, 2, 1)), 95.0).unwrap();
        assert_eq!(vec![Some(8.0)], f64_values(&january, "percentile_95").unwrap());

        let empty = ride_distance_percentile(&warehouse, (date(2025, 1, 1), date(2025, 2, 1)), 95.0).unwrap();
        assert_eq!(0, empty.height());
    }

    #[test]
    fn test_snowiest_days_rides() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = warehouse(dir.path());

        let snowiest = snowiest_days_rides(&warehouse, 2).unwrap();

        assert_eq!(2, snowiest.height());
        assert_eq!(vec![Some(0.3), Some(0.1)], f64_values(&snowiest, "total_precipitation").unwrap());
        assert_eq!(vec![Some(3i64), Some(3)], i64_values(&snowiest, "total_rides").unwrap());

        let all = snowiest_days_rides(&warehouse, 10).unwrap();
        assert_eq!(3, all.height());
        // The day without measurement had no rides either
        assert_eq!(Some(0), i64_values(&all, "total_rides").unwrap()[2]);
    }

    #[test]
    fn test_hourly_rides_weather() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = warehouse(dir.path());

        let hourly = hourly_rides_weather(&warehouse, (timestamp("2024-01-01 07:00:00"), timestamp("2024-01-01 10:00:00"))).unwrap();

        assert_eq!(4, hourly.height());
        assert_eq!(vec![Some(0i64), Some(3), Some(0), Some(0)], i64_values(&hourly, "total_rides").unwrap());
        assert_eq!(vec![Some(0.0), Some(0.375), Some(0.0), Some(0.0)], f64_values(&hourly, "precipitation").unwrap());
        assert_eq!(vec![Some(0.0), Some(8.0), Some(0.0), Some(3.0)], f64_values(&hourly, "windspeed").unwrap());

        let inverted = hourly_rides_weather(&warehouse, (timestamp("2024-01-02 00:00:00"), timestamp("2024-01-01 00:00:00")));
        assert!(matches!(inverted, Err(QueryError::InvalidWindow(_, _))));
    }

    #[test]
    fn test_run_queries_writes_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let warehouse = warehouse(&dir.path().join("warehouse"));
        let out_dir = dir.path().join("queries");

        let written = run_queries(&warehouse, &QueryConfig::default(), &out_dir).unwrap();

        assert_eq!(5, written.len());
        for path in written {
            assert!(path.exists(), "{}", path.display());
        }
        let header = std::fs::read_to_string(out_dir.join("snowiest_days_rides.csv")).unwrap();
        assert!(header.starts_with("date,total_precipitation,total_rides"));
        assert!(string_values(&warehouse.read(CanonicalTable::TaxiTrips).unwrap(), SOURCE_FILE).unwrap().iter().all(Option::is_some));
    }
}
