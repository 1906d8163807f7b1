use crate::RidesError;
use analytics::queries::run_queries;
use analytics::warehouse::Warehouse;
use common::types::config::{PathConfig, QueryConfig, ZoneSource};
use common::types::dataset::Dataset;
use common::types::region::RegionConfig;
use common::types::sampling::SamplingConfig;
use common::util::logging;
use data_harvester::harvest::{harvest_dataset, HarvestContext};
use data_harvester::zones::load_zone_geometries;
use log::{error, info, warn};
use std::fs::create_dir_all;
use std::time::Instant;

pub struct IngestInput {
    pub datasets: Vec<Dataset>,
    pub zones: ZoneSource,
    pub paths: PathConfig,
    pub sampling: SamplingConfig,
    pub regions: RegionConfig,
    pub queries: QueryConfig,
}

/// Harvests every dataset into the warehouse and answers the queries over it. A dataset of
/// which no batch could be processed is skipped; without zones nothing can be done.
pub async fn ingest(input: IngestInput, skip_queries: bool) -> Result<(), RidesError> {
    info!(target: "ingest", "Starting ingestion of {} datasets", input.datasets.len());
    let start_time = Instant::now();

    let zones = logging::run_with_spinner("zones", "Loading taxi zones", || {
        load_zone_geometries(&input.zones)
    })?;

    create_dir_all(&input.paths.cache_dir)?;
    let warehouse = Warehouse::open(&input.paths.warehouse_dir)?;
    warehouse.create_tables()?;

    let context = HarvestContext {
        zones: &zones,
        regions: &input.regions,
        sampling: &input.sampling,
        cache_dir: &input.paths.cache_dir,
    };

    let mut harvested = 0;
    for dataset in &input.datasets {
        let description = format!("Harvesting dataset '{}'", dataset.id);
        let merged = match logging::run_with_spinner_async("harvest", &description, harvest_dataset(dataset, &context)).await {
            Ok(merged) => merged,
            Err(err) => {
                error!(target: "ingest", "Error in dataset '{}': {}", dataset.id, err);
                warn!(target: "ingest", "Skipping dataset '{}'", dataset.id);
                continue;
            }
        };

        for table in dataset.kind.tables() {
            if merged.table(*table).is_none() {
                warn!(target: "ingest", "Dataset '{}' produced no rows for {}", dataset.id, table);
            }
        }
        for (table, rows) in merged.tables {
            let appended = rows.height();
            let total = warehouse.append(table, rows)?;
            info!(target: "ingest", "Stored {} rows of '{}' in {} ({} in total)", appended, dataset.id, table, total);
        }
        harvested += 1;
    }

    if harvested == 0 {
        return Err(RidesError::NoData);
    }

    if skip_queries {
        info!(target: "ingest", "Skipping queries");
    } else {
        let written = run_queries(&warehouse, &input.queries, &input.paths.query_dir)?;
        info!(target: "ingest", "Wrote {} query results to {}", written.len(), input.paths.query_dir.display());
    }

    let elapsed = indicatif::HumanDuration(start_time.elapsed());
    info!(target: "ingest", "Ingestion finished in {}", elapsed);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use common::types::dataset::{DataSource, DatasetKind};
    use common::types::tables::CanonicalTable;
    use common::util::df::{write_df_to_file, FileType};
    use polars::df;
    use std::path::Path;

    const ZONES: &str = r#"{"type":"FeatureCollection","features":[
      {"type":"Feature","properties":{"LocationID":1,"zone":"Midtown Center","borough":"Manhattan"},
       "geometry":{"type":"Polygon","coordinates":[[[-73.995,40.745],[-73.985,40.745],[-73.985,40.755],[-73.995,40.755],[-73.995,40.745]]]}},
      {"type":"Feature","properties":{"LocationID":132,"zone":"JFK Airport","borough":"Queens"},
       "geometry":{"type":"Polygon","coordinates":[[[-73.80,40.63],[-73.77,40.63],[-73.77,40.66],[-73.80,40.66],[-73.80,40.63]]]}}
    ]}"#;

    const WEATHER: &str = "STATION,DATE,HourlyPresentWeatherType,HourlyDryBulbTemperature,HourlyPrecipitation,HourlyWindSpeed
72505394728,2024-01-06T08:51:00,-SN:03 |SN |,30,0.10,12
72505394728,2024-01-06T09:51:00,-SN:03 |SN |,29,0.20,14
72505394728,2024-01-07T09:51:00,,35,0.00,3
";

    fn timestamp(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn dataset(id: &str, kind: DatasetKind, path: &Path) -> Dataset {
        Dataset {
            id: id.to_owned(),
            kind,
            sources: vec![DataSource::File { path: path.to_path_buf() }],
            sample: Some(false),
        }
    }

    #[tokio::test]
    async fn test_local_datasets_end_up_in_warehouse() {
        let dir = tempfile::tempdir().unwrap();

        let zones = dir.path().join("taxi_zones.geojson");
        std::fs::write(&zones, ZONES).unwrap();
        let weather = dir.path().join("2024_weather.csv");
        std::fs::write(&weather, WEATHER).unwrap();
        let taxi = dir.path().join("yellow_tripdata_2024-01.parquet");
        let mut records = df![
            "tpep_pickup_datetime" => [timestamp("2024-01-06 08:10:00"), timestamp("2024-01-06 09:20:00"), timestamp("2024-01-07 09:00:00")],
            "tpep_dropoff_datetime" => [timestamp("2024-01-06 08:50:00"), timestamp("2024-01-06 09:45:00"), timestamp("2024-01-07 09:30:00")],
            "PULocationID" => [1i64, 132, 264],
            "DOLocationID" => [132i64, 1, 1],
            "RatecodeID" => [2.0, 1.0, 1.0],
            "trip_distance" => [17.0, 16.5, 2.0],
            "total_amount" => [75.0, 62.5, 14.0],
        ].unwrap();
        write_df_to_file(&taxi, FileType::PARQUET, &mut records).unwrap();

        let paths = PathConfig {
            cache_dir: dir.path().join("raw"),
            warehouse_dir: dir.path().join("warehouse"),
            query_dir: dir.path().join("queries"),
        };
        let input = IngestInput {
            datasets: vec![
                dataset("yellow", DatasetKind::Taxi, &taxi),
                dataset("missing", DatasetKind::Rideshare, &dir.path().join("fhvhv_tripdata_2024-01.parquet")),
                dataset("weather", DatasetKind::Weather, &weather),
            ],
            zones: ZoneSource { path: zones, crs: None },
            paths: paths.clone(),
            sampling: SamplingConfig::default(),
            regions: RegionConfig::default(),
            queries: QueryConfig::default(),
        };

        ingest(input, false).await.unwrap();

        let warehouse = Warehouse::open(&paths.warehouse_dir).unwrap();
        // Zone 264 is unknown
        assert_eq!(2, warehouse.read(CanonicalTable::TaxiTrips).unwrap().height());
        assert_eq!(0, warehouse.read(CanonicalTable::UberTrips).unwrap().height());
        assert_eq!(3, warehouse.read(CanonicalTable::HourlyWeather).unwrap().height());
        assert_eq!(2, warehouse.read(CanonicalTable::DailyWeather).unwrap().height());

        let snowiest = std::fs::read_to_string(paths.query_dir.join("snowiest_days_rides.csv")).unwrap();
        assert_eq!(2, snowiest.lines().count(), "{}", snowiest);
        assert!(snowiest.lines().nth(1).unwrap().starts_with("2024-01-06,"));
        assert!(snowiest.lines().nth(1).unwrap().ends_with(",2"));
    }

    #[tokio::test]
    async fn test_unreadable_zones_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = IngestInput {
            datasets: vec![],
            zones: ZoneSource { path: dir.path().join("missing.geojson"), crs: None },
            paths: PathConfig::default(),
            sampling: SamplingConfig::default(),
            regions: RegionConfig::default(),
            queries: QueryConfig::default(),
        };

        assert!(matches!(ingest(input, true).await, Err(RidesError::Zones(_))));
    }
}
