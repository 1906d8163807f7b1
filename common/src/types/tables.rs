use polars::datatypes::{DataType, TimeUnit};
use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{col, Field, IntoLazy, Schema, SchemaExt};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Name of the provenance column the merge step adds to every canonical table
pub const SOURCE_FILE: &str = "source_file";

/// The tables handed to the warehouse. Column order and types are fixed here and every
/// producer conforms its output to them.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum CanonicalTable {
    TaxiTrips,
    UberTrips,
    HourlyWeather,
    DailyWeather,
}

impl CanonicalTable {
    pub const ALL: [CanonicalTable; 4] = [
        CanonicalTable::TaxiTrips,
        CanonicalTable::UberTrips,
        CanonicalTable::HourlyWeather,
        CanonicalTable::DailyWeather,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalTable::TaxiTrips => "taxi_trips",
            CanonicalTable::UberTrips => "uber_trips",
            CanonicalTable::HourlyWeather => "hourly_weather",
            CanonicalTable::DailyWeather => "daily_weather",
        }
    }

    /// Columns produced by the normalizers, without the provenance column
    pub fn record_fields(&self) -> Vec<Field> {
        let timestamp = || DataType::Datetime(TimeUnit::Microseconds, None);
        let field = |name: &str, dtype: DataType| Field { name: name.into(), dtype };
        let amount = |name: &str| field(name, DataType::Float64);

        match self {
            CanonicalTable::TaxiTrips => vec![
                field("pickup_datetime", timestamp()),
                field("dropoff_datetime", timestamp()),
                field("rate_code_id", DataType::Float64),
                amount("trip_distance"),
                amount("fare_amount"),
                amount("extra"),
                amount("mta_tax"),
                amount("tip_amount"),
                amount("tolls_amount"),
                amount("improvement_surcharge"),
                amount("total_amount"),
                amount("congestion_surcharge"),
                amount("airport_fee"),
                field("pickup_coords", DataType::String),
                field("dropoff_coords", DataType::String),
                field("weekday_num", DataType::Int32),
                field("airport", DataType::String),
            ],
            CanonicalTable::UberTrips => vec![
                field("pickup_datetime", timestamp()),
                field("dropoff_datetime", timestamp()),
                field("hvfhs_license_num", DataType::String),
                amount("trip_miles"),
                amount("base_passenger_fare"),
                amount("tolls"),
                amount("sales_tax"),
                amount("congestion_surcharge"),
                amount("airport_fee"),
                amount("tips"),
                amount("driver_pay"),
                amount("bcf"),
                amount("total_amount"),
                field("pickup_coords", DataType::String),
                field("dropoff_coords", DataType::String),
                field("weekday_num", DataType::Int32),
                field("airport", DataType::String),
            ],
            CanonicalTable::HourlyWeather => vec![
                field("date", timestamp()),
                field("hourly_weather_type", DataType::String),
                field("hourly_temperature", DataType::Float64),
                field("hourly_precipitation", DataType::Float64),
                field("hourly_windspeed", DataType::Float64),
                field("hour", DataType::Int32),
                field("weekday_num", DataType::Int32),
                field("severe_weather", DataType::Boolean),
            ],
            CanonicalTable::DailyWeather => vec![
                field("date", DataType::Date),
                field("daily_weather_type", DataType::String),
                field("avg_temperature", DataType::Float64),
                field("avg_precipitation", DataType::Float64),
                field("avg_windspeed", DataType::Float64),
                field("weekday_num", DataType::Int32),
            ],
        }
    }

    /// Full storage schema: record columns plus [`SOURCE_FILE`]
    pub fn schema(&self) -> Schema {
        let mut fields = self.record_fields();
        fields.push(Field { name: SOURCE_FILE.into(), dtype: DataType::String });
        Schema::from_iter(fields)
    }

    /// Selects the record columns in canonical order and casts them to canonical types
    pub fn conform_records(&self, frame: DataFrame) -> PolarsResult<DataFrame> {
        conform(frame, self.record_fields())
    }

    /// Like [`CanonicalTable::conform_records`], but including the provenance column
    pub fn conform(&self, frame: DataFrame) -> PolarsResult<DataFrame> {
        conform(frame, self.schema().iter_fields().collect())
    }
}

fn conform(frame: DataFrame, fields: Vec<Field>) -> PolarsResult<DataFrame> {
    frame.lazy()
        .select(
            fields.into_iter()
                .map(|field| col(field.name.clone()).cast(field.dtype))
                .collect::<Vec<_>>(),
        )
        .collect()
}

impl Display for CanonicalTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_conform_orders_and_casts_columns() {
        let frame = df![
            "weekday_num" => [3i64],
            "date" => [chrono::NaiveDate::from_ymd_opt(2023, 1, 4).unwrap()],
            "avg_windspeed" => [Some(4i64)],
            "avg_precipitation" => [None::<f64>],
            "avg_temperature" => [Some(31.5)],
            "daily_weather_type" => ["rain"],
            "unrelated" => [true],
        ].unwrap();

        let conformed = CanonicalTable::DailyWeather.conform_records(frame).unwrap();

        assert_eq!(
            vec!["date", "daily_weather_type", "avg_temperature", "avg_precipitation", "avg_windspeed", "weekday_num"],
            conformed.get_column_names().iter().map(|name| name.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(&DataType::Int32, conformed.column("weekday_num").unwrap().dtype());
        assert_eq!(&DataType::Float64, conformed.column("avg_windspeed").unwrap().dtype());
    }

    #[test]
    fn test_schema_ends_with_provenance() {
        for table in CanonicalTable::ALL {
            let schema = table.schema();
            assert_eq!(table.record_fields().len() + 1, schema.len());
            assert_eq!(Some(&DataType::String), schema.get(SOURCE_FILE));
        }
    }
}
