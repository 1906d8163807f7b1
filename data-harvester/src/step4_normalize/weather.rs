use super::{weekday_num, NormalizeContext, NormalizeError, Normalizer};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use common::types::tables::CanonicalTable;
use common::types::weather::{DailyWeather, HourlyWeather};
use common::util::df::{datetime_values, f64_values, string_values};
use polars::frame::DataFrame;
use polars::prelude::Column;
use std::collections::BTreeMap;

const DATE: &str = "DATE";
const WEATHER_TYPE: &str = "HourlyPresentWeatherType";
const TEMPERATURE: &str = "HourlyDryBulbTemperature";
const PRECIPITATION: &str = "HourlyPrecipitation";
const WIND_SPEED: &str = "HourlyWindSpeed";

const REQUIRED: [&str; 5] = [DATE, WEATHER_TYPE, TEMPERATURE, PRECIPITATION, WIND_SPEED];

/// Hourly observations of an LCD file, typed and with unparseable dates dropped
struct Observations {
    date: Vec<NaiveDateTime>,
    weather_type: Vec<Option<String>>,
    temperature: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    wind_speed: Vec<Option<f64>>,
}

impl Observations {
    fn read(batch: &DataFrame) -> Result<Self, NormalizeError> {
        let dates = datetime_values(batch, DATE)?;
        let rows: Vec<usize> = dates.iter()
            .enumerate()
            .filter_map(|(row, date)| date.map(|_| row))
            .collect();

        let pick = |values: Vec<Option<f64>>| rows.iter().map(|row| values[*row]).collect::<Vec<_>>();
        let weather_type = string_values(batch, WEATHER_TYPE)?;

        Ok(Self {
            date: dates.into_iter().flatten().collect(),
            weather_type: rows.iter().map(|row| weather_type[*row].clone()).collect(),
            temperature: pick(f64_values(batch, TEMPERATURE)?),
            precipitation: pick(f64_values(batch, PRECIPITATION)?),
            wind_speed: pick(f64_values(batch, WIND_SPEED)?),
        })
    }
}

pub struct HourlyWeatherNormalizer;

impl Normalizer for HourlyWeatherNormalizer {
    fn table(&self) -> CanonicalTable {
        CanonicalTable::HourlyWeather
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &REQUIRED
    }

    fn normalize(&self, batch: &DataFrame, _context: &NormalizeContext) -> Result<DataFrame, NormalizeError> {
        self.check_schema(batch)?;
        let observations = Observations::read(batch)?;

        let categories: Vec<HourlyWeather> = observations.weather_type.iter()
            .zip(&observations.precipitation)
            .map(|(code, precipitation)| HourlyWeather::classify(code.as_deref(), *precipitation))
            .collect();

        let columns = vec![
            Column::new("hourly_weather_type".into(), categories.iter().map(HourlyWeather::label).collect::<Vec<_>>()),
            Column::new("severe_weather".into(), categories.iter().map(HourlyWeather::is_severe).collect::<Vec<_>>()),
            Column::new("hour".into(), observations.date.iter().map(|date| date.hour() as i32).collect::<Vec<_>>()),
            Column::new("weekday_num".into(), observations.date.iter().map(weekday_num).collect::<Vec<_>>()),
            Column::new("date".into(), observations.date),
            Column::new("hourly_temperature".into(), observations.temperature),
            Column::new("hourly_precipitation".into(), observations.precipitation),
            Column::new("hourly_windspeed".into(), observations.wind_speed),
        ];

        Ok(self.table().conform_records(DataFrame::new(columns)?)?)
    }
}

/// One row per calendar day with averaged measurements
pub struct DailyWeatherNormalizer;

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

#[derive(Default)]
struct Day {
    weather: Option<DailyWeather>,
    temperature: Mean,
    precipitation: Mean,
    wind_speed: Mean,
}

impl Normalizer for DailyWeatherNormalizer {
    fn table(&self) -> CanonicalTable {
        CanonicalTable::DailyWeather
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &REQUIRED
    }

    fn normalize(&self, batch: &DataFrame, _context: &NormalizeContext) -> Result<DataFrame, NormalizeError> {
        self.check_schema(batch)?;
        let observations = Observations::read(batch)?;

        let mut days: BTreeMap<NaiveDate, Day> = BTreeMap::new();
        for i in 0..observations.date.len() {
            let day = days.entry(observations.date[i].date()).or_default();
            let weather = DailyWeather::from_code(observations.weather_type[i].as_deref());

            day.weather = day.weather.max(Some(weather));
            day.temperature.add(observations.temperature[i]);
            day.precipitation.add(observations.precipitation[i]);
            day.wind_speed.add(observations.wind_speed[i]);
        }

        let columns = vec![
            Column::new("date".into(), days.keys().copied().collect::<Vec<_>>()),
            Column::new(
                "daily_weather_type".into(),
                days.values().map(|day| day.weather.unwrap_or(DailyWeather::Other).label()).collect::<Vec<_>>(),
            ),
            Column::new("avg_temperature".into(), days.values().map(|day| day.temperature.value()).collect::<Vec<_>>()),
            Column::new("avg_precipitation".into(), days.values().map(|day| day.precipitation.value()).collect::<Vec<_>>()),
            Column::new("avg_windspeed".into(), days.values().map(|day| day.wind_speed.value()).collect::<Vec<_>>()),
            Column::new(
                "weekday_num".into(),
                days.keys().map(|date| date.weekday().number_from_monday() as i32).collect::<Vec<_>>(),
            ),
        ];

        Ok(self.table().conform_records(DataFrame::new(columns)?)?)
    }
}
