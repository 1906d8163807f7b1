use super::{weekday_num, NormalizeContext};
use chrono::NaiveDateTime;
use common::types::airport::AirportTag;
use common::types::Coordinate;
use common::util::df::{datetime_values, f64_values, has_column, i64_values};
use common::util::geofence::in_bounding_box;
use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::Column;

pub(super) const PICKUP_ZONE: &str = "PULocationID";
pub(super) const DROPOFF_ZONE: &str = "DOLocationID";

/// A monetary or distance column of the canonical table and the raw spellings it is read from
pub(super) struct Amount {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Amount {
    pub const fn same(name: &'static str) -> Self {
        Self { name, aliases: &[] }
    }

    fn raw_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// Trips of a batch that have both timestamps, two resolvable zones and stay inside the metro
/// area, with their derived fields
pub(super) struct CleanTrips {
    /// Positions in the raw batch
    pub rows: Vec<usize>,
    pub pickup_time: Vec<NaiveDateTime>,
    pub dropoff_time: Vec<NaiveDateTime>,
    pub pickup: Vec<Coordinate>,
    pub dropoff: Vec<Coordinate>,
}

pub(super) fn clean_trips(
    batch: &DataFrame,
    pickup_time_column: &str,
    dropoff_time_column: &str,
    keep: impl Fn(usize) -> bool,
    context: &NormalizeContext,
) -> PolarsResult<CleanTrips> {
    let pickup_times = datetime_values(batch, pickup_time_column)?;
    let dropoff_times = datetime_values(batch, dropoff_time_column)?;
    let pickup_zones = i64_values(batch, PICKUP_ZONE)?;
    let dropoff_zones = i64_values(batch, DROPOFF_ZONE)?;
    let metro = &context.regions.metro;

    let mut trips = CleanTrips {
        rows: vec![],
        pickup_time: vec![],
        dropoff_time: vec![],
        pickup: vec![],
        dropoff: vec![],
    };

    for row in 0..batch.height() {
        if !keep(row) {
            continue;
        }
        let (Some(pickup_time), Some(dropoff_time)) = (pickup_times[row], dropoff_times[row]) else {
            continue;
        };
        let (Some(pickup), Some(dropoff)) = (
            context.zones.resolve_raw(pickup_zones[row]),
            context.zones.resolve_raw(dropoff_zones[row]),
        ) else {
            continue;
        };
        if !in_bounding_box(&pickup, metro) || !in_bounding_box(&dropoff, metro) {
            continue;
        }

        trips.rows.push(row);
        trips.pickup_time.push(pickup_time);
        trips.dropoff_time.push(dropoff_time);
        trips.pickup.push(pickup);
        trips.dropoff.push(dropoff);
    }

    Ok(trips)
}

/// Values of an optional column at the kept rows, `None` if the batch has no such column
pub(super) fn optional_amount(
    batch: &DataFrame,
    amount: &Amount,
    rows: &[usize],
) -> PolarsResult<Option<Vec<Option<f64>>>> {
    let Some(column) = amount.raw_names().find(|name| has_column(batch, name)) else {
        return Ok(None);
    };

    let values = f64_values(batch, column)?;
    Ok(Some(rows.iter().map(|row| values[*row].filter(|value| !value.is_nan())).collect()))
}

pub(super) fn zero_filled(values: &Option<Vec<Option<f64>>>, len: usize) -> Vec<f64> {
    match values {
        Some(values) => values.iter().map(|value| value.unwrap_or(0.0)).collect(),
        None => vec![0.0; len],
    }
}

/// A provided total passes through. Without one, the total is the sum of the components that
/// are present, and 0 if none is.
pub(super) fn reconcile_total(provided: Option<f64>, components: impl IntoIterator<Item = Option<f64>>) -> f64 {
    provided
        .or_else(|| components.into_iter().flatten().reduce(|sum, value| sum + value))
        .unwrap_or(0.0)
}

/// Columns every canonical trip table shares
pub(super) fn trip_columns(trips: CleanTrips, airports: Vec<AirportTag>) -> Vec<Column> {
    let weekdays: Vec<i32> = trips.dropoff_time.iter().map(weekday_num).collect();
    let coordinates = |coordinates: &[Coordinate]| coordinates.iter()
        .map(Coordinate::to_string)
        .collect::<Vec<_>>();

    vec![
        Column::new("pickup_coords".into(), coordinates(&trips.pickup)),
        Column::new("dropoff_coords".into(), coordinates(&trips.dropoff)),
        Column::new("pickup_datetime".into(), trips.pickup_time),
        Column::new("dropoff_datetime".into(), trips.dropoff_time),
        Column::new("weekday_num".into(), weekdays),
        Column::new("airport".into(), airports.iter().map(AirportTag::label).collect::<Vec<_>>()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_total() {
        assert_eq!(25.5, reconcile_total(Some(25.5), [Some(1.0), Some(2.0)]));
        assert_eq!(3.0, reconcile_total(None, [Some(1.0), None, Some(2.0)]));
        assert_eq!(0.0, reconcile_total(None, [None, None]));
    }

    #[test]
    fn test_zero_filled() {
        assert_eq!(vec![0.0, 0.0], zero_filled(&None, 2));
        assert_eq!(vec![1.5, 0.0], zero_filled(&Some(vec![Some(1.5), None]), 2));
    }
}
