use super::trips::{clean_trips, optional_amount, reconcile_total, trip_columns, zero_filled, Amount, DROPOFF_ZONE, PICKUP_ZONE};
use super::{NormalizeContext, NormalizeError, Normalizer};
use common::types::airport::{Airport, AirportTag};
use common::types::region::Region;
use common::types::tables::CanonicalTable;
use common::types::Coordinate;
use common::util::df::string_values;
use common::util::geofence::classify;
use polars::frame::DataFrame;
use polars::prelude::Column;

const LICENSE: &str = "hvfhs_license_num";
const PICKUP_TIME: &str = "pickup_datetime";
const DROPOFF_TIME: &str = "dropoff_datetime";

/// High volume license number of Uber
pub const UBER_LICENSE: &str = "HV0003";

const AMOUNTS: [Amount; 9] = [
    Amount::same("trip_miles"),
    Amount::same("base_passenger_fare"),
    Amount::same("tolls"),
    Amount::same("sales_tax"),
    Amount::same("congestion_surcharge"),
    Amount::same("airport_fee"),
    Amount::same("tips"),
    Amount::same("driver_pay"),
    Amount::same("bcf"),
];

/// Tips are voluntary and not part of the total
const TOTAL_COMPONENTS: [&str; 7] = [
    "base_passenger_fare",
    "tolls",
    "sales_tax",
    "congestion_surcharge",
    "airport_fee",
    "driver_pay",
    "bcf",
];

/// High volume for-hire vehicle trip records, of which only Uber trips are kept
pub struct RideshareNormalizer;

impl Normalizer for RideshareNormalizer {
    fn table(&self) -> CanonicalTable {
        CanonicalTable::UberTrips
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[LICENSE, PICKUP_TIME, DROPOFF_TIME, PICKUP_ZONE, DROPOFF_ZONE]
    }

    fn normalize(&self, batch: &DataFrame, context: &NormalizeContext) -> Result<DataFrame, NormalizeError> {
        self.check_schema(batch)?;

        let licenses = string_values(batch, LICENSE)?;
        let is_uber = |row: usize| licenses[row].as_deref().map(str::trim) == Some(UBER_LICENSE);

        let trips = clean_trips(batch, PICKUP_TIME, DROPOFF_TIME, is_uber, context)?;
        let len = trips.rows.len();

        let amounts = AMOUNTS.iter()
            .map(|amount| Ok((amount.name, optional_amount(batch, amount, &trips.rows)?)))
            .collect::<Result<Vec<_>, NormalizeError>>()?;

        // The HVFHV records carry no total
        let totals: Vec<f64> = (0..len)
            .map(|i| reconcile_total(
                None,
                amounts.iter()
                    .filter(|(name, _)| TOTAL_COMPONENTS.contains(name))
                    .map(|(_, values)| values.as_ref().and_then(|values| values[i])),
            ))
            .collect();

        let airports: Vec<AirportTag> = trips.pickup.iter()
            .zip(&trips.dropoff)
            .map(|(pickup, dropoff)| geofence_airport(pickup, dropoff, &context.regions.airports))
            .collect();

        let mut columns = trip_columns(trips, airports);
        columns.push(Column::new(LICENSE.into(), vec![UBER_LICENSE; len]));
        columns.push(Column::new("total_amount".into(), totals));
        for (name, values) in &amounts {
            columns.push(Column::new((*name).into(), zero_filled(values, len)));
        }

        Ok(self.table().conform_records(DataFrame::new(columns)?)?)
    }
}

/// The airport a trip starts at, or else the one it ends at
pub fn geofence_airport(pickup: &Coordinate, dropoff: &Coordinate, airports: &[Region<Airport>]) -> AirportTag {
    classify(pickup, airports)
        .or_else(|| classify(dropoff, airports))
        .copied()
        .into()
}
