use super::trips::{clean_trips, optional_amount, reconcile_total, trip_columns, zero_filled, Amount, DROPOFF_ZONE, PICKUP_ZONE};
use super::{NormalizeContext, NormalizeError, Normalizer};
use common::types::airport::{Airport, AirportTag};
use common::types::region::TaxiAirportRule;
use common::types::tables::CanonicalTable;
use common::util::df::f64_values;
use polars::frame::DataFrame;
use polars::prelude::Column;

const PICKUP_TIME: &str = "tpep_pickup_datetime";
const DROPOFF_TIME: &str = "tpep_dropoff_datetime";
const RATE_CODE: &str = "RatecodeID";

const TOTAL: Amount = Amount::same("total_amount");
const AIRPORT_FEE: Amount = Amount { name: "airport_fee", aliases: &["Airport_fee"] };

const AMOUNTS: [Amount; 9] = [
    Amount::same("trip_distance"),
    Amount::same("fare_amount"),
    Amount::same("extra"),
    Amount::same("mta_tax"),
    Amount::same("tip_amount"),
    Amount::same("tolls_amount"),
    Amount::same("improvement_surcharge"),
    Amount::same("congestion_surcharge"),
    AIRPORT_FEE,
];

/// Parts of [`AMOUNTS`] that add up to the total when the batch has none
const TOTAL_COMPONENTS: [&str; 7] = [
    "fare_amount",
    "extra",
    "mta_tax",
    "tolls_amount",
    "improvement_surcharge",
    "congestion_surcharge",
    "airport_fee",
];

/// Yellow taxi trip records
pub struct TaxiNormalizer;

impl Normalizer for TaxiNormalizer {
    fn table(&self) -> CanonicalTable {
        CanonicalTable::TaxiTrips
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[PICKUP_TIME, DROPOFF_TIME, PICKUP_ZONE, DROPOFF_ZONE, RATE_CODE]
    }

    fn normalize(&self, batch: &DataFrame, context: &NormalizeContext) -> Result<DataFrame, NormalizeError> {
        self.check_schema(batch)?;

        let trips = clean_trips(batch, PICKUP_TIME, DROPOFF_TIME, |_| true, context)?;
        let len = trips.rows.len();

        let raw_rate_codes = f64_values(batch, RATE_CODE)?;
        let rate_codes: Vec<Option<f64>> = trips.rows.iter().map(|row| raw_rate_codes[*row]).collect();

        let amounts = AMOUNTS.iter()
            .map(|amount| Ok((amount.name, optional_amount(batch, amount, &trips.rows)?)))
            .collect::<Result<Vec<_>, NormalizeError>>()?;
        let amount = |name: &str| amounts.iter()
            .find(|(candidate, _)| *candidate == name)
            .and_then(|(_, values)| values.as_ref());

        let provided_total = optional_amount(batch, &TOTAL, &trips.rows)?;
        let totals: Vec<f64> = (0..len)
            .map(|i| reconcile_total(
                provided_total.as_ref().and_then(|total| total[i]),
                TOTAL_COMPONENTS.iter().map(|name| amount(*name).and_then(|values| values[i])),
            ))
            .collect();

        let airport_fees = amount(AIRPORT_FEE.name);
        let airports: Vec<AirportTag> = (0..len)
            .map(|i| taxi_airport(
                rate_codes[i],
                airport_fees.and_then(|fees| fees[i]),
                &context.regions.taxi_airport_rule,
            ))
            .collect();

        let mut columns = trip_columns(trips, airports);
        columns.push(Column::new("rate_code_id".into(), rate_codes));
        columns.push(Column::new(TOTAL.name.into(), totals));
        for (name, values) in &amounts {
            columns.push(Column::new((*name).into(), zero_filled(values, len)));
        }

        Ok(self.table().conform_records(DataFrame::new(columns)?)?)
    }
}

/// Taxi trips are attributed to airports by their fare: JFK and Newark have a rate code of
/// their own, LaGuardia trips pay a specific airport fee. Checked in that order.
pub fn taxi_airport(rate_code: Option<f64>, airport_fee: Option<f64>, rule: &TaxiAirportRule) -> AirportTag {
    let is_rate = |code: i64| rate_code == Some(code as f64);

    if is_rate(rule.jfk_rate_code) {
        AirportTag::Airport(Airport::Jfk)
    } else if airport_fee.is_some_and(|fee| (fee - rule.lga_airport_fee).abs() < 1e-9) {
        AirportTag::Airport(Airport::Lga)
    } else if is_rate(rule.newark_rate_code) {
        AirportTag::Airport(Airport::Ewr)
    } else {
        AirportTag::NotAirport
    }
}
