//! Sampling of large batches.
//!
//! The sample size follows Cochran's formula for proportions,
//! `n0 = z² · p · (1 - p) / e²`, with the finite population correction
//! `n = n0 · N / (n0 + N - 1)`. `n0` is taken at its tabulated integer value before the
//! correction, so 95 % confidence, a 5 % margin and `p = 0.5` give the familiar 384.

use common::types::errors::UnsupportedConfidenceLevel;
use common::types::sampling::{ConfidenceLevel, SamplingConfig};
use log::debug;
use polars::frame::DataFrame;
use std::fmt;
use std::fmt::Display;

pub fn sample_size(
    population: i64,
    confidence: f64,
    margin_of_error: f64,
    proportion: f64,
) -> Result<usize, SampleError> {
    let confidence = ConfidenceLevel::try_from(confidence)?;
    sample_size_for_level(population, confidence, margin_of_error, proportion)
}

pub fn sample_size_for_level(
    population: i64,
    confidence: ConfidenceLevel,
    margin_of_error: f64,
    proportion: f64,
) -> Result<usize, SampleError> {
    if population <= 0 {
        return Err(SampleError::InvalidPopulation(population));
    }
    if !(margin_of_error > 0.0 && margin_of_error < 1.0) {
        return Err(SampleError::InvalidMargin(margin_of_error));
    }
    if !(0.0..=1.0).contains(&proportion) {
        return Err(SampleError::InvalidProportion(proportion));
    }

    let z = confidence.z_score();
    let n0 = (z * z * proportion * (1.0 - proportion) / (margin_of_error * margin_of_error)).round();
    let population_f = population as f64;
    let corrected = (n0 * population_f / (n0 + population_f - 1.0)).ceil();

    // p = 0 or 1 yields n0 = 0, still sample at least one record
    let size = if corrected.is_finite() { corrected as i64 } else { 1 };
    Ok(size.clamp(1, population) as usize)
}

/// Seeded uniform sample of exactly `size` rows, drawn without replacement. Equal input and
/// seed give an equal sample.
pub fn draw_sample(records: &DataFrame, size: usize, seed: u64) -> Result<DataFrame, SampleError> {
    if size > records.height() {
        return Err(SampleError::SampleTooLarge { size, population: records.height() });
    }
    Ok(records.sample_n_literal(size, false, false, Some(seed))?)
}

/// Shrinks a raw batch to a statistically sufficient sample. Empty batches pass through.
pub fn sample_batch(records: DataFrame, config: &SamplingConfig) -> Result<DataFrame, SampleError> {
    if records.height() == 0 {
        return Ok(records);
    }

    let size = sample_size_for_level(
        records.height() as i64,
        config.confidence,
        config.margin_of_error,
        config.proportion,
    )?;
    debug!(target: "sample", "Sampling {} of {} rows", size, records.height());

    draw_sample(&records, size, config.seed)
}

#[derive(thiserror::Error, Debug)]
pub enum SampleError {
    UnsupportedConfidence(#[from] UnsupportedConfidenceLevel),
    Polars(#[from] polars::error::PolarsError),
    InvalidPopulation(i64),
    InvalidMargin(f64),
    InvalidProportion(f64),
    SampleTooLarge { size: usize, population: usize },
}

impl Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleError::UnsupportedConfidence(err) => err.fmt(f),
            SampleError::Polars(err) => err.fmt(f),
            SampleError::InvalidPopulation(population) => {
                write!(f, "Population size must be positive, got {}", population)
            }
            SampleError::InvalidMargin(margin) => {
                write!(f, "Margin of error must be between 0 and 1 (exclusive), got {}", margin)
            }
            SampleError::InvalidProportion(proportion) => {
                write!(f, "Proportion must be between 0 and 1, got {}", proportion)
            }
            SampleError::SampleTooLarge { size, population } => {
                write!(f, "Cannot draw {} rows from a batch of {} rows", size, population)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_sample_size_of_a_million() {
        assert_eq!(384, sample_size(1_000_000, 0.95, 0.05, 0.5).unwrap());
    }

    #[test]
    fn test_sample_size_is_bounded_by_population() {
        for population in [1, 2, 3, 10, 99, 385, 1_000, 12_345, 3_000_000] {
            for confidence in [0.90, 0.95, 0.99] {
                let size = sample_size(population, confidence, 0.05, 0.5).unwrap();
                assert!(size >= 1, "{} for N={}", size, population);
                assert!(size as i64 <= population, "{} for N={}", size, population);
            }
        }
        assert_eq!(1, sample_size(1, 0.99, 0.01, 0.5).unwrap());
        assert_eq!(1, sample_size(500, 0.95, 0.05, 0.0).unwrap());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(sample_size(0, 0.95, 0.05, 0.5), Err(SampleError::InvalidPopulation(0))));
        assert!(matches!(sample_size(-5, 0.95, 0.05, 0.5), Err(SampleError::InvalidPopulation(-5))));
        assert!(matches!(sample_size(100, 0.8, 0.05, 0.5), Err(SampleError::UnsupportedConfidence(_))));
        assert!(matches!(sample_size(100, 0.95, 0.0, 0.5), Err(SampleError::InvalidMargin(_))));
        assert!(matches!(sample_size(100, 0.95, 0.05, 1.5), Err(SampleError::InvalidProportion(_))));
    }

    #[test]
    fn test_draw_sample_is_deterministic() {
        let records = df!["id" => (0..1_000i64).collect::<Vec<_>>()].unwrap();

        let first = draw_sample(&records, 50, 42).unwrap();
        let second = draw_sample(&records, 50, 42).unwrap();

        assert_eq!(50, first.height());
        assert!(first.equals(&second));
        assert_eq!(50, first.column("id").unwrap().as_materialized_series().n_unique().unwrap());
    }

    #[test]
    fn test_draw_sample_rejects_oversized_samples() {
        let records = df!["id" => [1i64, 2, 3]].unwrap();
        assert!(matches!(
            draw_sample(&records, 4, 42),
            Err(SampleError::SampleTooLarge { size: 4, population: 3 })
        ));
    }

    #[test]
    fn test_sample_batch_uses_config() {
        let records = df!["id" => (0..10_000i64).collect::<Vec<_>>()].unwrap();
        let sampled = sample_batch(records, &SamplingConfig::default()).unwrap();
        assert_eq!(370, sampled.height());

        let empty = df!["id" => Vec::<i64>::new()].unwrap();
        assert_eq!(0, sample_batch(empty, &SamplingConfig::default()).unwrap().height());
    }
}
