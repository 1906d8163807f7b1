use crate::types::errors::UnsupportedConfidenceLevel;
use serde::Deserialize;

/// Confidence levels with a tabulated z-score. Other levels are rejected instead of being
/// approximated.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(try_from = "f64")]
pub enum ConfidenceLevel {
    Ninety,
    NinetyFive,
    NinetyNine,
}

impl ConfidenceLevel {
    pub fn z_score(&self) -> f64 {
        match self {
            ConfidenceLevel::Ninety => 1.645,
            ConfidenceLevel::NinetyFive => 1.96,
            ConfidenceLevel::NinetyNine => 2.576,
        }
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = UnsupportedConfidenceLevel;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        const LEVELS: [(f64, ConfidenceLevel); 3] = [
            (0.90, ConfidenceLevel::Ninety),
            (0.95, ConfidenceLevel::NinetyFive),
            (0.99, ConfidenceLevel::NinetyNine),
        ];

        LEVELS.iter()
            .find(|(level, _)| (level - value).abs() < 1e-9)
            .map(|(_, level)| *level)
            .ok_or(UnsupportedConfidenceLevel(value))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_confidence")]
    pub confidence: ConfidenceLevel,
    #[serde(default = "default_margin_of_error")]
    pub margin_of_error: f64,
    /// Estimated proportion of the attribute in the population. 0.5 is the most conservative
    #[serde(default = "default_proportion")]
    pub proportion: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_confidence() -> ConfidenceLevel { ConfidenceLevel::NinetyFive }
fn default_margin_of_error() -> f64 { 0.05 }
fn default_proportion() -> f64 { 0.5 }
fn default_seed() -> u64 { 42 }

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            margin_of_error: default_margin_of_error(),
            proportion: default_proportion(),
            seed: default_seed(),
        }
    }
}
