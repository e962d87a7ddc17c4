use serde::{Deserialize, Serialize};

/// One band of a cutoff table: raters whose (deviation or deviation
/// percentile) is <= `threshold` and above every smaller threshold receive
/// `weight`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoffBand {
    pub threshold: f64,
    pub weight: f64,
}

/// Credibility-weighting policy. The fixed table is calibrated offline
/// against historical data; the percentile table is realized against the
/// current run's deviation distribution, making the cutoffs adaptive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WeightPolicy {
    FixedCutoff { bands: Vec<CutoffBand> },
    PercentileCutoff { bands: Vec<CutoffBand> },
    /// Every rater gets weight 1.0; weighted output reduces to unweighted.
    Uniform,
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("cutoff table is empty")]
    EmptyTable,
    #[error("cutoff thresholds must be strictly increasing: {0} then {1}")]
    NonIncreasingThresholds(f64, f64),
    #[error("cutoff weight {0} outside (0, 1]")]
    WeightOutOfRange(f64),
    #[error("cutoff weights must be non-increasing with deviation: {0} then {1}")]
    IncreasingWeights(f64, f64),
    #[error("percentile threshold {0} outside (0, 1)")]
    PercentileOutOfRange(f64),
}

impl WeightPolicy {
    /// Fixed deviation cutoffs calibrated on the 2023 season data.
    pub fn fixed_v1() -> Self {
        WeightPolicy::FixedCutoff {
            bands: vec![
                CutoffBand { threshold: 0.5512, weight: 1.0 },
                CutoffBand { threshold: 0.6862, weight: 0.9 },
                CutoffBand { threshold: 0.8023, weight: 0.85 },
                CutoffBand { threshold: 1.0166, weight: 0.6 },
                CutoffBand { threshold: 1.2798, weight: 0.45 },
                CutoffBand { threshold: 1.3746, weight: 0.30 },
            ],
        }
    }

    /// Percentile cutoffs: a rater at or below the 50th deviation percentile
    /// keeps full weight, the top 1% drops to 0.4.
    pub fn percentile_v1() -> Self {
        WeightPolicy::PercentileCutoff {
            bands: vec![
                CutoffBand { threshold: 0.50, weight: 1.0 },
                CutoffBand { threshold: 0.75, weight: 0.9 },
                CutoffBand { threshold: 0.85, weight: 0.8 },
                CutoffBand { threshold: 0.90, weight: 0.7 },
                CutoffBand { threshold: 0.95, weight: 0.6 },
                CutoffBand { threshold: 0.99, weight: 0.4 },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let (bands, percentile) = match self {
            WeightPolicy::FixedCutoff { bands } => (bands, false),
            WeightPolicy::PercentileCutoff { bands } => (bands, true),
            WeightPolicy::Uniform => return Ok(()),
        };
        if bands.is_empty() {
            return Err(PolicyError::EmptyTable);
        }
        for pair in bands.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(PolicyError::NonIncreasingThresholds(
                    pair[0].threshold,
                    pair[1].threshold,
                ));
            }
            // Higher deviation must never earn more credibility.
            if pair[1].weight > pair[0].weight {
                return Err(PolicyError::IncreasingWeights(
                    pair[0].weight,
                    pair[1].weight,
                ));
            }
        }
        for band in bands {
            if !(band.weight > 0.0 && band.weight <= 1.0) {
                return Err(PolicyError::WeightOutOfRange(band.weight));
            }
            if percentile && !(band.threshold > 0.0 && band.threshold < 1.0) {
                return Err(PolicyError::PercentileOutOfRange(band.threshold));
            }
        }
        Ok(())
    }
}
