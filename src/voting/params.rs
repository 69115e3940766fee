//! Parameter types configuring the voting stages.
//!
//! This module groups knobs for hypothesis sampling, outlier pruning and the
//! consensus weighting. Defaults follow the values the pose network was tuned
//! with: 51 hypotheses (odd, so the IQR medians land on real samples), an
//! in-mask boost of 3 and IQR pruning that replaces outliers by the median.
//!
//! String names for the pruning method and replacement style are only
//! accepted at the configuration boundary (`FromStr`), where unknown names
//! fail immediately.

use crate::error::VotingError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Voting-wide parameters.
#[derive(Clone, Debug)]
pub struct VotingParams {
    /// Maximum number of point pairs (hypotheses) sampled per instance (>=1).
    pub num_hypotheses: usize,
    /// Vote boost applied when a hypothesis falls on a mask pixel (>=1).
    pub in_mask_multiplier: f32,
    /// Outlier pruning applied to the raw hypotheses.
    pub pruning: PruneParams,
    /// Seed for the pair sampler used by [`HoughVoter::vote`](super::HoughVoter::vote).
    pub seed: u64,
}

impl Default for VotingParams {
    fn default() -> Self {
        Self {
            num_hypotheses: 51,
            in_mask_multiplier: 3.0,
            pruning: PruneParams::default(),
            seed: 0,
        }
    }
}

impl VotingParams {
    /// Range checks performed at the top of every voting call.
    pub fn validate(&self) -> Result<(), VotingError> {
        if self.num_hypotheses == 0 {
            return Err(VotingError::InvalidParams(
                "num_hypotheses must be at least 1".to_string(),
            ));
        }
        if !(self.in_mask_multiplier >= 1.0) || !self.in_mask_multiplier.is_finite() {
            return Err(VotingError::InvalidParams(format!(
                "in_mask_multiplier must be a finite value >= 1, got {}",
                self.in_mask_multiplier
            )));
        }
        self.pruning.validate()
    }
}

/// Outlier pruning configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneParams {
    pub method: PruneMethod,
    pub policy: OutlierPolicy,
}

impl Default for PruneParams {
    fn default() -> Self {
        Self {
            method: PruneMethod::Iqr { multiplier: 1.5 },
            policy: OutlierPolicy::Replace(ReplacementStyle::Median),
        }
    }
}

impl PruneParams {
    /// Pruning disabled.
    pub fn disabled() -> Self {
        Self {
            method: PruneMethod::None,
            policy: OutlierPolicy::Drop,
        }
    }

    pub fn validate(&self) -> Result<(), VotingError> {
        match self.method {
            PruneMethod::None => Ok(()),
            PruneMethod::ZScore { threshold } => {
                if threshold > 0.0 && threshold.is_finite() {
                    Ok(())
                } else {
                    Err(VotingError::InvalidParams(format!(
                        "z-score threshold must be a finite value > 0, got {threshold}"
                    )))
                }
            }
            PruneMethod::Iqr { multiplier } => {
                if multiplier >= 0.0 && multiplier.is_finite() {
                    Ok(())
                } else {
                    Err(VotingError::InvalidParams(format!(
                        "IQR multiplier must be a finite value >= 0, got {multiplier}"
                    )))
                }
            }
        }
    }
}

/// Statistical criterion used to flag outlier hypotheses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PruneMethod {
    None,
    /// `(value - mean) / std > threshold` on either axis.
    ZScore { threshold: f32 },
    /// Outside `[Q1 - m·IQR, Q3 + m·IQR]` on either axis.
    Iqr { multiplier: f32 },
}

impl PruneMethod {
    /// Canonical configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            PruneMethod::None => "none",
            PruneMethod::ZScore { .. } => "z-score",
            PruneMethod::Iqr { .. } => "iqr",
        }
    }
}

/// Method name as it appears in configuration files, before its parameter is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneMethodName {
    None,
    ZScore,
    Iqr,
}

impl PruneMethodName {
    pub fn with_params(self, zscore_threshold: f32, iqr_multiplier: f32) -> PruneMethod {
        match self {
            PruneMethodName::None => PruneMethod::None,
            PruneMethodName::ZScore => PruneMethod::ZScore {
                threshold: zscore_threshold,
            },
            PruneMethodName::Iqr => PruneMethod::Iqr {
                multiplier: iqr_multiplier,
            },
        }
    }
}

impl FromStr for PruneMethodName {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "null" | "" => Ok(PruneMethodName::None),
            "z-score" | "zscore" | "z_score" => Ok(PruneMethodName::ZScore),
            "iqr" => Ok(PruneMethodName::Iqr),
            _ => Err(VotingError::UnknownPruneMethod(s.to_string())),
        }
    }
}

/// What happens to a flagged hypothesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlierPolicy {
    /// Replace the hypothesis by NaN; its weight becomes 0.
    Drop,
    /// Overwrite the hypothesis with a statistic of the unpruned set.
    Replace(ReplacementStyle),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplacementStyle {
    Mean,
    Median,
}

impl FromStr for ReplacementStyle {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(ReplacementStyle::Mean),
            "median" => Ok(ReplacementStyle::Median),
            _ => Err(VotingError::UnknownReplacementStyle(s.to_string())),
        }
    }
}

impl fmt::Display for OutlierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierPolicy::Drop => write!(f, "drop"),
            OutlierPolicy::Replace(ReplacementStyle::Mean) => write!(f, "replace(mean)"),
            OutlierPolicy::Replace(ReplacementStyle::Median) => write!(f, "replace(median)"),
        }
    }
}
