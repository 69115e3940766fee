use crate::error::VotingError;
use crate::voting::{
    OutlierPolicy, PruneMethodName, PruneParams, ReplacementStyle, VotingParams,
};
use serde::{Deserialize, Deserializer};

/// Optional overrides of [`VotingParams`].
///
/// Keys are snake_case; the upper-case names used by the pose network's
/// training configuration are accepted as aliases.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    #[serde(alias = "HV_NUM_OF_HYPOTHESES")]
    pub num_hypotheses: Option<usize>,
    #[serde(alias = "HV_HYPOTHESIS_IN_MASK_MULTIPLIER")]
    pub in_mask_multiplier: Option<f32>,
    /// `"none"`, `"z-score"` or `"iqr"`. An explicit `null` disables
    /// pruning; an absent key keeps the default.
    #[serde(alias = "PRUN_METHOD", deserialize_with = "present")]
    pub prune_method: Option<Option<String>>,
    /// Drop outliers instead of replacing them.
    #[serde(alias = "PRUN_OUTLIER_DROP")]
    pub outlier_drop: Option<bool>,
    /// `"mean"` or `"median"`.
    #[serde(alias = "PRUN_OUTLIER_REPLACEMENT_STYLE")]
    pub replacement_style: Option<String>,
    #[serde(alias = "PRUN_ZSCORE_THRESHOLD")]
    pub zscore_threshold: Option<f32>,
    #[serde(alias = "IQR_MULTIPLIER")]
    pub iqr_multiplier: Option<f32>,
    pub seed: Option<u64>,
}

impl VotingConfig {
    /// Apply the overrides to the defaults and range-check the result.
    ///
    /// Unknown method or style names fail here, before any voting.
    pub fn resolve(&self) -> Result<VotingParams, VotingError> {
        let mut params = VotingParams::default();
        if let Some(v) = self.num_hypotheses {
            params.num_hypotheses = v;
        }
        if let Some(v) = self.in_mask_multiplier {
            params.in_mask_multiplier = v;
        }
        if let Some(v) = self.seed {
            params.seed = v;
        }
        params.pruning = self.resolve_pruning()?;
        params.validate()?;
        Ok(params)
    }

    fn resolve_pruning(&self) -> Result<PruneParams, VotingError> {
        let method_name = match &self.prune_method {
            Some(Some(name)) => name.parse::<PruneMethodName>()?,
            Some(None) => PruneMethodName::None,
            None => PruneMethodName::Iqr,
        };
        let style = match &self.replacement_style {
            Some(name) => name.parse::<ReplacementStyle>()?,
            None => ReplacementStyle::Median,
        };
        let method = method_name.with_params(
            self.zscore_threshold.unwrap_or(1.0),
            self.iqr_multiplier.unwrap_or(1.5),
        );
        let policy = if self.outlier_drop.unwrap_or(false) {
            OutlierPolicy::Drop
        } else {
            OutlierPolicy::Replace(style)
        };
        Ok(PruneParams { method, policy })
    }
}

/// Marks a key as present so `null` stays distinguishable from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::PruneMethod;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let cfg: VotingConfig = serde_json::from_str("{}").expect("parse");
        let params = cfg.resolve().expect("resolve");
        assert_eq!(params.num_hypotheses, 51);
        assert_eq!(params.in_mask_multiplier, 3.0);
        assert_eq!(params.pruning, PruneParams::default());
    }

    #[test]
    fn upper_case_aliases_are_accepted() {
        let cfg: VotingConfig = serde_json::from_str(
            r#"{
                "HV_NUM_OF_HYPOTHESES": 101,
                "HV_HYPOTHESIS_IN_MASK_MULTIPLIER": 2.0,
                "PRUN_METHOD": "z-score",
                "PRUN_OUTLIER_DROP": true,
                "PRUN_ZSCORE_THRESHOLD": 2.5
            }"#,
        )
        .expect("parse");
        let params = cfg.resolve().expect("resolve");
        assert_eq!(params.num_hypotheses, 101);
        assert_eq!(params.in_mask_multiplier, 2.0);
        assert_eq!(
            params.pruning.method,
            PruneMethod::ZScore { threshold: 2.5 }
        );
        assert_eq!(params.pruning.policy, OutlierPolicy::Drop);
    }

    #[test]
    fn null_prune_method_disables_pruning() {
        let cfg: VotingConfig =
            serde_json::from_str(r#"{ "PRUN_METHOD": null }"#).expect("parse");
        let params = cfg.resolve().expect("resolve");
        assert_eq!(params.pruning.method, PruneMethod::None);

        let cfg: VotingConfig = serde_json::from_str(r#"{ "prune_method": "null" }"#).expect("parse");
        assert_eq!(cfg.resolve().expect("resolve").pruning.method, PruneMethod::None);

        let cfg: VotingConfig = serde_json::from_str(r#"{ "IQR_MULTIPLIER": 2.0 }"#).expect("parse");
        assert_eq!(
            cfg.resolve().expect("resolve").pruning.method,
            PruneMethod::Iqr { multiplier: 2.0 }
        );
    }

    #[test]
    fn unknown_names_fail_fast() {
        let cfg = VotingConfig {
            prune_method: Some(Some("ransac".to_string())),
            ..Default::default()
        };
        assert_eq!(
            cfg.resolve().unwrap_err(),
            VotingError::UnknownPruneMethod("ransac".to_string())
        );

        // The style is checked even when outliers are dropped.
        let cfg = VotingConfig {
            outlier_drop: Some(true),
            replacement_style: Some("mode".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            cfg.resolve(),
            Err(VotingError::UnknownReplacementStyle(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cfg = VotingConfig {
            num_hypotheses: Some(0),
            ..Default::default()
        };
        assert!(matches!(cfg.resolve(), Err(VotingError::InvalidParams(_))));
    }
}
