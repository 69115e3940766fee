use crate::voting::{OutlierPolicy, PruneMethod};
use serde::Serialize;

/// Report of the outlier pruning stage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruningStage {
    pub elapsed_ms: f64,
    pub method: PruneMethod,
    pub policy: OutlierPolicy,
    /// Flagged hypotheses over the whole batch.
    pub flagged: usize,
    /// Flagged hypotheses per batch instance (0 for instances never voted).
    pub flagged_per_instance: Vec<usize>,
}
