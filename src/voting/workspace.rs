//! Reusable buffers for the voting stages.
//!
//! A [`HoughVoter`](super::HoughVoter) owns one workspace and rebuilds it on
//! every call, so repeated batches of similar size stop allocating after the
//! first one.
use super::hypothesis::{HypothesisSet, PairArena};
use super::points::PointArena;
use super::pruning::Pruner;

#[derive(Clone, Debug, Default)]
pub struct VotingWorkspace {
    pub(crate) points: PointArena,
    pub(crate) pairs: PairArena,
    pub(crate) hypotheses: HypothesisSet,
    /// Copy of the hypotheses before pruning; only filled for diagnostics.
    pub(crate) raw: HypothesisSet,
    pub(crate) weights: Vec<f32>,
    pub(crate) pruner: Pruner,
}

impl VotingWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Foreground pixels of the last batch.
    pub fn points(&self) -> &PointArena {
        &self.points
    }

    /// Hypotheses of the last batch after pruning.
    pub fn hypotheses(&self) -> &HypothesisSet {
        &self.hypotheses
    }

    /// Normalized weights of the last batch, aligned with [`Self::hypotheses`].
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}
