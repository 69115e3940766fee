//! Voting pipeline driving hypothesis generation, pruning and weighting.
//!
//! The [`HoughVoter`] takes a batch of unit-vector fields and instance masks
//! and returns one `(row, col)` center per instance. Instances that cannot be
//! voted keep a zero row and a non-`Voted` status, so the output always has
//! the batch size of the input.
//!
//! Typical usage:
//! ```no_run
//! use hough_voting::{HoughVoter, VotingParams};
//! use hough_voting::field::{InstanceMask, UnitVectorField};
//!
//! # fn example(field: UnitVectorField, mask: InstanceMask) -> Result<(), hough_voting::VotingError> {
//! let mut voter = HoughVoter::new(VotingParams::default());
//! let centers = voter.vote(&field, &mask)?;
//! for (i, center) in centers.centers.iter().enumerate() {
//!     println!("instance {i}: {:?} ({:?})", center, centers.status[i]);
//! }
//! # Ok(())
//! # }
//! ```
use super::hypothesis::{generate_batch, generate_instance};
use super::params::VotingParams;
use super::points::Pixel;
use super::pruning::{PruneOutcome, Pruner};
use super::weights::{weigh_batch, weighted_center, VoteContext};
use super::workspace::VotingWorkspace;
use crate::diagnostics::pipeline::to_row_col;
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{
    InputDescriptor, InstanceTrace, PruningStage, TimingBreakdown, VotingReport, VotingTrace,
};
use crate::error::VotingError;
use crate::field::{InstanceMask, UnitVectorField};
use crate::types::{EstimatedCenters, InstanceStatus};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// One class worth of instances for [`HoughVoter::vote_classes`].
#[derive(Clone, Copy, Debug)]
pub struct ClassBatch<'a> {
    pub field: &'a UnitVectorField,
    pub mask: &'a InstanceMask,
}

/// Batched Hough voter for object centers.
pub struct HoughVoter {
    params: VotingParams,
    workspace: VotingWorkspace,
}

struct StageRun {
    centers: EstimatedCenters,
    prune: PruneOutcome,
    totals: Vec<f32>,
    timings: TimingBreakdown,
    pruning_ms: f64,
}

impl HoughVoter {
    /// Create a voter with the supplied parameters.
    pub fn new(params: VotingParams) -> Self {
        Self {
            params,
            workspace: VotingWorkspace::new(),
        }
    }

    pub fn params(&self) -> &VotingParams {
        &self.params
    }

    pub fn set_params(&mut self, params: VotingParams) {
        self.params = params;
    }

    /// Buffers of the most recent call.
    pub fn workspace(&self) -> &VotingWorkspace {
        &self.workspace
    }

    /// Vote with a sampler seeded from `params.seed`.
    pub fn vote(
        &mut self,
        field: &UnitVectorField,
        mask: &InstanceMask,
    ) -> Result<EstimatedCenters, VotingError> {
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        self.vote_with_rng(field, mask, &mut rng)
    }

    /// Vote drawing pixel pairs from the caller's random source.
    pub fn vote_with_rng<R: Rng + ?Sized>(
        &mut self,
        field: &UnitVectorField,
        mask: &InstanceMask,
        rng: &mut R,
    ) -> Result<EstimatedCenters, VotingError> {
        self.params.validate()?;
        check_shapes(field, mask)?;
        Ok(self.run(field, mask, rng, false).centers)
    }

    /// Vote and return a detailed per-stage, per-instance report.
    pub fn vote_with_diagnostics(
        &mut self,
        field: &UnitVectorField,
        mask: &InstanceMask,
    ) -> Result<VotingReport, VotingError> {
        self.params.validate()?;
        check_shapes(field, mask)?;
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let run = self.run(field, mask, &mut rng, true);
        let trace = self.build_trace(mask, &run);
        Ok(VotingReport {
            centers: run.centers,
            trace,
        })
    }

    /// Vote several class batches in order with one seeded random stream.
    ///
    /// Every batch is checked before any of them is voted.
    pub fn vote_classes(
        &mut self,
        batches: &[ClassBatch<'_>],
    ) -> Result<Vec<EstimatedCenters>, VotingError> {
        self.params.validate()?;
        for batch in batches {
            check_shapes(batch.field, batch.mask)?;
        }
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        Ok(batches
            .iter()
            .map(|batch| self.run(batch.field, batch.mask, &mut rng, false).centers)
            .collect())
    }

    /// Sequential single-instance vote.
    ///
    /// Consumes `rng` exactly like the batched path does for this instance,
    /// so voting the valid instances of a batch one by one with the same
    /// stream reproduces [`HoughVoter::vote_with_rng`]. `None` means no center
    /// could be determined.
    pub fn vote_instance<R: Rng + ?Sized>(
        &self,
        field: &UnitVectorField,
        mask: &InstanceMask,
        instance: usize,
        rng: &mut R,
    ) -> Result<Option<[f32; 2]>, VotingError> {
        self.params.validate()?;
        check_shapes(field, mask)?;
        if instance >= mask.instances() {
            return Err(VotingError::InstanceOutOfRange {
                instance,
                instances: mask.instances(),
            });
        }
        let points: Vec<Pixel> = mask
            .foreground(instance)
            .map(|(row, col)| Pixel { row, col })
            .collect();
        if points.len() < 2 {
            return Ok(None);
        }
        let mut generated =
            generate_instance(rng, field, instance, &points, self.params.num_hypotheses);
        let hypotheses = &mut generated.hypotheses;
        if hypotheses.iter().all(|h| !(h.x.is_finite() && h.y.is_finite())) {
            return Ok(None);
        }
        let mut flags = vec![false; hypotheses.len()];
        Pruner::new().prune_slot(hypotheses, &self.params.pruning, &mut flags);
        let ctx = VoteContext {
            field,
            mask,
            instance,
            points: &points,
            in_mask_multiplier: self.params.in_mask_multiplier,
        };
        let mut weights = vec![0.0; hypotheses.len()];
        ctx.weigh(hypotheses, &mut weights);
        Ok(weighted_center(hypotheses, &weights))
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        field: &UnitVectorField,
        mask: &InstanceMask,
        rng: &mut R,
        keep_raw: bool,
    ) -> StageRun {
        let instances = mask.instances();
        debug!(
            "HoughVoter::vote start instances={} h={} w={} k={}",
            instances,
            mask.height(),
            mask.width(),
            self.params.num_hypotheses
        );
        let total_start = Instant::now();
        let mut timings = TimingBreakdown::default();
        let params = &self.params;
        let ws = &mut self.workspace;

        let start = Instant::now();
        ws.points.rebuild(mask);
        timings.push("points", elapsed_ms(start));

        if ws.points.validity().is_empty() {
            debug!("HoughVoter::vote no instance has two mask pixels; returning zeros");
            ws.hypotheses.clear();
            ws.raw.clear();
            ws.weights.clear();
            timings.total_ms = elapsed_ms(total_start);
            return StageRun {
                centers: EstimatedCenters::zeros(instances, InstanceStatus::TooFewPoints),
                prune: PruneOutcome::default(),
                totals: Vec::new(),
                timings,
                pruning_ms: 0.0,
            };
        }

        let start = Instant::now();
        generate_batch(
            rng,
            &ws.points,
            field,
            params.num_hypotheses,
            &mut ws.pairs,
            &mut ws.hypotheses,
        );
        timings.push("hypotheses", elapsed_ms(start));

        if keep_raw {
            ws.raw.copy_from(&ws.hypotheses);
        } else {
            ws.raw.clear();
        }
        let slots = ws.points.num_slots();
        let undetermined: Vec<bool> = (0..slots)
            .map(|slot| ws.hypotheses.is_undetermined(slot))
            .collect();

        let start = Instant::now();
        let prune = ws.pruner.prune(&mut ws.hypotheses, &params.pruning);
        let pruning_ms = elapsed_ms(start);
        timings.push("pruning", pruning_ms);

        let start = Instant::now();
        let totals = weigh_batch(
            &ws.points,
            field,
            mask,
            &ws.hypotheses,
            params.in_mask_multiplier,
            &mut ws.weights,
        );
        timings.push("weighting", elapsed_ms(start));

        let mut slot_centers = Vec::with_capacity(slots);
        let mut slot_status = Vec::with_capacity(slots);
        for slot in 0..slots {
            let range = ws.hypotheses.range(slot);
            let center = weighted_center(ws.hypotheses.slot(slot), &ws.weights[range]);
            let status = if undetermined[slot] {
                InstanceStatus::NoFiniteHypotheses
            } else if center.is_none() {
                InstanceStatus::ZeroWeight
            } else {
                InstanceStatus::Voted
            };
            trace!(
                "instance {}: {:?} hypotheses={} flagged={} center={:?}",
                ws.points.instance_of(slot),
                status,
                ws.hypotheses.slot(slot).len(),
                prune.flagged_per_slot.get(slot).copied().unwrap_or(0),
                center
            );
            slot_centers.push(center.unwrap_or([0.0; 2]));
            slot_status.push(status);
        }

        let validity = ws.points.validity();
        let centers = EstimatedCenters {
            centers: validity.expand(&slot_centers, [0.0; 2]),
            status: validity.expand(&slot_status, InstanceStatus::TooFewPoints),
        };
        timings.total_ms = elapsed_ms(total_start);
        debug!(
            "HoughVoter::vote done voted={}/{} flagged={} total_ms={:.3}",
            centers.determined(),
            instances,
            prune.total_flagged(),
            timings.total_ms
        );
        StageRun {
            centers,
            prune,
            totals,
            timings,
            pruning_ms,
        }
    }

    fn build_trace(&self, mask: &InstanceMask, run: &StageRun) -> VotingTrace {
        let ws = &self.workspace;
        let points = &ws.points;
        let mut slot_of = vec![None; mask.instances()];
        for (slot, &instance) in points.validity().indices().iter().enumerate() {
            slot_of[instance] = Some(slot);
        }
        let stats = ws.pairs.stats();

        let instances = (0..mask.instances())
            .map(|instance| {
                let mask_pixels = points.mask_counts()[instance];
                let Some(slot) = slot_of[instance] else {
                    return InstanceTrace::skipped(instance, mask_pixels);
                };
                let range = ws.hypotheses.range(slot);
                InstanceTrace {
                    instance,
                    status: run.centers.status[instance],
                    mask_pixels,
                    sampled_pairs: stats[slot].sampled,
                    dropped_nan_pairs: stats[slot].dropped_nan,
                    raw_hypotheses: to_row_col(ws.raw.slot(slot)),
                    hypotheses: to_row_col(ws.hypotheses.slot(slot)),
                    outliers: run.prune.flags[range.clone()].to_vec(),
                    weights: ws.weights[range].to_vec(),
                    total_score: run.totals[slot],
                    center: run.centers.get(instance),
                }
            })
            .collect();

        let pruning = if points.validity().is_empty() {
            None
        } else {
            Some(PruningStage {
                elapsed_ms: run.pruning_ms,
                method: self.params.pruning.method,
                policy: self.params.pruning.policy,
                flagged: run.prune.total_flagged(),
                flagged_per_instance: points.validity().expand(&run.prune.flagged_per_slot, 0),
            })
        };

        VotingTrace {
            input: InputDescriptor {
                instances: mask.instances(),
                height: mask.height(),
                width: mask.width(),
                valid_instances: points.num_slots(),
                num_hypotheses: self.params.num_hypotheses,
                in_mask_multiplier: self.params.in_mask_multiplier,
                seed: self.params.seed,
            },
            timings: run.timings.clone(),
            pruning,
            instances,
        }
    }
}

/// Field and mask must agree on `(instances, H, W)`.
fn check_shapes(field: &UnitVectorField, mask: &InstanceMask) -> Result<(), VotingError> {
    if field.instances() != mask.instances()
        || field.height() != mask.height()
        || field.width() != mask.width()
    {
        return Err(VotingError::ShapeMismatch {
            field_instances: field.instances(),
            field_height: field.height(),
            field_width: field.width(),
            mask_instances: mask.instances(),
            mask_height: mask.height(),
            mask_width: mask.width(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::synthetic::{fill_toward_center, fill_undefined};
    use crate::voting::params::{OutlierPolicy, PruneMethod, PruneParams};
    use approx::assert_abs_diff_eq;

    fn two_squares() -> (UnitVectorField, InstanceMask) {
        let mut mask = InstanceMask::new(3, 20, 20);
        mask.fill_rect(0, 2, 10, 3, 11);
        mask.set(1, 15, 15, true);
        mask.fill_rect(2, 11, 19, 10, 18);
        let mut field = UnitVectorField::new(3, 20, 20);
        fill_toward_center(&mut field, 0, [6.3, 7.2]);
        fill_toward_center(&mut field, 2, [14.6, 13.7]);
        (field, mask)
    }

    #[test]
    fn votes_centers_and_keeps_batch_shape() {
        let (field, mask) = two_squares();
        let mut voter = HoughVoter::new(VotingParams::default());
        let out = voter.vote(&field, &mask).expect("vote");
        assert_eq!(out.len(), 3);
        assert_eq!(out.centers[1], [0.0, 0.0]);
        assert_eq!(out.status[1], InstanceStatus::TooFewPoints);
        assert_abs_diff_eq!(out.centers[0][0], 6.3, epsilon = 1e-2);
        assert_abs_diff_eq!(out.centers[0][1], 7.2, epsilon = 1e-2);
        assert_abs_diff_eq!(out.centers[2][0], 14.6, epsilon = 1e-2);
        assert_abs_diff_eq!(out.centers[2][1], 13.7, epsilon = 1e-2);
    }

    #[test]
    fn weights_sum_to_one_per_slot() {
        let (field, mask) = two_squares();
        let mut voter = HoughVoter::new(VotingParams::default());
        voter.vote(&field, &mask).expect("vote");
        let ws = voter.workspace();
        for slot in 0..ws.hypotheses().num_slots() {
            let sum: f32 = ws.weights()[ws.hypotheses().range(slot)].iter().sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn sequential_instances_match_batch() {
        let (field, mask) = two_squares();
        let params = VotingParams {
            num_hypotheses: 15,
            pruning: PruneParams {
                method: PruneMethod::ZScore { threshold: 1.0 },
                policy: OutlierPolicy::Drop,
            },
            ..Default::default()
        };
        let mut voter = HoughVoter::new(params);
        let batched = voter
            .vote_with_rng(&field, &mask, &mut StdRng::seed_from_u64(21))
            .expect("vote");

        let mut rng = StdRng::seed_from_u64(21);
        for instance in 0..mask.instances() {
            let center = voter
                .vote_instance(&field, &mask, instance, &mut rng)
                .expect("vote_instance");
            assert_eq!(center, batched.get(instance), "instance {instance}");
        }
    }

    #[test]
    fn empty_batch_short_circuits_to_zeros() {
        let field = UnitVectorField::new(2, 5, 5);
        let mask = InstanceMask::new(2, 5, 5);
        let mut voter = HoughVoter::new(VotingParams::default());
        let report = voter.vote_with_diagnostics(&field, &mask).expect("vote");
        assert_eq!(report.centers.centers, vec![[0.0; 2]; 2]);
        assert!(report.trace.pruning.is_none());
        assert!(report.trace.timings.stage_ms("points").is_some());
        assert!(report.trace.timings.stage_ms("weighting").is_none());
        assert_eq!(report.trace.instances.len(), 2);
    }

    #[test]
    fn undefined_directions_isolate_one_instance() {
        let (mut field, mask) = two_squares();
        fill_undefined(&mut field, 0);
        let mut voter = HoughVoter::new(VotingParams::default());
        let report = voter.vote_with_diagnostics(&field, &mask).expect("vote");
        assert_eq!(report.centers.centers[0], [0.0, 0.0]);
        assert_eq!(
            report.centers.status[0],
            InstanceStatus::NoFiniteHypotheses
        );
        assert_eq!(report.centers.status[2], InstanceStatus::Voted);
        let trace0 = &report.trace.instances[0];
        assert_eq!(trace0.raw_hypotheses.len(), 1);
        assert!(trace0.raw_hypotheses[0][0].is_nan());
        assert_eq!(trace0.dropped_nan_pairs, trace0.sampled_pairs);
    }

    #[test]
    fn shape_and_range_errors_are_reported() {
        let field = UnitVectorField::new(2, 5, 5);
        let mask = InstanceMask::new(2, 5, 6);
        let mut voter = HoughVoter::new(VotingParams::default());
        assert!(matches!(
            voter.vote(&field, &mask),
            Err(VotingError::ShapeMismatch { .. })
        ));

        let mask = InstanceMask::new(2, 5, 5);
        let err = voter
            .vote_instance(&field, &mask, 2, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(
            err,
            VotingError::InstanceOutOfRange {
                instance: 2,
                instances: 2
            }
        );
    }
}
