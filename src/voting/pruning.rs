//! Statistical pruning of outlier hypotheses.
//!
//! Each slot is pruned independently with per-axis statistics computed over
//! its finite hypotheses only; NaN entries (undetermined slots, or dropped
//! outliers) are never flagged and never replaced. A hypothesis is an outlier
//! when either of its axes is.
//!
//! Medians are lower medians: for an even count the smaller of the two
//! middle values is used, for Q1/Q3 as well as for the replacement value.
use super::hypothesis::HypothesisSet;
use super::params::{OutlierPolicy, PruneMethod, PruneParams, ReplacementStyle};
use nalgebra::Point2;

/// Result of pruning one batch.
#[derive(Clone, Debug, Default)]
pub struct PruneOutcome {
    /// One flag per hypothesis, aligned with the flat hypothesis buffer.
    pub flags: Vec<bool>,
    /// Number of flagged hypotheses per slot.
    pub flagged_per_slot: Vec<usize>,
}

impl PruneOutcome {
    pub fn total_flagged(&self) -> usize {
        self.flagged_per_slot.iter().sum()
    }
}

/// Reusable pruning scratch space.
#[derive(Clone, Debug, Default)]
pub struct Pruner {
    axis_buf: Vec<f32>,
}

impl Pruner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag and handle outliers in every slot of `set`, in place.
    pub fn prune(&mut self, set: &mut HypothesisSet, params: &PruneParams) -> PruneOutcome {
        let mut outcome = PruneOutcome {
            flags: vec![false; set.len()],
            flagged_per_slot: Vec::with_capacity(set.num_slots()),
        };
        if params.method == PruneMethod::None {
            outcome.flagged_per_slot.resize(set.num_slots(), 0);
            return outcome;
        }
        for slot in 0..set.num_slots() {
            let range = set.range(slot);
            let flags = &mut outcome.flags[range];
            let flagged = self.prune_slot(set.slot_mut(slot), params, flags);
            outcome.flagged_per_slot.push(flagged);
        }
        outcome
    }

    /// Prune one slot; `flags` must have the slot's length.
    pub fn prune_slot(
        &mut self,
        hypotheses: &mut [Point2<f32>],
        params: &PruneParams,
        flags: &mut [bool],
    ) -> usize {
        debug_assert_eq!(hypotheses.len(), flags.len());
        match params.method {
            PruneMethod::None => return 0,
            PruneMethod::ZScore { threshold } => {
                self.flag_zscore(hypotheses, threshold, flags);
            }
            PruneMethod::Iqr { multiplier } => {
                self.flag_iqr(hypotheses, multiplier, flags);
            }
        }
        let flagged = flags.iter().filter(|&&f| f).count();
        if flagged == 0 {
            return 0;
        }
        match params.policy {
            OutlierPolicy::Drop => {
                for (h, &flag) in hypotheses.iter_mut().zip(flags.iter()) {
                    if flag {
                        *h = Point2::new(f32::NAN, f32::NAN);
                    }
                }
            }
            OutlierPolicy::Replace(style) => {
                // Statistics come from the unpruned set.
                let replacement = Point2::new(
                    self.axis_statistic(hypotheses, 0, style),
                    self.axis_statistic(hypotheses, 1, style),
                );
                for (h, &flag) in hypotheses.iter_mut().zip(flags.iter()) {
                    if flag {
                        *h = replacement;
                    }
                }
            }
        }
        flagged
    }

    fn flag_zscore(&mut self, hypotheses: &[Point2<f32>], threshold: f32, flags: &mut [bool]) {
        for axis in 0..2 {
            self.collect_axis(hypotheses, axis);
            let Some((mean, std)) = mean_std(&self.axis_buf) else {
                continue;
            };
            for (h, flag) in hypotheses.iter().zip(flags.iter_mut()) {
                let z = (h[axis] - mean) / std;
                if z > threshold {
                    *flag = true;
                }
            }
        }
    }

    fn flag_iqr(&mut self, hypotheses: &[Point2<f32>], multiplier: f32, flags: &mut [bool]) {
        for axis in 0..2 {
            self.collect_axis(hypotheses, axis);
            self.axis_buf.sort_by(f32::total_cmp);
            let Some((q1, q3)) = quartiles(&self.axis_buf) else {
                continue;
            };
            let iqr = q3 - q1;
            let low = q1 - multiplier * iqr;
            let high = q3 + multiplier * iqr;
            for (h, flag) in hypotheses.iter().zip(flags.iter_mut()) {
                let v = h[axis];
                if v < low || v > high {
                    *flag = true;
                }
            }
        }
    }

    fn axis_statistic(
        &mut self,
        hypotheses: &[Point2<f32>],
        axis: usize,
        style: ReplacementStyle,
    ) -> f32 {
        self.collect_axis(hypotheses, axis);
        match style {
            ReplacementStyle::Mean => mean(&self.axis_buf).unwrap_or(f32::NAN),
            ReplacementStyle::Median => {
                self.axis_buf.sort_by(f32::total_cmp);
                lower_median(&self.axis_buf).unwrap_or(f32::NAN)
            }
        }
    }

    fn collect_axis(&mut self, hypotheses: &[Point2<f32>], axis: usize) {
        self.axis_buf.clear();
        self.axis_buf.extend(
            hypotheses
                .iter()
                .filter(|h| h.x.is_finite() && h.y.is_finite())
                .map(|h| h[axis]),
        );
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f32>() / values.len() as f32)
}

/// Mean and unbiased (n−1) standard deviation; `None` below two samples.
fn mean_std(values: &[f32]) -> Option<(f32, f32)> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f32 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((m, (ss / (values.len() - 1) as f32).sqrt()))
}

/// Lower median of an ascending slice.
pub fn lower_median(sorted: &[f32]) -> Option<f32> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[(sorted.len() - 1) / 2])
}

/// Q1 = median of values ≤ Q2, Q3 = median of values ≥ Q2 (ascending input).
pub fn quartiles(sorted: &[f32]) -> Option<(f32, f32)> {
    let q2 = lower_median(sorted)?;
    let lower_end = sorted.partition_point(|&v| v <= q2);
    let upper_start = sorted.partition_point(|&v| v < q2);
    let q1 = lower_median(&sorted[..lower_end])?;
    let q3 = lower_median(&sorted[upper_start..])?;
    Some((q1, q3))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<Point2<f32>> {
        let mut pts: Vec<Point2<f32>> = (0..10)
            .map(|i| Point2::new(10.0 + 0.1 * i as f32, 20.0 - 0.1 * i as f32))
            .collect();
        pts.push(Point2::new(500.0, 20.0));
        pts
    }

    fn iqr(policy: OutlierPolicy) -> PruneParams {
        PruneParams {
            method: PruneMethod::Iqr { multiplier: 1.5 },
            policy,
        }
    }

    #[test]
    fn quartiles_use_lower_medians() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(lower_median(&sorted), Some(4.0));
        assert_eq!(quartiles(&sorted), Some((2.0, 5.0)));

        let even = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(lower_median(&even), Some(2.0));
        // lower half {1, 2} -> 1, upper half {2, 3, 4} -> 3
        assert_eq!(quartiles(&even), Some((1.0, 3.0)));
        assert_eq!(quartiles(&[]), None);
    }

    #[test]
    fn iqr_replace_overwrites_outlier_with_median() {
        let mut pts = cluster_with_outlier();
        let mut flags = vec![false; pts.len()];
        let flagged = Pruner::new().prune_slot(
            &mut pts,
            &iqr(OutlierPolicy::Replace(ReplacementStyle::Median)),
            &mut flags,
        );
        assert_eq!(flagged, 1);
        assert!(flags[10]);
        assert!(flags[..10].iter().all(|f| !f));
        // x values sorted: 10.0..10.9, 500 -> lower median index 5 -> 10.5
        // y values sorted: 19.1..20.0, 20.0 -> index 5 -> 19.6
        assert!((pts[10].x - 10.5).abs() < 1e-5, "x={}", pts[10].x);
        assert!((pts[10].y - 19.6).abs() < 1e-5, "y={}", pts[10].y);
    }

    #[test]
    fn iqr_drop_marks_outlier_nan() {
        let mut pts = cluster_with_outlier();
        let mut flags = vec![false; pts.len()];
        Pruner::new().prune_slot(&mut pts, &iqr(OutlierPolicy::Drop), &mut flags);
        assert!(pts[10].x.is_nan() && pts[10].y.is_nan());
        assert!(pts[..10].iter().all(|p| p.x.is_finite()));
    }

    #[test]
    fn mean_replacement_uses_unpruned_set() {
        let mut pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
        ];
        let mut flags = vec![false; pts.len()];
        let params = PruneParams {
            method: PruneMethod::Iqr { multiplier: 1.5 },
            policy: OutlierPolicy::Replace(ReplacementStyle::Mean),
        };
        Pruner::new().prune_slot(&mut pts, &params, &mut flags);
        assert_eq!(pts[4], Point2::new(20.0, 0.0));
    }

    #[test]
    fn zscore_is_one_sided_and_per_axis() {
        let mut pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.5, 30.0),
            Point2::new(-30.0, 0.5),
        ];
        let mut flags = vec![false; pts.len()];
        let params = PruneParams {
            method: PruneMethod::ZScore { threshold: 1.5 },
            policy: OutlierPolicy::Drop,
        };
        let flagged = Pruner::new().prune_slot(&mut pts, &params, &mut flags);
        // Only the large positive deviation crosses the one-sided threshold.
        assert_eq!(flags, vec![false, false, false, false, true, false]);
        assert_eq!(flagged, 1);
    }

    #[test]
    fn nan_hypotheses_are_left_alone() {
        let mut set = HypothesisSet::new();
        set.clear();
        set.push_slot(std::iter::empty());
        set.push_slot(cluster_with_outlier());
        let outcome = Pruner::new().prune(
            &mut set,
            &iqr(OutlierPolicy::Replace(ReplacementStyle::Median)),
        );
        assert_eq!(outcome.flagged_per_slot, vec![0, 1]);
        assert_eq!(outcome.total_flagged(), 1);
        assert!(set.slot(0)[0].x.is_nan());
        assert!(outcome.flags[set.range(1)][10]);
    }

    #[test]
    fn disabled_pruning_keeps_everything() {
        let mut set = HypothesisSet::new();
        set.push_slot(cluster_with_outlier());
        let before = set.as_slice().to_vec();
        let outcome = Pruner::new().prune(&mut set, &PruneParams::disabled());
        assert_eq!(outcome.total_flagged(), 0);
        assert_eq!(set.as_slice(), before.as_slice());
    }
}
