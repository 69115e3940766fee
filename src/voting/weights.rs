//! Consensus weighting of hypotheses.
//!
//! A hypothesis `h` collects one vote from every mask pixel `p` whose
//! predicted direction points toward it, `normalize(h − p) · U[p] > 0`, and
//! its count is multiplied when `h` itself lands on the instance mask.
//! Non-finite hypotheses weigh 0. Weights are normalized per slot, so each
//! slot's weights sum to 1, or are all 0 when nothing voted.
use super::hypothesis::HypothesisSet;
use super::points::{Pixel, PointArena};
use crate::field::{InstanceMask, UnitVectorField};
use nalgebra::{Point2, Vector2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Inputs shared by every hypothesis of one instance.
#[derive(Clone, Copy)]
pub struct VoteContext<'a> {
    pub field: &'a UnitVectorField,
    pub mask: &'a InstanceMask,
    pub instance: usize,
    pub points: &'a [Pixel],
    pub in_mask_multiplier: f32,
}

impl VoteContext<'_> {
    /// Un-normalized consensus score of `h`.
    pub fn score(&self, h: Point2<f32>) -> f32 {
        if !(h.x.is_finite() && h.y.is_finite()) {
            return 0.0;
        }
        let votes = self
            .points
            .iter()
            .filter(|p| {
                let dir = self.field.direction(self.instance, p.row, p.col);
                (h - p.to_point())
                    .try_normalize(0.0)
                    .map_or(false, |to_h| to_h.dot(&dir) > 0.0)
            })
            .count() as f32;
        // Integer casts truncate toward zero.
        if self.mask.contains(self.instance, h.y as i64, h.x as i64) {
            votes * self.in_mask_multiplier
        } else {
            votes
        }
    }

    /// Normalized weights of one slot written into `out`; returns the raw total.
    pub fn weigh(&self, hypotheses: &[Point2<f32>], out: &mut [f32]) -> f32 {
        debug_assert_eq!(hypotheses.len(), out.len());
        for (w, &h) in out.iter_mut().zip(hypotheses) {
            let s = self.score(h);
            *w = if s.is_finite() { s } else { 0.0 };
        }
        normalize_in_place(out)
    }
}

/// Scale `weights` to sum 1; an all-zero slice stays zero. Returns the raw sum.
pub fn normalize_in_place(weights: &mut [f32]) -> f32 {
    let total: f32 = weights.iter().sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w /= total;
        }
    } else {
        weights.iter_mut().for_each(|w| *w = 0.0);
    }
    total
}

/// Weighted mean of the finite hypotheses, in `(row, col)` order.
///
/// `None` when the weights carry no mass.
pub fn weighted_center(hypotheses: &[Point2<f32>], weights: &[f32]) -> Option<[f32; 2]> {
    let mut acc = Vector2::<f32>::zeros();
    let mut mass = 0.0f32;
    for (h, &w) in hypotheses.iter().zip(weights) {
        if w > 0.0 && h.x.is_finite() && h.y.is_finite() {
            acc += h.coords * w;
            mass += w;
        }
    }
    if mass > 0.0 {
        Some([acc.y, acc.x])
    } else {
        None
    }
}

/// Weights for every slot of `hypotheses`, flat and aligned with it.
///
/// Returns the raw (pre-normalization) total per slot.
pub fn weigh_batch(
    points: &PointArena,
    field: &UnitVectorField,
    mask: &InstanceMask,
    hypotheses: &HypothesisSet,
    in_mask_multiplier: f32,
    weights: &mut Vec<f32>,
) -> Vec<f32> {
    let weigh_slot = |slot: usize| -> (Vec<f32>, f32) {
        let ctx = VoteContext {
            field,
            mask,
            instance: points.instance_of(slot),
            points: points.slot(slot),
            in_mask_multiplier,
        };
        let hyps = hypotheses.slot(slot);
        let mut w = vec![0.0; hyps.len()];
        let total = ctx.weigh(hyps, &mut w);
        (w, total)
    };

    #[cfg(feature = "parallel")]
    let per_slot: Vec<(Vec<f32>, f32)> = (0..hypotheses.num_slots())
        .into_par_iter()
        .map(weigh_slot)
        .collect();
    #[cfg(not(feature = "parallel"))]
    let per_slot: Vec<(Vec<f32>, f32)> = (0..hypotheses.num_slots()).map(weigh_slot).collect();

    weights.clear();
    let mut totals = Vec::with_capacity(per_slot.len());
    for (w, total) in per_slot {
        weights.extend_from_slice(&w);
        totals.push(total);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::synthetic::fill_toward_center;
    use approx::assert_abs_diff_eq;

    fn square_instance() -> (UnitVectorField, InstanceMask, Vec<Pixel>) {
        let mut mask = InstanceMask::new(1, 10, 10);
        mask.fill_rect(0, 2, 8, 2, 8);
        let mut field = UnitVectorField::new(1, 10, 10);
        fill_toward_center(&mut field, 0, [4.5, 4.5]);
        let points = mask
            .foreground(0)
            .map(|(row, col)| Pixel { row, col })
            .collect();
        (field, mask, points)
    }

    #[test]
    fn true_center_outscores_far_hypothesis() {
        let (field, mask, points) = square_instance();
        let ctx = VoteContext {
            field: &field,
            mask: &mask,
            instance: 0,
            points: &points,
            in_mask_multiplier: 3.0,
        };
        // Every pixel points at (4.5, 4.5), and the center is on the mask.
        assert_eq!(ctx.score(Point2::new(4.5, 4.5)), 36.0 * 3.0);
        let far = ctx.score(Point2::new(40.0, 4.5));
        assert!(far < 36.0, "far={far}");
        assert_eq!(ctx.score(Point2::new(f32::NAN, 1.0)), 0.0);
    }

    #[test]
    fn in_mask_test_truncates_toward_zero() {
        let mut mask = InstanceMask::new(1, 4, 4);
        mask.set(0, 0, 0, true);
        let mut field = UnitVectorField::new(1, 4, 4);
        let d = std::f32::consts::FRAC_1_SQRT_2;
        field.set(0, 3, 3, [-d, -d]);
        let ctx = VoteContext {
            field: &field,
            mask: &mask,
            instance: 0,
            points: &[Pixel { row: 3, col: 3 }],
            in_mask_multiplier: 2.0,
        };
        // (-0.7, -0.2) truncates onto pixel (0, 0); (-1.2, 0.0) does not.
        assert_eq!(ctx.score(Point2::new(-0.7, -0.2)), 2.0);
        assert_eq!(ctx.score(Point2::new(-1.2, 0.0)), 1.0);
    }

    #[test]
    fn weights_sum_to_one_or_zero() {
        let (field, mask, points) = square_instance();
        let ctx = VoteContext {
            field: &field,
            mask: &mask,
            instance: 0,
            points: &points,
            in_mask_multiplier: 3.0,
        };
        let hyps = [
            Point2::new(4.5, 4.5),
            Point2::new(5.0, 4.0),
            Point2::new(f32::NAN, f32::NAN),
        ];
        let mut w = [0.0; 3];
        let total = ctx.weigh(&hyps, &mut w);
        assert!(total > 0.0);
        assert_abs_diff_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_eq!(w[2], 0.0);

        let nan = [Point2::new(f32::NAN, f32::NAN)];
        let mut w = [1.0];
        assert_eq!(ctx.weigh(&nan, &mut w), 0.0);
        assert_eq!(w, [0.0]);
    }

    #[test]
    fn weighted_center_reorders_to_row_col() {
        let hyps = [Point2::new(2.0, 8.0), Point2::new(4.0, 6.0)];
        let center = weighted_center(&hyps, &[0.5, 0.5]).expect("mass");
        assert_abs_diff_eq!(center[0], 7.0, epsilon = 1e-6);
        assert_abs_diff_eq!(center[1], 3.0, epsilon = 1e-6);
        assert_eq!(weighted_center(&hyps, &[0.0, 0.0]), None);
    }
}
