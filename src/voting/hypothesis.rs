//! Ray-intersection hypotheses from sampled pixel pairs.
//!
//! For a pair `(p, q)` with predicted directions `u_p`, `u_q` the rays
//! `p + s·u_p` and `q + t·u_q` meet where
//!
//! ```text
//! [u_p  −u_q] · [s t]ᵀ = q − p
//! ```
//!
//! The 2×2 system is solved with an SVD pseudo-inverse so that parallel or
//! nearly parallel rays produce the least-squares, minimum-norm answer rather
//! than a failure. The hypothesis is `p + s·u_p`.
//!
//! The batched path concatenates every valid instance's systems into one
//! [`PairArena`] and solves them in a single (optionally rayon-parallel) pass;
//! [`generate_instance`] is the sequential one-instance equivalent and draws
//! the same random stream.
use super::points::{Pixel, PointArena};
use super::sampling::sample_pairs;
use crate::field::UnitVectorField;
use log::{trace, warn};
use nalgebra::{Matrix2, Point2, Vector2};
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Relative cutoff below which singular values are treated as zero.
const PINV_RCOND: f32 = 1e-6;

/// Linear system for one sampled pixel pair.
#[derive(Clone, Copy, Debug)]
pub struct PairSystem {
    pub p: Point2<f32>,
    pub q: Point2<f32>,
    pub dir_p: Vector2<f32>,
    pub dir_q: Vector2<f32>,
}

impl PairSystem {
    fn new(field: &UnitVectorField, instance: usize, p: Pixel, q: Pixel) -> Self {
        Self {
            p: p.to_point(),
            q: q.to_point(),
            dir_p: field.direction(instance, p.row, p.col),
            dir_q: field.direction(instance, q.row, q.col),
        }
    }

    #[inline]
    fn has_nan(&self) -> bool {
        self.dir_p.iter().chain(self.dir_q.iter()).any(|v| v.is_nan())
    }

    #[inline]
    fn matrix(&self) -> Matrix2<f32> {
        Matrix2::from_columns(&[self.dir_p, -self.dir_q])
    }

    #[inline]
    fn rhs(&self) -> Vector2<f32> {
        self.q - self.p
    }
}

/// Solve one pair system; `None` only if the SVD itself fails.
pub fn solve_pair(system: &PairSystem) -> Option<Point2<f32>> {
    let svd = system.matrix().svd(true, true);
    let sigma_max = svd.singular_values.max();
    let pinv = svd.pseudo_inverse(PINV_RCOND * sigma_max).ok()?;
    let x = pinv * system.rhs();
    Some(system.p + system.dir_p * x[0])
}

/// Sample pairs for one instance and append its NaN-free systems.
///
/// Returns `(sampled, kept)`.
fn push_instance_systems<R: Rng + ?Sized>(
    rng: &mut R,
    field: &UnitVectorField,
    instance: usize,
    points: &[Pixel],
    max_pairs: usize,
    pair_buf: &mut Vec<(usize, usize)>,
    systems: &mut Vec<PairSystem>,
) -> (usize, usize) {
    pair_buf.clear();
    let sampled = sample_pairs(rng, points.len(), max_pairs, pair_buf);
    let before = systems.len();
    systems.extend(
        pair_buf
            .iter()
            .map(|&(i, j)| PairSystem::new(field, instance, points[i], points[j]))
            .filter(|system| !system.has_nan()),
    );
    (sampled, systems.len() - before)
}

/// Hypotheses of every valid slot, stored flat with an offset table.
///
/// A slot with no finite pair holds exactly one NaN hypothesis.
#[derive(Clone, Debug, Default)]
pub struct HypothesisSet {
    points: Vec<Point2<f32>>,
    offsets: Vec<usize>,
}

impl HypothesisSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.offsets.clear();
        self.offsets.push(0);
    }

    /// Append one slot; an empty iterator records the NaN marker.
    pub fn push_slot<I: IntoIterator<Item = Point2<f32>>>(&mut self, hypotheses: I) {
        if self.offsets.is_empty() {
            self.offsets.push(0);
        }
        let start = self.points.len();
        self.points.extend(hypotheses);
        if self.points.len() == start {
            self.points.push(Point2::new(f32::NAN, f32::NAN));
        }
        self.offsets.push(self.points.len());
    }

    pub fn num_slots(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn slot(&self, slot: usize) -> &[Point2<f32>] {
        &self.points[self.offsets[slot]..self.offsets[slot + 1]]
    }

    pub fn slot_mut(&mut self, slot: usize) -> &mut [Point2<f32>] {
        &mut self.points[self.offsets[slot]..self.offsets[slot + 1]]
    }

    /// Slot boundaries in the flat buffer.
    pub fn range(&self, slot: usize) -> std::ops::Range<usize> {
        self.offsets[slot]..self.offsets[slot + 1]
    }

    /// Every hypothesis of every slot.
    pub fn as_slice(&self) -> &[Point2<f32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the slot carries no finite hypothesis.
    pub fn is_undetermined(&self, slot: usize) -> bool {
        self.slot(slot)
            .iter()
            .all(|h| !(h.x.is_finite() && h.y.is_finite()))
    }

    /// Overwrite `self` with `other`, reusing allocations.
    pub fn copy_from(&mut self, other: &HypothesisSet) {
        self.points.clear();
        self.points.extend_from_slice(&other.points);
        self.offsets.clear();
        self.offsets.extend_from_slice(&other.offsets);
    }
}

/// Per-slot bookkeeping from the sampling step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplingStats {
    /// Pairs drawn from the point set.
    pub sampled: usize,
    /// Pairs discarded because a direction was NaN.
    pub dropped_nan: usize,
}

/// Flat buffer of every valid slot's pair systems.
#[derive(Clone, Debug, Default)]
pub struct PairArena {
    systems: Vec<PairSystem>,
    offsets: Vec<usize>,
    stats: Vec<SamplingStats>,
    solutions: Vec<Option<Point2<f32>>>,
    pair_buf: Vec<(usize, usize)>,
}

impl PairArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample pairs for every valid slot, in slot order, from `rng`.
    pub fn rebuild<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        points: &PointArena,
        field: &UnitVectorField,
        max_pairs: usize,
    ) {
        self.systems.clear();
        self.offsets.clear();
        self.offsets.push(0);
        self.stats.clear();
        for slot in 0..points.num_slots() {
            let (sampled, kept) = push_instance_systems(
                rng,
                field,
                points.instance_of(slot),
                points.slot(slot),
                max_pairs,
                &mut self.pair_buf,
                &mut self.systems,
            );
            self.offsets.push(self.systems.len());
            self.stats.push(SamplingStats {
                sampled,
                dropped_nan: sampled - kept,
            });
        }
    }

    /// Solve every stored system in one pass.
    pub fn solve(&mut self) {
        #[cfg(feature = "parallel")]
        self.systems
            .par_iter()
            .map(solve_pair)
            .collect_into_vec(&mut self.solutions);
        #[cfg(not(feature = "parallel"))]
        {
            self.solutions.clear();
            self.solutions.extend(self.systems.iter().map(solve_pair));
        }
    }

    /// Split solved systems back into per-slot hypothesis sets.
    pub fn write_hypotheses(&self, out: &mut HypothesisSet) {
        out.clear();
        for slot in 0..self.stats.len() {
            let range = self.offsets[slot]..self.offsets[slot + 1];
            out.push_slot(self.solutions[range].iter().flatten().copied());
        }
    }

    pub fn stats(&self) -> &[SamplingStats] {
        &self.stats
    }

    /// Total number of systems in the arena.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

/// Batched generation for every valid slot of `points`.
pub fn generate_batch<R: Rng + ?Sized>(
    rng: &mut R,
    points: &PointArena,
    field: &UnitVectorField,
    max_pairs: usize,
    pairs: &mut PairArena,
    out: &mut HypothesisSet,
) {
    pairs.rebuild(rng, points, field, max_pairs);
    pairs.solve();
    pairs.write_hypotheses(out);
    for (slot, stats) in pairs.stats().iter().enumerate() {
        if out.is_undetermined(slot) {
            warn!(
                "instance {}: all {} sampled pairs have undefined directions",
                points.instance_of(slot),
                stats.sampled
            );
        }
    }
    trace!(
        "generated {} hypotheses from {} systems over {} instances",
        out.len(),
        pairs.len(),
        points.num_slots()
    );
}

/// Hypotheses of a single instance from the sequential path.
#[derive(Clone, Debug)]
pub struct InstanceHypotheses {
    /// Finite hypotheses, or a single NaN entry when none exist.
    pub hypotheses: Vec<Point2<f32>>,
    pub stats: SamplingStats,
}

/// Sequential generation for one instance, solving pair by pair.
pub fn generate_instance<R: Rng + ?Sized>(
    rng: &mut R,
    field: &UnitVectorField,
    instance: usize,
    points: &[Pixel],
    max_pairs: usize,
) -> InstanceHypotheses {
    let mut pair_buf = Vec::new();
    let mut systems = Vec::new();
    let (sampled, kept) = push_instance_systems(
        rng,
        field,
        instance,
        points,
        max_pairs,
        &mut pair_buf,
        &mut systems,
    );
    let mut hypotheses: Vec<Point2<f32>> = systems.iter().filter_map(solve_pair).collect();
    if hypotheses.is_empty() {
        hypotheses.push(Point2::new(f32::NAN, f32::NAN));
    }
    InstanceHypotheses {
        hypotheses,
        stats: SamplingStats {
            sampled,
            dropped_nan: sampled - kept,
        },
    }
}
