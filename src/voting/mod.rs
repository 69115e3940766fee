//! Hough voting for object centers from a unit-vector field.
//!
//! Overview
//! - Collects every instance's foreground pixels into a flat arena and
//!   records which batch instances have at least two of them.
//! - Samples up to `K` distinct pixel pairs per instance and intersects the
//!   two predicted direction rays with an SVD pseudo-inverse, one hypothesis
//!   per pair. All instances' systems are solved in one pass.
//! - Flags outlier hypotheses per instance (z-score or IQR) and drops or
//!   replaces them.
//! - Weighs every hypothesis by the number of mask pixels pointing at it,
//!   boosting those that land on the mask, and returns the weighted mean.
//!
//! Modules
//! - [`params`] – configuration types for the voter and CLI.
//! - `pipeline` – the [`HoughVoter`] implementation.
//! - [`points`] – flat per-instance pixel storage and the validity mask.
//! - [`sampling`] – distinct pair sampling.
//! - [`hypothesis`] – pair systems, the batched solver and hypothesis sets.
//! - [`pruning`] – statistical outlier handling.
//! - [`weights`] – consensus scoring and the weighted center.
//! - `workspace` – reusable buffers that amortise allocations across calls.
//!
//! Key Ideas
//! - Internally points are `(x = col, y = row)`; results are reported as
//!   `(row, col)`.
//! - Degenerate instances never fail the batch: they keep a zero row and an
//!   explicit [`InstanceStatus`](crate::types::InstanceStatus).
//! - Randomness is always injected, so a seed reproduces a vote exactly.

pub mod hypothesis;
pub mod params;
mod pipeline;
pub mod points;
pub mod pruning;
pub mod sampling;
pub mod weights;
mod workspace;

pub use params::{
    OutlierPolicy, PruneMethod, PruneMethodName, PruneParams, ReplacementStyle, VotingParams,
};
pub use pipeline::{ClassBatch, HoughVoter};
pub use workspace::VotingWorkspace;
