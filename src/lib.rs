#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod types;
pub mod voting;

// --- High-level re-exports -------------------------------------------------

// Main entry points: voter, parameters and results.
pub use crate::error::VotingError;
pub use crate::types::{EstimatedCenters, InstanceStatus};
pub use crate::voting::{
    ClassBatch, HoughVoter, OutlierPolicy, PruneMethod, PruneParams, ReplacementStyle,
    VotingParams, VotingWorkspace,
};

// High-level diagnostics returned by the voter.
pub use crate::diagnostics::{InstanceTrace, VotingReport, VotingTrace};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use hough_voting::prelude::*;
/// use hough_voting::field::synthetic::fill_toward_center;
///
/// # fn main() -> Result<(), VotingError> {
/// let mut mask = InstanceMask::new(1, 32, 32);
/// mask.fill_rect(0, 8, 24, 8, 24);
/// let mut field = UnitVectorField::new(1, 32, 32);
/// fill_toward_center(&mut field, 0, [15.3, 16.7]);
///
/// let mut voter = HoughVoter::new(VotingParams::default());
/// let centers = voter.vote(&field, &mask)?;
/// println!("center={:?}", centers.get(0));
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::field::{InstanceMask, UnitVectorField};
    pub use crate::{EstimatedCenters, HoughVoter, VotingError, VotingParams};
}
