//! Structured diagnostics produced by the voter.
//!
//! `VotingReport` is the entry point returned by
//! [`HoughVoter::vote_with_diagnostics`](crate::HoughVoter::vote_with_diagnostics):
//! the per-instance centers plus a `VotingTrace` describing every stage. All
//! types serialize to camelCase JSON for external tooling; hypotheses and
//! centers are reported in `(row, col)` order.

pub mod pipeline;
pub mod pruning;
pub mod timing;

pub use pipeline::{InputDescriptor, InstanceTrace, VotingReport, VotingTrace};
pub use pruning::PruningStage;
pub use timing::{StageTiming, TimingBreakdown};
