use thiserror::Error;

/// Errors raised before any voting work starts.
///
/// Degenerate instances (too few mask pixels, undefined directions, every
/// hypothesis pruned) are not errors: they surface as zero rows together with
/// an [`InstanceStatus`](crate::types::InstanceStatus).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VotingError {
    #[error("unknown pruning method {0:?} (expected one of: none, z-score, iqr)")]
    UnknownPruneMethod(String),
    #[error("unknown outlier replacement style {0:?} (expected mean or median)")]
    UnknownReplacementStyle(String),
    #[error("invalid voting parameters: {0}")]
    InvalidParams(String),
    #[error(
        "field shape (instances={field_instances}, h={field_height}, w={field_width}) does not \
         match mask shape (instances={mask_instances}, h={mask_height}, w={mask_width})"
    )]
    ShapeMismatch {
        field_instances: usize,
        field_height: usize,
        field_width: usize,
        mask_instances: usize,
        mask_height: usize,
        mask_width: usize,
    },
    #[error("instance {instance} is out of range for a batch of {instances}")]
    InstanceOutOfRange { instance: usize, instances: usize },
    #[error("buffer holds {actual} elements, shape requires {expected}")]
    BufferLength { expected: usize, actual: usize },
}
