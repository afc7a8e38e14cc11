/*!
 * Failure Aggregation
 * Merges failures from many independent resources into one error per pass
 */

mod holder;

pub use holder::FailureHolder;

use crate::core::errors::{CheckpointError, Failure, RestoreError};

/// An aggregate error kind: a container of zero or more nested causes
pub trait Aggregate: Default + Into<Failure> + Send {
    /// Kind name for logging
    const KIND: &'static str;

    fn causes(&self) -> &[Failure];

    fn add_cause(&mut self, cause: Failure);

    fn into_causes(self) -> Vec<Failure>;

    /// Recover an aggregate of this kind from a failure, or hand it back
    fn split_same_kind(failure: Failure) -> Result<Self, Failure>;
}

impl Aggregate for CheckpointError {
    const KIND: &'static str = "checkpoint";

    fn causes(&self) -> &[Failure] {
        CheckpointError::causes(self)
    }

    fn add_cause(&mut self, cause: Failure) {
        CheckpointError::add_cause(self, cause)
    }

    fn into_causes(self) -> Vec<Failure> {
        CheckpointError::into_causes(self)
    }

    fn split_same_kind(failure: Failure) -> Result<Self, Failure> {
        match failure {
            Failure::Checkpoint(e) => Ok(e),
            other => Err(other),
        }
    }
}

impl Aggregate for RestoreError {
    const KIND: &'static str = "restore";

    fn causes(&self) -> &[Failure] {
        RestoreError::causes(self)
    }

    fn add_cause(&mut self, cause: Failure) {
        RestoreError::add_cause(self, cause)
    }

    fn into_causes(self) -> Vec<Failure> {
        RestoreError::into_causes(self)
    }

    fn split_same_kind(failure: Failure) -> Result<Self, Failure> {
        match failure {
            Failure::Restore(e) => Ok(e),
            other => Err(other),
        }
    }
}

/// Holder for before-checkpoint failures
pub type CheckpointHolder = FailureHolder<CheckpointError>;

/// Holder for after-restore failures
pub type RestoreHolder = FailureHolder<RestoreError>;
