/*!
 * Failure Holder
 * Lazy, mergeable accumulator for one aggregate kind
 */

use super::Aggregate;
use crate::core::errors::Failure;
use crate::core::interrupt;
use log::debug;

/// Accumulates failures into at most one aggregate of kind `E`
///
/// The aggregate is constructed on the first handled failure. Aggregates of
/// the same kind are flattened one level, anything else becomes a single
/// nested cause.
#[derive(Debug)]
pub struct FailureHolder<E: Aggregate> {
    aggregate: Option<E>,
}

impl<E: Aggregate> FailureHolder<E> {
    pub const fn new() -> Self {
        Self { aggregate: None }
    }

    /// Absorb one failure
    pub fn handle(&mut self, failure: impl Into<Failure>) {
        let aggregate = self.aggregate.get_or_insert_with(E::default);
        match E::split_same_kind(failure.into()) {
            Ok(same) => {
                for cause in same.into_causes() {
                    aggregate.add_cause(cause);
                }
            }
            Err(other) => {
                if matches!(other, Failure::Interrupted) {
                    // recorded, but never swallowed
                    interrupt::interrupt();
                }
                aggregate.add_cause(other);
            }
        }
    }

    /// Absorb a sequence of already-unwrapped causes
    pub fn absorb_causes<I>(&mut self, causes: I)
    where
        I: IntoIterator<Item = Failure>,
    {
        for cause in causes {
            self.handle(cause);
        }
    }

    /// Run `block`, absorbing its failure if any
    pub fn run_with_handler<F, T>(&mut self, block: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, Failure>,
    {
        match block() {
            Ok(value) => Some(value),
            Err(failure) => {
                debug!("Absorbed {} failure: {}", E::KIND, failure);
                self.handle(failure);
                None
            }
        }
    }

    /// Whether no cause has been recorded
    pub fn is_empty(&self) -> bool {
        self.aggregate.as_ref().map_or(true, |a| a.causes().is_empty())
    }

    /// Number of recorded causes
    pub fn len(&self) -> usize {
        self.aggregate.as_ref().map_or(0, |a| a.causes().len())
    }

    /// Raise the aggregate only if at least one cause was recorded
    pub fn throw_if_any(self) -> Result<(), E> {
        match self.take_if_any() {
            Some(aggregate) => Err(aggregate),
            None => Ok(()),
        }
    }

    /// Take the aggregate out if it holds at least one cause
    pub fn take_if_any(self) -> Option<E> {
        self.aggregate.filter(|a| !a.causes().is_empty())
    }
}

impl<E: Aggregate> Default for FailureHolder<E> {
    fn default() -> Self {
        Self::new()
    }
}
