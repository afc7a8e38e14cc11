/*!
 * Priority-Ordered Context
 * Snapshot sorted by each registration's order key, ties in registration order
 */

use super::notify::{after_restore_pass, before_checkpoint_pass};
use super::registry::WeakRegistry;
use super::Context;
use crate::aggregate::{CheckpointHolder, RestoreHolder};
use crate::core::errors::{CheckpointError, Failure, RestoreError};
use crate::core::types::{ContextId, RestoreOrder};
use crate::resource::{Resource, WeakResource};
use log::debug;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::{Arc, Weak};

/// External comparator over order keys
pub type Comparator<K> = Arc<dyn Fn(&K, &K) -> Ordering + Send + Sync>;

/// Context notifying resources sorted by a declared order key
///
/// Sorting is stable, so registrations with equal keys keep their
/// registration order and the snapshot is total and deterministic. The
/// resources notified before checkpoint are remembered (weakly) and replayed
/// after restore in the configured [`RestoreOrder`].
pub struct PriorityContext<K> {
    id: ContextId,
    registry: Mutex<WeakRegistry<K>>,
    comparator: Option<Comparator<K>>,
    restore_order: RestoreOrder,
    restore_queue: Mutex<Vec<Weak<dyn Resource>>>,
}

impl<K: Ord + Send + Sync + 'static> PriorityContext<K> {
    /// Context ordered by `K`'s natural order
    pub fn new() -> Self {
        let comparator: Comparator<K> = Arc::new(|a: &K, b: &K| a.cmp(b));
        Self::build(Some(comparator))
    }
}

impl<K: Ord + Send + Sync + 'static> Default for PriorityContext<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Send + Sync + 'static> PriorityContext<K> {
    /// Context ordered by an external comparator
    pub fn with_comparator<F>(comparator: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        let comparator: Comparator<K> = Arc::new(comparator);
        Self::build(Some(comparator))
    }

    /// Context that keeps registration order and ignores keys
    pub(crate) fn insertion_ordered() -> Self {
        Self::build(None)
    }

    fn build(comparator: Option<Comparator<K>>) -> Self {
        Self {
            id: ContextId::next(),
            registry: Mutex::new(WeakRegistry::new()),
            comparator,
            restore_order: RestoreOrder::default(),
            restore_queue: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_restore_order(mut self, order: RestoreOrder) -> Self {
        self.restore_order = order;
        self
    }

    #[inline]
    pub fn restore_order(&self) -> RestoreOrder {
        self.restore_order
    }

    /// Register a resource under `key` without taking ownership of it
    pub fn register<R: WeakResource + ?Sized>(&self, resource: &R, key: K) {
        self.registry.lock().insert(resource.downgrade_resource(), key);
    }

    /// Ordered snapshot of the live registrants
    pub fn checkpoint_snapshot(&self) -> Vec<Arc<dyn Resource>> {
        let registry = self.registry.lock();
        let mut live = registry.live();
        if let Some(ref comparator) = self.comparator {
            // sort_by is stable: equal keys keep registration order
            live.sort_by(|a, b| comparator(a.0, b.0));
        }
        live.into_iter().map(|(_, resource)| resource).collect()
    }

    /// Resources the next after-restore pass will notify, in order
    pub fn restore_snapshot(&self) -> Vec<Arc<dyn Resource>> {
        self.restore_queue
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

impl<K: Send + Sync + 'static> Context for PriorityContext<K> {
    fn id(&self) -> ContextId {
        self.id
    }

    fn before_checkpoint(&self, trigger: Option<&dyn Context>) -> Result<(), CheckpointError> {
        let snapshot = self.checkpoint_snapshot();
        debug!(
            "{}: beforeCheckpoint of {} resource(s) (triggered by {:?})",
            self.id,
            snapshot.len(),
            trigger.map(|c| c.id())
        );

        let queue: Vec<Weak<dyn Resource>> = snapshot.iter().map(Arc::downgrade).collect();
        *self.restore_queue.lock() = self.restore_order.arrange(queue);

        let mut holder = CheckpointHolder::new();
        before_checkpoint_pass(self, &snapshot, &mut holder);
        holder.throw_if_any()
    }

    fn after_restore(&self, trigger: Option<&dyn Context>) -> Result<(), RestoreError> {
        let queue = std::mem::take(&mut *self.restore_queue.lock());
        let snapshot: Vec<Arc<dyn Resource>> = queue.iter().filter_map(Weak::upgrade).collect();
        debug!(
            "{}: afterRestore of {} resource(s) (triggered by {:?})",
            self.id,
            snapshot.len(),
            trigger.map(|c| c.id())
        );

        let mut holder = RestoreHolder::new();
        after_restore_pass(self, &snapshot, &mut holder);
        holder.throw_if_any()
    }

    fn live_count(&self) -> usize {
        self.registry.lock().live_count()
    }
}

impl<K: Send + Sync + 'static> Resource for PriorityContext<K> {
    fn before_checkpoint(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::before_checkpoint(self, Some(context)).map_err(Failure::from)
    }

    fn after_restore(&self, context: &dyn Context) -> Result<(), Failure> {
        Context::after_restore(self, Some(context)).map_err(Failure::from)
    }

    fn name(&self) -> &str {
        "PriorityContext"
    }
}
