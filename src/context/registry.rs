/*!
 * Weak Registry
 * Non-owning, insertion-ordered set of registered resources
 */

use crate::core::limits::{DEFAULT_REGISTRY_CAPACITY, REGISTRY_COMPACT_THRESHOLD};
use crate::resource::Resource;
use std::sync::{Arc, Weak};

struct Registration<K> {
    key: K,
    resource: Weak<dyn Resource>,
}

impl<K> Registration<K> {
    #[inline]
    fn is_live(&self) -> bool {
        self.resource.strong_count() > 0
    }
}

/// Registry holding resources through [`Weak`] references
///
/// Entries stay in registration order. Liveness is checked when a snapshot
/// is taken; a dropped resource silently disappears from later snapshots.
pub(crate) struct WeakRegistry<K> {
    entries: Vec<Registration<K>>,
}

impl<K> WeakRegistry<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(DEFAULT_REGISTRY_CAPACITY),
        }
    }

    /// Append a registration
    pub fn insert(&mut self, resource: Weak<dyn Resource>, key: K) {
        if self.entries.len() >= REGISTRY_COMPACT_THRESHOLD
            && self.entries.len() % REGISTRY_COMPACT_THRESHOLD == 0
        {
            self.prune();
        }
        self.entries.push(Registration { key, resource });
    }

    /// Whether the same resource is already registered
    pub fn contains(&self, resource: &Weak<dyn Resource>) -> bool {
        self.entries
            .iter()
            .any(|entry| Weak::ptr_eq(&entry.resource, resource))
    }

    /// Drop registrations whose resource is gone
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(Registration::is_live);
        before - self.entries.len()
    }

    /// Live resources with their keys, in registration order
    pub fn live(&self) -> Vec<(&K, Arc<dyn Resource>)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.resource.upgrade().map(|r| (&entry.key, r)))
            .collect()
    }

    /// Live resources in registration order
    pub fn live_resources(&self) -> Vec<Arc<dyn Resource>> {
        self.entries
            .iter()
            .filter_map(|entry| entry.resource.upgrade())
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_live()).count()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K> Default for WeakRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}
