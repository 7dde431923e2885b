use alloc::collections::BTreeMap;

use crate::{any::Instance, key::Key};

/// Constructed singletons of one container, by canonical key.
#[derive(Default)]
pub(crate) struct Cache {
    map: BTreeMap<Key, Instance>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &Key) -> Option<Instance> {
        self.map.get(key).cloned()
    }

    #[inline]
    pub(crate) fn insert(&mut self, key: Key, instance: Instance) -> Option<Instance> {
        self.map.insert(key, instance)
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
