use alloc::collections::BTreeMap;

use crate::key::Key;

/// Exclusive-construction guards, one per singleton key.
///
/// The guard of a key is held while its value is constructed, so concurrent
/// resolutions of the same uncached singleton construct it once. Guards of
/// different keys are independent and a validated graph is acyclic, so a
/// resolution never waits for a guard held further up its own path.
pub(crate) struct KeyLocks<M> {
    locks: BTreeMap<Key, M>,
}

impl<M: Default> KeyLocks<M> {
    #[must_use]
    pub(crate) fn new<'a>(keys: impl IntoIterator<Item = &'a Key>) -> Self {
        Self {
            locks: keys.into_iter().map(|key| (key.clone(), M::default())).collect(),
        }
    }
}

impl<M> KeyLocks<M> {
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &Key) -> Option<&M> {
        self.locks.get(key)
    }
}
