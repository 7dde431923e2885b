use alloc::{collections::BTreeMap, sync::Arc};

use crate::{
    any::Instance,
    key::Key,
    utils::thread_safety::{erase, SendSafety, SyncSafety},
};

/// Marks a static argument as "resolve this key" instead of a literal value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dependency {
    pub key: Key,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<Key>) -> Self {
        Self { key: key.into() }
    }
}

#[derive(Clone)]
pub enum StaticArg {
    /// Passed to the recipe verbatim.
    Value(Instance),
    Dependency(Dependency),
}

/// Arguments fixed at registration time, by recipe parameter name.
#[derive(Clone, Default)]
pub struct StaticArgs {
    pub(crate) args: BTreeMap<Arc<str>, StaticArg>,
}

impl StaticArgs {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { args: BTreeMap::new() }
    }

    #[inline]
    #[must_use]
    pub fn value<T: SendSafety + SyncSafety + 'static>(self, name: impl Into<Arc<str>>, value: T) -> Self {
        self.instance(name, erase(value))
    }

    #[inline]
    #[must_use]
    pub fn instance(mut self, name: impl Into<Arc<str>>, instance: Instance) -> Self {
        self.args.insert(name.into(), StaticArg::Value(instance));
        self
    }

    #[inline]
    #[must_use]
    pub fn dependency(mut self, name: impl Into<Arc<str>>, key: impl Into<Key>) -> Self {
        self.args.insert(name.into(), StaticArg::Dependency(Dependency::new(key)));
        self
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StaticArg> {
        self.args.get(name)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.args.keys()
    }
}
