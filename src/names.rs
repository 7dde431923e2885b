use alloc::{collections::BTreeMap, sync::Arc};

use crate::key::Key;

/// Symbol table reconciling names with the keys registered under them.
#[derive(Clone, Default, Debug)]
pub(crate) struct NameTable {
    names: BTreeMap<Arc<str>, Key>,
}

impl NameTable {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self { names: BTreeMap::new() }
    }

    /// Records a newly registered key under its display name.
    pub(crate) fn record(&mut self, key: &Key) {
        match key {
            Key::Type(type_info) => {
                self.names.insert(Arc::from(type_info.short_name()), key.clone());
            }
            Key::Name(name) | Key::Deferred(name) => {
                self.names.insert(name.clone(), Key::Name(name.clone()));
            }
            Key::Var(_) | Key::Generic(..) => {}
        }
    }

    /// Canonical form of `key` against the names recorded so far.
    ///
    /// Unknown names are returned as they are, so forward references stay
    /// representable until the table is complete.
    #[must_use]
    pub(crate) fn canonicalize(&self, key: &Key) -> Key {
        match key {
            // A type only gives way to a literal name registered under its short name
            Key::Type(type_info) => match self.names.get(type_info.short_name()) {
                Some(name @ Key::Name(_)) => name.clone(),
                _ => key.clone(),
            },
            Key::Name(name) | Key::Deferred(name) => self.names.get(name).cloned().unwrap_or_else(|| key.clone()),
            // Type arguments are part of the contract's identity and never redirected,
            // so a key stays equal to itself whatever gets registered after it
            Key::Var(_) | Key::Generic(..) => key.clone(),
        }
    }

    /// Canonical form of a key that is about to be bound.
    /// Binding a forward-declared name turns it into a literal one.
    #[must_use]
    pub(crate) fn canonicalize_binding(&self, key: &Key) -> Key {
        match self.canonicalize(key) {
            Key::Deferred(name) => Key::Name(name),
            key => key,
        }
    }
}
