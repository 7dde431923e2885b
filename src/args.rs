use alloc::{collections::BTreeMap, sync::Arc};
use core::any::type_name;

use crate::{
    any::Instance,
    errors::InstantiateErrorKind,
    utils::thread_safety::{downcast, RcThreadSafety, SendSafety, SyncSafety},
};

/// Named arguments a recipe is called with: static values plus resolved dependencies.
#[derive(Clone, Default)]
pub struct Args {
    values: BTreeMap<Arc<str>, Instance>,
}

impl Args {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { values: BTreeMap::new() }
    }

    #[inline]
    pub fn insert(&mut self, name: impl Into<Arc<str>>, instance: Instance) -> Option<Instance> {
        self.values.insert(name.into(), instance)
    }

    /// Gets the shared argument `name` as `T`.
    ///
    /// # Errors
    /// - Returns [`InstantiateErrorKind::MissingArgument`] if there is no such argument
    /// - Returns [`InstantiateErrorKind::IncorrectArgumentType`] if the argument isn't a `T`
    pub fn get<T: SendSafety + SyncSafety + 'static>(&self, name: &str) -> Result<RcThreadSafety<T>, InstantiateErrorKind> {
        let Some(instance) = self.values.get(name) else {
            return Err(InstantiateErrorKind::MissingArgument { name: Arc::from(name) });
        };
        downcast(instance.clone()).map_err(|_| InstantiateErrorKind::IncorrectArgumentType {
            name: Arc::from(name),
            expected: type_name::<T>(),
        })
    }

    /// Same as [`Self::get`], but clones the value out of the shared handle.
    #[allow(clippy::missing_errors_doc)]
    pub fn cloned<T: Clone + SendSafety + SyncSafety + 'static>(&self, name: &str) -> Result<T, InstantiateErrorKind> {
        self.get::<T>(name).map(|value| (*value).clone())
    }

    #[inline]
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
