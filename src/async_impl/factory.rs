use core::future::Future;

use super::service::{service_fn, BoxCloneService};
use crate::{
    any::Instance,
    args::Args,
    errors::InstantiateErrorKind,
    recipe::{self, Recipe},
    utils::thread_safety::{erase, SendSafety, SyncSafety},
};

pub(crate) type BoxedCloneAsyncFactory = BoxCloneService<Args, Instance, InstantiateErrorKind>;

#[derive(Clone)]
pub(crate) enum FactoryKind {
    Sync(recipe::Factory),
    Async(BoxedCloneAsyncFactory),
}

/// Type-erased recipe function of the async container, synchronous or asynchronous.
#[derive(Clone)]
pub struct Factory(pub(crate) FactoryKind);

impl From<recipe::Factory> for Factory {
    #[inline]
    fn from(factory: recipe::Factory) -> Self {
        Self(FactoryKind::Sync(factory))
    }
}

impl From<Recipe<recipe::Factory>> for Recipe<Factory> {
    #[inline]
    fn from(recipe: Recipe<recipe::Factory>) -> Self {
        recipe.map_factory(Factory::from)
    }
}

impl Recipe<Factory> {
    /// Asynchronous recipe, usable only with the async container.
    ///
    /// ```rust
    /// use wireup::{async_impl::ContainerBuilder, Key, Recipe, StaticArgs};
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder
    ///     .register(Key::of::<i32>(), Recipe::new_async(|_| async { Ok(1i32) }), true, StaticArgs::new())
    ///     .unwrap();
    /// ```
    pub fn new_async<Func, Fut, T>(mut f: Func) -> Self
    where
        Func: FnMut(Args) -> Fut + Clone + SendSafety + SyncSafety + 'static,
        Fut: Future<Output = Result<T, InstantiateErrorKind>> + SendSafety + 'static,
        T: SendSafety + SyncSafety + 'static,
    {
        Self::from_factory(Factory(FactoryKind::Async(BoxCloneService::new(service_fn(move |args| {
            let fut = f(args);
            async move { fut.await.map(erase) }
        })))))
    }
}
