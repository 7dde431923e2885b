use alloc::boxed::Box;
use core::any::type_name;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, debug_span, error, Instrument as _};

use super::{
    factory::{Factory, FactoryKind},
    service::Service as _,
};
use crate::{
    any::Instance,
    cache::Cache,
    dependency::StaticArgs,
    errors::{BuildErrorKind, InstantiatorErrorKind, OverrideErrorKind, ResolveErrorKind},
    graph,
    key::Key,
    lock::KeyLocks,
    recipe::Recipe,
    registry::{Binding, Provider, Registry, RegistryBuilder},
    utils::{
        future::BoxFuture,
        thread_safety::{downcast, erase, RcThreadSafety, SendSafety, SyncSafety},
    },
};

/// Builder of the async [`Container`].
///
/// Accepts both synchronous recipes ([`Recipe::new`]) and asynchronous ones ([`Recipe::new_async`]).
pub type ContainerBuilder = RegistryBuilder<Factory>;

impl ContainerBuilder {
    /// Validates the bindings registered so far and freezes them into a container.
    ///
    /// # Errors
    /// - Returns [`BuildErrorKind::MissingDependency`] if a dependency of some binding isn't registered
    /// - Returns [`BuildErrorKind::CyclicDependency`] if some binding depends on itself
    pub fn build(&self) -> Result<Container, BuildErrorKind> {
        let registry = self.registry.with_container(Key::of::<Container>());
        graph::validate(&registry)?;

        debug!(bindings = registry.len(), "Container built");
        Ok(Container::new(registry))
    }
}

pub(crate) struct ContainerInner {
    registry: Registry<Factory>,
    cache: Mutex<Cache>,
    locks: KeyLocks<AsyncMutex<()>>,
}

/// Async counterpart of [`crate::Container`].
///
/// Dependencies are awaited one by one, in parameter declaration order.
#[derive(Clone)]
pub struct Container {
    inner: RcThreadSafety<ContainerInner>,
}

impl Container {
    #[must_use]
    fn new(registry: Registry<Factory>) -> Self {
        let locks = KeyLocks::new(registry.bindings().filter(|binding| binding.is_singleton).map(|binding| &binding.key));
        Self {
            inner: RcThreadSafety::new(ContainerInner {
                registry,
                cache: Mutex::new(Cache::new()),
                locks,
            }),
        }
    }

    /// Resolves `key`, constructing it and its dependencies if needed.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::UnknownBinding`] if `key` isn't registered
    /// - Returns [`ResolveErrorKind::Instantiator`] if the recipe of `key` or of one of its dependencies fails
    pub async fn resolve(&self, key: impl Into<Key>) -> Result<Instance, ResolveErrorKind> {
        let key = self.inner.registry.canonicalize(&key.into());
        self.resolve_canonical(key).await
    }

    /// Resolves `key` and downcasts the value to `T`.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the value isn't a `T`
    /// - Returns the errors of [`Self::resolve`]
    pub async fn get<T: SendSafety + SyncSafety + 'static>(&self, key: impl Into<Key>) -> Result<RcThreadSafety<T>, ResolveErrorKind> {
        let key = key.into();
        let instance = self.resolve(&key).await?;
        downcast(instance).map_err(|_| {
            let err = ResolveErrorKind::IncorrectType {
                key,
                expected: type_name::<T>(),
            };
            error!("{}", err);
            err
        })
    }

    /// Same as [`Self::get`] with `Key::of::<T>()`.
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub async fn get_by_type<T: SendSafety + SyncSafety + 'static>(&self) -> Result<RcThreadSafety<T>, ResolveErrorKind> {
        self.get(Key::of::<T>()).await
    }

    /// Every key this container can resolve, including its own.
    #[inline]
    pub fn registered_keys(&self) -> impl Iterator<Item = &Key> {
        self.inner.registry.keys()
    }

    /// Derives a container with the binding of `key` replaced, see [`crate::Container::with_override`].
    ///
    /// # Errors
    /// - Returns [`OverrideErrorKind::CannotOverrideUnregistered`] if `key` isn't registered
    /// - Returns [`OverrideErrorKind::Register`] if the new binding is invalid
    /// - Returns [`OverrideErrorKind::Build`] if the new binding breaks the graph
    pub fn with_override(
        &self,
        key: impl Into<Key>,
        recipe: impl Into<Recipe<Factory>>,
        is_singleton: bool,
        args: StaticArgs,
    ) -> Result<Container, OverrideErrorKind> {
        let registry = self.inner.registry.with_override(&key.into(), recipe.into(), is_singleton, args)?;
        graph::validate(&registry)?;

        Ok(Self::new(registry))
    }

    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn with_override_singleton(
        &self,
        key: impl Into<Key>,
        recipe: impl Into<Recipe<Factory>>,
        args: StaticArgs,
    ) -> Result<Container, OverrideErrorKind> {
        self.with_override(key, recipe, true, args)
    }
}

impl Container {
    fn resolve_canonical(&self, key: Key) -> BoxFuture<'_, Result<Instance, ResolveErrorKind>> {
        let span = debug_span!("resolve", key = %key);

        Box::pin(
            async move {
                let cached = self.inner.cache.lock().get(&key);
                if let Some(instance) = cached {
                    debug!("Found in cache");
                    return Ok(instance);
                }
                debug!("Not found in cache");

                let Some(binding) = self.inner.registry.get(&key) else {
                    let err = ResolveErrorKind::UnknownBinding { key };
                    error!("{}", err);
                    return Err(err);
                };

                let Some(lock) = self.inner.locks.get(&key) else {
                    return self.instantiate(binding).await;
                };
                let _construction = lock.lock().await;

                let cached = self.inner.cache.lock().get(&key);
                if let Some(instance) = cached {
                    debug!("Found in cache");
                    return Ok(instance);
                }

                let instance = self.instantiate(binding).await?;
                self.inner.cache.lock().insert(key, instance.clone());
                debug!("Cached");

                Ok(instance)
            }
            .instrument(span),
        )
    }

    async fn instantiate(&self, binding: &Binding<Factory>) -> Result<Instance, ResolveErrorKind> {
        let factory = match &binding.provider {
            Provider::Recipe(factory) => factory,
            Provider::Container => return Ok(erase(self.clone())),
        };

        let mut args = binding.constants.clone();
        for (name, dependency) in &binding.dependencies {
            let dependency = self.inner.registry.canonicalize(dependency);
            match self.resolve_canonical(dependency).await {
                Ok(instance) => {
                    args.insert(name.clone(), instance);
                }
                Err(err) => {
                    let err = ResolveErrorKind::Instantiator {
                        key: binding.key.clone(),
                        kind: InstantiatorErrorKind::Deps(Box::new(err)),
                    };
                    error!("{}", err);
                    return Err(err);
                }
            }
        }

        let result = match &factory.0 {
            FactoryKind::Sync(factory) => factory.call(args),
            FactoryKind::Async(factory) => factory.clone().call(args).await,
        };
        result.map_err(|err| {
            let err = ResolveErrorKind::Instantiator {
                key: binding.key.clone(),
                kind: InstantiatorErrorKind::Factory(err),
            };
            error!("{}", err);
            err
        })
    }
}
