use alloc::boxed::Box;
use core::any::type_name;
use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, debug_span, error};

use crate::{
    any::Instance,
    cache::Cache,
    dependency::StaticArgs,
    errors::{BuildErrorKind, InstantiatorErrorKind, OverrideErrorKind, ResolveErrorKind},
    graph,
    key::Key,
    lock::KeyLocks,
    recipe::{Factory, Recipe},
    registry::{Binding, Provider, Registry, RegistryBuilder},
    utils::thread_safety::{downcast, erase, RcThreadSafety, SendSafety, SyncSafety},
};

/// Builder of the synchronous [`Container`].
pub type ContainerBuilder = RegistryBuilder<Factory>;

impl ContainerBuilder {
    /// Validates the bindings registered so far and freezes them into a container.
    ///
    /// The builder stays usable, but bindings registered later never reach containers built before.
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
    locks: KeyLocks<ReentrantMutex<()>>,
}

/// Resolves keys into constructed values.
///
/// A container is a cheap handle: clones share the same bindings and singletons.
/// Recipes may depend on `Key::of::<Container>()` to resolve keys dynamically.
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
    /// Singletons are constructed at most once per container and cached only
    /// after their recipe succeeds, so a failed construction is retried by the next call.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::UnknownBinding`] if `key` isn't registered
    /// - Returns [`ResolveErrorKind::Instantiator`] if the recipe of `key` or of one of its dependencies fails
    pub fn resolve(&self, key: impl Into<Key>) -> Result<Instance, ResolveErrorKind> {
        let key = self.inner.registry.canonicalize(&key.into());
        self.resolve_canonical(&key)
    }

    /// Resolves `key` and downcasts the value to `T`.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the value isn't a `T`
    /// - Returns the errors of [`Self::resolve`]
    pub fn get<T: SendSafety + SyncSafety + 'static>(&self, key: impl Into<Key>) -> Result<RcThreadSafety<T>, ResolveErrorKind> {
        let key = key.into();
        let instance = self.resolve(&key)?;
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
    pub fn get_by_type<T: SendSafety + SyncSafety + 'static>(&self) -> Result<RcThreadSafety<T>, ResolveErrorKind> {
        self.get(Key::of::<T>())
    }

    /// Every key this container can resolve, including its own.
    #[inline]
    pub fn registered_keys(&self) -> impl Iterator<Item = &Key> {
        self.inner.registry.keys()
    }

    /// Derives a container with the binding of `key` replaced.
    ///
    /// The derived container starts with an empty cache. This container, its
    /// bindings and its cached singletons are left untouched.
    ///
    /// # Errors
    /// - Returns [`OverrideErrorKind::CannotOverrideUnregistered`] if `key` isn't registered
    /// - Returns [`OverrideErrorKind::Register`] if the new binding is invalid, see [`RegistryBuilder::register`]
    /// - Returns [`OverrideErrorKind::Build`] if the new binding breaks the graph
    pub fn with_override(
        &self,
        key: impl Into<Key>,
        recipe: impl Into<Recipe>,
        is_singleton: bool,
        args: StaticArgs,
    ) -> Result<Container, OverrideErrorKind> {
        let registry = self.inner.registry.with_override(&key.into(), recipe.into(), is_singleton, args)?;
        graph::validate(&registry)?;

        Ok(Self::new(registry))
    }

    /// Same as [`Self::with_override`] with `is_singleton` set.
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn with_override_singleton(&self, key: impl Into<Key>, recipe: impl Into<Recipe>, args: StaticArgs) -> Result<Container, OverrideErrorKind> {
        self.with_override(key, recipe, true, args)
    }
}

impl Container {
    fn resolve_canonical(&self, key: &Key) -> Result<Instance, ResolveErrorKind> {
        let span = debug_span!("resolve", key = %key);
        let _guard = span.enter();

        if let Some(instance) = self.inner.cache.lock().get(key) {
            debug!("Found in cache");
            return Ok(instance);
        }
        debug!("Not found in cache");

        let Some(binding) = self.inner.registry.get(key) else {
            let err = ResolveErrorKind::UnknownBinding { key: key.clone() };
            error!("{}", err);
            return Err(err);
        };

        let Some(lock) = self.inner.locks.get(key) else {
            return self.instantiate(binding);
        };
        let _construction = lock.lock();

        // Another caller may have finished constructing it while we were waiting
        if let Some(instance) = self.inner.cache.lock().get(key) {
            debug!("Found in cache");
            return Ok(instance);
        }

        let instance = self.instantiate(binding)?;
        self.inner.cache.lock().insert(key.clone(), instance.clone());
        debug!("Cached");

        Ok(instance)
    }

    fn instantiate(&self, binding: &Binding<Factory>) -> Result<Instance, ResolveErrorKind> {
        let factory = match &binding.provider {
            Provider::Recipe(factory) => factory,
            Provider::Container => return Ok(erase(self.clone())),
        };

        let mut args = binding.constants.clone();
        for (name, dependency) in &binding.dependencies {
            let dependency = self.inner.registry.canonicalize(dependency);
            match self.resolve_canonical(&dependency) {
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

        factory.call(args).map_err(|err| {
            let err = ResolveErrorKind::Instantiator {
                key: binding.key.clone(),
                kind: InstantiatorErrorKind::Factory(err),
            };
            error!("{}", err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{Container, ContainerBuilder};
    use crate::{
        errors::{BuildErrorKind, InstantiateErrorKind, InstantiatorErrorKind, OverrideErrorKind, ResolveErrorKind},
        utils::thread_safety::RcThreadSafety,
        Args, Contract, Key, Recipe, StaticArgs,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        vec::Vec,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing_test::traced_test;

    struct A {
        x: i32,
        y: String,
    }

    struct Lol {
        x: i32,
    }

    struct Kek {
        kek: RcThreadSafety<Lol>,
    }

    fn counted<T: Send + Sync + 'static>(call_count: &RcThreadSafety<AtomicU8>, value: fn() -> T) -> Recipe {
        let call_count = call_count.clone();
        Recipe::new(move |_| {
            call_count.fetch_add(1, Ordering::SeqCst);
            Ok(value())
        })
    }

    #[test]
    #[traced_test]
    fn test_basic() {
        let mut builder = ContainerBuilder::new();
        builder
            .register(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new())
            .unwrap()
            .register("y", Recipe::instance(String::from("abacaba")), false, StaticArgs::new())
            .unwrap()
            .register(
                Key::of::<A>(),
                Recipe::new(|args: Args| {
                    Ok(A {
                        x: args.cloned("x")?,
                        y: args.cloned("y")?,
                    })
                })
                .param("x", Key::of::<i32>())
                .param("y", Key::of::<String>()),
                false,
                StaticArgs::new().dependency("y", "y"),
            )
            .unwrap();
        let container = builder.build().unwrap();

        let a = container.get::<A>(Key::of::<A>()).unwrap();

        assert_eq!(a.x, 1);
        assert_eq!(a.y, "abacaba");
        assert!(logs_contain("Not found in cache"));
    }

    #[test]
    #[traced_test]
    fn test_singleton_and_transient() {
        let singleton_calls = RcThreadSafety::new(AtomicU8::new(0));
        let transient_calls = RcThreadSafety::new(AtomicU8::new(0));

        let mut builder = ContainerBuilder::new();
        builder
            .singleton(Key::of::<u8>(), counted(&singleton_calls, || 1u8), StaticArgs::new())
            .unwrap()
            .register(Key::of::<u16>(), counted(&transient_calls, || 1u16), false, StaticArgs::new())
            .unwrap();
        let container = builder.build().unwrap();

        let first = container.resolve(Key::of::<u8>()).unwrap();
        let second = container.resolve(Key::of::<u8>()).unwrap();
        assert!(RcThreadSafety::ptr_eq(&first, &second));
        assert_eq!(singleton_calls.load(Ordering::SeqCst), 1);

        let first = container.resolve(Key::of::<u16>()).unwrap();
        let second = container.resolve(Key::of::<u16>()).unwrap();
        assert!(!RcThreadSafety::ptr_eq(&first, &second));
        assert_eq!(transient_calls.load(Ordering::SeqCst), 2);

        assert!(logs_contain("Cached"));
        assert!(logs_contain("Found in cache"));
    }

    #[test]
    #[traced_test]
    fn test_nested_singleton_is_shared() {
        struct Db;
        struct Service {
            db: RcThreadSafety<Db>,
        }

        let mut builder = ContainerBuilder::new();
        builder
            .singleton(Key::of::<Db>(), Recipe::new(|_| Ok(Db)), StaticArgs::new())
            .unwrap()
            .register(
                Key::of::<Service>(),
                Recipe::new(|args: Args| Ok(Service { db: args.get("db")? })).param("db", Key::of::<Db>()),
                false,
                StaticArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        let first = container.get_by_type::<Service>().unwrap();
        let second = container.get_by_type::<Service>().unwrap();
        let db = container.get_by_type::<Db>().unwrap();

        assert!(!RcThreadSafety::ptr_eq(&first, &second));
        assert!(RcThreadSafety::ptr_eq(&first.db, &second.db));
        assert!(RcThreadSafety::ptr_eq(&first.db, &db));
    }

    #[test]
    #[traced_test]
    fn test_deferred_name() {
        let mut builder = ContainerBuilder::new();
        builder
            .register(
                Key::of::<Kek>(),
                Recipe::new(|args: Args| Ok(Kek { kek: args.get("kek")? })).param("kek", Key::deferred("Lol")),
                false,
                StaticArgs::new(),
            )
            .unwrap()
            .register("Lol", Recipe::new(|_| Ok(Lol { x: 1 })), false, StaticArgs::new())
            .unwrap();
        let container = builder.build().unwrap();

        assert_eq!(container.get::<Kek>(Key::of::<Kek>()).unwrap().kek.x, 1);
        // The type's short name redirects to the literal name
        assert_eq!(container.get_by_type::<Lol>().unwrap().x, 1);
        assert_eq!(container.get::<Lol>(Key::deferred("Lol")).unwrap().x, 1);
    }

    #[test]
    #[traced_test]
    fn test_generic_independence() {
        const INTERFACE: Contract = Contract::new("Interface", &["T"]);

        struct Impl<T> {
            value: RcThreadSafety<T>,
        }

        let mut builder = ContainerBuilder::new();
        builder
            .register(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new())
            .unwrap()
            .register(Key::of::<&str>(), Recipe::instance("abacaba"), false, StaticArgs::new())
            .unwrap()
            .singleton(
                INTERFACE.of([Key::of::<i32>()]),
                Recipe::new(|args: Args| Ok(Impl::<i32> { value: args.get("value")? })).param("value", Key::var("T")),
                StaticArgs::new(),
            )
            .unwrap()
            .singleton(
                INTERFACE.of([Key::of::<&str>()]),
                Recipe::new(|args: Args| Ok(Impl::<&str> { value: args.get("value")? })).param("value", Key::var("T")),
                StaticArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        let int = container.get::<Impl<i32>>(INTERFACE.of([Key::of::<i32>()])).unwrap();
        let text = container.get::<Impl<&str>>(INTERFACE.of([Key::of::<&str>()])).unwrap();

        assert_eq!(*int.value, 1);
        assert_eq!(*text.value, "abacaba");
        assert!(matches!(
            container.resolve(INTERFACE.of([Key::of::<u8>()])),
            Err(ResolveErrorKind::UnknownBinding { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_unknown_binding() {
        let container = ContainerBuilder::new().build().unwrap();

        assert!(matches!(
            container.resolve(Key::of::<A>()),
            Err(ResolveErrorKind::UnknownBinding { key }) if key == Key::of::<A>()
        ));
        assert!(logs_contain("No binding registered for"));
    }

    #[test]
    #[traced_test]
    fn test_incorrect_type() {
        let mut builder = ContainerBuilder::new();
        builder.register("x", Recipe::instance(1i32), false, StaticArgs::new()).unwrap();
        let container = builder.build().unwrap();

        assert!(matches!(container.get::<u8>("x"), Err(ResolveErrorKind::IncorrectType { .. })));
    }

    #[test]
    #[traced_test]
    fn test_register_after_build() {
        let mut builder = ContainerBuilder::new();
        builder.register(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new()).unwrap();
        let container = builder.build().unwrap();

        builder.register(Key::of::<u8>(), Recipe::instance(1u8), false, StaticArgs::new()).unwrap();

        assert!(matches!(
            container.resolve(Key::of::<u8>()),
            Err(ResolveErrorKind::UnknownBinding { .. })
        ));
        assert_eq!(*builder.build().unwrap().get_by_type::<u8>().unwrap(), 1);
    }

    #[test]
    #[traced_test]
    fn test_failed_singleton_is_retried() {
        let call_count = RcThreadSafety::new(AtomicU8::new(0));

        let mut builder = ContainerBuilder::new();
        builder
            .singleton(
                Key::of::<u8>(),
                Recipe::new({
                    let call_count = call_count.clone();
                    move |_| {
                        if call_count.fetch_add(1, Ordering::SeqCst) == 0 {
                            return Err(InstantiateErrorKind::Custom(anyhow::anyhow!("first call fails")));
                        }
                        Ok(1u8)
                    }
                }),
                StaticArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        assert!(matches!(
            container.resolve(Key::of::<u8>()),
            Err(ResolveErrorKind::Instantiator {
                kind: InstantiatorErrorKind::Factory(InstantiateErrorKind::Custom(_)),
                ..
            })
        ));
        assert_eq!(*container.get_by_type::<u8>().unwrap(), 1);
        assert_eq!(*container.get_by_type::<u8>().unwrap(), 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn test_dependency_failure() {
        struct B;

        let mut builder = ContainerBuilder::new();
        builder
            .register(
                Key::of::<u8>(),
                Recipe::new(|_| Err::<u8, _>(InstantiateErrorKind::Custom(anyhow::anyhow!("broken")))),
                false,
                StaticArgs::new(),
            )
            .unwrap()
            .register(Key::of::<B>(), Recipe::new(|_| Ok(B)).param("x", Key::of::<u8>()), false, StaticArgs::new())
            .unwrap();
        let container = builder.build().unwrap();

        let err = container.resolve(Key::of::<B>()).unwrap_err();

        assert!(matches!(
            err,
            ResolveErrorKind::Instantiator {
                kind: InstantiatorErrorKind::Deps(_),
                ..
            }
        ));
        assert!(matches!(err.root_cause(), ResolveErrorKind::Instantiator { key, .. } if *key == Key::of::<u8>()));
    }

    #[test]
    #[traced_test]
    fn test_container_as_dependency() {
        struct Lazy {
            container: RcThreadSafety<Container>,
        }

        let mut builder = ContainerBuilder::new();
        builder
            .register(Key::of::<i32>(), Recipe::instance(1), true, StaticArgs::new())
            .unwrap()
            .register(
                Key::of::<Lazy>(),
                Recipe::new(|args: Args| Ok(Lazy { container: args.get("container")? })).param("container", Key::of::<Container>()),
                false,
                StaticArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        let lazy = container.get_by_type::<Lazy>().unwrap();

        assert_eq!(*lazy.container.get_by_type::<i32>().unwrap(), 1);
        assert!(RcThreadSafety::ptr_eq(
            &lazy.container.resolve(Key::of::<i32>()).unwrap(),
            &container.resolve(Key::of::<i32>()).unwrap(),
        ));
    }

    #[test]
    #[traced_test]
    fn test_registered_keys() {
        let mut builder = ContainerBuilder::new();
        builder
            .register(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new())
            .unwrap()
            .register("y", Recipe::instance(2), false, StaticArgs::new())
            .unwrap();
        let container = builder.build().unwrap();

        let keys = container.registered_keys().cloned().collect::<Vec<_>>();

        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&Key::of::<Container>()));
        assert!(keys.contains(&Key::name("y")));
    }

    #[test]
    #[traced_test]
    fn test_override_isolation() {
        let mut builder = ContainerBuilder::new();
        builder.singleton(Key::of::<i32>(), Recipe::instance(1), StaticArgs::new()).unwrap();
        let container = builder.build().unwrap();
        assert_eq!(*container.get_by_type::<i32>().unwrap(), 1);

        let overridden = container
            .with_override_singleton(Key::of::<i32>(), Recipe::instance(2), StaticArgs::new())
            .unwrap();

        assert_eq!(*overridden.get_by_type::<i32>().unwrap(), 2);
        assert_eq!(*container.get_by_type::<i32>().unwrap(), 1);

        let twice = overridden
            .with_override(Key::of::<i32>(), Recipe::instance(3), false, StaticArgs::new())
            .unwrap();

        assert_eq!(*twice.get_by_type::<i32>().unwrap(), 3);
        assert_eq!(*overridden.get_by_type::<i32>().unwrap(), 2);
        assert_eq!(*container.get_by_type::<i32>().unwrap(), 1);
    }

    #[test]
    #[traced_test]
    fn test_override_keeps_self_reference() {
        let mut builder = ContainerBuilder::new();
        builder.register(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new()).unwrap();
        let container = builder.build().unwrap();

        let overridden = container
            .with_override(Key::of::<Container>(), Recipe::instance(2i32), false, StaticArgs::new())
            .unwrap()
            .with_override(Key::of::<i32>(), Recipe::instance(3), false, StaticArgs::new())
            .unwrap();
        let itself = overridden.get_by_type::<Container>().unwrap();

        assert_eq!(*itself.get_by_type::<i32>().unwrap(), 3);
        assert_eq!(overridden.registered_keys().count(), 2);
    }

    #[test]
    #[traced_test]
    fn test_override_errors() {
        struct B;

        let mut builder = ContainerBuilder::new();
        builder
            .register(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new())
            .unwrap()
            .register(Key::of::<B>(), Recipe::new(|_| Ok(B)).param("x", Key::of::<i32>()), false, StaticArgs::new())
            .unwrap();
        let container = builder.build().unwrap();

        assert!(matches!(
            container.with_override(Key::of::<u8>(), Recipe::instance(1u8), false, StaticArgs::new()),
            Err(OverrideErrorKind::CannotOverrideUnregistered { .. })
        ));
        assert!(matches!(
            container.with_override(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new().value("z", 1)),
            Err(OverrideErrorKind::Register(_))
        ));
        assert!(matches!(
            container.with_override(
                Key::of::<i32>(),
                Recipe::new(|_| Ok(2)).param("b", Key::of::<B>()),
                false,
                StaticArgs::new()
            ),
            Err(OverrideErrorKind::Build(BuildErrorKind::CyclicDependency { .. }))
        ));
    }

    #[test]
    #[traced_test]
    #[cfg(feature = "thread_safe")]
    fn test_concurrent_singleton() {
        use std::thread;

        let call_count = RcThreadSafety::new(AtomicU8::new(0));

        let mut builder = ContainerBuilder::new();
        builder
            .singleton(
                Key::of::<u8>(),
                Recipe::new({
                    let call_count = call_count.clone();
                    move |_| {
                        call_count.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(core::time::Duration::from_millis(10));
                        Ok(1u8)
                    }
                }),
                StaticArgs::new(),
            )
            .unwrap();
        let container = builder.build().unwrap();

        let handles = (0..8)
            .map(|_| {
                let container = container.clone();
                thread::spawn(move || container.resolve(Key::of::<u8>()).unwrap())
            })
            .collect::<Vec<_>>();
        let instances = handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>();

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|instance| RcThreadSafety::ptr_eq(instance, &instances[0])));
    }
}
