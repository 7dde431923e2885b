use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use tracing::{debug, warn};

use crate::{
    args::Args,
    dependency::{Dependency, StaticArg, StaticArgs},
    errors::{OverrideErrorKind, RegisterErrorKind},
    generic,
    key::Key,
    names::NameTable,
    recipe::{Factory, Recipe},
    utils::thread_safety::RcThreadSafety,
};

pub(crate) enum Provider<F> {
    Recipe(F),
    /// Resolves to the container doing the resolution.
    Container,
}

/// Validated, immutable binding.
pub(crate) struct Binding<F> {
    pub(crate) key: Key,
    pub(crate) provider: Provider<F>,
    pub(crate) is_singleton: bool,
    /// Literal static arguments, passed to the recipe verbatim.
    pub(crate) constants: Args,
    /// Arguments resolved from the container, in parameter declaration order.
    /// Keys aren't canonicalized, names bound later must still apply to them.
    pub(crate) dependencies: Vec<(Arc<str>, Key)>,
}

pub(crate) struct Registry<F> {
    bindings: BTreeMap<Key, RcThreadSafety<Binding<F>>>,
    names: NameTable,
    /// Key of the self-reference binding, once the registry belongs to a container.
    container: Option<Key>,
}

impl<F> Clone for Registry<F> {
    fn clone(&self) -> Self {
        Self {
            bindings: self.bindings.clone(),
            names: self.names.clone(),
            container: self.container.clone(),
        }
    }
}

impl<F> Registry<F> {
    #[inline]
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
            names: NameTable::new(),
            container: None,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &Key) -> Option<&RcThreadSafety<Binding<F>>> {
        self.bindings.get(key)
    }

    #[inline]
    #[must_use]
    pub(crate) fn canonicalize(&self, key: &Key) -> Key {
        self.names.canonicalize(key)
    }

    #[inline]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &Key> {
        self.bindings.keys()
    }

    #[inline]
    pub(crate) fn bindings(&self) -> impl Iterator<Item = &Binding<F>> {
        self.bindings.values().map(|binding| &**binding)
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    fn insert(&mut self, binding: Binding<F>) {
        self.names.record(&binding.key);
        self.bindings.insert(binding.key.clone(), RcThreadSafety::new(binding));
    }

    /// Copy of the registry with the self-reference binding under `key`.
    #[must_use]
    pub(crate) fn with_container(&self, key: Key) -> Self {
        let mut registry = self.clone();
        registry.insert_container(key);
        registry
    }

    fn insert_container(&mut self, key: Key) {
        self.insert(Binding {
            key: key.clone(),
            provider: Provider::Container,
            is_singleton: false,
            constants: Args::new(),
            dependencies: Vec::new(),
        });
        self.container = Some(key);
    }

    /// Validates `recipe` bound under the canonical `key` and splits its parameters
    /// into constants and dependencies.
    fn binding(&self, key: Key, recipe: Recipe<F>, is_singleton: bool, args: StaticArgs) -> Result<Binding<F>, RegisterErrorKind> {
        if key.is_unbound() {
            return Err(RegisterErrorKind::UnboundGenericParameters { key });
        }

        let signature = generic::signature(&key, &recipe)?;
        if let Some(name) = args.names().find(|name| !signature.iter().any(|(param, _)| param == *name)) {
            return Err(RegisterErrorKind::UnknownParameter { key, name: name.clone() });
        }

        let mut constants = Args::new();
        let mut dependencies = Vec::with_capacity(signature.len());
        for (name, param_key) in signature {
            match args.get(&name) {
                Some(StaticArg::Value(instance)) => {
                    constants.insert(name, instance.clone());
                }
                Some(StaticArg::Dependency(Dependency { key })) => dependencies.push((name, key.clone())),
                None => dependencies.push((name, param_key)),
            }
        }

        Ok(Binding {
            key,
            provider: Provider::Recipe(recipe.factory),
            is_singleton,
            constants,
            dependencies,
        })
    }

    /// Copy of the registry with the binding of `key` replaced.
    ///
    /// Bindings are shared with the source registry, only the map itself is copied.
    /// The self-reference binding is always restored, even if `key` is the container's own key.
    pub(crate) fn with_override(&self, key: &Key, recipe: Recipe<F>, is_singleton: bool, args: StaticArgs) -> Result<Self, OverrideErrorKind> {
        let key = self.names.canonicalize_binding(key);
        if !self.bindings.contains_key(&key) {
            let err = OverrideErrorKind::CannotOverrideUnregistered { key };
            warn!("{}", err);
            return Err(err);
        }

        let binding = self.binding(key, recipe, is_singleton, args).inspect_err(|err| warn!("{}", err))?;
        debug!(key = %binding.key, is_singleton, "Binding overridden");

        let mut registry = self.clone();
        registry.insert(binding);
        if let Some(container) = registry.container.take() {
            registry.insert_container(container);
        }
        Ok(registry)
    }
}

/// Accumulates bindings for a container.
///
/// Every binding is validated when it's registered. Dependencies don't have to be
/// registered yet, they're checked when the container is built.
///
/// ```rust
/// use wireup::{ContainerBuilder, Key, Recipe, StaticArgs};
///
/// struct A {
///     x: i32,
///     y: String,
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register(Key::of::<i32>(), Recipe::instance(1), false, StaticArgs::new())
///     .unwrap()
///     .register("y", Recipe::instance(String::from("abacaba")), false, StaticArgs::new())
///     .unwrap()
///     .register(
///         Key::of::<A>(),
///         Recipe::new(|args| {
///             Ok(A {
///                 x: args.cloned("x")?,
///                 y: args.cloned("y")?,
///             })
///         })
///         .param("x", Key::of::<i32>())
///         .param("y", Key::of::<String>()),
///         false,
///         StaticArgs::new().dependency("y", "y"),
///     )
///     .unwrap();
///
/// let container = builder.build().unwrap();
/// let a = container.get::<A>(Key::of::<A>()).unwrap();
///
/// assert_eq!(a.x, 1);
/// assert_eq!(a.y, "abacaba");
/// ```
pub struct RegistryBuilder<F = Factory> {
    pub(crate) registry: Registry<F>,
}

impl<F> Default for RegistryBuilder<F> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<F> RegistryBuilder<F> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { registry: Registry::new() }
    }

    /// Registers `recipe` as the way to build `key`.
    ///
    /// Static arguments are matched to the recipe's parameters by name. A static
    /// [`crate::Dependency`] replaces the key of its parameter, a static value is passed as is.
    ///
    /// # Errors
    /// - Returns [`RegisterErrorKind::DuplicateBinding`] if `key` is already registered
    /// - Returns [`RegisterErrorKind::UnknownParameter`] if a static argument isn't a recipe parameter
    /// - Returns [`RegisterErrorKind::NonCallableRecipe`] if the recipe's manifest is malformed
    /// - Returns [`RegisterErrorKind::UnboundGenericParameters`] if `key` or the recipe misses type arguments
    pub fn register(
        &mut self,
        key: impl Into<Key>,
        recipe: impl Into<Recipe<F>>,
        is_singleton: bool,
        args: StaticArgs,
    ) -> Result<&mut Self, RegisterErrorKind> {
        let key = self.registry.names.canonicalize_binding(&key.into());
        if self.registry.bindings.contains_key(&key) {
            let err = RegisterErrorKind::DuplicateBinding { key };
            warn!("{}", err);
            return Err(err);
        }

        let binding = self
            .registry
            .binding(key, recipe.into(), is_singleton, args)
            .inspect_err(|err| warn!("{}", err))?;
        debug!(key = %binding.key, is_singleton, "Binding registered");

        self.registry.insert(binding);
        Ok(self)
    }

    /// Same as [`Self::register`] with `is_singleton` set.
    #[allow(clippy::missing_errors_doc)]
    #[inline]
    pub fn singleton(&mut self, key: impl Into<Key>, recipe: impl Into<Recipe<F>>, args: StaticArgs) -> Result<&mut Self, RegisterErrorKind> {
        self.register(key, recipe, true, args)
    }

    /// Number of registered bindings.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }
}
