use alloc::{sync::Arc, vec::Vec};

use crate::{
    any::Instance,
    args::Args,
    errors::InstantiateErrorKind,
    key::Key,
    utils::thread_safety::{erase, RcThreadSafety, SendSafety, SyncSafety},
};

#[cfg(feature = "thread_safe")]
type BoxedFactory = RcThreadSafety<dyn Fn(Args) -> Result<Instance, InstantiateErrorKind> + Send + Sync>;

#[cfg(not(feature = "thread_safe"))]
type BoxedFactory = RcThreadSafety<dyn Fn(Args) -> Result<Instance, InstantiateErrorKind>>;

/// Type-erased synchronous recipe function.
#[derive(Clone)]
pub struct Factory(BoxedFactory);

impl Factory {
    #[inline]
    pub(crate) fn call(&self, args: Args) -> Result<Instance, InstantiateErrorKind> {
        (self.0)(args)
    }
}

/// A construction recipe: a function plus the manifest of its named parameters.
///
/// Each declared parameter is resolved from the container by its key, unless
/// the binding supplies a static argument with the same name.
///
/// ```rust
/// use wireup::{Key, Recipe};
///
/// struct A {
///     x: i32,
/// }
///
/// let recipe = Recipe::new(|args| Ok(A { x: args.cloned("x")? })).param("x", Key::of::<i32>());
/// assert_eq!(recipe.params().len(), 1);
/// ```
pub struct Recipe<F = Factory> {
    pub(crate) factory: F,
    pub(crate) params: Vec<(Arc<str>, Key)>,
    pub(crate) type_params: Vec<Arc<str>>,
    pub(crate) type_args: Option<Vec<Key>>,
}

impl Recipe {
    /// Recipe calling `f` with the resolved arguments.
    ///
    /// Every call gets its own clone of `f`, so state mutated by one call isn't seen by the next.
    pub fn new<Func, T>(f: Func) -> Self
    where
        Func: FnMut(Args) -> Result<T, InstantiateErrorKind> + Clone + SendSafety + SyncSafety + 'static,
        T: SendSafety + SyncSafety + 'static,
    {
        Self::from_factory(Factory(RcThreadSafety::new(move |args| {
            let mut call = f.clone();
            call(args).map(erase)
        })))
    }

    /// Recipe that returns a clone of a value built outside the container.
    #[inline]
    #[must_use]
    pub fn instance<T: Clone + SendSafety + SyncSafety + 'static>(val: T) -> Self {
        Self::new(move |_| Ok(val.clone()))
    }
}

impl<F> Recipe<F> {
    #[inline]
    #[must_use]
    pub(crate) fn from_factory(factory: F) -> Self {
        Self {
            factory,
            params: Vec::new(),
            type_params: Vec::new(),
            type_args: None,
        }
    }

    /// Declares a parameter `name` of type `key`.
    #[inline]
    #[must_use]
    pub fn param(mut self, name: impl Into<Arc<str>>, key: impl Into<Key>) -> Self {
        self.params.push((name.into(), key.into()));
        self
    }

    /// Declares the recipe's own type variables, usable as [`Key::Var`] in parameters.
    #[must_use]
    pub fn type_params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<str>>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Binds the recipe's type variables explicitly instead of taking them from the registered key.
    #[must_use]
    pub fn with_type_args(mut self, args: impl IntoIterator<Item = Key>) -> Self {
        self.type_args = Some(args.into_iter().collect());
        self
    }

    /// Declared parameters, in declaration order, before type variables are substituted.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[(Arc<str>, Key)] {
        &self.params
    }

    #[cfg(feature = "async")]
    #[inline]
    #[must_use]
    pub(crate) fn map_factory<G>(self, f: impl FnOnce(F) -> G) -> Recipe<G> {
        Recipe {
            factory: f(self.factory),
            params: self.params,
            type_params: self.type_params,
            type_args: self.type_args,
        }
    }
}
