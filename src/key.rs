use alloc::{sync::Arc, vec::Vec};
use core::fmt::{self, Debug, Display, Formatter};

use crate::any::TypeInfo;

/// A parameterized contract, e.g. `Interface<T>`.
///
/// Contracts carry their declared type variables so a binding can be checked
/// for fully specified type arguments at registration time.
///
/// ```rust
/// use wireup::{Contract, Key};
///
/// const INTERFACE: Contract = Contract::new("Interface", &["T"]);
///
/// let key = INTERFACE.of([Key::of::<i32>()]);
/// assert!(!key.is_unbound());
/// assert!(INTERFACE.key().is_unbound());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Contract {
    name: &'static str,
    params: &'static [&'static str],
}

impl Contract {
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str, params: &'static [&'static str]) -> Self {
        Self { name, params }
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type variables, in order.
    #[inline]
    #[must_use]
    pub const fn params(&self) -> &'static [&'static str] {
        self.params
    }

    /// The contract applied to concrete type arguments.
    #[inline]
    #[must_use]
    pub fn of(&self, args: impl IntoIterator<Item = Key>) -> Key {
        Key::Generic(*self, args.into_iter().collect())
    }

    /// The bare contract without type arguments.
    #[inline]
    #[must_use]
    pub fn key(&self) -> Key {
        Key::Generic(*self, Arc::from([]))
    }
}

/// Identifier of a bound contract.
///
/// Keys are compared structurally. Names are reconciled with concrete types
/// through the container's name table before lookup, see [`Key::deferred`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    /// A concrete Rust type.
    Type(TypeInfo),
    /// A literal string name.
    Name(Arc<str>),
    /// A forward-declared name, bound to whatever gets registered under it.
    Deferred(Arc<str>),
    /// A type variable of a generic recipe or contract.
    Var(Arc<str>),
    /// A contract with its ordered type arguments.
    Generic(Contract, Arc<[Key]>),
}

impl Key {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Self::Name(name.into())
    }

    /// A name that doesn't have to be registered yet.
    /// It must be bound, either as a literal name or as the short name of a
    /// registered type, by the time the container is built.
    #[inline]
    #[must_use]
    pub fn deferred(name: impl Into<Arc<str>>) -> Self {
        Self::Deferred(name.into())
    }

    #[inline]
    #[must_use]
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Self::Var(name.into())
    }

    /// Type arguments of a generic key, empty for everything else.
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Key] {
        match self {
            Self::Generic(_, args) => args,
            _ => &[],
        }
    }

    /// Whether the key still has type variables or misses type arguments of its contract.
    #[must_use]
    pub fn is_unbound(&self) -> bool {
        match self {
            Self::Var(_) => true,
            Self::Generic(contract, args) => contract.params.len() != args.len() || args.iter().any(Key::is_unbound),
            Self::Type(_) | Self::Name(_) | Self::Deferred(_) => false,
        }
    }

    /// Type variables occurring anywhere in the key, in order of appearance.
    #[must_use]
    pub(crate) fn vars(&self) -> Vec<&Arc<str>> {
        fn collect<'a>(key: &'a Key, vars: &mut Vec<&'a Arc<str>>) {
            match key {
                Key::Var(name) => vars.push(name),
                Key::Generic(_, args) => args.iter().for_each(|arg| collect(arg, vars)),
                Key::Type(_) | Key::Name(_) | Key::Deferred(_) => {}
            }
        }

        let mut vars = Vec::new();
        collect(self, &mut vars);
        vars
    }
}

impl From<Contract> for Key {
    #[inline]
    fn from(contract: Contract) -> Self {
        contract.key()
    }
}

impl From<&str> for Key {
    #[inline]
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<&Key> for Key {
    #[inline]
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(type_info) => Display::fmt(type_info, f),
            Self::Name(name) => write!(f, "\"{name}\""),
            Self::Deferred(name) => write!(f, "'{name}'"),
            Self::Var(name) => f.write_str(name),
            Self::Generic(contract, args) => {
                f.write_str(contract.name)?;
                if args.is_empty() {
                    return Ok(());
                }
                f.write_str("<")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(arg, f)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}
