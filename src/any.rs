use core::{
    any::{type_name, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

use crate::utils::thread_safety::RcAnyThreadSafety;

/// Identity of a concrete Rust type together with its readable name.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Name without the module path, e.g. `Lol` for `app::models::Lol`.
    ///
    /// Generic arguments are kept as written: `Vec<app::Lol>` stays `Vec<app::Lol>`.
    /// Names that don't start with a path (tuples, references, trait objects) are returned whole.
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let path = self.name.split_once('<').map_or(self.name, |(path, _)| path);
        if !path.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':') {
            return self.name;
        }
        match path.rsplit_once("::") {
            Some((prefix, _)) => &self.name[prefix.len() + 2..],
            None => self.name,
        }
    }
}

/// A constructed value as stored by a container: shared and type-erased.
pub type Instance = RcAnyThreadSafety;
