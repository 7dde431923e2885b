use alloc::sync::Arc;

use crate::key::Key;

#[derive(thiserror::Error, Debug)]
pub enum RegisterErrorKind {
    #[error("Key {key} is already registered")]
    DuplicateBinding { key: Key },
    #[error("No parameter `{name}` in the recipe for {key}")]
    UnknownParameter { key: Key, name: Arc<str> },
    #[error("Can't use the recipe for {key}: {kind}")]
    NonCallableRecipe { key: Key, kind: SignatureErrorKind },
    #[error("Specify generic parameters for {key}")]
    UnboundGenericParameters { key: Key },
}

/// Reasons a recipe's declared signature can't be used.
#[derive(thiserror::Error, Debug)]
pub enum SignatureErrorKind {
    #[error("parameter `{name}` is declared more than once")]
    DuplicateParameter { name: Arc<str> },
    #[error("parameter `{name}` uses type variable `{var}` the recipe doesn't declare")]
    UndeclaredTypeVariable { name: Arc<str>, var: Arc<str> },
}
