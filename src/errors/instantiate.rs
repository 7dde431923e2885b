use alloc::{boxed::Box, sync::Arc};

use super::resolve::ResolveErrorKind;

/// Errors returned by recipes.
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("Missing argument `{name}`")]
    MissingArgument { name: Arc<str> },
    #[error("Incorrect type of argument `{name}`. Expected: {expected}")]
    IncorrectArgumentType { name: Arc<str>, expected: &'static str },
    #[error("{0}")]
    Resolve(Box<ResolveErrorKind>),
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl From<ResolveErrorKind> for InstantiateErrorKind {
    #[inline]
    fn from(err: ResolveErrorKind) -> Self {
        Self::Resolve(Box::new(err))
    }
}
