use alloc::boxed::Box;

use super::{instantiate::InstantiateErrorKind, instantiator::InstantiatorErrorKind};
use crate::key::Key;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No binding registered for {key}")]
    UnknownBinding { key: Key },
    #[error("Incorrect type provided for {key}. Expected: {expected}")]
    IncorrectType { key: Key, expected: &'static str },
    #[error("Failed to build {key}: {kind}")]
    Instantiator {
        key: Key,
        kind: InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>,
    },
}

impl ResolveErrorKind {
    /// The innermost error, following failed dependencies down to the binding that actually failed.
    #[must_use]
    pub fn root_cause(&self) -> &ResolveErrorKind {
        match self {
            Self::Instantiator {
                kind: InstantiatorErrorKind::Deps(err),
                ..
            } => err.root_cause(),
            _ => self,
        }
    }
}
