use super::{build::BuildErrorKind, register::RegisterErrorKind};
use crate::key::Key;

#[derive(thiserror::Error, Debug)]
pub enum OverrideErrorKind {
    #[error("Can't override {key} without any registration")]
    CannotOverrideUnregistered { key: Key },
    #[error(transparent)]
    Register(#[from] RegisterErrorKind),
    #[error(transparent)]
    Build(#[from] BuildErrorKind),
}
