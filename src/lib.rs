#![no_std]

extern crate alloc;

pub(crate) mod any;
pub(crate) mod args;
pub(crate) mod cache;
pub(crate) mod container;
pub(crate) mod dependency;
pub(crate) mod errors;
pub(crate) mod generic;
pub(crate) mod graph;
pub(crate) mod key;
pub(crate) mod lock;
pub(crate) mod names;
pub(crate) mod recipe;
pub(crate) mod registry;

pub mod utils;

#[cfg(feature = "async")]
pub mod async_impl;

pub use any::{Instance, TypeInfo};
pub use args::Args;
pub use container::{Container, ContainerBuilder};
pub use dependency::{Dependency, StaticArg, StaticArgs};
pub use errors::{
    BuildErrorKind, InstantiateErrorKind, InstantiatorErrorKind, OverrideErrorKind, RegisterErrorKind, ResolveErrorKind, SignatureErrorKind,
};
pub use key::{Contract, Key};
pub use recipe::{Factory, Recipe};
pub use registry::RegistryBuilder;
