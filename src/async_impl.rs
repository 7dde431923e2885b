pub(crate) mod container;
pub(crate) mod factory;
pub(crate) mod service;

pub use container::{Container, ContainerBuilder};
pub use factory::Factory;
