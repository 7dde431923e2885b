use alloc::boxed::Box;
use core::fmt::{self, Display, Formatter};

use crate::key::Key;

#[derive(thiserror::Error, Debug)]
pub enum BuildErrorKind {
    MissingDependency { key: Key, parent: Key },
    CyclicDependency { key: Key, cycle: Box<[Key]> },
}

impl Display for BuildErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BuildErrorKind::MissingDependency { key, parent } => {
                write!(f, "No dependency of type {key} needed by {parent}")?;
            }
            BuildErrorKind::CyclicDependency { key, cycle } => {
                write!(f, "Cyclic dependency detected for {key}: ")?;
                for (index, key) in cycle.iter().enumerate() {
                    if index > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{key}")?;
                }
            }
        }
        Ok(())
    }
}
