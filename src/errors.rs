mod build;
mod instantiate;
mod instantiator;
mod overrides;
mod register;
mod resolve;

pub use build::BuildErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use overrides::OverrideErrorKind;
pub use register::{RegisterErrorKind, SignatureErrorKind};
pub use resolve::ResolveErrorKind;
