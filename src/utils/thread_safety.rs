#[cfg(feature = "thread_safe")]
mod thread_safe {
    use alloc::sync::Arc;
    use core::any::Any;

    pub trait SendSafety: Send {}
    pub trait SyncSafety: Sync {}

    impl<T: Send> SendSafety for T {}
    impl<T: Sync> SyncSafety for T {}

    pub type RcThreadSafety<T> = Arc<T>;
    pub type RcAnyThreadSafety = RcThreadSafety<dyn Any + Send + Sync>;
}

#[cfg(not(feature = "thread_safe"))]
mod thread_unsafe {
    use alloc::rc::Rc;
    use core::any::Any;

    pub trait SendSafety {}
    pub trait SyncSafety {}

    impl<T> SendSafety for T {}
    impl<T> SyncSafety for T {}

    pub type RcThreadSafety<T> = Rc<T>;
    pub type RcAnyThreadSafety = RcThreadSafety<dyn Any>;
}

#[cfg(feature = "thread_safe")]
pub use thread_safe::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety};

#[cfg(not(feature = "thread_safe"))]
pub use thread_unsafe::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety};

/// Wraps a constructed value into a shared, type-erased handle.
#[inline]
#[must_use]
pub(crate) fn erase<T: SendSafety + SyncSafety + 'static>(value: T) -> RcAnyThreadSafety {
    RcThreadSafety::new(value)
}

/// Downcasts a type-erased handle back to `T`, giving the handle back on mismatch.
#[inline]
pub(crate) fn downcast<T: SendSafety + SyncSafety + 'static>(value: RcAnyThreadSafety) -> Result<RcThreadSafety<T>, RcAnyThreadSafety> {
    value.downcast::<T>()
}
