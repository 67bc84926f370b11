use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-use cancellation flag shared between a [`TaskScopes`](super::TaskScopes)
/// slot and the tasks started under it.
///
/// Once triggered it stays triggered. Restarting a scope installs a new signal.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Do both handles refer to the same underlying flag?
    #[inline]
    pub fn same_as(&self, other: &CancelSignal) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
