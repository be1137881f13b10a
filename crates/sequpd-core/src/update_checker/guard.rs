//! RAII guard that marks a checker idle again when dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Held by the running session; clears the in-flight flag on drop.
pub(super) struct SessionGuard {
    active: Arc<AtomicBool>,
}

impl SessionGuard {
    /// Claim the flag. Returns `None` if another session already holds it.
    pub(super) fn try_acquire(active: &Arc<AtomicBool>) -> Option<Self> {
        active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                active: Arc::clone(active),
            })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
