//! Process-wide cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to the "cancelled" flag.
///
/// Starts out `false` and is never persisted, so a restart clears it.
/// Clones share the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Create a flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Overwrite the value.
    pub fn set(&self, cancelled: bool) {
        self.cancelled.store(cancelled, Ordering::SeqCst);
    }

    /// Flip the value and return the new one.
    pub fn toggle(&self) -> bool {
        !self.cancelled.fetch_xor(true, Ordering::SeqCst)
    }
}
