//! Cooperative cancellation shared between the caller and scan workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable flag that signals an in-flight operation to stop.
///
/// Clones share the same flag. Workers poll [`is_cancelled`](Self::is_cancelled)
/// between files and between read chunks.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    /// Shared cancellation flag
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
