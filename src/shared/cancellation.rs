use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Cooperative cancellation signal: an optional deadline plus an explicit flag.
///
/// Long-running operations poll [`Cancellation::is_cancelled`] between storage
/// calls. Clones share the flag, so cancelling one cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    /// Never fires on its own
    pub fn none() -> Self {
        Self::default()
    }

    /// Fires once `timeout` has elapsed from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            flag: Arc::default(),
        }
    }

    #[cfg(test)]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
