//! Cooperative stop signal for the long-running tasks.
//!
//! Production firmware never cancels; tests and host simulation do, so
//! the sampling loop and the link task can be driven to completion.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// One waiter per token: [`Signal`] wakes a single task.
pub struct CancelToken {
    cancelled: AtomicBool,
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            signal: Signal::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.signal.signal(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.signal.wait().await;
    }
}
