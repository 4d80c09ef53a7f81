//! Timer adapter.
//!
//! Implements [`Clock`] on top of `async-io-mini` timers, which sit on the
//! same select-based reactor on ESP-IDF and on the host.

use core::time::Duration;

use async_io_mini::Timer;

use crate::app::ports::Clock;

/// Production clock: every sleep is a real timer wait.
#[derive(Debug, Default)]
pub struct TimerClock;

impl TimerClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for TimerClock {
    async fn sleep(&mut self, duration: Duration) {
        Timer::after(duration).await;
    }
}
