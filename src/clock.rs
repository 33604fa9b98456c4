//! Time source for the dashboard timers.
//!
//! Every timer in the console (sync clock, trip countdown, detection delay,
//! notices, case rotation) reads time through [`Clock`] so tests can drive
//! them with a [`ManualClock`] instead of sleeping.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Move time forward by whole seconds
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Format seconds as `mm:ss` (minutes are not wrapped at 60)
pub fn format_timer(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timer() {
        assert_eq!(format_timer(0), "00:00");
        assert_eq!(format_timer(9), "00:09");
        assert_eq!(format_timer(90), "01:30");
        assert_eq!(format_timer(3600), "60:00");
    }

    #[test]
    fn test_manual_clock_advances_shared() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = clock.now();

        other.advance_secs(5);
        assert_eq!(clock.now() - start, Duration::from_secs(5));

        clock.advance(Duration::from_millis(250));
        assert_eq!(other.now() - start, Duration::from_millis(5250));
    }
}
