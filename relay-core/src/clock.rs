//! Clock abstraction for TTL evaluation and token validation.
//!
//! Owning time behind a trait keeps the delivery evaluator and the JWT
//! checks deterministic in tests: inject a fixed or manually-advanced clock
//! instead of sleeping through TTL windows.

use crate::identity::Timestamp;
use chrono::Utc;
use std::sync::{Arc, RwLock};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time as a UTC timestamp.
    fn now(&self) -> Timestamp;

    /// Current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Fixed clock for deterministic tests.
///
/// Always returns the same timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Manually-advanced clock for multi-step test scenarios.
///
/// Cloning shares the underlying instant, so a test can hold one handle
/// while the engine under test holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<Timestamp>>,
}

impl ManualClock {
    /// Create a manual clock starting at the given instant.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Move the clock forward by the given duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = *now + duration;
    }

    /// Set the clock to an absolute instant.
    pub fn set(&self, instant: Timestamp) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_fixed_clock_is_constant() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(instant);
        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now_epoch_secs(), 1704067200);
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();

        clock.advance(Duration::seconds(30));
        assert_eq!(handle.now(), start + Duration::seconds(30));

        handle.set(start);
        assert_eq!(clock.now(), start);
    }
}
