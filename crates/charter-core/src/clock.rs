//! Time source abstraction.
//!
//! All tick and expiration logic consumes time exclusively through the
//! [`Clock`] trait so that event replay and tests can substitute a
//! controllable virtual clock for the system clock.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// A queryable UTC time source.
pub trait Clock: Send + Sync {
    /// Returns the current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for deterministic tests and replay.
///
/// The clock starts at the Unix epoch unless constructed with
/// [`VirtualClock::starting_at`]. Advancing is explicit; `now()` returns
/// the same instant until the caller moves it.
#[derive(Debug)]
pub struct VirtualClock {
    current: Mutex<DateTime<Utc>>,
}

impl VirtualClock {
    /// Creates a virtual clock fixed at the Unix epoch.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(DateTime::UNIX_EPOCH)
    }

    /// Creates a virtual clock fixed at the given instant.
    #[must_use]
    pub fn starting_at(initial: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    /// Sets the clock to a specific instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.lock().unwrap() = instant;
    }

    /// Advances the clock by whole seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        let mut current = self.current.lock().unwrap();
        *current += Duration::seconds(seconds);
    }

    /// Advances the clock by whole days.
    pub fn advance_days(&self, days: i64) {
        let mut current = self.current.lock().unwrap();
        *current += Duration::days(days);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
