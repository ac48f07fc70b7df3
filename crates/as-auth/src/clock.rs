//! Time and identifier sources.
//!
//! Issuers and validators never read the wall clock or generate random ids
//! directly. They go through [`Clock`] and [`IdGenerator`], so tests can pin
//! both to known values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use time::{Duration, OffsetDateTime};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> OffsetDateTime;
}

/// Source of unique token identifiers (`jti`).
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    fn new_id(&self) -> String;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

impl<T: IdGenerator + ?Sized> IdGenerator for &T {
    fn new_id(&self) -> String {
        (**self).new_id()
    }
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// A clock frozen at a settable instant.
///
/// Keeps full sub-second precision. The instant sits behind a mutex so
/// tests can change it through a shared reference while issuers and
/// validators borrow the clock.
#[derive(Debug)]
pub struct FixedClock {
    initial: OffsetDateTime,
    instant: Mutex<OffsetDateTime>,
}

impl FixedClock {
    /// Creates a clock frozen at the given Unix timestamp.
    ///
    /// Out-of-range timestamps read as the epoch.
    #[must_use]
    pub fn at_unix(unix_seconds: i64) -> Self {
        Self::at(from_unix(unix_seconds))
    }

    /// Creates a clock frozen at the given instant, nanoseconds included.
    #[must_use]
    pub fn at(instant: OffsetDateTime) -> Self {
        Self {
            initial: instant,
            instant: Mutex::new(instant),
        }
    }

    /// Moves the clock to the given instant.
    pub fn set(&self, instant: OffsetDateTime) {
        *self.lock() = instant;
    }

    /// Moves the clock to the given Unix timestamp.
    pub fn set_unix(&self, unix_seconds: i64) {
        self.set(from_unix(unix_seconds));
    }

    /// Moves the clock forward (or backward, for negative values).
    pub fn advance(&self, by: Duration) {
        let mut instant = self.lock();
        *instant = instant.saturating_add(by);
    }

    /// Moves the clock back to the instant it was created with.
    pub fn reset(&self) {
        self.set(self.initial);
    }

    /// Returns the current Unix timestamp of this clock, in whole seconds.
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.lock().unix_timestamp()
    }

    fn lock(&self) -> MutexGuard<'_, OffsetDateTime> {
        self.instant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.lock()
    }
}

fn from_unix(unix_seconds: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(unix_seconds).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Deterministic identifiers: `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator whose ids start with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }

    /// Restarts the sequence at 1.
    pub fn reset(&self) {
        self.next.store(1, Ordering::SeqCst);
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}
