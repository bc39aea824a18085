//! Time abstraction for testability.
//!
//! This module provides a `Clock` trait that abstracts over calendar time,
//! enabling deterministic testing of retention-cutoff arithmetic.
//!
//! # Example
//!
//! ```
//! use mailsweep_core::time::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let today = clock.today();
//! let cutoff = today - chrono::Days::new(30);
//! assert!(cutoff < today);
//! ```

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Abstraction over calendar time for testability.
///
/// In production, use [`SystemClock`] which delegates to the system clock.
/// In tests, use [`FixedClock`] to pin a date deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current calendar date, as observed by the deployment.
    fn today(&self) -> NaiveDate;
}

/// System clock that uses real time.
///
/// `today()` is evaluated in the deployment's local time zone, so retention
/// cutoffs follow the calendar the mailbox owner lives in.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a fixed instant, for testing date-dependent code.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use mailsweep_core::time::{Clock, FixedClock};
///
/// let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
/// let clock = FixedClock::on_date(date);
/// assert_eq!(clock.today(), date);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Creates a clock pinned to the given instant.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Creates a clock pinned to noon UTC on the given date.
    ///
    /// Noon keeps the pinned instant and the pinned date on the same calendar
    /// day regardless of small offsets applied in tests.
    #[must_use]
    #[allow(clippy::expect_used)] // 12:00:00 is always a valid time
    pub fn on_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .expect("12:00:00 is a valid time")
            .and_utc();
        Self { now: noon }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
