//! # Clock
//!
//! Time source for the register. Every deadline the session keeps (banner
//! dismissal, scanner reset, focus restore) is compared against
//! [`Clock::now_ms`], so tests drive time with [`ManualClock`] instead of
//! sleeping.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Source of the current time.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Wall-clock timestamp, used to stamp completed sales.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Local calendar date, used for expiry defaults and warnings.
    fn today(&self) -> NaiveDate;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the session.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Starts at the given instant.
    pub fn at(start: DateTime<Utc>) -> Self {
        ManualClock {
            now_ms: Rc::new(Cell::new(start.timestamp_millis().max(0) as u64)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_ms.set(ms);
    }
}

impl Default for ManualClock {
    /// 2023-05-01 12:00 UTC.
    fn default() -> Self {
        ManualClock::at(Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_ms.get() as i64)
            .single()
            .unwrap_or_default()
    }

    /// The UTC date, so tests do not depend on the machine's time zone.
    fn today(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}
