//! Clock source
//!
//! The clinic runs on a single local timezone, so every date and timestamp
//! in the system is a naive, clinic-local value.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Source of the current date and time
pub trait Clock {
    /// Current clinic-local date and time
    fn now(&self) -> NaiveDateTime;

    /// Current clinic-local date
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock of the machine running the clinic
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        // Timestamps are stored with second precision
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Clock frozen at `date` `hour`:`minute`
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let time = chrono::NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
        Self(date.and_time(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
