//! Time-box guard.
//!
//! Cooperative: the scheduler evaluates it before every batch, never inside
//! one. A batch started before the cutoff runs to completion.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffGuard {
    day: Weekday,
    hour: u32,
}

impl CutoffGuard {
    pub fn new(day: Weekday, hour: u32) -> Self {
        Self { day, hour }
    }

    /// True when `now` falls on the cutoff day at or after the cutoff hour.
    pub fn is_past<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        now.weekday() == self.day && now.hour() >= self.hour
    }

    /// Evaluates the guard against the local wall clock.
    pub fn check_now(&self) -> bool {
        self.is_past(&Local::now())
    }
}
