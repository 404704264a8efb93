use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, TimeDelta, Utc};

use std::fmt::Display;

/// The date range an orders report covers.
///
/// Unlike the overlapping [`crate::window::Window`]s, a period makes a single
/// keep-or-drop decision for each order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    AllTime,
    /// From the first instant of the current calendar month, in UTC.
    CurrentMonth,
    /// From exactly N days before now.
    LastDays(u32),
}

impl Period {
    /// Builds a period from command-line flags.
    ///
    /// `month` takes precedence over `days`, and zero days means no limit.
    #[must_use]
    pub fn from_flags(month: bool, days: Option<u32>) -> Self {
        match (month, days) {
            (true, _) => Period::CurrentMonth,
            (false, Some(days)) if days > 0 => Period::LastDays(days),
            _ => Period::AllTime,
        }
    }

    /// Returns the earliest instant included in the period, if any.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::AllTime => None,
            Period::CurrentMonth => {
                let today = now.date_naive();
                let first = today - TimeDelta::days(i64::from(today.day0()));
                Some(first.and_time(NaiveTime::MIN).and_utc())
            }
            Period::LastDays(days) => Some(now - TimeDelta::days(i64::from(*days))),
        }
    }

    /// Returns a predicate that keeps instants on or after the cutoff.
    pub fn includes(&self, now: DateTime<Utc>) -> impl Fn(DateTime<FixedOffset>) -> bool {
        let cutoff = self.cutoff(now);
        move |at| cutoff.map_or(true, |cutoff| at.with_timezone(&Utc) >= cutoff)
    }

    /// Describes the period for a report header, naming the month as seen
    /// from `now`.
    #[must_use]
    pub fn label<Tz>(&self, now: DateTime<Tz>) -> String
    where
        Tz: chrono::TimeZone,
        Tz::Offset: Display,
    {
        match self {
            Period::AllTime => "all time".to_string(),
            Period::CurrentMonth => now.format("%B %Y").to_string(),
            Period::LastDays(days) => format!("last {days} days"),
        }
    }
}
