//! Named, overlapping reporting windows.
//!
//! Windows are not a partition: every window is an independent test, and a
//! record from today counts towards Today, This Week and the rolling window
//! all at once.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};

use std::fmt::Display;

use crate::aggregate::Tally;

/// Calendar days covered by the This Week window, including today.
pub const WEEK_DAYS: i64 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
    Today,
    Yesterday,
    ThisWeek,
    /// The last N days, or all time if there is no limit.
    Rolling(Option<u32>),
}

impl Window {
    /// Returns the standard windows in display order.
    #[must_use]
    pub fn all(rolling_days: Option<u32>) -> [Window; 4] {
        [
            Window::Today,
            Window::Yesterday,
            Window::ThisWeek,
            Window::Rolling(rolling_days),
        ]
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Window::Today => "Today".to_string(),
            Window::Yesterday => "Yesterday".to_string(),
            Window::ThisWeek => "This Week".to_string(),
            Window::Rolling(Some(days)) => format!("Last {days}d"),
            Window::Rolling(None) => "All Time".to_string(),
        };
        f.pad(&label)
    }
}

/// Decides which windows a record of type `R` falls into.
pub trait Calendar<R> {
    fn contains(&self, window: Window, record: &R) -> bool;
}

/// Records that carry a calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Records that carry an instant with its original UTC offset.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<FixedOffset>;
}

/// Classifies calendar days against today's date in UTC.
///
/// The stats service stores its dates in UTC, so these windows are exact day
/// matches in UTC regardless of the local time zone. A rolling window of N
/// days reaches back to and includes the date N days before today, the oldest
/// date a `days=N` query returns.
#[derive(Clone, Copy, Debug)]
pub struct UtcDays {
    today: NaiveDate,
}

impl UtcDays {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            today: now.date_naive(),
        }
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    #[must_use]
    pub fn contains_date(&self, window: Window, date: NaiveDate) -> bool {
        let age = (self.today - date).num_days();
        match window {
            Window::Today => age == 0,
            Window::Yesterday => age == 1,
            Window::ThisWeek => (0..WEEK_DAYS).contains(&age),
            Window::Rolling(Some(days)) => (0..=i64::from(days)).contains(&age),
            Window::Rolling(None) => true,
        }
    }
}

impl<R: Dated> Calendar<R> for UtcDays {
    fn contains(&self, window: Window, record: &R) -> bool {
        self.contains_date(window, record.date())
    }
}

/// Classifies instants against the local calendar day of `now`.
///
/// Today runs from local midnight, Yesterday is the local day before that,
/// and This Week starts at local midnight seven days ago. The rolling window
/// counts back N whole days from `now` itself.
#[derive(Clone, Copy, Debug)]
pub struct LocalDays {
    now: DateTime<FixedOffset>,
    today_start: DateTime<FixedOffset>,
}

impl LocalDays {
    #[must_use]
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        let since_midnight = now.time().signed_duration_since(NaiveTime::MIN);
        Self {
            now,
            today_start: now - since_midnight,
        }
    }

    #[must_use]
    pub fn today_start(&self) -> DateTime<FixedOffset> {
        self.today_start
    }

    #[must_use]
    pub fn contains_instant(&self, window: Window, at: DateTime<FixedOffset>) -> bool {
        let yesterday_start = self.today_start - TimeDelta::days(1);
        let week_start = self.today_start - TimeDelta::days(WEEK_DAYS);
        match window {
            Window::Today => at >= self.today_start,
            Window::Yesterday => at >= yesterday_start && at < self.today_start,
            Window::ThisWeek => at >= week_start,
            Window::Rolling(Some(days)) => at >= self.now - TimeDelta::days(i64::from(days)),
            Window::Rolling(None) => true,
        }
    }
}

impl<R: Timestamped> Calendar<R> for LocalDays {
    fn contains(&self, window: Window, record: &R) -> bool {
        self.contains_instant(window, record.timestamp())
    }
}

/// One tally per window, in the order the windows were given.
#[derive(Clone, Debug)]
pub struct Windowed<T> {
    rows: Vec<(Window, T)>,
}

impl<T> Windowed<T> {
    /// Tallies each record into every window that contains it.
    pub fn tally<'a, R, I, C>(records: I, windows: [Window; 4], calendar: &C) -> Self
    where
        R: 'a,
        I: IntoIterator<Item = &'a R>,
        C: Calendar<R>,
        T: Tally<R>,
    {
        let mut rows: Vec<(Window, T)> = windows.iter().map(|w| (*w, T::default())).collect();
        for record in records {
            for (window, tally) in &mut rows {
                if calendar.contains(*window, record) {
                    tally.add(record);
                }
            }
        }
        Self { rows }
    }

    #[must_use]
    pub fn get(&self, window: Window) -> Option<&T> {
        self.rows
            .iter()
            .find(|(w, _)| *w == window)
            .map(|(_, tally)| tally)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Window, &T)> {
        self.rows.iter().map(|(window, tally)| (*window, tally))
    }
}
