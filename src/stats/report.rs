use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use std::fmt::Display;

use crate::{
    aggregate::{Counts, Grouped},
    window::{UtcDays, Window, Windowed},
};

use super::{DownloadRecord, EventKind, EventRecord, Source, Stats};

/// How many versions the by-version table lists.
pub const TOP_VERSIONS: usize = 20;

pub const NO_DOWNLOADS: &str = "No download data found for the selected period.";
pub const NO_EVENTS: &str = "No event data found for the selected period.";
const ALL_APPS: &str = "all apps";

/// Downloads per source in each reporting window.
#[derive(Debug)]
pub struct DailyDownloads(Windowed<Counts<Source>>);

impl DailyDownloads {
    #[must_use]
    pub fn new(rows: &[DownloadRecord], days: &UtcDays, window_days: u32) -> Self {
        Self(Windowed::tally(rows, Window::all(Some(window_days)), days))
    }

    #[must_use]
    pub fn get(&self, window: Window) -> Option<&Counts<Source>> {
        self.0.get(window)
    }
}

impl Display for DailyDownloads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<15} {:>7} {:>9} {:>9} {:>9} {:>9}",
            "Period", "Total", "Sparkle", "Homebrew", "Website", "Unknown"
        )?;
        writeln!(f, "{:-<60}", "")?;
        for (window, counts) in self.0.iter() {
            write_source_row(f, &window, counts)?;
        }
        Ok(())
    }
}

fn write_source_row(
    f: &mut std::fmt::Formatter<'_>,
    name: &dyn Display,
    counts: &Counts<Source>,
) -> std::fmt::Result {
    writeln!(
        f,
        "{:<15} {:>7} {:>9} {:>9} {:>9} {:>9}",
        name.to_string(),
        counts.total(),
        counts.get(&Source::Sparkle),
        counts.get(&Source::Homebrew),
        counts.get(&Source::Website),
        counts.get(&Source::Unknown),
    )
}

/// Downloads per source for each app, busiest app first.
#[derive(Debug)]
pub struct DownloadsByApp(Grouped<String, Counts<Source>>);

impl DownloadsByApp {
    #[must_use]
    pub fn new(rows: &[DownloadRecord]) -> Self {
        Self(Grouped::by(rows, DownloadRecord::app_key))
    }

    /// Returns app names, most downloads first.
    #[must_use]
    pub fn apps(&self) -> Vec<&str> {
        self.0
            .ranked_by(Counts::total)
            .into_iter()
            .map(|(app, _)| app.as_str())
            .collect()
    }

    #[must_use]
    pub fn get(&self, app: &str) -> Counts<Source> {
        self.0.get(&app.to_string())
    }
}

impl Display for DownloadsByApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "{:<15} {:>7} {:>9} {:>9} {:>9} {:>9}",
            "App", "Total", "Sparkle", "Homebrew", "Website", "Unknown"
        )?;
        writeln!(f, "{:-<60}", "")?;
        for (app, counts) in self.0.ranked_by(Counts::total) {
            write_source_row(f, app, counts)?;
        }
        Ok(())
    }
}

/// Downloads for the most popular app versions.
#[derive(Debug)]
pub struct DownloadsByVersion(Grouped<String, Counts<Source>>);

impl DownloadsByVersion {
    #[must_use]
    pub fn new(rows: &[DownloadRecord]) -> Self {
        Self(Grouped::by(rows, DownloadRecord::version_key))
    }

    /// Returns the top versions with their counts, most downloads first.
    #[must_use]
    pub fn top(&self) -> Vec<(&String, &Counts<Source>)> {
        self.0.top_by(TOP_VERSIONS, Counts::total)
    }
}

impl Display for DownloadsByVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "{:<25} {:>7} {:>9} {:>9}",
            "App Version", "Total", "Sparkle", "Website"
        )?;
        writeln!(f, "{:-<50}", "")?;
        for (version, counts) in self.top() {
            writeln!(
                f,
                "{version:<25} {:>7} {:>9} {:>9}",
                counts.total(),
                counts.get(&Source::Sparkle),
                counts.get(&Source::Website),
            )?;
        }
        Ok(())
    }
}

/// User events of each kind in each reporting window.
#[derive(Debug)]
pub struct EventSummary {
    today: NaiveDate,
    windows: Windowed<Counts<EventKind>>,
}

impl EventSummary {
    #[must_use]
    pub fn new(events: &[EventRecord], days: &UtcDays, window_days: u32) -> Self {
        Self {
            today: days.today(),
            windows: Windowed::tally(events, Window::all(Some(window_days)), days),
        }
    }

    #[must_use]
    pub fn get(&self, window: Window) -> Option<&Counts<EventKind>> {
        self.windows.get(window)
    }
}

impl Display for EventSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "User Events — {}", self.today.format("%Y-%m-%d"))?;
        writeln!(
            f,
            "{:<15} {:>10} {:>15} {:>11}",
            "Period", "New Free", "Early Adopter", "Activated"
        )?;
        writeln!(f, "{:-<55}", "")?;
        for (window, counts) in self.windows.iter() {
            writeln!(
                f,
                "{:<15} {:>10} {:>15} {:>11}",
                window,
                counts.get(&EventKind::NewFreeUser),
                counts.get(&EventKind::EarlyAdopterGrant),
                counts.get(&EventKind::LicenseActivated),
            )?;
        }
        Ok(())
    }
}


/// Which tables a download report shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatsView {
    /// By app and by version, then events.
    #[default]
    Summary,
    /// Sources per reporting window, then events.
    Daily,
    /// Events only.
    Events,
}

/// A complete download report for one stats response.
///
/// Renders a single "no data" line, and no tables, when the response has
/// nothing for the chosen view.
#[derive(Debug)]
pub struct DownloadReport<'a> {
    stats: &'a Stats,
    view: StatsView,
    app: Option<&'a str>,
    window_days: u32,
    now: DateTime<FixedOffset>,
}

impl<'a> DownloadReport<'a> {
    /// Creates a report as of `now`, given in the local offset. Windows are
    /// still classified by UTC date; `now` only dates the header.
    #[must_use]
    pub fn new(
        stats: &'a Stats,
        view: StatsView,
        app: Option<&'a str>,
        window_days: u32,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            stats,
            view,
            app,
            window_days,
            now,
        }
    }
}

impl Display for DownloadReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Stats { rows, events } = self.stats;
        let days = UtcDays::new(self.now.with_timezone(&Utc));
        let app = self.app.unwrap_or(ALL_APPS);
        let date = self.now.format("%Y-%m-%d");

        if self.view == StatsView::Events {
            if events.is_empty() {
                return writeln!(f, "{NO_EVENTS}");
            }
            writeln!(f, "Event Analytics — {app} — {date}")?;
            return write!(f, "{}", EventSummary::new(events, &days, self.window_days));
        }

        if rows.is_empty() {
            return writeln!(f, "{NO_DOWNLOADS}");
        }
        writeln!(f, "Download Analytics — {app} — {date}")?;
        writeln!(f)?;
        if self.view == StatsView::Daily {
            write!(f, "{}", DailyDownloads::new(rows, &days, self.window_days))?;
        } else {
            write!(f, "{}", DownloadsByApp::new(rows))?;
            write!(f, "{}", DownloadsByVersion::new(rows))?;
        }
        if !events.is_empty() {
            write!(f, "{}", EventSummary::new(events, &days, self.window_days))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::stats::StatsPayload;

    use std::fs;

    fn stats() -> crate::stats::Stats {
        let body = fs::read_to_string("testdata/stats.json").unwrap();
        StatsPayload::from_body(&body).unwrap().stats
    }

    fn days() -> UtcDays {
        UtcDays::new("2026-10-17T10:00:00Z".parse().unwrap())
    }

    #[test]
    fn daily_downloads_counts_each_record_in_every_matching_window() {
        let daily = DailyDownloads::new(&stats().rows, &days(), 90);
        let totals: Vec<_> = Window::all(Some(90))
            .into_iter()
            .map(|w| daily.get(w).unwrap().total())
            .collect();
        assert_eq!(totals, vec![8, 7, 21, 40]);
        let week = daily.get(Window::ThisWeek).unwrap();
        assert_eq!(week.get(&Source::Sparkle), 15);
        assert_eq!(week.get(&Source::Unknown), 0);
        let rolling = daily.get(Window::Rolling(Some(90))).unwrap();
        assert_eq!(rolling.get(&Source::Unknown), 7);
        assert_eq!(rolling.get(&Source::Homebrew), 3);
        assert_eq!(rolling.get(&Source::Sparkle), 25);
    }

    #[test]
    fn daily_downloads_rolling_window_agrees_with_by_app_totals() {
        let rows = stats().rows;
        let daily = DailyDownloads::new(&rows, &days(), 90);
        let by_app = DownloadsByApp::new(&rows);
        let by_app_total: u64 = by_app.apps().iter().map(|app| by_app.get(app).total()).sum();
        assert_eq!(daily.get(Window::Rolling(Some(90))).unwrap().total(), by_app_total);
    }

    #[test]
    fn daily_downloads_display_lists_windows_in_order() {
        let text = DailyDownloads::new(&stats().rows, &days(), 90).to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Period"));
        assert_eq!(
            lines[2],
            "Today                 8         5         1         2         0"
        );
        assert!(lines[5].starts_with("Last 90d"));
    }

    #[test]
    fn downloads_by_app_ranks_apps_by_total() {
        let by_app = DownloadsByApp::new(&stats().rows);
        assert_eq!(by_app.apps(), vec!["SaneBar", "SaneClip"]);
        let sanebar = by_app.get("SaneBar");
        assert_eq!(sanebar.total(), 29);
        assert_eq!(
            sanebar.total(),
            sanebar.iter().map(|(_, count)| count).sum::<u64>()
        );
        assert_eq!(by_app.get("SaneHosts").total(), 0);
    }

    #[test]
    fn downloads_by_version_ranks_versions_by_total() {
        let by_version = DownloadsByVersion::new(&stats().rows);
        let top: Vec<_> = by_version
            .top()
            .into_iter()
            .map(|(version, counts)| (version.as_str(), counts.total()))
            .collect();
        assert_eq!(
            top,
            vec![
                ("SaneBar 2.1.0", 11),
                ("SaneBar 1.9.0", 10),
                ("SaneBar 2.0.9", 8),
                ("SaneClip 1.0.2", 7),
                ("SaneClip 1.0.3", 4),
            ]
        );
    }

    #[test]
    fn downloads_by_version_keeps_top_twenty() {
        let rows: Vec<DownloadRecord> = (0..25)
            .map(|i| DownloadRecord {
                date: "2026-10-17".parse().unwrap(),
                app: Some("SaneBar".into()),
                version: Some(format!("1.{i}")),
                source: Source::Sparkle,
                count: 100 - i,
            })
            .collect();
        let by_version = DownloadsByVersion::new(&rows);
        let top = by_version.top();
        assert_eq!(top.len(), TOP_VERSIONS);
        assert_eq!(top[0].0, "SaneBar 1.0");
        assert_eq!(top[19].0, "SaneBar 1.19");
        assert_eq!(by_version.to_string().lines().count(), 3 + TOP_VERSIONS);
    }

    #[test]
    fn event_summary_counts_events_per_window() {
        let summary = EventSummary::new(&stats().events, &days(), 90);
        let today = summary.get(Window::Today).unwrap();
        assert_eq!(today.get(&EventKind::NewFreeUser), 3);
        assert_eq!(today.get(&EventKind::LicenseActivated), 1);
        let yesterday = summary.get(Window::Yesterday).unwrap();
        assert_eq!(yesterday.get(&EventKind::EarlyAdopterGrant), 2);
        let week = summary.get(Window::ThisWeek).unwrap();
        assert_eq!(week.get(&EventKind::NewFreeUser), 7);
        let rolling = summary.get(Window::Rolling(Some(90))).unwrap();
        assert_eq!(rolling.get(&EventKind::LicenseActivated), 6);
        assert!(summary.to_string().contains("User Events — 2026-10-17"));
    }

    fn local_now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-10-17T10:00:00+00:00").unwrap()
    }

    #[test]
    fn download_report_without_rows_prints_only_no_data_message() {
        let empty = Stats {
            rows: Vec::new(),
            events: stats().events,
        };
        for view in [StatsView::Summary, StatsView::Daily] {
            let text = DownloadReport::new(&empty, view, None, 90, local_now()).to_string();
            assert_eq!(text, format!("{NO_DOWNLOADS}\n"));
        }
    }

    #[test]
    fn download_report_events_view_without_events_prints_only_no_data_message() {
        let empty = Stats {
            rows: stats().rows,
            events: Vec::new(),
        };
        let text = DownloadReport::new(&empty, StatsView::Events, None, 90, local_now()).to_string();
        assert_eq!(text, format!("{NO_EVENTS}\n"));
    }

    #[test]
    fn download_report_summary_shows_apps_versions_and_events() {
        let stats = stats();
        let text =
            DownloadReport::new(&stats, StatsView::Summary, Some("sanebar"), 90, local_now()).to_string();
        assert!(text.starts_with("Download Analytics — sanebar — 2026-10-17\n"));
        assert!(text.contains("App Version"));
        assert!(text.contains("User Events — 2026-10-17"));
        assert!(!text.contains("No download data"));
    }

    #[test]
    fn download_report_daily_view_shows_windows_without_app_table() {
        let stats = Stats {
            rows: stats().rows,
            events: Vec::new(),
        };
        let text = DownloadReport::new(&stats, StatsView::Daily, None, 90, local_now()).to_string();
        assert!(text.starts_with("Download Analytics — all apps — 2026-10-17\n"));
        assert!(text.contains("Last 90d"));
        assert!(!text.contains("App Version"));
        assert!(!text.contains("User Events"));
    }

    #[test]
    fn download_report_dates_header_locally_but_windows_in_utc() {
        let stats = Stats {
            rows: vec![DownloadRecord {
                date: "2026-10-18".parse().unwrap(),
                app: Some("SaneBar".into()),
                version: Some("2.1.0".into()),
                source: Source::Website,
                count: 5,
            }],
            events: Vec::new(),
        };
        // Still the 17th locally, already the 18th in UTC.
        let now = DateTime::parse_from_rfc3339("2026-10-17T20:00:00-07:00").unwrap();
        let text = DownloadReport::new(&stats, StatsView::Daily, None, 90, now).to_string();
        assert!(text.starts_with("Download Analytics — all apps — 2026-10-17\n"));
        let today = text.lines().find(|line| line.starts_with("Today")).unwrap();
        assert_eq!(today.split_whitespace().nth(1), Some("5"));
    }
}
