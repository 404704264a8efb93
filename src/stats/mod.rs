//! Download and user-event analytics from the distribution stats API.

use chrono::NaiveDate;
use log::info;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull, DeserializeFromStr};

use std::{convert::Infallible, fmt::Display, str::FromStr};

use crate::{
    aggregate::{Counts, Tally},
    client::{parse_json, Client},
    error::{snippet, ReportError},
    window::Dated,
};

pub mod report;

pub use report::{
    DailyDownloads, DownloadReport, DownloadsByApp, DownloadsByVersion, EventSummary, StatsView,
};

pub const DEFAULT_BASE_URL: &str = "https://dist.saneapps.com";
pub const STATS_PATH: &str = "/api/stats";
/// Days of history requested when none are given.
pub const DEFAULT_DAYS: u32 = 90;
/// Label for records that don't say which app or version they belong to.
pub const UNKNOWN: &str = "unknown";

/// The channel a download came through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr)]
pub enum Source {
    Sparkle,
    Homebrew,
    Website,
    #[default]
    Unknown,
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "sparkle" => Source::Sparkle,
            "homebrew" => Source::Homebrew,
            "website" => Source::Website,
            _ => Source::Unknown,
        })
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Source::Sparkle => "sparkle",
            Source::Homebrew => "homebrew",
            Source::Website => "website",
            Source::Unknown => UNKNOWN,
        };
        f.pad(name)
    }
}

/// A kind of user event. Kinds this tool doesn't know are kept by name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr)]
pub enum EventKind {
    NewFreeUser,
    EarlyAdopterGrant,
    LicenseActivated,
    Other(String),
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "new_free_user" => EventKind::NewFreeUser,
            "early_adopter_grant" => EventKind::EarlyAdopterGrant,
            "license_activated" => EventKind::LicenseActivated,
            other => EventKind::Other(other.to_string()),
        })
    }
}

/// Downloads of one app version through one source on one UTC day.
#[serde_as]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DownloadRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub source: Source,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub count: u64,
}

impl DownloadRecord {
    #[must_use]
    pub fn app(&self) -> &str {
        self.app.as_deref().unwrap_or(UNKNOWN)
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(UNKNOWN)
    }

    /// Grouping key for per-app totals.
    #[must_use]
    pub fn app_key(&self) -> String {
        self.app().to_string()
    }

    /// Grouping key for per-version totals: app name, then version.
    #[must_use]
    pub fn version_key(&self) -> String {
        format!("{} {}", self.app(), self.version())
    }
}

impl Dated for DownloadRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Tally<DownloadRecord> for Counts<Source> {
    fn add(&mut self, record: &DownloadRecord) {
        self.add_count(record.source, record.count);
    }
}

/// Occurrences of one kind of user event on one UTC day.
#[serde_as]
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EventRecord {
    pub date: NaiveDate,
    pub event: EventKind,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub count: u64,
}

impl Dated for EventRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Tally<EventRecord> for Counts<EventKind> {
    fn add(&mut self, record: &EventRecord) {
        self.add_count(record.event.clone(), record.count);
    }
}

/// The records in one stats API response.
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Stats {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub rows: Vec<DownloadRecord>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

/// A stats API response, both as sent and as parsed.
#[derive(Clone, Debug)]
pub struct StatsPayload {
    pub raw: Value,
    pub stats: Stats,
}

impl StatsPayload {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::MalformedResponse`] if `body` isn't JSON, or
    /// doesn't have the expected shape.
    pub fn from_body(body: &str) -> Result<Self, ReportError> {
        let raw: Value = parse_json(body)?;
        let stats = Stats::deserialize(&raw).map_err(|source| ReportError::MalformedResponse {
            snippet: snippet(body),
            source,
        })?;
        Ok(Self { raw, stats })
    }
}

/// What to ask the stats API for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsQuery {
    pub days: u32,
    pub app: Option<String>,
}

impl Default for StatsQuery {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            app: None,
        }
    }
}

impl StatsQuery {
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("days", self.days.to_string())];
        if let Some(app) = &self.app {
            params.push(("app", app.clone()));
        }
        params
    }
}

/// Fetches download and event records in a single request.
///
/// # Errors
///
/// Returns any transport, status or decoding error; there are no retries.
pub fn fetch(client: &Client, query: &StatsQuery) -> Result<StatsPayload, ReportError> {
    let body = client.get_text(STATS_PATH, &query.params(), None)?;
    let payload = StatsPayload::from_body(&body)?;
    info!(
        "fetched {} download rows and {} event rows",
        payload.stats.rows.len(),
        payload.stats.events.len()
    );
    Ok(payload)
}
