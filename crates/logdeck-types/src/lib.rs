//! Shared types for logdeck
//!
//! This crate contains data structures used across multiple logdeck crates.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Debug,
    Warn,
    Error,
}

impl LogLevel {
    /// All levels in display order
    pub const ALL: [LogLevel; 4] = [Self::Info, Self::Debug, Self::Warn, Self::Error];

    /// Parse a level token, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Position in the fixed display order
    pub fn index(&self) -> usize {
        match self {
            Self::Info => 0,
            Self::Debug => 1,
            Self::Warn => 2,
            Self::Error => 3,
        }
    }

    /// Wire name, as sent to the log service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Lower-case key used by configuration and filter toggles
    pub fn key(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Short display string (3 chars)
    pub fn short(&self) -> &'static str {
        match self {
            Self::Info => "INF",
            Self::Debug => "DBG",
            Self::Warn => "WRN",
            Self::Error => "ERR",
        }
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Blue,
            Self::Debug => Color::Cyan,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single application log record as returned by the log service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Opaque record identifier
    pub id: String,

    /// Human readable record name (e.g. "LOG-000042")
    pub name: String,

    pub level: LogLevel,

    /// Creation instant on the platform clock
    pub created: DateTime<Utc>,

    pub short_message: String,

    /// Class or location that emitted the record
    pub location: String,

    /// Record the log entry refers to, if any
    pub affected_id: Option<String>,
}

impl LogRecord {
    /// Link to the record page
    pub fn record_link(&self) -> String {
        format!("/{}", self.id)
    }
}

/// Pre-aggregated count row for a single level, as computed by the log service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCountRow {
    pub level: LogLevel,
    pub count: u64,
    pub first_created: Option<DateTime<Utc>>,
}

/// Count and first-seen instant for one level
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSummary {
    pub level: LogLevel,
    pub count: u64,
    /// None when count is zero
    pub first_created: Option<DateTime<Utc>>,
}

impl LevelSummary {
    /// An empty summary for the given level
    pub fn empty(level: LogLevel) -> Self {
        Self {
            level,
            count: 0,
            first_created: None,
        }
    }

    /// Title of the bulk delete action for this level
    pub fn delete_title(&self) -> String {
        format!("Delete {} logs", self.level)
    }
}

/// Per-date, per-level count row feeding the chart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateLevelCount {
    pub date: NaiveDate,
    pub level: LogLevel,
    pub count: u64,
}

impl DateLevelCount {
    pub fn new(date: NaiveDate, level: LogLevel, count: u64) -> Self {
        Self { date, level, count }
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Relative date range used by the storage summary and bulk delete
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateRange {
    Today,
    Yesterday,
    #[default]
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    LastYear,
    /// No date restriction
    AllTime,
}

impl DateRange {
    pub const ALL: [DateRange; 9] = [
        Self::Today,
        Self::Yesterday,
        Self::ThisWeek,
        Self::LastWeek,
        Self::ThisMonth,
        Self::LastMonth,
        Self::ThisYear,
        Self::LastYear,
        Self::AllTime,
    ];

    /// Wire token; None means all time
    pub fn token(&self) -> Option<&'static str> {
        match self {
            Self::Today => Some("TODAY"),
            Self::Yesterday => Some("YESTERDAY"),
            Self::ThisWeek => Some("THIS_WEEK"),
            Self::LastWeek => Some("LAST_WEEK"),
            Self::ThisMonth => Some("THIS_MONTH"),
            Self::LastMonth => Some("LAST_MONTH"),
            Self::ThisYear => Some("THIS_YEAR"),
            Self::LastYear => Some("LAST_YEAR"),
            Self::AllTime => None,
        }
    }

    /// Parse a wire token. Empty, "null" and "ALL_TIME" select all time.
    pub fn parse(s: &str) -> Option<Self> {
        let token = s.trim().to_uppercase();
        if token.is_empty() || token == "NULL" || token == "ALL_TIME" {
            return Some(Self::AllTime);
        }
        Self::ALL
            .into_iter()
            .find(|range| range.token() == Some(token.as_str()))
    }

    /// Get display label for this range
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::ThisWeek => "This Week",
            Self::LastWeek => "Last Week",
            Self::ThisMonth => "This Month",
            Self::LastMonth => "Last Month",
            Self::ThisYear => "This Year",
            Self::LastYear => "Last Year",
            Self::AllTime => "All Time",
        }
    }

    /// Cycle to the next range
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|r| r == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Cycle to the previous range
    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|r| r == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Inclusive calendar bounds relative to `today`. None means unbounded.
    ///
    /// Weeks start on Sunday.
    pub fn bounds(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let week_start =
            today.checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_sunday())))?;
        let month_start = today.with_day(1)?;
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;

        match self {
            Self::Today => Some((today, today)),
            Self::Yesterday => {
                let day = today.pred_opt()?;
                Some((day, day))
            }
            Self::ThisWeek => Some((week_start, week_start.checked_add_days(Days::new(6))?)),
            Self::LastWeek => Some((
                week_start.checked_sub_days(Days::new(7))?,
                week_start.pred_opt()?,
            )),
            Self::ThisMonth => Some((
                month_start,
                month_start.checked_add_months(Months::new(1))?.pred_opt()?,
            )),
            Self::LastMonth => Some((
                month_start.checked_sub_months(Months::new(1))?,
                month_start.pred_opt()?,
            )),
            Self::ThisYear => Some((
                year_start,
                NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            )),
            Self::LastYear => Some((
                NaiveDate::from_ymd_opt(today.year() - 1, 1, 1)?,
                year_start.pred_opt()?,
            )),
            Self::AllTime => None,
        }
    }

    /// Check whether a date falls in this range relative to `today`
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self.bounds(today) {
            Some((start, end)) => start <= date && date <= end,
            None => true,
        }
    }
}

/// Number of records requested per fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    Fifty,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [Self::Ten, Self::Twenty, Self::Fifty];

    pub fn value(&self) -> u32 {
        match self {
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
        }
    }

    /// Exact match against the supported sizes
    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.value() == value)
    }

    /// Resolve a configured default; anything unsupported falls back to 10
    pub fn from_configured(value: Option<u32>) -> Self {
        value.and_then(Self::from_value).unwrap_or_default()
    }

    /// Cycle to the next size
    pub fn next(&self) -> Self {
        match self {
            Self::Ten => Self::Twenty,
            Self::Twenty => Self::Fifty,
            Self::Fifty => Self::Ten,
        }
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.value()
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("unsupported page size: {}", value))
    }
}

/// Parameters sent with every log listing fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Selected levels, never empty
    #[serde(rename = "logLevels")]
    pub levels: Vec<LogLevel>,

    #[serde(rename = "logsPerPage")]
    pub page_size: PageSize,

    /// Changes on every fetch to defeat intermediate caches
    pub cache_buster: i64,

    /// Only records created at or after this instant (set while tailing)
    pub since: Option<DateTime<Utc>>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            levels: vec![LogLevel::Info],
            page_size: PageSize::default(),
            cache_buster: 0,
            since: None,
        }
    }
}

// ============================================================================
// Chart Types
// ============================================================================

/// Presentation of the per-date chart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChartType {
    Line,
    #[default]
    Bar,
    StackedBar,
    Area,
    Off,
}

impl ChartType {
    /// Parse a supported chart type token
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "line" => Some(Self::Line),
            "bar" => Some(Self::Bar),
            "stackedBar" => Some(Self::StackedBar),
            "area" => Some(Self::Area),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::StackedBar => "stackedBar",
            Self::Area => "area",
            Self::Off => "off",
        }
    }

    /// Whether level series are drawn on top of each other
    pub fn is_stacked(&self) -> bool {
        matches!(self, Self::StackedBar | Self::Area)
    }

    pub fn is_visible(&self) -> bool {
        *self != Self::Off
    }

    /// Cycle through the presentations, ending with the chart hidden
    pub fn next(&self) -> Self {
        match self {
            Self::Bar => Self::StackedBar,
            Self::StackedBar => Self::Line,
            Self::Line => Self::Area,
            Self::Area => Self::Off,
            Self::Off => Self::Bar,
        }
    }
}

// ============================================================================
// Tailing Types
// ============================================================================

/// Lifecycle of push-driven tailing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TailState {
    #[default]
    Idle,
    Subscribing,
    Tailing,
    Unsubscribing,
}

impl TailState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Subscribing => "subscribing",
            Self::Tailing => "tailing",
            Self::Unsubscribing => "unsubscribing",
        }
    }
}

/// Where a new subscription starts reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayFrom {
    /// Only messages published after subscribing
    Latest,
    /// Every retained message
    Earliest,
    /// Messages after the given replay id
    After(i64),
}

/// A message received from the push channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub topic: String,
    pub replay_id: i64,
    pub payload: serde_json::Value,
}

// ============================================================================
// Notification Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn color(&self) -> Color {
        match self {
            Self::Success => Color::Green,
            Self::Info => Color::Cyan,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

/// User-facing notification (toast)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("Success", message, Severity::Success)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message, Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_level_parse_ignores_case_and_whitespace() {
        assert_eq!(LogLevel::parse(" Warn "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("ERROR"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("trace"), None);
    }

    #[test]
    fn test_page_size_fallback() {
        assert_eq!(PageSize::from_configured(Some(15)), PageSize::Ten);
        assert_eq!(PageSize::from_configured(None), PageSize::Ten);
        assert_eq!(PageSize::from_configured(Some(50)), PageSize::Fifty);
    }

    #[test]
    fn test_query_params_wire_shape() {
        let params = QueryParams {
            levels: vec![LogLevel::Info, LogLevel::Warn],
            page_size: PageSize::Twenty,
            cache_buster: 42,
            since: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["logLevels"], serde_json::json!(["INFO", "WARN"]));
        assert_eq!(json["logsPerPage"], 20);
        assert_eq!(json["cacheBuster"], 42);
    }

    #[test]
    fn test_date_range_bounds() {
        // 2024-01-10 is a Wednesday
        let today = date(2024, 1, 10);
        assert_eq!(
            DateRange::ThisWeek.bounds(today),
            Some((date(2024, 1, 7), date(2024, 1, 13)))
        );
        assert_eq!(
            DateRange::LastWeek.bounds(today),
            Some((date(2023, 12, 31), date(2024, 1, 6)))
        );
        assert_eq!(
            DateRange::LastMonth.bounds(today),
            Some((date(2023, 12, 1), date(2023, 12, 31)))
        );
        assert_eq!(
            DateRange::ThisMonth.bounds(date(2024, 2, 10)),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(DateRange::AllTime.bounds(today), None);
        assert!(DateRange::Yesterday.contains(date(2024, 1, 9), today));
        assert!(!DateRange::Today.contains(date(2024, 1, 9), today));
    }

    #[test]
    fn test_date_range_tokens() {
        assert_eq!(DateRange::parse("last_month"), Some(DateRange::LastMonth));
        assert_eq!(DateRange::parse("null"), Some(DateRange::AllTime));
        assert_eq!(DateRange::parse("NEXT_WEEK"), None);
        assert_eq!(DateRange::AllTime.next(), DateRange::Today);
        assert_eq!(DateRange::Today.prev(), DateRange::AllTime);
    }

    #[test]
    fn test_chart_type_parse() {
        assert_eq!(ChartType::parse("stackedBar"), Some(ChartType::StackedBar));
        assert_eq!(ChartType::Off.next(), ChartType::Bar);
        assert_eq!(ChartType::parse("pie"), None);
        assert!(ChartType::Area.is_stacked());
        assert!(!ChartType::Off.is_visible());
    }
}
