//! Calendar-day normalization for exam and student dates.
//!
//! Dates reach the service in several shapes: ISO strings (optionally with a
//! time and offset), spreadsheet serial numbers, and a fixed set of textual
//! layouts produced by hand-edited sheets. Every shape is resolved once, at the
//! boundary, into a [`CalendarDay`] which is then compared by value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Date as supplied by a caller or stored in a document.
///
/// JSON numbers are spreadsheet serial dates; JSON strings are classified when
/// parsed (ISO first, then each [`TextFormat`] in order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Serial(f64),
    Text(String),
}

impl DateInput {
    /// Resolve this input into a calendar day, remembering which representation matched.
    pub fn parse(&self) -> Result<ParsedDate, DateParseError> {
        parse_date(self)
    }

    /// Classify a bare value such as a query-string parameter, where JSON
    /// typing is unavailable: digits with at most one decimal point are a
    /// spreadsheet serial, anything else is text.
    pub fn from_query(raw: &str) -> Self {
        let trimmed = raw.trim();
        let numeric = trimmed.starts_with(|c: char| c.is_ascii_digit())
            && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.')
            && trimmed.matches('.').count() <= 1;
        match trimmed.parse::<f64>() {
            Ok(serial) if numeric => DateInput::Serial(serial),
            _ => DateInput::Text(raw.to_string()),
        }
    }

    /// Shorthand for `parse().map(|p| p.day)`.
    pub fn calendar_day(&self) -> Result<CalendarDay, DateParseError> {
        self.parse().map(|parsed| parsed.day)
    }
}

impl fmt::Display for DateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateInput::Serial(n) => write!(f, "{}", n),
            DateInput::Text(s) => f.write_str(s),
        }
    }
}

impl From<CalendarDay> for DateInput {
    fn from(day: CalendarDay) -> Self {
        DateInput::Text(day.to_string())
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<f64> for DateInput {
    fn from(n: f64) -> Self {
        DateInput::Serial(n)
    }
}

/// A (year, month, day) value with no time-of-day and no offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(CalendarDay)
    }

    /// Current UTC calendar day.
    pub fn today() -> Self {
        CalendarDay(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        CalendarDay(date)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = DateParseError;

    /// Strict `YYYY-MM-DD`; use [`DateInput::parse`] for lenient input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(CalendarDay)
            .map_err(|_| DateParseError::Unrecognized {
                input: s.to_string(),
            })
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Non-ISO textual layouts accepted for dates, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextFormat {
    DayMonthYear,
    MonthDayYear,
    YearMonthDaySlash,
    DayMonthNameYear,
    MonthNameDayYear,
    DayMonthShortYear,
    MonthDayShortYear,
}

impl TextFormat {
    pub const ALL: [TextFormat; 7] = [
        TextFormat::DayMonthYear,
        TextFormat::MonthDayYear,
        TextFormat::YearMonthDaySlash,
        TextFormat::DayMonthNameYear,
        TextFormat::MonthNameDayYear,
        TextFormat::DayMonthShortYear,
        TextFormat::MonthDayShortYear,
    ];

    fn pattern(&self) -> &'static str {
        match self {
            TextFormat::DayMonthYear => "%d-%m-%Y",
            TextFormat::MonthDayYear => "%m/%d/%Y",
            TextFormat::YearMonthDaySlash => "%Y/%m/%d",
            TextFormat::DayMonthNameYear => "%d %b %Y",
            TextFormat::MonthNameDayYear => "%b %d, %Y",
            TextFormat::DayMonthShortYear => "%d-%m-%y",
            TextFormat::MonthDayShortYear => "%m/%d/%y",
        }
    }

    /// Human-readable layout, as shown to operators in error payloads.
    pub fn label(&self) -> &'static str {
        match self {
            TextFormat::DayMonthYear => "DD-MM-YYYY",
            TextFormat::MonthDayYear => "MM/DD/YYYY",
            TextFormat::YearMonthDaySlash => "YYYY/MM/DD",
            TextFormat::DayMonthNameYear => "DD MMM YYYY",
            TextFormat::MonthNameDayYear => "MMM DD, YYYY",
            TextFormat::DayMonthShortYear => "DD-MM-YY",
            TextFormat::MonthDayShortYear => "MM/DD/YY",
        }
    }

    fn has_short_year(&self) -> bool {
        matches!(
            self,
            TextFormat::DayMonthShortYear | TextFormat::MonthDayShortYear
        )
    }
}

/// Which representation a date was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateRepr {
    Iso,
    Serial,
    Text(TextFormat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub day: CalendarDay,
    pub repr: DateRepr,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DateParseError {
    #[error("date is empty")]
    Empty,
    #[error("spreadsheet serial date {0} is out of range")]
    SerialOutOfRange(f64),
    #[error("unrecognized date '{input}'")]
    Unrecognized { input: String },
}

/// Layouts accepted by [`parse_date`], ISO first.
pub fn supported_formats() -> Vec<&'static str> {
    let mut formats = vec!["YYYY-MM-DD"];
    formats.extend(TextFormat::ALL.iter().map(TextFormat::label));
    formats
}

/// Spreadsheet day zero; serial 1 is 1899-12-31 and serial 61 is 1900-03-01.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// Serial of 9999-12-31.
const MAX_SERIAL: f64 = 2_958_465.0;

/// Resolve any supported date representation to a calendar day.
pub fn parse_date(input: &DateInput) -> Result<ParsedDate, DateParseError> {
    match input {
        DateInput::Serial(n) => parse_serial(*n).map(|day| ParsedDate {
            day,
            repr: DateRepr::Serial,
        }),
        DateInput::Text(s) => parse_text(s),
    }
}

fn parse_serial(n: f64) -> Result<CalendarDay, DateParseError> {
    if !n.is_finite() || n < 1.0 || n > MAX_SERIAL {
        return Err(DateParseError::SerialOutOfRange(n));
    }
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|epoch| epoch.checked_add_days(Days::new(n.floor() as u64)))
        .map(CalendarDay)
        .ok_or(DateParseError::SerialOutOfRange(n))
}

fn parse_text(raw: &str) -> Result<ParsedDate, DateParseError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(DateParseError::Empty);
    }

    if let Some(day) = parse_iso(s) {
        return Ok(ParsedDate {
            day,
            repr: DateRepr::Iso,
        });
    }

    for format in TextFormat::ALL {
        if let Ok(date) = NaiveDate::parse_from_str(s, format.pattern()) {
            // %Y accepts any digit count; "10-05-24" must fall through to the short-year layout.
            if !format.has_short_year() && date.year() < 1000 {
                continue;
            }
            return Ok(ParsedDate {
                day: CalendarDay(date),
                repr: DateRepr::Text(format),
            });
        }
    }

    Err(DateParseError::Unrecognized {
        input: raw.to_string(),
    })
}

/// Date-only, RFC 3339, or naive date-time. Timestamps carrying an offset are
/// converted to UTC before the day is taken; naive ones are read as UTC.
fn parse_iso(s: &str) -> Option<CalendarDay> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return (date.year() >= 1000).then_some(CalendarDay(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(CalendarDay(dt.with_timezone(&Utc).date_naive()));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(CalendarDay(dt.date()));
        }
    }
    None
}

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod calendar_tests;
