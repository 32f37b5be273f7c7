//! Date normalization for appointment records.
//!
//! The schedule service is inconsistent about dates: some records carry
//! `dd/mm/yyyy`, others ISO 8601, and typed callers hand over chrono values.
//! Everything is reduced to one local wall-clock instant here. Accepted text
//! forms are a closed set; anything else is an error.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc,
};
use regex::Regex;

use shared_models::error::ApiError;

/// Calendar entries have no per-service duration.
pub const APPOINTMENT_DURATION_MINUTES: i64 = 60;

const SHORT_MONTHS_PT: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)(?::([0-5]\d))?$").expect("valid time regex")
});

static DAY_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid date regex")
});

#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Text(&'a str),
    Day(NaiveDate),
    Local(NaiveDateTime),
    Utc(DateTime<Utc>),
}

/// Parses `HH:mm` (a trailing `:ss` is tolerated and dropped).
pub fn parse_time(value: &str) -> Result<NaiveTime, ApiError> {
    let trimmed = value.trim();
    let caps = TIME_RE
        .captures(trimmed)
        .ok_or_else(|| ApiError::InvalidTime(value.to_string()))?;

    let hour: u32 = caps[1].parse().map_err(|_| ApiError::InvalidTime(value.to_string()))?;
    let minute: u32 = caps[2].parse().map_err(|_| ApiError::InvalidTime(value.to_string()))?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ApiError::InvalidTime(value.to_string()))
}

fn parse_day_first(value: &str) -> Result<NaiveDateTime, ApiError> {
    let invalid = || ApiError::InvalidDate(value.to_string());
    let caps = DAY_FIRST_RE.captures(value.trim()).ok_or_else(invalid)?;

    let day: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let year: i32 = caps[3].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.and_time(NaiveTime::MIN))
        .ok_or_else(invalid)
}

fn parse_iso(value: &str) -> Result<NaiveDateTime, ApiError> {
    let trimmed = value.trim();

    // Date-only ISO strings name a calendar day; no UTC shift.
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Local).naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(instant) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(instant);
        }
    }

    Err(ApiError::InvalidDate(value.to_string()))
}

/// Parses a date string: anything with `/` is day-first, the rest must be ISO.
pub fn parse_date(value: &str) -> Result<NaiveDateTime, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidDate(value.to_string()));
    }

    if value.contains('/') {
        parse_day_first(value)
    } else {
        parse_iso(value)
    }
}

/// Produces the canonical instant for a date plus optional `HH:mm` time.
/// Without a time the instant is midnight of the parsed day.
pub fn normalize(date: DateInput<'_>, time: Option<&str>) -> Result<NaiveDateTime, ApiError> {
    let base = match date {
        DateInput::Text(text) => parse_date(text)?,
        DateInput::Day(day) => day.and_time(NaiveTime::MIN),
        DateInput::Local(instant) => instant,
        DateInput::Utc(instant) => instant.with_timezone(&Local).naive_local(),
    };

    match time {
        Some(t) => Ok(base.date().and_time(parse_time(t)?)),
        None => Ok(base),
    }
}

pub fn parse_day(value: &str) -> Result<NaiveDate, ApiError> {
    parse_date(value).map(|instant| instant.date())
}

/// `dd/MM/yyyy`, the format the backend and the views use for days.
pub fn format_day(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub fn calendar_end(start: NaiveDateTime) -> NaiveDateTime {
    start + Duration::minutes(APPOINTMENT_DURATION_MINUTES)
}

/// Two-digit day of month for the dashboard date badge.
pub fn day_badge(day: NaiveDate) -> String {
    format!("{:02}", day.day())
}

/// Short Portuguese month name for the dashboard date badge.
pub fn month_badge(day: NaiveDate) -> &'static str {
    SHORT_MONTHS_PT[day.month0() as usize]
}
