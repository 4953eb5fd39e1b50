// Time zone conversion for the `time` command.
//
// Input is whatever people type after the command: nothing, "21:30",
// "2024-05-01 9pm JST", "05/01 08:00 +0900"... Parsing is forgiving about the
// date part and about where the zone comes from.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Taipei;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Unrecognised date/time: {0}")]
    Unrecognised(String),

    #[error("{0} does not exist in the requested time zone")]
    NonexistentLocalTime(String),
}

/// A zone named by the user: an IANA zone or a bare UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneSpec {
    Named(Tz),
    Offset(FixedOffset),
}

pub struct ZoneTime {
    pub abbreviation: String,
    pub formatted: String,
}

pub struct TimezoneService {
    timezones: Vec<Tz>,
}

impl TimezoneService {
    pub fn new() -> Self {
        Self {
            timezones: vec![
                chrono_tz::Asia::Taipei,
                chrono_tz::Asia::Tokyo,
                chrono_tz::America::New_York,
            ],
        }
    }

    /// `at` rendered in every configured zone.
    pub fn times_at(&self, at: DateTime<Utc>) -> Vec<ZoneTime> {
        self.timezones
            .iter()
            .map(|tz| {
                let local = at.with_timezone(tz);
                ZoneTime {
                    abbreviation: local.format("%Z").to_string(),
                    formatted: local.format(TIME_FORMAT).to_string(),
                }
            })
            .collect()
    }

    /// The code block the `time` command replies with.
    pub fn render(&self, at: DateTime<Utc>) -> String {
        let mut lines = vec!["```".to_string()];
        lines.extend(
            self.times_at(at)
                .into_iter()
                .map(|zone| format!("{}: {}", zone.abbreviation, zone.formatted)),
        );
        lines.push("```".to_string());
        lines.join("\n")
    }

    /// Parses the command arguments relative to `now`.
    ///
    /// Missing date parts default to today in [`DEFAULT_TIMEZONE`]; a missing
    /// time defaults to `now` truncated to the minute; a missing zone means
    /// [`DEFAULT_TIMEZONE`].
    pub fn parse(&self, input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(TimeParseError::Unrecognised(input.to_string()));
        }

        let trailing_zone = tokens
            .split_last()
            .and_then(|(last, rest)| parse_zone(last).map(|zone| (zone, rest)));
        let (zone, datetime_tokens) = match trailing_zone {
            Some(found) => found,
            None => (ZoneSpec::Named(DEFAULT_TIMEZONE), &tokens[..]),
        };

        let text = datetime_tokens.join(" ").to_uppercase();
        let default = now
            .with_timezone(&DEFAULT_TIMEZONE)
            .naive_local()
            .with_second(0)
            .and_then(|dt| dt.with_nanosecond(0))
            .ok_or_else(|| TimeParseError::Unrecognised(input.to_string()))?;

        // A zone on its own keeps the default wall-clock time.
        let naive = if datetime_tokens.is_empty() {
            default
        } else {
            parse_naive(&text, default)
                .ok_or_else(|| TimeParseError::Unrecognised(input.to_string()))?
        };

        localize(zone, naive).ok_or_else(|| TimeParseError::NonexistentLocalTime(naive.to_string()))
    }
}

impl Default for TimezoneService {
    fn default() -> Self {
        Self::new()
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %I:%M%p",
    "%Y-%m-%d %I:%M %p",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Formats without a year; the default year is prepended before parsing.
const MONTH_DAY_FORMATS: &[&str] = &[
    "%m-%d %H:%M:%S",
    "%m-%d %H:%M",
    "%m/%d %H:%M:%S",
    "%m/%d %H:%M",
    "%m/%d %I:%M%p",
    "%m/%d %I:%M %p",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M%p", "%I:%M %p", "%I:%M:%S%p"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

fn parse_naive(text: &str, default: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = &with_minutes(text);

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }

    let with_year = format!("{} {}", default.year(), text);
    if let Some(dt) = MONTH_DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&with_year, &format!("%Y {fmt}")).ok())
    {
        return Some(dt);
    }

    if let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
    {
        return Some(default.date().and_time(time));
    }

    let with_year_date = ["%m-%d", "%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, &format!("%Y {fmt}")).ok());
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or(with_year_date)
        .map(|date| date.and_time(default.time()))
}

/// chrono needs minutes to build a time, so `9PM` and `9 PM` become `9:00PM`.
fn with_minutes(text: &str) -> String {
    let joined = join_meridiem(text);
    let text = joined.as_str();
    let (head, last) = match text.rsplit_once(' ') {
        Some((head, last)) => (Some(head), last),
        None => (None, text),
    };

    let rewritten = ["AM", "PM"].iter().find_map(|suffix| {
        let hour = last.strip_suffix(suffix)?;
        let is_hour = !hour.is_empty() && hour.len() <= 2 && hour.chars().all(|c| c.is_ascii_digit());
        is_hour.then(|| format!("{hour}:00{suffix}"))
    });

    match (head, rewritten) {
        (Some(head), Some(last)) => format!("{head} {last}"),
        (None, Some(last)) => last,
        _ => text.to_string(),
    }
}

/// `9 PM` -> `9PM`, `9:30 AM` -> `9:30AM`.
fn join_meridiem(text: &str) -> String {
    ["AM", "PM"]
        .iter()
        .find_map(|suffix| {
            let head = text.strip_suffix(suffix)?.strip_suffix(' ')?;
            Some(format!("{head}{suffix}"))
        })
        .unwrap_or_else(|| text.to_string())
}

fn parse_zone(token: &str) -> Option<ZoneSpec> {
    if let Some(offset) = parse_offset(token) {
        return Some(ZoneSpec::Offset(offset));
    }
    if let Ok(tz) = token.parse::<Tz>() {
        return Some(ZoneSpec::Named(tz));
    }

    let tz = match token.to_uppercase().as_str() {
        "US" | "ET" => chrono_tz::America::New_York,
        "JP" | "JPN" | "JAPAN" | "JST" => chrono_tz::Asia::Tokyo,
        "TW" | "TWN" | "TAIPEI" | "TPE" | "NST" | "CST" => chrono_tz::Asia::Taipei,
        "UTC" | "GMT" | "Z" => chrono_tz::UTC,
        _ => return None,
    };
    Some(ZoneSpec::Named(tz))
}

/// `+09:00`, `-0500`, `+8`, optionally prefixed with `UTC`/`GMT`.
fn parse_offset(token: &str) -> Option<FixedOffset> {
    let upper = token.to_uppercase();
    let body = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper);

    let (sign, digits) = match body.chars().next()? {
        '+' => (1, &body[1..]),
        '-' => (-1, &body[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None if digits.len() == 4 => (digits[..2].parse().ok()?, digits[2..].parse().ok()?),
        None if !digits.is_empty() && digits.len() <= 2 => (digits.parse().ok()?, 0),
        None => return None,
    };
    if hours > 14 || minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn localize(zone: ZoneSpec, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match zone {
        ZoneSpec::Named(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
        ZoneSpec::Offset(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}
