use crate::error::{ScheduleError, ScheduleResult};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// A calendar timestamp. Naive local time, no timezone handling.
pub type Instant = NaiveDateTime;

const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const ISO_INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SECONDS_PER_DAY: i64 = 86_400;

/// Parses `YYYY-MM-DD HH:MM:SS[.f]`, its `T`-separated ISO form, or a bare
/// `YYYY-MM-DD` (midnight).
pub fn parse_instant(text: &str) -> ScheduleResult<Instant> {
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, INSTANT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, ISO_INSTANT_FORMAT))
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| ScheduleError::format(text, "instant"))
}

/// Canonical `YYYY-MM-DD HH:MM:SS` text; a fraction is appended only when
/// the sub-second part is non-zero.
pub fn format_instant(instant: Instant) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

/// `instant + span`, or `None` when the result leaves chrono's range.
pub fn add(instant: Instant, span: TimeSpan) -> Option<Instant> {
    instant.checked_add_signed(span.0)
}

/// `instant - span`, or `None` when the result leaves chrono's range.
pub fn sub(instant: Instant, span: TimeSpan) -> Option<Instant> {
    instant.checked_sub_signed(span.0)
}

/// `later - earlier`. Negative when `later` precedes `earlier`.
pub fn subtract(later: Instant, earlier: Instant) -> TimeSpan {
    TimeSpan(later.signed_duration_since(earlier))
}

/// A span of time with the canonical text form `[-]<days>d<H>:<M>:<S>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan(TimeDelta);

impl TimeSpan {
    pub const ZERO: TimeSpan = TimeSpan(TimeDelta::zero());

    pub fn from_delta(delta: TimeDelta) -> Self {
        Self(delta)
    }

    pub fn days(days: i64) -> Self {
        Self(TimeDelta::days(days))
    }

    pub fn hours(hours: i64) -> Self {
        Self(TimeDelta::hours(hours))
    }

    pub fn minutes(minutes: i64) -> Self {
        Self(TimeDelta::minutes(minutes))
    }

    pub fn seconds(seconds: i64) -> Self {
        Self(TimeDelta::seconds(seconds))
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < TimeDelta::zero()
    }

    pub fn parse(text: &str) -> ScheduleResult<Self> {
        parse_span(text).ok_or_else(|| ScheduleError::format(text, "duration"))
    }
}

impl Add for TimeSpan {
    type Output = TimeSpan;

    fn add(self, rhs: TimeSpan) -> TimeSpan {
        TimeSpan(self.0 + rhs.0)
    }
}

impl From<TimeDelta> for TimeSpan {
    fn from(value: TimeDelta) -> Self {
        Self(value)
    }
}

impl FromStr for TimeSpan {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = if self.is_negative() { -self.0 } else { self.0 };
        if self.is_negative() {
            f.write_str("-")?;
        }
        let total = magnitude.num_seconds();
        let days = total / SECONDS_PER_DAY;
        let rest = total % SECONDS_PER_DAY;
        write!(f, "{days}d{}:{}:{}", rest / 3600, (rest % 3600) / 60, rest % 60)?;

        let nanos = magnitude.subsec_nanos();
        if nanos == 0 {
            Ok(())
        } else if nanos % 1000 == 0 {
            write!(f, ".{:06}", nanos / 1000)
        } else {
            write!(f, ".{nanos:09}")
        }
    }
}

impl Serialize for TimeSpan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSpan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TimeSpan::parse(&text).map_err(serde::de::Error::custom)
    }
}

fn parse_span(text: &str) -> Option<TimeSpan> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (days, clock) = body.split_once('d')?;
    let days = parse_digits(days)?;

    let (clock, fraction) = match clock.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (clock, None),
    };
    let mut fields = clock.split(':');
    let hours = parse_digits(fields.next()?)?;
    let minutes = parse_digits(fields.next()?)?;
    let seconds = parse_digits(fields.next()?)?;
    if fields.next().is_some() || hours >= 24 || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let nanos = match fraction {
        Some(digits) => parse_fraction(digits)?,
        None => 0,
    };

    let whole = days
        .checked_mul(SECONDS_PER_DAY)?
        .checked_add(hours * 3600 + minutes * 60 + seconds)?;
    let delta = TimeDelta::try_seconds(whole)?.checked_add(&TimeDelta::nanoseconds(nanos))?;
    Some(TimeSpan(if negative { -delta } else { delta }))
}

fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_fraction(digits: &str) -> Option<i64> {
    if digits.is_empty() || digits.len() > 9 {
        return None;
    }
    let value = parse_digits(digits)?;
    Some(value * 10_i64.pow(9 - digits.len() as u32))
}

/// `Option<Instant>` as canonical instant text, for flat export records.
pub(crate) mod optional_instant {
    use super::{Instant, format_instant};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<Instant>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(instant) => serializer.serialize_str(&format_instant(*instant)),
            None => serializer.serialize_none(),
        }
    }
}
