//! Time values used by SensorThings entities.
//!
//! Instants and intervals are exchanged as ISO 8601 strings; intervals use the
//! `start/end` form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Interval end precedes start: {0}")]
    InvertedInterval(String),
}

/// Parse an ISO 8601 instant.
///
/// Accepts RFC 3339, a naive date-time (assumed UTC) or a bare date.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

/// A closed time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeParseError> {
        if end < start {
            return Err(TimeParseError::InvertedInterval(format!(
                "{}/{}",
                format_instant(&start),
                format_instant(&end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Degenerate interval covering a single instant.
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| TimeParseError::InvalidFormat(s.to_string()))?;
        Self::new(parse_instant(start)?, parse_instant(end)?)
    }

    /// Smallest interval covering both `self` and `other`.
    pub fn union(&self, other: &TimeInterval) -> TimeInterval {
        TimeInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", format_instant(&self.start), format_instant(&self.end))
    }
}

impl Serialize for TimeInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeInterval::parse(&s).map_err(de::Error::custom)
    }
}

/// A time that is either an instant or an interval (e.g. phenomenonTime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeValue {
    Instant(DateTime<Utc>),
    Interval(TimeInterval),
}

impl TimeValue {
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        if s.contains('/') {
            Ok(TimeValue::Interval(TimeInterval::parse(s)?))
        } else {
            Ok(TimeValue::Instant(parse_instant(s)?))
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        match self {
            TimeValue::Instant(t) => *t,
            TimeValue::Interval(i) => i.start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            TimeValue::Instant(t) => *t,
            TimeValue::Interval(i) => i.end,
        }
    }

    pub fn as_interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start(),
            end: self.end(),
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Instant(t) => f.write_str(&format_instant(t)),
            TimeValue::Interval(i) => i.fmt(f),
        }
    }
}

impl Serialize for TimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeValue::parse(&s).map_err(de::Error::custom)
    }
}
