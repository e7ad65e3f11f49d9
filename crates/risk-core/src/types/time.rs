use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Naive layouts the upstream service emits without an offset (assumed UTC).
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Unix timestamps above this are milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// A date-like field from upstream. Missing or unparseable values become
/// [`EventTime::Unknown`] instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EventTime {
    At(DateTime<Utc>),
    #[default]
    Unknown,
}

impl EventTime {
    pub fn parse(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::parse_str(s),
            Some(Value::Number(n)) => n.as_i64().map_or(Self::Unknown, Self::from_unix),
            _ => Self::Unknown,
        }
    }

    pub fn parse_str(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Unknown;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self::At(dt.with_timezone(&Utc));
        }

        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Self::At(naive.and_utc());
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Self::At(naive.and_utc());
            }
        }

        if let Ok(ts) = raw.parse::<i64>() {
            return Self::from_unix(ts);
        }

        Self::Unknown
    }

    /// Seconds or milliseconds since the epoch.
    pub fn from_unix(ts: i64) -> Self {
        let parsed = if ts.abs() >= MILLIS_THRESHOLD {
            DateTime::<Utc>::from_timestamp_millis(ts)
        } else {
            DateTime::<Utc>::from_timestamp(ts, 0)
        };
        parsed.map_or(Self::Unknown, Self::At)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(dt) => Some(*dt),
            Self::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::At(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S UTC")),
            Self::Unknown => f.write_str("Unknown date"),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::At(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Self::Unknown => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_rfc3339() {
        let t = EventTime::parse(Some(&json!("2024-03-01T12:30:00Z")));
        let dt = t.datetime().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 1));
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_naive_iso_with_fraction() {
        let t = EventTime::parse_str("2024-03-01T12:30:00.123456");
        assert!(t.is_known());
        let t = EventTime::parse_str("2024-03-01 08:00:00");
        assert_eq!(t.datetime().unwrap().hour(), 8);
    }

    #[test]
    fn test_parse_date_only() {
        let t = EventTime::parse_str("2024-03-01");
        assert_eq!(t.datetime().unwrap().hour(), 0);
    }

    #[test]
    fn test_parse_unix_seconds_and_millis() {
        let secs = EventTime::parse(Some(&json!(1_700_000_000)));
        let millis = EventTime::parse(Some(&json!(1_700_000_000_000i64)));
        assert_eq!(secs, millis);
        assert!(secs.is_known());
    }

    #[test]
    fn test_invalid_values_become_unknown() {
        assert_eq!(EventTime::parse(None), EventTime::Unknown);
        assert_eq!(EventTime::parse(Some(&json!(null))), EventTime::Unknown);
        assert_eq!(EventTime::parse(Some(&json!("not a date"))), EventTime::Unknown);
        assert_eq!(EventTime::parse(Some(&json!("2024-13-45"))), EventTime::Unknown);
        assert_eq!(EventTime::parse(Some(&json!({"a": 1}))), EventTime::Unknown);
        assert_eq!(EventTime::Unknown.to_string(), "Unknown date");
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_value(EventTime::Unknown).unwrap(), json!(null));
        let t = EventTime::parse_str("2024-03-01T00:00:00Z");
        assert_eq!(
            serde_json::to_value(t).unwrap(),
            json!("2024-03-01T00:00:00+00:00")
        );
    }
}
