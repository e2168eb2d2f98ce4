//! Filter operand values

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::equality::{format_number, Value};

/// Rendering of a date operand that could not be parsed
pub const INVALID_DATE: &str = "Invalid Date";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// A single primitive operand of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl FilterValue {
    /// Whole-string numeric coercion in the manner of JS `Number()`, not
    /// `parseFloat`: surrounding whitespace is trimmed and any trailing
    /// garbage (`"12abc"`) gives `NaN`. Empty text is `NaN` too, where
    /// `Number("")` would give 0.
    pub fn to_number(&self) -> f64 {
        match self {
            FilterValue::Number(n) => *n,
            FilterValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            FilterValue::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        }
    }

    /// Interpret the operand as a point in time.
    ///
    /// Numbers (and booleans) are epoch milliseconds.
    pub fn to_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FilterValue::String(s) => parse_timestamp(s),
            other => {
                let millis = other.to_number();
                if millis.is_finite() {
                    DateTime::from_timestamp_millis(millis as i64)
                } else {
                    None
                }
            }
        }
    }

    /// ISO-8601 UTC rendering with millisecond precision, or [`INVALID_DATE`]
    pub fn to_iso_date(&self) -> String {
        self.to_timestamp()
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| INVALID_DATE.to_string())
    }
}

/// Parse an RFC 3339 timestamp, a naive date-time or a bare date.
///
/// Naive values are read as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Boolean(b) => write!(f, "{}", b),
            FilterValue::Number(n) => f.write_str(&format_number(*n)),
            FilterValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Number(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Number(f64::from(n))
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Boolean(b)
    }
}

impl From<FilterValue> for Value {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Boolean(b) => Value::Bool(b),
            FilterValue::Number(n) => Value::Number(n),
            FilterValue::String(s) => Value::String(s),
        }
    }
}
