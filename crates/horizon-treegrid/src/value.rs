//! Cell values and their ordering.
//!
//! Every cell in the store holds a [`CellValue`]. Matching always works on the
//! value's display text; sorting and range queries use the typed value.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Magnitude from which integral floats no longer fit in an `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// A single cell value.
///
/// Deserializes from plain JSON scalars: `null` becomes [`CellValue::Empty`],
/// strings become text, and numbers become integers or floats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// No value.
    #[default]
    Empty,
    /// A text value.
    Text(String),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Float(f64),
}

impl CellValue {
    /// Returns the text used for display and matching.
    ///
    /// Integral floats render without a fractional part, so `3.0` reads `"3"`.
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) if value.fract() == 0.0 && value.abs() < I64_LIMIT => {
                format!("{}", *value as i64)
            }
            Self::Float(value) => value.to_string(),
        }
    }

    /// Returns `true` for values that land in the catch-all group.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Integer(value) => *value == 0,
            Self::Float(value) => *value == 0.0,
        }
    }

    /// Returns `true` for a missing value or blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Returns the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Parses text values that look like dates.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Text(text) => parse_date(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Parses a date or date-time string.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, and RFC 3339 timestamps.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime);
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|datetime| datetime.naive_utc())
}

/// Sort class of a value. Classes order before their contents do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortClass {
    Number,
    Date,
    Text,
    Empty,
}

fn sort_class(value: &CellValue) -> SortClass {
    match value {
        CellValue::Integer(_) | CellValue::Float(_) => SortClass::Number,
        _ if value.is_empty() => SortClass::Empty,
        _ if value.as_datetime().is_some() => SortClass::Date,
        _ => SortClass::Text,
    }
}

/// Compares two cell values for ascending sort order.
///
/// Values rank by class first: numbers, then date-like text, then other text,
/// then empty values. Within a class numbers compare numerically, dates
/// chronologically, and text by its characters. This is a total order even
/// when a column mixes classes.
pub fn compare_values(a: &CellValue, b: &CellValue) -> Ordering {
    let class = sort_class(a);
    class.cmp(&sort_class(b)).then_with(|| match class {
        SortClass::Number => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
        SortClass::Date => a.as_datetime().cmp(&b.as_datetime()),
        SortClass::Text => a.display_text().cmp(&b.display_text()),
        SortClass::Empty => Ordering::Equal,
    })
}
