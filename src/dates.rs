//! Date parsing and named output profiles.
//!
//! Output is always by profile name (`short`, `medium`, `html_date`, …), never
//! by raw pattern, so the presentation of a date can change in one place.
//! Input values are either Unix timestamps or strings in a caller-supplied
//! `strftime` pattern.

use crate::config::DatesConfig;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DateError {
    #[error("cannot parse '{value}' with format '{format}': {source}")]
    Parse {
        value: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("'{value}' is not a timestamp and no input format was given")]
    NotATimestamp { value: String },
}

/// Date rendering service.
pub trait DateFormatter {
    /// Render a Unix timestamp with the named output profile.
    fn format(&self, timestamp: i64, profile: &str) -> String;
}

/// [`DateFormatter`] over the profiles named in [`DatesConfig`], in UTC.
#[derive(Debug, Clone)]
pub struct ProfileDateFormatter {
    formats: BTreeMap<String, String>,
    fallback: String,
}

impl ProfileDateFormatter {
    pub fn new(config: &DatesConfig) -> Self {
        Self {
            formats: config.formats.clone(),
            fallback: config.fallback.clone(),
        }
    }
}

impl Default for ProfileDateFormatter {
    fn default() -> Self {
        Self::new(&DatesConfig::default())
    }
}

impl DateFormatter for ProfileDateFormatter {
    fn format(&self, timestamp: i64, profile: &str) -> String {
        let pattern = self.formats.get(profile).unwrap_or_else(|| {
            debug!(profile, "unknown date profile, using fallback");
            &self.fallback
        });
        let Some(dt) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
            return String::new();
        };
        let mut out = String::new();
        if write!(out, "{}", dt.format(pattern)).is_err() {
            warn!(profile, pattern = %pattern, "date pattern cannot be rendered");
            return String::new();
        }
        out
    }
}

/// Whether every `strftime` specifier in `pattern` is one chrono can render.
pub fn is_valid_pattern(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error))
}

/// Interpret a value as a Unix timestamp, if it is numeric.
///
/// Fractional values are truncated toward zero.
pub fn numeric_timestamp(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(ts) = trimmed.parse::<i64>() {
        return Some(ts);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

/// Parse `value` with a `strftime` pattern into a UTC timestamp.
///
/// Patterns without a time component are read as midnight.
pub fn parse_timestamp(value: &str, format: &str) -> Result<i64, DateError> {
    match NaiveDateTime::parse_from_str(value, format) {
        Ok(dt) => Ok(dt.and_utc().timestamp()),
        Err(datetime_err) => NaiveDate::parse_from_str(value, format)
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc().timestamp())
            .map_err(|_| DateError::Parse {
                value: value.to_string(),
                format: format.to_string(),
                source: datetime_err,
            }),
    }
}
