//! Date extraction and month-name handling.
//!
//! Grouping keys are derived from an entry's modification (or creation)
//! timestamp, interpreted in the local timezone. The month level can be
//! rendered either as the raw numeral or as the English month name.

use chrono::{DateTime, Datelike, Local, Month};
use serde::Deserialize;
use std::fs::Metadata;
use std::io;

/// Which filesystem timestamp to group entries by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    /// Group by the last-modified time.
    Modified,
    /// Group by the creation time, falling back to the modification time
    /// on platforms that do not record it.
    Created,
}

impl Default for TimestampSource {
    fn default() -> Self {
        TimestampSource::Modified
    }
}

/// The date triple captured for an entry, used to derive grouping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl GroupDate {
    /// Extracts the grouping date from filesystem metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested timestamp is unavailable.
    pub fn from_metadata(metadata: &Metadata, source: TimestampSource) -> io::Result<Self> {
        let stamp = match source {
            TimestampSource::Modified => metadata.modified()?,
            TimestampSource::Created => metadata.created().or_else(|_| metadata.modified())?,
        };
        let local: DateTime<Local> = stamp.into();
        Ok(Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
        })
    }
}

/// Returns the English month name for a decimal month string.
///
/// Input that does not parse as an integer is returned unchanged. Integers
/// outside `[1, 12]` map to an empty string.
///
/// # Examples
///
/// ```
/// use datetidy::dates::month_as_name;
///
/// assert_eq!(month_as_name("1"), "January");
/// assert_eq!(month_as_name("12"), "December");
/// assert_eq!(month_as_name("13"), "");
/// assert_eq!(month_as_name("photos"), "photos");
/// ```
pub fn month_as_name(month: &str) -> String {
    let Ok(index) = month.parse::<i64>() else {
        return month.to_string();
    };

    if !(1..=12).contains(&index) {
        return String::new();
    }

    Month::try_from(index as u8)
        .map(|m| m.name().to_string())
        .unwrap_or_default()
}

/// Resolves the display name of a tree node at the given depth.
///
/// Depth 2 is the month level; when `expand_month` is set and the name is a
/// numeric month, the English name is used. All other depths keep the raw
/// name.
pub fn display_name(name: &str, depth: usize, expand_month: bool) -> String {
    if depth != 2 || !expand_month {
        return name.to_string();
    }
    month_as_name(name)
}
