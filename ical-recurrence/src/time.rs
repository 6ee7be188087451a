//! Calendar timestamps and the compact formats they travel in.
//!
//! Recurrence text carries two timestamp shapes: date-only values
//! (`20100722`, used by all-day events) and complete date-times
//! (`20100722T134909Z`, ISO 8601 basic format). [`Timestamp`] holds either;
//! the free functions translate between the compact text forms and `chrono`
//! values, consulting the IANA timezone database for `TZID`-qualified input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// The time of a recurrence boundary.
///
/// Start, end and repeat-until values are either a specific instant (stored
/// in UTC) or a bare date with no time-of-day component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// A date without a time-of-day, as carried by `VALUE=DATE` properties.
    Date(NaiveDate),
    /// A specific instant, normalized to UTC.
    DateTime(DateTime<Utc>),
}

impl Timestamp {
    /// Returns `true` for the date-only variant.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the date portion of either variant.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::DateTime(instant) => instant.date_naive(),
        }
    }

    /// Converts to a UTC instant; date-only values become midnight UTC.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
            Self::DateTime(instant) => *instant,
        }
    }
}

/// Formats an instant in the complete UTC form `YYYYMMDDTHHMMSSZ`.
pub fn format_complete(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Formats a date in the date-only form `YYYYMMDD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Parses a date-only value (`YYYYMMDD`).
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

/// Parses a complete date-time value (`YYYYMMDDTHHMMSS`), tolerating the
/// trailing `Z` that UTC-zoned exports append.
pub(crate) fn parse_complete(value: &str) -> Option<NaiveDateTime> {
    let bare = value.strip_suffix('Z').unwrap_or(value);
    NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S").ok()
}

/// Parses a date-time value into a UTC instant.
///
/// A trailing `Z` marks the value as already UTC. Otherwise a resolvable
/// `tzid` localizes the wall time into that zone before converting; an
/// absent or unresolvable `tzid` leaves the value interpreted as UTC, so
/// malformed third-party exports still parse.
pub(crate) fn parse_datetime(value: &str, tzid: Option<&str>) -> Option<DateTime<Utc>> {
    let naive = parse_complete(value)?;
    if value.ends_with('Z') {
        return Some(naive.and_utc());
    }
    match tzid.and_then(resolve_tzid) {
        Some(tz) => Some(localize(naive, tz)),
        None => Some(naive.and_utc()),
    }
}

/// Parses a timestamp that may be either form: date-only when the value has
/// no `T` time designator, a date-time (honoring `tzid`) otherwise.
pub(crate) fn parse_timestamp(value: &str, tzid: Option<&str>) -> Option<Timestamp> {
    if value.contains('T') {
        parse_datetime(value, tzid).map(Timestamp::DateTime)
    } else {
        parse_date(value).map(Timestamp::Date)
    }
}

/// Looks a `TZID` up in the compiled-in IANA database.
fn resolve_tzid(tzid: &str) -> Option<Tz> {
    match tzid.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            debug!(tzid, "unresolvable TZID, falling back to UTC");
            None
        }
    }
}

/// Converts a wall time in `tz` to UTC.
///
/// An ambiguous wall time (DST fold) resolves to the earlier instant. A wall
/// time inside a DST gap has no instant at all; it stays interpreted as UTC.
fn localize(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local).earliest() {
        Some(zoned) => zoned.with_timezone(&Utc),
        None => local.and_utc(),
    }
}
