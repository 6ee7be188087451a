//! Parsing, serialization and rendering of iCalendar-style recurrence rules.
//!
//! The dialect is the restricted one produced by calendar export feeds:
//! top-level `DTSTART`, `DTEND` and `RRULE` property lines, optionally
//! interleaved with nested `BEGIN:`/`END:` blocks (timezone definitions and
//! the like) whose contents are skipped. [`Recurrence`] is the value type;
//! it parses from and serializes back to that text, validates structured
//! [`RecurrenceConfig`] input, and renders a lossy English description via
//! [`std::fmt::Display`].

use thiserror::Error;

mod property;
mod recurrence;
mod scanner;
mod time;


pub use crate::recurrence::{
    Frequency, FrequencyConfig, FrequencyUnit, Recurrence, RecurrenceConfig,
};
pub use crate::time::{format_complete, format_date, Timestamp};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RecurrenceError {
    /// `BEGIN:`/`END:` blocks in the input do not pair up. The message names
    /// the offending line.
    #[error("Inconsistent block structure: {0}")]
    ScopeMismatch(String),
    /// A structured description carried a value the field cannot hold.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidFieldValue { field: &'static str, reason: String },
    /// Serialization was asked for before the named field was set.
    #[error("Cannot serialize while `{0}` is unset")]
    MissingRequiredField(&'static str),
}
