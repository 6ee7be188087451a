//! The recurrence rule value type and the forms it moves between: recurrence
//! text, structured configuration and rendered English.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::property::ParsedProperty;
use crate::scanner::ScopedLines;
use crate::time::{self, Timestamp};
use crate::RecurrenceError;

/// A recurrence rule: the span of the first occurrence and how it repeats.
///
/// Rules come from three places: [`Recurrence::parse`] reads the recurrence
/// text dialect, [`Recurrence::from_config`] validates a structured
/// description, and [`Recurrence::new`] plus the setters build one directly.
/// [`Recurrence::to_recurrence_string`] writes canonical text back out, and
/// the [`fmt::Display`] impl renders a lossy English description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recurrence {
    /// When the first occurrence starts.
    start_time: Option<Timestamp>,
    /// When the first occurrence ends.
    end_time: Option<Timestamp>,
    /// Whether occurrences span whole days rather than a clocked interval.
    all_day: bool,
    /// How the rule repeats; absent for a one-off span.
    frequency: Option<Frequency>,
    /// Last date the rule repeats on; unbounded when absent.
    repeat_until: Option<Timestamp>,
}

impl Recurrence {
    /// Creates a rule spanning `start_time` to `end_time` with no repetition.
    pub fn new(start_time: Timestamp, end_time: Timestamp) -> Self {
        Recurrence {
            start_time: Some(start_time),
            end_time: Some(end_time),
            ..Recurrence::default()
        }
    }

    /// When the first occurrence starts.
    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn set_start_time(&mut self, start_time: Timestamp) {
        self.start_time = Some(start_time);
    }

    /// When the first occurrence ends.
    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn set_end_time(&mut self, end_time: Timestamp) {
        self.end_time = Some(end_time);
    }

    /// Whether occurrences span whole days.
    pub fn all_day(&self) -> bool {
        self.all_day
    }

    pub fn set_all_day(&mut self, all_day: bool) {
        self.all_day = all_day;
    }

    /// How the rule repeats, if it does.
    pub fn frequency(&self) -> Option<&Frequency> {
        self.frequency.as_ref()
    }

    pub fn set_frequency(&mut self, frequency: Option<Frequency>) {
        self.frequency = frequency;
    }

    /// Last date the rule repeats on, if bounded.
    pub fn repeat_until(&self) -> Option<Timestamp> {
        self.repeat_until
    }

    pub fn set_repeat_until(&mut self, repeat_until: Option<Timestamp>) {
        self.repeat_until = repeat_until;
    }

    /// Parses recurrence text into a rule.
    ///
    /// Recognized top-level properties (`DTSTART`, `DTEND`, `RRULE`) fold
    /// into the rule in order, later lines overwriting earlier ones. Lines
    /// inside `BEGIN:`/`END:` blocks, unrecognized properties and malformed
    /// values are skipped; the only fatal error is inconsistent block
    /// structure, reported as [`RecurrenceError::ScopeMismatch`].
    pub fn parse(input: &str) -> Result<Self, RecurrenceError> {
        let mut rule = Recurrence::default();
        for scanned in ScopedLines::new(input) {
            let (line, top_level) = scanned?;
            if top_level {
                rule.fold_line(line);
            }
        }
        Ok(rule)
    }

    fn fold_line(&mut self, line: &str) {
        let property = ParsedProperty::parse(line);
        match property.name {
            "DTSTART" => {
                if let Some((stamp, date_only)) = parse_boundary(&property) {
                    self.start_time = Some(stamp);
                    self.all_day = date_only;
                }
            }
            "DTEND" => {
                // DTEND alone never flips a rule to all-day.
                if let Some((stamp, _)) = parse_boundary(&property) {
                    self.end_time = Some(stamp);
                }
            }
            "RRULE" => self.fold_rrule(&property),
            _ => {}
        }
    }

    fn fold_rrule(&mut self, property: &ParsedProperty<'_>) {
        let params = &property.value_params;
        // UNTIL is stored independently of the frequency, so a rule whose
        // FREQ is absent or unrecognized still keeps its end date.
        if let Some(until) = params.get("UNTIL") {
            match time::parse_timestamp(until, None) {
                Some(stamp) => self.repeat_until = Some(stamp),
                None => debug!(until, "skipping malformed UNTIL value"),
            }
        }
        let Some(freq) = params.get("FREQ") else {
            return;
        };
        let Some(unit) = FrequencyUnit::from_name(freq) else {
            debug!(freq, "skipping RRULE with unrecognized FREQ");
            return;
        };
        let mut frequency = Frequency::new(unit);
        if let Some(raw) = params.get("INTERVAL") {
            match raw.parse() {
                Ok(interval) => frequency.interval = Some(interval),
                Err(_) => debug!(interval = raw, "skipping non-numeric INTERVAL"),
            }
        }
        // Every axis the serializer can emit folds back into the flat list.
        for axis in ["BYDAY", "BYMONTHDAY", "BYYEARDAY", "BYSECOND", "BYMINUTE", "BYHOUR"] {
            if let Some(entries) = params.get(axis) {
                frequency.qualifiers.extend(
                    entries.split(',').filter(|entry| !entry.is_empty()).map(str::to_owned),
                );
            }
        }
        self.frequency = Some(frequency);
    }

    /// Writes the canonical recurrence text.
    ///
    /// Fails with [`RecurrenceError::MissingRequiredField`] unless both ends
    /// of the occurrence span are set; everything else is optional. The
    /// `UNTIL` clause keeps only the date portion of `repeat_until`.
    pub fn to_recurrence_string(&self) -> Result<String, RecurrenceError> {
        let start_time =
            self.start_time.ok_or(RecurrenceError::MissingRequiredField("start_time"))?;
        let end_time = self.end_time.ok_or(RecurrenceError::MissingRequiredField("end_time"))?;

        let mut out = String::new();
        self.write_boundary(&mut out, "DTSTART", start_time);
        self.write_boundary(&mut out, "DTEND", end_time);
        out.push_str("RRULE:");
        if let Some(frequency) = &self.frequency {
            out.push_str(&format!("FREQ={};", frequency.unit.canonical_name().to_uppercase()));
            if let Some(interval) = frequency.interval {
                out.push_str(&format!("INTERVAL={interval};"));
            }
            if !frequency.qualifiers.is_empty() {
                if let Some(axis) = frequency.unit.by_axis() {
                    out.push_str(&format!("{axis}={};", frequency.qualifiers.join(",")));
                }
            }
        }
        if let Some(repeat_until) = self.repeat_until {
            out.push_str(&format!("UNTIL={}", time::format_date(repeat_until.date())));
        }
        out.push('\n');
        Ok(out)
    }

    fn write_boundary(&self, out: &mut String, name: &str, stamp: Timestamp) {
        if self.all_day {
            out.push_str(&format!("{name};VALUE=DATE:{}\n", time::format_date(stamp.date())));
        } else {
            out.push_str(&format!(
                "{name};VALUE=DATE-TIME:{}\n",
                time::format_complete(stamp.to_utc_datetime())
            ));
        }
    }

    /// Builds a rule from a structured description.
    ///
    /// Unlike parsing, construction is validating: a timestamp that does not
    /// read as `YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]`, or an unrecognized
    /// frequency unit, fails with [`RecurrenceError::InvalidFieldValue`]
    /// naming the offending field.
    pub fn from_config(config: &RecurrenceConfig) -> Result<Self, RecurrenceError> {
        let start_time = parse_config_timestamp("start_time", &config.start_time)?;
        let end_time = parse_config_timestamp("end_time", &config.end_time)?;
        let frequency = config.frequency.as_ref().map(Frequency::from_config).transpose()?;
        let repeat_until = config
            .repeat_until
            .as_deref()
            .map(|raw| parse_config_timestamp("repeat_until", raw))
            .transpose()?;
        Ok(Recurrence {
            start_time: Some(start_time),
            end_time: Some(end_time),
            all_day: config.all_day,
            frequency,
            repeat_until,
        })
    }
}

impl FromStr for Recurrence {
    type Err = RecurrenceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Recurrence::parse(input)
    }
}

impl TryFrom<&RecurrenceConfig> for Recurrence {
    type Error = RecurrenceError;

    fn try_from(config: &RecurrenceConfig) -> Result<Self, Self::Error> {
        Recurrence::from_config(config)
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(frequency) = &self.frequency {
            parts.push(frequency.phrase());
            if let Some(interval) = frequency.interval {
                parts.push(format!("for {interval} times"));
            }
        }
        if let Some(repeat_until) = self.repeat_until {
            parts.push(format!("and repeats until {}", repeat_until.date().format("%m/%d/%Y")));
        }
        f.write_str(&parts.join(" "))
    }
}

/// Reads a `DTSTART`/`DTEND` value: date-only when the name carries
/// `VALUE=DATE`, a date-time honoring `TZID` otherwise. Returns the stamp
/// and whether it was the date-only form.
fn parse_boundary(property: &ParsedProperty<'_>) -> Option<(Timestamp, bool)> {
    if property.name_params.get("VALUE") == Some("DATE") {
        let Some(date) = time::parse_date(property.value) else {
            debug!(name = property.name, value = property.value, "skipping malformed date");
            return None;
        };
        Some((Timestamp::Date(date), true))
    } else {
        let tzid = property.name_params.get("TZID");
        let Some(instant) = time::parse_datetime(property.value, tzid) else {
            debug!(name = property.name, value = property.value, "skipping malformed date-time");
            return None;
        };
        Some((Timestamp::DateTime(instant), false))
    }
}

fn parse_config_timestamp(field: &'static str, raw: &str) -> Result<Timestamp, RecurrenceError> {
    time::parse_timestamp(raw, None).ok_or_else(|| RecurrenceError::InvalidFieldValue {
        field,
        reason: format!("`{raw}` is not a `YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]` timestamp"),
    })
}

/// How often a rule repeats, with the qualifiers that pin occurrences to
/// positions within the period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frequency {
    /// Repetition period.
    pub unit: FrequencyUnit,
    /// Positions within the period, one flat list read according to the
    /// unit: weekday codes for weekly rules (`WE`), ordinal weekday codes
    /// for monthly rules (`+1TU`), day-of-year numbers for yearly rules,
    /// numeric positions for sub-daily rules.
    pub qualifiers: Vec<String>,
    /// Stride between repetitions (`2` repeats every other period).
    pub interval: Option<u32>,
}

impl Frequency {
    /// Creates a frequency with no qualifiers and no stride.
    pub fn new(unit: FrequencyUnit) -> Self {
        Frequency { unit, ..Frequency::default() }
    }

    /// Appends qualifier entries.
    pub fn with_qualifiers<I, S>(mut self, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qualifiers.extend(qualifiers.into_iter().map(Into::into));
        self
    }

    /// Sets the stride.
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    fn from_config(config: &FrequencyConfig) -> Result<Self, RecurrenceError> {
        let Some(unit) = FrequencyUnit::from_name(&config.unit) else {
            return Err(RecurrenceError::InvalidFieldValue {
                field: "frequency.unit",
                reason: format!("`{}` is not a recurrence frequency", config.unit),
            });
        };
        Ok(Frequency { unit, qualifiers: config.qualifiers.clone(), interval: config.interval })
    }

    /// English phrase for the repetition, e.g. `weekly on WE`.
    fn phrase(&self) -> String {
        let list = self.qualifiers.join(",");
        if list.is_empty() {
            return self.unit.canonical_name().to_lowercase();
        }
        match self.unit {
            FrequencyUnit::Secondly => format!("every {list} second"),
            FrequencyUnit::Minutely => format!("every {list} minute"),
            FrequencyUnit::Hourly => format!("every {list} hour"),
            FrequencyUnit::Daily => "daily".to_string(),
            FrequencyUnit::Weekly => format!("weekly on {list}"),
            FrequencyUnit::Monthly => format!("monthly on {list}"),
            FrequencyUnit::Yearly => format!("yearly on the {list} day of the year"),
        }
    }
}

/// Repetition period of a [`Frequency`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrequencyUnit {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
}

impl FrequencyUnit {
    /// Parses a `FREQ` value or config unit name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "secondly" => Some(FrequencyUnit::Secondly),
            "minutely" => Some(FrequencyUnit::Minutely),
            "hourly" => Some(FrequencyUnit::Hourly),
            "daily" => Some(FrequencyUnit::Daily),
            "weekly" => Some(FrequencyUnit::Weekly),
            "monthly" => Some(FrequencyUnit::Monthly),
            "yearly" => Some(FrequencyUnit::Yearly),
            _ => None,
        }
    }

    /// Canonical name in title case, e.g. `Weekly`.
    pub fn canonical_name(self) -> &'static str {
        match self {
            FrequencyUnit::Secondly => "Secondly",
            FrequencyUnit::Minutely => "Minutely",
            FrequencyUnit::Hourly => "Hourly",
            FrequencyUnit::Daily => "Daily",
            FrequencyUnit::Weekly => "Weekly",
            FrequencyUnit::Monthly => "Monthly",
            FrequencyUnit::Yearly => "Yearly",
        }
    }

    /// The `BY*` axis this unit's qualifiers serialize under, if any.
    fn by_axis(self) -> Option<&'static str> {
        match self {
            FrequencyUnit::Secondly => Some("BYSECOND"),
            FrequencyUnit::Minutely => Some("BYMINUTE"),
            FrequencyUnit::Hourly => Some("BYHOUR"),
            FrequencyUnit::Daily => None,
            FrequencyUnit::Weekly | FrequencyUnit::Monthly => Some("BYDAY"),
            FrequencyUnit::Yearly => Some("BYYEARDAY"),
        }
    }
}

impl fmt::Display for FrequencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Structured description of a recurrence rule, for callers that keep rules
/// in configuration rather than recurrence text.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RecurrenceConfig {
    /// Start of the first occurrence (`YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]`).
    pub start_time: String,
    /// End of the first occurrence.
    pub end_time: String,
    /// Whether occurrences span whole days.
    #[serde(default)]
    pub all_day: bool,
    /// How the rule repeats.
    pub frequency: Option<FrequencyConfig>,
    /// Last date the rule repeats on.
    pub repeat_until: Option<String>,
}

/// Structured description of a [`Frequency`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FrequencyConfig {
    /// Repetition period name, matched case-insensitively (`weekly`).
    pub unit: String,
    /// Qualifier entries, in the shape the unit expects.
    #[serde(default)]
    pub qualifiers: Vec<String>,
    /// Stride between repetitions.
    pub interval: Option<u32>,
}
