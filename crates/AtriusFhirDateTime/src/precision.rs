use std::fmt;
use std::str::FromStr;

use chrono::FixedOffset;

use crate::error::{DateTimeError, DateTimeResult};

/// Precision levels for FHIR date/time values.
///
/// Ordered from coarsest to finest, so `p >= TemporalPrecision::Minute`
/// reads as "carries a time of day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum TemporalPrecision {
    /// Year only (YYYY)
    Year,
    /// Year and month (YYYY-MM)
    Month,
    /// Full date (YYYY-MM-DD)
    Day,
    /// Date with hour and minute (YYYY-MM-DDTHH:MM)
    Minute,
    /// Date with time to seconds (YYYY-MM-DDTHH:MM:SS)
    Second,
    /// Date with time to milliseconds (YYYY-MM-DDTHH:MM:SS.sss)
    Milli,
}

impl TemporalPrecision {
    /// All precisions, coarsest first.
    pub const ALL: [TemporalPrecision; 6] = [
        TemporalPrecision::Year,
        TemporalPrecision::Month,
        TemporalPrecision::Day,
        TemporalPrecision::Minute,
        TemporalPrecision::Second,
        TemporalPrecision::Milli,
    ];

    /// Returns true if values at this precision carry a time of day.
    pub fn has_time(self) -> bool {
        self >= TemporalPrecision::Minute
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemporalPrecision::Year => "YEAR",
            TemporalPrecision::Month => "MONTH",
            TemporalPrecision::Day => "DAY",
            TemporalPrecision::Minute => "MINUTE",
            TemporalPrecision::Second => "SECOND",
            TemporalPrecision::Milli => "MILLI",
        }
    }
}

impl fmt::Display for TemporalPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemporalPrecision {
    type Err = DateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "year" => Ok(TemporalPrecision::Year),
            "month" => Ok(TemporalPrecision::Month),
            "day" => Ok(TemporalPrecision::Day),
            "minute" => Ok(TemporalPrecision::Minute),
            "second" => Ok(TemporalPrecision::Second),
            "milli" | "millisecond" => Ok(TemporalPrecision::Milli),
            _ => Err(DateTimeError::format("unknown precision", s)),
        }
    }
}

/// Timezone state of a date/time value.
///
/// `Offset` and `Zulu` are kept apart even when the offset is zero:
/// `+00:00` and `Z` render differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// No timezone was supplied, or none applies (date-only values).
    #[default]
    Absent,
    /// A fixed offset from UTC.
    Offset(FixedOffset),
    /// UTC, written with the literal `Z` suffix.
    Zulu,
}

impl Zone {
    /// Builds a fixed-offset zone from a signed number of minutes east of UTC.
    pub fn from_offset_minutes(minutes: i32) -> DateTimeResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Zone::Offset)
            .ok_or_else(|| DateTimeError::OutOfRange(format!("offset of {} minutes", minutes)))
    }

    /// Builds a fixed-offset zone, rounding the offset to the nearest whole
    /// minute. Historical local offsets such as `-04:56:02` carry seconds that
    /// the `±HH:MM` suffix cannot express.
    pub fn from_fixed_offset(offset: FixedOffset) -> Self {
        let minutes = whole_minutes(offset.local_minus_utc());
        FixedOffset::east_opt(minutes * 60).map_or(Zone::Absent, Zone::Offset)
    }

    /// Offset from UTC in whole minutes; `Zulu` reports zero.
    pub fn offset_minutes(&self) -> Option<i32> {
        match self {
            Zone::Absent => None,
            Zone::Offset(offset) => Some(whole_minutes(offset.local_minus_utc())),
            Zone::Zulu => Some(0),
        }
    }

    /// The same zone with any fixed offset rounded to whole minutes.
    pub(crate) fn normalized(self) -> Self {
        match self {
            Zone::Offset(offset) => Zone::from_fixed_offset(offset),
            other => other,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Zone::Absent)
    }

    /// Zone equality for value comparison: two present zones are
    /// interchangeable when the instants already match, except that a
    /// non-zero offset never matches `Zulu`.
    pub(crate) fn equivalent(&self, other: &Zone) -> bool {
        match (self, other) {
            (Zone::Absent, Zone::Absent) => true,
            (Zone::Zulu, Zone::Zulu) | (Zone::Offset(_), Zone::Offset(_)) => true,
            (Zone::Zulu, Zone::Offset(o)) | (Zone::Offset(o), Zone::Zulu) => {
                o.local_minus_utc() == 0
            }
            _ => false,
        }
    }
}

impl fmt::Display for Zone {
    /// Renders the suffix used in FHIR text: empty, `Z`, or `±HH:MM`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.offset_minutes()) {
            (Zone::Zulu, _) => f.write_str("Z"),
            (_, None) => Ok(()),
            (_, Some(minutes)) => {
                let sign = if minutes < 0 { '-' } else { '+' };
                let abs = minutes.abs();
                write!(f, "{}{:02}:{:02}", sign, abs / 60, abs % 60)
            }
        }
    }
}

/// Rounds an offset in seconds to the nearest minute, halves away from zero.
fn whole_minutes(seconds: i32) -> i32 {
    let rounded = (seconds.abs() + 30) / 60;
    if seconds < 0 { -rounded } else { rounded }
}

/// Calendar field selector for date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl FromStr for CalendarField {
    type Err = DateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "year" | "years" => Ok(CalendarField::Year),
            "month" | "months" => Ok(CalendarField::Month),
            "day" | "days" | "date" => Ok(CalendarField::Day),
            "hour" | "hours" => Ok(CalendarField::Hour),
            "minute" | "minutes" => Ok(CalendarField::Minute),
            "second" | "seconds" => Ok(CalendarField::Second),
            "millisecond" | "milliseconds" | "milli" => Ok(CalendarField::Millisecond),
            _ => Err(DateTimeError::InvalidField(s.to_string())),
        }
    }
}
