use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write as _;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{
    DateTime, Datelike, Days, FixedOffset, Local, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeDelta, TimeZone, Utc,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use tracing::{debug, trace};

use crate::error::{DateTimeError, DateTimeResult};
use crate::format;
use crate::kind::{DateKind, DateTimeKind, InstantKind, TemporalKind};
use crate::precision::{CalendarField, TemporalPrecision, Zone};
use crate::v3;

/// FHIR `date` value (year, year-month or full date).
pub type FhirDate = DateTimeValue<DateKind>;
/// FHIR `dateTime` value (any precision, optional timezone).
pub type FhirDateTime = DateTimeValue<DateTimeKind>;
/// FHIR `instant` value (second or millisecond precision).
pub type FhirInstant = DateTimeValue<InstantKind>;

/// Precision-aware FHIR date/time value.
///
/// A value is an absolute instant together with a precision, which says how
/// much of the instant is meaningful, and a timezone state, which says how the
/// wall clock should be rendered. The three parts are tracked independently:
/// changing the precision or the zone re-renders the text but never moves the
/// instant.
///
/// # FHIR DateTime Formats
/// - `YYYY` - Year only
/// - `YYYYMM` / `YYYY-MM` - Year and month
/// - `YYYYMMDD` / `YYYY-MM-DD` - Date only
/// - `YYYY-MM-DDTHH:MM` - Date with hour and minute
/// - `YYYY-MM-DDTHH:MM:SS` - Date with time to seconds
/// - `YYYY-MM-DDTHH:MM:SS.sss` - Date with time to milliseconds
/// - Time formats may end in `Z` or a `+HH:MM` / `-HH:MM` offset
///
/// # Examples
/// ```rust
/// use atrius_fhir_datetime::{FhirDateTime, TemporalPrecision, CalendarField};
///
/// let mut dt = FhirDateTime::parse("2015-04-11T12:22:01-04:00").unwrap();
/// assert_eq!(dt.precision(), TemporalPrecision::Second);
///
/// dt.add(CalendarField::Hour, 2).unwrap();
/// assert_eq!(dt.value_as_string(), Some("2015-04-11T14:22:01-04:00"));
/// ```
#[derive(Debug, Clone)]
pub struct DateTimeValue<K: TemporalKind = DateTimeKind> {
    /// The instant, truncated to whole milliseconds (None when empty)
    instant: Option<DateTime<Utc>>,
    /// Explicit precision; falls back to the datatype default
    precision: Option<TemporalPrecision>,
    zone: Zone,
    /// Parsed text, or the rendering after the last mutation
    text: Option<Arc<str>>,
    kind: PhantomData<K>,
}

impl<K: TemporalKind> Default for DateTimeValue<K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: TemporalKind> DateTimeValue<K> {
    /// Creates a value holding no instant.
    pub fn empty() -> Self {
        Self {
            instant: None,
            precision: None,
            zone: Zone::Absent,
            text: None,
            kind: PhantomData,
        }
    }

    /// Creates a value from an instant and an explicit precision.
    ///
    /// Time precisions adopt the local system offset, as [`set_value`](Self::set_value) does.
    ///
    /// # Errors
    /// [`DateTimeError::InvalidPrecision`] if this datatype does not allow `precision`.
    pub fn new(instant: DateTime<Utc>, precision: TemporalPrecision) -> DateTimeResult<Self> {
        let mut value = Self::empty();
        value.set_value_with_precision(instant, precision)?;
        Ok(value)
    }

    /// Creates a value from an instant, a precision and an explicit zone.
    ///
    /// Passing [`Zone::Absent`] yields a naive value rendered in local time
    /// without a suffix. Offsets are rounded to whole minutes.
    pub fn with_zone(
        instant: DateTime<Utc>,
        precision: TemporalPrecision,
        zone: Zone,
    ) -> DateTimeResult<Self> {
        Self::check_precision(precision, &instant.to_rfc3339())?;
        let mut value = Self::empty();
        value.instant = Some(truncate_to_millis(instant));
        value.precision = Some(precision);
        value.zone = zone.normalized();
        value.refresh_text();
        Ok(value)
    }

    /// Parses a FHIR date/time string, deriving precision and zone from its shape.
    ///
    /// This does not enforce the datatype's allowed precisions; use
    /// [`str::parse`] for the checked constructor.
    pub fn parse(text: &str) -> DateTimeResult<Self> {
        let parsed = parse_text(text)?;
        if !K::is_precision_allowed(parsed.precision) {
            debug!(
                "Invalid date/time string (datatype {} does not support {} precision): {}",
                K::NAME,
                parsed.precision,
                text
            );
        }
        Ok(Self {
            instant: Some(parsed.instant),
            precision: Some(parsed.precision),
            zone: parsed.zone,
            text: Some(Arc::from(text)),
            kind: PhantomData,
        })
    }

    /// Parses an HL7 V3 compact timestamp such as `20130202201303-0500`.
    ///
    /// Blank input yields an empty value rather than an error.
    pub fn parse_v3(text: &str) -> DateTimeResult<Self> {
        match v3::to_fhir_syntax(text) {
            None => Ok(Self::empty()),
            Some(rewritten) => {
                trace!("Rewrote V3 timestamp {} as {}", text, rewritten);
                Self::parse(&rewritten)
            }
        }
    }

    /// Replaces this value by parsing `text`. On failure the value is left untouched.
    pub fn set_value_as_string(&mut self, text: &str) -> DateTimeResult<()> {
        *self = Self::parse(text)?;
        Ok(())
    }

    /// Replaces this value by parsing a V3 timestamp. On failure the value is left untouched.
    pub fn set_value_as_v3_string(&mut self, text: &str) -> DateTimeResult<()> {
        *self = Self::parse_v3(text)?;
        Ok(())
    }

    /// Returns the string form: the parsed text, or the rendering after the last change.
    pub fn value_as_string(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Renders the value using exactly the pattern implied by its precision and zone.
    ///
    /// Date precisions never carry a zone suffix. Time precisions end in `Z`,
    /// a `±HH:MM` offset, or nothing when no zone was set.
    pub fn format(&self) -> Option<String> {
        let dt = self.to_chrono_datetime()?;
        let precision = self.precision();
        let mut text = format::render(&dt, precision);
        if precision.has_time() {
            // Writing to a String cannot fail
            let _ = write!(text, "{}", self.zone);
        }
        Some(text)
    }

    pub fn is_empty(&self) -> bool {
        self.instant.is_none()
    }

    /// Returns the instant, if any.
    pub fn value(&self) -> Option<DateTime<Utc>> {
        self.instant
    }

    /// Sets the instant using the default precision for this datatype.
    ///
    /// If no zone is set and the default precision carries a time of day, the
    /// local system offset at that instant is adopted.
    pub fn set_value(&mut self, instant: DateTime<Utc>) {
        self.instant = Some(truncate_to_millis(instant));
        self.precision = Some(K::default_precision());
        self.adopt_local_zone();
        self.refresh_text();
    }

    /// Sets the instant with an explicit precision, adopting the local offset
    /// for time precisions when no zone is set.
    pub fn set_value_with_precision(
        &mut self,
        instant: DateTime<Utc>,
        precision: TemporalPrecision,
    ) -> DateTimeResult<()> {
        Self::check_precision(precision, &instant.to_rfc3339())?;
        self.instant = Some(truncate_to_millis(instant));
        self.precision = Some(precision);
        self.adopt_local_zone();
        self.refresh_text();
        Ok(())
    }

    /// Empties the value, including its precision and zone.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Returns the precision, using the datatype default if none was set.
    pub fn precision(&self) -> TemporalPrecision {
        self.precision.unwrap_or_else(K::default_precision)
    }

    /// Changes the precision without moving the instant.
    pub fn set_precision(&mut self, precision: TemporalPrecision) -> DateTimeResult<()> {
        Self::check_precision(precision, self.value_as_string().unwrap_or_default())?;
        self.precision = Some(precision);
        self.refresh_text();
        Ok(())
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Replaces the zone without moving the instant. Offsets are rounded to
    /// whole minutes.
    pub fn set_zone(&mut self, zone: Zone) {
        self.zone = zone.normalized();
        self.refresh_text();
    }

    /// Returns the fixed offset, or `None` when the zone is absent or Zulu.
    pub fn time_zone(&self) -> Option<FixedOffset> {
        match self.zone {
            Zone::Offset(offset) => Some(offset),
            _ => None,
        }
    }

    pub fn set_time_zone(&mut self, offset: Option<FixedOffset>) {
        self.set_zone(offset.map_or(Zone::Absent, Zone::Offset));
    }

    pub fn is_time_zone_zulu(&self) -> bool {
        self.zone == Zone::Zulu
    }

    /// Switches to Zulu, or back to no zone when `zulu` is false and the value was Zulu.
    pub fn set_time_zone_zulu(&mut self, zulu: bool) {
        if zulu {
            self.set_zone(Zone::Zulu);
        } else if self.zone == Zone::Zulu {
            self.set_zone(Zone::Absent);
        }
    }

    /// Sets a fixed offset from a signed number of minutes east of UTC, e.g.
    /// `-90` for `-01:30`. Clears Zulu.
    pub fn set_offset_minutes(&mut self, minutes: i32) -> DateTimeResult<()> {
        let zone = Zone::from_offset_minutes(minutes)?;
        self.set_zone(zone);
        Ok(())
    }

    /// Shifts the instant by `amount` units of `field`, keeping the precision.
    ///
    /// Years, months and days move the wall clock of the value's own zone, so
    /// month ends clamp (January 31 plus one month is the last day of
    /// February). Smaller fields add an exact duration.
    pub fn add(&mut self, field: CalendarField, amount: i32) -> DateTimeResult<()> {
        let instant = self.instant.ok_or(DateTimeError::NullValue(K::NAME))?;
        let amount = i64::from(amount);
        let shifted = match field {
            CalendarField::Year => self.shift_wall_clock(instant, |dt| add_months(dt, amount * 12)),
            CalendarField::Month => self.shift_wall_clock(instant, |dt| add_months(dt, amount)),
            CalendarField::Day => self.shift_wall_clock(instant, |dt| add_days(dt, amount)),
            CalendarField::Hour => TimeDelta::try_hours(amount)
                .and_then(|delta| instant.checked_add_signed(delta)),
            CalendarField::Minute => TimeDelta::try_minutes(amount)
                .and_then(|delta| instant.checked_add_signed(delta)),
            CalendarField::Second => TimeDelta::try_seconds(amount)
                .and_then(|delta| instant.checked_add_signed(delta)),
            CalendarField::Millisecond => TimeDelta::try_milliseconds(amount)
                .and_then(|delta| instant.checked_add_signed(delta)),
        };
        // The rendered year must stay within four digits
        let shifted = shifted
            .filter(|dt| (0..=9999).contains(&self.in_own_zone(*dt).year()))
            .ok_or_else(|| {
                DateTimeError::OutOfRange(format!(
                    "adding {} {:?} to {}",
                    amount,
                    field,
                    self.value_as_string().unwrap_or_default()
                ))
            })?;
        self.instant = Some(shifted);
        self.refresh_text();
        Ok(())
    }

    /// Returns true if the value falls on today's date in its own zone.
    ///
    /// # Errors
    /// [`DateTimeError::NullValue`] if the value is empty.
    pub fn is_today(&self) -> DateTimeResult<bool> {
        self.is_same_day_as(Utc::now())
    }

    /// Returns true if `other` falls on the same calendar date as this value,
    /// both read in this value's zone.
    pub fn is_same_day_as(&self, other: DateTime<Utc>) -> DateTimeResult<bool> {
        let own = self
            .to_chrono_datetime()
            .ok_or(DateTimeError::NullValue(K::NAME))?;
        Ok(own.date_naive() == other.with_timezone(own.offset()).date_naive())
    }

    /// Orders two values by instant. `None` if either is empty.
    pub fn compare<O: TemporalKind>(&self, other: &DateTimeValue<O>) -> Option<Ordering> {
        Some(self.instant?.cmp(&other.instant?))
    }

    /// Strictly earlier than `other`.
    pub fn before<O: TemporalKind>(&self, other: &DateTimeValue<O>) -> DateTimeResult<bool> {
        Ok(self.ordering(other)? == Ordering::Less)
    }

    /// Strictly later than `other`.
    pub fn after<O: TemporalKind>(&self, other: &DateTimeValue<O>) -> DateTimeResult<bool> {
        Ok(self.ordering(other)? == Ordering::Greater)
    }

    fn ordering<O: TemporalKind>(&self, other: &DateTimeValue<O>) -> DateTimeResult<Ordering> {
        let own = self.instant.ok_or(DateTimeError::NullValue(K::NAME))?;
        let theirs = other.instant.ok_or(DateTimeError::NullValue(O::NAME))?;
        Ok(own.cmp(&theirs))
    }

    /// Milliseconds since the Unix epoch.
    pub fn time_millis(&self) -> Option<i64> {
        self.instant.map(|instant| instant.timestamp_millis())
    }

    /// The instant as seen in the value's own zone; values without a zone
    /// use the local system offset.
    pub fn to_chrono_datetime(&self) -> Option<DateTime<FixedOffset>> {
        self.instant.map(|instant| self.in_own_zone(instant))
    }

    fn in_own_zone(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self.zone {
            Zone::Zulu => instant.fixed_offset(),
            Zone::Offset(offset) => instant.with_timezone(&offset),
            Zone::Absent => instant.with_timezone(&Local).fixed_offset(),
        }
    }

    /// Human readable rendering in the zone contained in the value.
    ///
    /// `2012-01-05T12:00:00-08:00` renders as `Jan 5, 2012 12:00:00 PM`
    /// regardless of the zone the program runs in.
    pub fn to_human_display(&self) -> DateTimeResult<String> {
        let dt = self
            .to_chrono_datetime()
            .ok_or(DateTimeError::NullValue(K::NAME))?;
        Ok(format::render_human(&dt, self.precision()))
    }

    /// Human readable rendering after converting to the local system zone.
    pub fn to_human_display_local_timezone(&self) -> DateTimeResult<String> {
        let instant = self.instant.ok_or(DateTimeError::NullValue(K::NAME))?;
        let local = instant.with_timezone(&Local).fixed_offset();
        Ok(format::render_human(&local, self.precision()))
    }

    fn check_precision(precision: TemporalPrecision, value: &str) -> DateTimeResult<()> {
        if K::is_precision_allowed(precision) {
            Ok(())
        } else {
            Err(DateTimeError::InvalidPrecision {
                datatype: K::NAME,
                precision,
                value: value.to_string(),
            })
        }
    }

    fn adopt_local_zone(&mut self) {
        if self.zone != Zone::Absent || !self.precision().has_time() {
            return;
        }
        if let Some(instant) = self.instant {
            let offset = instant.with_timezone(&Local).offset().fix();
            trace!("Adopting local offset {} for {}", offset, K::NAME);
            self.zone = Zone::from_fixed_offset(offset);
        }
    }

    fn shift_wall_clock(
        &self,
        instant: DateTime<Utc>,
        shift: impl FnOnce(NaiveDateTime) -> Option<NaiveDateTime>,
    ) -> Option<DateTime<Utc>> {
        let wall_clock = match self.zone {
            Zone::Zulu => instant.naive_utc(),
            Zone::Offset(offset) => instant.with_timezone(&offset).naive_local(),
            Zone::Absent => instant.with_timezone(&Local).naive_local(),
        };
        resolve(shift(wall_clock)?, self.zone)
    }

    fn refresh_text(&mut self) {
        self.text = self.format().map(Arc::from);
    }
}

/// Checked constructor from a string: parses and then rejects precisions the
/// datatype does not allow.
impl<K: TemporalKind> FromStr for DateTimeValue<K> {
    type Err = DateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Self::parse(s)?;
        Self::check_precision(value.precision(), s)?;
        Ok(value)
    }
}

/// Two values are equal when they have the same precision and agree on
/// every field that precision shows. Date precisions compare the calendar
/// date each value reads in its own zone. Time precisions compare the
/// instant cut down to the precision, and the zones must match in kind;
/// fixed offsets are not compared textually, and `+00:00` matches `Z`.
impl<K: TemporalKind, O: TemporalKind> PartialEq<DateTimeValue<O>> for DateTimeValue<K> {
    fn eq(&self, other: &DateTimeValue<O>) -> bool {
        let (own, theirs) = match (self.to_chrono_datetime(), other.to_chrono_datetime()) {
            (None, None) => return true,
            (Some(own), Some(theirs)) => (own, theirs),
            _ => return false,
        };
        let precision = self.precision();
        if precision != other.precision() {
            return false;
        }
        if precision.has_time() {
            self.zone.equivalent(&other.zone)
                && significant_millis(&own, precision) == significant_millis(&theirs, precision)
        } else {
            format::render(&own, precision) == format::render(&theirs, precision)
        }
    }
}

impl<K: TemporalKind> Eq for DateTimeValue<K> {}

impl<K: TemporalKind> fmt::Display for DateTimeValue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value_as_string().unwrap_or_default())
    }
}

// === Serde Implementations ===

#[cfg(feature = "serde")]
impl<K: TemporalKind> Serialize for DateTimeValue<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value_as_string() {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K: TemporalKind> Deserialize<'de> for DateTimeValue<K> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Self::empty()),
            Some(s) => Self::parse(&s).map_err(|e| {
                de::Error::custom(format!("Invalid FHIR {} format: {}", K::NAME, e))
            }),
        }
    }
}

// === Parsing ===

struct Parsed {
    instant: DateTime<Utc>,
    precision: TemporalPrecision,
    zone: Zone,
}

fn parse_text(value: &str) -> DateTimeResult<Parsed> {
    let b = value.as_bytes();
    match b.len() {
        4 if matches_shape(b, b"dddd") => {
            parse_date(value, (0, None, None), TemporalPrecision::Year)
        }
        // E.g. 198401, accepted to be lenient
        6 if matches_shape(b, b"dddddd") => {
            parse_date(value, (0, Some(4), None), TemporalPrecision::Month)
        }
        7 if matches_shape(b, b"dddd-dd") => {
            parse_date(value, (0, Some(5), None), TemporalPrecision::Month)
        }
        // E.g. 19840101, accepted to be lenient
        8 if matches_shape(b, b"dddddddd") => {
            parse_date(value, (0, Some(4), Some(6)), TemporalPrecision::Day)
        }
        10 if matches_shape(b, b"dddd-dd-dd") => {
            parse_date(value, (0, Some(5), Some(8)), TemporalPrecision::Day)
        }
        n if n >= 16 => parse_date_time(value),
        _ => Err(DateTimeError::format("invalid length", value)),
    }
}

/// Parses a date-only form. `fields` holds the byte offsets of the year,
/// month and day groups; missing groups default to 1.
fn parse_date(
    value: &str,
    fields: (usize, Option<usize>, Option<usize>),
    precision: TemporalPrecision,
) -> DateTimeResult<Parsed> {
    let (year_at, month_at, day_at) = fields;
    let year = digits(value, year_at, 4) as i32;
    let month = month_at.map_or(1, |at| digits(value, at, 2));
    let day = day_at.map_or(1, |at| digits(value, at, 2));
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateTimeError::format("no such calendar date", value))?;
    let instant = resolve(date.and_time(NaiveTime::MIN), Zone::Absent)
        .ok_or_else(|| DateTimeError::format("date out of range", value))?;
    Ok(Parsed {
        instant,
        precision,
        zone: Zone::Absent,
    })
}

fn parse_date_time(value: &str) -> DateTimeResult<Parsed> {
    let b = value.as_bytes();
    if b[10] != b'T' {
        return Err(DateTimeError::format("expected 'T' at offset 10", value));
    }
    if value.find(':') != Some(13) || !matches_shape(&b[..16], b"dddd-dd-ddTdd:dd") {
        return Err(DateTimeError::format("malformed date or hour:minute", value));
    }

    let has_seconds = b.get(16) == Some(&b':');
    let dot_index = b
        .get(18..)
        .and_then(|rest| rest.iter().position(|c| *c == b'.'))
        .map(|i| i + 18);
    let zone_index = offset_index(value)?;
    let zone_at = zone_index.unwrap_or(b.len());

    let precision = match (has_seconds, dot_index) {
        (true, Some(19)) => TemporalPrecision::Milli,
        (_, Some(_)) => {
            return Err(DateTimeError::format("misplaced fractional seconds", value));
        }
        (true, None) => TemporalPrecision::Second,
        (false, None) => TemporalPrecision::Minute,
    };
    let body_end = match precision {
        TemporalPrecision::Minute => 16,
        TemporalPrecision::Second => 19,
        _ => zone_at,
    };
    if body_end != zone_at {
        return Err(DateTimeError::format("offset position inconsistent", value));
    }

    let second = if precision >= TemporalPrecision::Second {
        if !matches_shape(&b[16..19], b":dd") {
            return Err(DateTimeError::format("malformed seconds", value));
        }
        digits(value, 17, 2)
    } else {
        0
    };

    let milli = if precision == TemporalPrecision::Milli {
        parse_millis(&value[20..zone_at]).ok_or_else(|| {
            DateTimeError::format("malformed fractional seconds", value)
        })?
    } else {
        0
    };

    let date = NaiveDate::from_ymd_opt(digits(value, 0, 4) as i32, digits(value, 5, 2), digits(value, 8, 2))
        .ok_or_else(|| DateTimeError::format("no such calendar date", value))?;
    let time = NaiveTime::from_hms_milli_opt(digits(value, 11, 2), digits(value, 14, 2), second, milli)
        .ok_or_else(|| DateTimeError::format("no such time of day", value))?;

    let zone = match zone_index {
        None => Zone::Absent,
        Some(at) => parse_zone(&value[at..], value)?,
    };

    let instant = resolve(date.and_time(time), zone)
        .ok_or_else(|| DateTimeError::format("date/time out of range", value))?;
    Ok(Parsed {
        instant,
        precision,
        zone,
    })
}

/// Finds the start of the zone suffix. Only the part after the `T` is
/// scanned so date hyphens are not mistaken for a negative offset.
fn offset_index(value: &str) -> DateTimeResult<Option<usize>> {
    let mut found = None;
    for (i, c) in value.bytes().enumerate().skip(11) {
        if matches!(c, b'+' | b'-' | b'Z') {
            if found.is_some() {
                // More than one separator
                return Err(DateTimeError::format("more than one zone separator", value));
            }
            found = Some(i);
        }
    }
    Ok(found)
}

/// Parses `Z`, `+HH:MM` or `-HH:MM`.
fn parse_zone(suffix: &str, value: &str) -> DateTimeResult<Zone> {
    let b = suffix.as_bytes();
    match b.first() {
        Some(b'Z') if b.len() == 1 => Ok(Zone::Zulu),
        Some(sign @ (b'+' | b'-')) if matches_shape(&b[1..], b"dd:dd") => {
            let hours = digits(suffix, 1, 2) as i32;
            let minutes = digits(suffix, 4, 2) as i32;
            if minutes > 59 {
                return Err(DateTimeError::format("offset minutes out of range", value));
            }
            let total = hours * 60 + minutes;
            let signed = if *sign == b'-' { -total } else { total };
            Zone::from_offset_minutes(signed)
                .map_err(|_| DateTimeError::format("offset out of range", value))
        }
        _ => Err(DateTimeError::format("malformed zone offset", value)),
    }
}

/// Reads fractional seconds as milliseconds. Digits past the third are
/// dropped, not rounded; fewer than three are scaled up (`5` is 500 ms).
fn parse_millis(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || !fraction.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let significant = &fraction[..fraction.len().min(3)];
    format!("{:0<3}", significant).parse().ok()
}

/// Maps a wall-clock reading in `zone` to an instant. Local wall clocks that
/// fall in a DST gap move forward an hour; ambiguous ones take the earlier instant.
fn resolve(naive: NaiveDateTime, zone: Zone) -> Option<DateTime<Utc>> {
    match zone {
        Zone::Zulu => Some(naive.and_utc()),
        Zone::Offset(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        Zone::Absent => Local
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                let moved = naive.checked_add_signed(TimeDelta::hours(1))?;
                Local.from_local_datetime(&moved).earliest()
            })
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Epoch milliseconds with everything below `precision` dropped. The cut is
/// made on the wall clock of `dt`'s own offset.
fn significant_millis(dt: &DateTime<FixedOffset>, precision: TemporalPrecision) -> i64 {
    let unit = match precision {
        TemporalPrecision::Minute => 60_000,
        TemporalPrecision::Second => 1_000,
        _ => 1,
    };
    let shift = i64::from(dt.offset().local_minus_utc()) * 1_000;
    (dt.timestamp_millis() + shift).div_euclid(unit) * unit - shift
}

fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.timestamp_millis()).unwrap_or(instant)
}

fn add_months(dt: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        dt.checked_add_months(count)
    } else {
        dt.checked_sub_months(count)
    }
}

fn add_days(dt: NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    let count = Days::new(days.unsigned_abs());
    if days >= 0 {
        dt.checked_add_days(count)
    } else {
        dt.checked_sub_days(count)
    }
}

/// Matches `bytes` against a shape where `d` stands for an ASCII digit and
/// any other byte must match literally.
fn matches_shape(bytes: &[u8], shape: &[u8]) -> bool {
    bytes.len() == shape.len()
        && bytes.iter().zip(shape).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

/// Reads `len` ASCII digits at byte offset `at`. Callers check the shape first.
fn digits(value: &str, at: usize, len: usize) -> u32 {
    value.as_bytes()[at..at + len]
        .iter()
        .fold(0, |acc, c| acc * 10 + u32::from(c - b'0'))
}
