//! Concrete FHIR date/time datatypes.
//!
//! FHIR defines three primitive types over the same partial-precision
//! representation. They differ only in their default precision and in which
//! precisions they accept. Each one is a zero-sized marker implementing
//! [`TemporalKind`], and [`DateTimeValue`](crate::DateTimeValue) is generic
//! over it.

use std::fmt::Debug;

use crate::precision::TemporalPrecision;

/// Capability declared by each concrete date/time datatype.
pub trait TemporalKind: Debug + Clone + Copy + Default + Send + Sync + 'static {
    /// FHIR datatype name, used in error messages.
    const NAME: &'static str;

    /// Precision used when a raw instant is set without one.
    fn default_precision() -> TemporalPrecision;

    /// Whether values of this datatype may carry the given precision.
    fn is_precision_allowed(precision: TemporalPrecision) -> bool;
}

/// FHIR `date`: year, year-month or full date, never a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateKind;

impl TemporalKind for DateKind {
    const NAME: &'static str = "date";

    fn default_precision() -> TemporalPrecision {
        TemporalPrecision::Day
    }

    fn is_precision_allowed(precision: TemporalPrecision) -> bool {
        matches!(
            precision,
            TemporalPrecision::Year | TemporalPrecision::Month | TemporalPrecision::Day
        )
    }
}

/// FHIR `dateTime`: any precision from year to millisecond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateTimeKind;

impl TemporalKind for DateTimeKind {
    const NAME: &'static str = "dateTime";

    fn default_precision() -> TemporalPrecision {
        TemporalPrecision::Second
    }

    fn is_precision_allowed(_precision: TemporalPrecision) -> bool {
        true
    }
}

/// FHIR `instant`: a full timestamp to the second or millisecond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InstantKind;

impl TemporalKind for InstantKind {
    const NAME: &'static str = "instant";

    fn default_precision() -> TemporalPrecision {
        TemporalPrecision::Milli
    }

    fn is_precision_allowed(precision: TemporalPrecision) -> bool {
        matches!(precision, TemporalPrecision::Second | TemporalPrecision::Milli)
    }
}
