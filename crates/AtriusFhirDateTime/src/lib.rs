//! # FHIR Date/Time Values
//!
//! Partial-precision date/time values for the FHIR `date`, `dateTime` and
//! `instant` primitives. A value keeps its precision (year through
//! millisecond) and its timezone state (none, fixed offset, or Zulu)
//! separately from the instant it holds. Values parse the strict FHIR syntax,
//! the lenient compact forms and HL7 V3 timestamps, and they render back at
//! exactly their precision.
//!
//! ```rust
//! use atrius_fhir_datetime::{FhirDate, FhirDateTime, TemporalPrecision};
//!
//! let month = FhirDate::parse("202106").unwrap();
//! assert_eq!(month.precision(), TemporalPrecision::Month);
//! assert_eq!(month.format().as_deref(), Some("2021-06"));
//!
//! let v3 = FhirDateTime::parse_v3("20130202201303-0500").unwrap();
//! assert_eq!(v3.value_as_string(), Some("2013-02-02T20:13:03-05:00"));
//! ```

pub mod date_time;
pub mod error;
pub mod format;
pub mod kind;
pub mod precision;
pub mod v3;
#[cfg(feature = "cli")]
pub mod cli;

pub use date_time::{DateTimeValue, FhirDate, FhirDateTime, FhirInstant};
pub use error::{DateTimeError, DateTimeResult};
pub use kind::{DateKind, DateTimeKind, InstantKind, TemporalKind};
pub use precision::{CalendarField, TemporalPrecision, Zone};
