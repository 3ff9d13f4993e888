//! Error types for FHIR date/time values
//!
//! Every fallible operation on a [`DateTimeValue`](crate::DateTimeValue)
//! reports one of these variants synchronously. Nothing is retried or
//! recovered internally.

use thiserror::Error;

use crate::precision::TemporalPrecision;

/// Result type alias for date/time operations
pub type DateTimeResult<T> = Result<T, DateTimeError>;

/// Errors raised while parsing, constructing or manipulating date/time values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateTimeError {
    /// The text does not match any recognized date/time form, or is
    /// structurally invalid at one of the fixed offsets.
    #[error("Invalid date/time string ({reason}): {value}")]
    Format { reason: String, value: String },

    /// The precision is not permitted for the concrete datatype.
    #[error(
        "Invalid date/time string (datatype {datatype} does not support {precision} precision): {value}"
    )]
    InvalidPrecision {
        datatype: &'static str,
        precision: TemporalPrecision,
        value: String,
    },

    /// Unknown field selector passed to date arithmetic.
    #[error("Unknown field constant: {0}")]
    InvalidField(String),

    /// The operation needs an instant but the value is empty.
    #[error("{0} contains null value")]
    NullValue(&'static str),

    /// Arithmetic or offset outside the representable range.
    #[error("Date/time out of range: {0}")]
    OutOfRange(String),
}

impl DateTimeError {
    pub(crate) fn format(reason: impl Into<String>, value: &str) -> Self {
        DateTimeError::Format {
            reason: reason.into(),
            value: value.to_string(),
        }
    }
}
