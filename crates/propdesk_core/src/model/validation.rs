//! Synchronous record validation helpers.
//!
//! # Responsibility
//! - Define the single error type returned by every `validate()` call.
//! - Provide shared field checks (blank text, positivity, formats).
//!
//! # Invariants
//! - Validation never touches storage; it only inspects in-memory values.
//! - A failed validation means no write happens.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));
static DATA_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:[a-zA-Z0-9.+-]+/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/]+=*$")
        .expect("valid data url regex")
});

/// Validation failures surfaced to form callers before any write.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    MissingField(&'static str),
    /// Numeric field must be strictly greater than zero.
    NotPositive { field: &'static str, value: f64 },
    /// Numeric field must not be negative.
    Negative { field: &'static str, value: f64 },
    /// An `Other` selection was made without its free-text companion.
    MissingOtherDetail(&'static str),
    /// Field value does not match the expected format.
    InvalidFormat { field: &'static str, value: String },
    /// End of a range is not after its start.
    InvalidRange {
        field: &'static str,
        start: i64,
        end: i64,
    },
    /// Numeric field is outside the accepted range.
    OutOfRange { field: &'static str, value: i64 },
    /// Custom field input does not fit its declared type.
    CustomFieldValue { label: String, expected: &'static str },
    /// Two custom fields of one record share an id.
    DuplicateCustomField(Uuid),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "`{field}` is required"),
            Self::NotPositive { field, value } => {
                write!(f, "`{field}` must be greater than 0, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "`{field}` must not be negative, got {value}")
            }
            Self::MissingOtherDetail(field) => {
                write!(f, "`{field}` is required when `other` is selected")
            }
            Self::InvalidFormat { field, value } => {
                write!(f, "`{field}` has an invalid format: `{value}`")
            }
            Self::InvalidRange { field, start, end } => {
                write!(f, "`{field}` end ({end}) must be after start ({start})")
            }
            Self::OutOfRange { field, value } => {
                write!(f, "`{field}` is out of range: {value}")
            }
            Self::CustomFieldValue { label, expected } => {
                write!(f, "custom field `{label}` expects a {expected} value")
            }
            Self::DuplicateCustomField(id) => {
                write!(f, "custom field id `{id}` is used more than once")
            }
        }
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub(crate) fn require_text(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

pub(crate) fn require_other_detail(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingOtherDetail(field));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> ValidationResult {
    // NaN and infinities are not finite.
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> ValidationResult {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn require_email(field: &'static str, value: &str) -> ValidationResult {
    require_text(field, value)?;
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(ValidationError::InvalidFormat {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_url(field: &'static str, value: &str) -> ValidationResult {
    require_text(field, value)?;
    if !URL_RE.is_match(value.trim()) {
        return Err(ValidationError::InvalidFormat {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_data_url(field: &'static str, value: &str) -> ValidationResult {
    require_text(field, value)?;
    if !DATA_URL_RE.is_match(value) {
        // Payloads are large; keep only the header in the error.
        let header = value.split(',').next().unwrap_or_default().to_string();
        return Err(ValidationError::InvalidFormat {
            field,
            value: header,
        });
    }
    Ok(())
}
