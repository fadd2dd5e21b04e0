//! Field validation shared by account and payment requests
//!
//! Every check names the field as `table.column` (e.g. `payment.amount`) so a
//! rejected request can be reported without further context.

use rust_decimal::Decimal;

// ============================================================================
// Validation Errors
// ============================================================================

/// Structural request errors, detected before any store interaction.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{field}' field must not be null")]
    Missing { field: &'static str },

    #[error("'{field}' field must not be empty")]
    Empty { field: &'static str },

    #[error("'{field}' field must not exceed {max} chars")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("'{field}' field must be positive")]
    NotPositive { field: &'static str },

    #[error("'{field}' field must not be negative")]
    Negative { field: &'static str },

    #[error("'payment.withdrawalAccountId' and 'payment.depositAccountId' must reference to different accounts")]
    SameAccount,

    #[error("'from' must not be after 'to'")]
    InvalidInterval,
}

// ============================================================================
// Field Limits
// ============================================================================

/// Maximum text lengths, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub owner_name_max_len: usize,
    pub comment_max_len: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            owner_name_max_len: 100,
            comment_max_len: 255,
        }
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Value must be present.
pub fn checked_not_null<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Missing { field })
}

/// Value must be present and strictly greater than zero.
pub fn checked_positive(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Decimal, ValidationError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(v),
        _ => Err(ValidationError::NotPositive { field }),
    }
}

/// Mandatory text: present, not blank, at most `max` chars.
pub fn checked_required_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => check_len(field, v, max),
        _ => Err(ValidationError::Empty { field }),
    }
}

/// Optional text: when present, at most `max` chars. Empty text is kept as-is.
pub fn checked_optional_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    value.map(|v| check_len(field, v, max)).transpose()
}

fn check_len(field: &'static str, value: String, max: usize) -> Result<String, ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(value)
}
