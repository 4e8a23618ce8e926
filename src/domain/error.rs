//! Domain Error Types
//!
//! Pure validation errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Request data that violates a domain rule.
///
/// All variants are client errors and surface as HTTP 400.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Month key is not `YYYY-MM`
    #[error("Invalid month key: {0}")]
    InvalidMonthKey(String),

    /// Date matches neither RFC 3339 nor `YYYY-MM-DD`
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Goal status outside the closed set
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Password shorter than the minimum length
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    /// Email missing or blank
    #[error("Email is required")]
    EmailRequired,

    /// Required text field missing or blank
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Monetary amount below zero
    #[error("Amount must not be negative: {0}")]
    NegativeAmount(&'static str),

    /// Monetary amount too large or with sub-cent precision
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(&'static str),

    /// Text longer than its column allows
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl DomainError {
    /// Machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMonthKey(_) => "invalid_month_key",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidStatus(_) => "invalid_status",
            Self::PasswordTooShort { .. } => "password_too_short",
            Self::EmailRequired => "email_required",
            Self::MissingField(_) => "missing_field",
            Self::NegativeAmount(_) => "negative_amount",
            Self::AmountOutOfRange(_) => "amount_out_of_range",
            Self::TooLong { .. } => "too_long",
        }
    }
}

/// Longest category, plan category and category name
pub const MAX_CATEGORY_LEN: usize = 64;

/// Longest email address
pub const MAX_EMAIL_LEN: usize = 255;

/// Decimal places kept by amount columns
const AMOUNT_SCALE: u32 = 2;

/// Amounts are stored as `NUMERIC(14, 2)`
const AMOUNT_INTEGER_LIMIT: i64 = 1_000_000_000_000;

/// Reject blank text, returning the trimmed value.
pub fn require_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Reject text longer than `max` characters.
pub fn require_max_len(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::TooLong { field, max });
    }
    Ok(())
}

/// Reject amounts below zero.
pub fn require_non_negative(field: &'static str, amount: Decimal) -> Result<Decimal, DomainError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::NegativeAmount(field));
    }
    Ok(amount)
}

/// Accept a storable amount: not negative, below one trillion, at most
/// two decimal places.
pub fn require_amount(field: &'static str, amount: Decimal) -> Result<Decimal, DomainError> {
    let amount = require_non_negative(field, amount)?;
    let limit = Decimal::new(AMOUNT_INTEGER_LIMIT, 0);
    if amount >= limit || amount.normalize().scale() > AMOUNT_SCALE {
        return Err(DomainError::AmountOutOfRange(field));
    }
    Ok(amount)
}
