//! Input validation utilities.
//!
//! Operator input arrives as text from a form or the command line. These functions turn
//! that text into typed values and report a [`PatientError`] of the validation family when
//! the text is unusable, before anything touches the store.

use crate::{PatientError, PatientResult};
use hms_types::NonEmptyText;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Validates a required free-text field such as a patient name or condition.
///
/// # Errors
///
/// Returns [`PatientError::EmptyField`] naming `field` if the trimmed input is empty.
pub fn required_text(field: &'static str, input: &str) -> PatientResult<NonEmptyText> {
    NonEmptyText::new(input).map_err(|_| PatientError::EmptyField { field })
}

/// Parses a patient age.
///
/// Accepts a whole number of years, zero included, with surrounding whitespace ignored.
///
/// # Errors
///
/// Returns [`PatientError::InvalidInput`] for empty, negative, fractional or non-numeric input.
pub fn parse_age(input: &str) -> PatientResult<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PatientError::EmptyField { field: "age" });
    }
    trimmed.parse::<u32>().map_err(|_| {
        PatientError::InvalidInput(format!(
            "age must be a non-negative whole number, got '{trimmed}'"
        ))
    })
}

/// Parses the number of days stayed. Must be a whole number of at least one.
pub fn parse_days_stayed(input: &str) -> PatientResult<u32> {
    let trimmed = input.trim();
    let days = trimmed.parse::<u32>().map_err(|_| {
        PatientError::InvalidInput(format!(
            "days stayed must be a whole number, got '{trimmed}'"
        ))
    })?;
    ensure_days_stayed(days)?;
    Ok(days)
}

pub(crate) fn ensure_days_stayed(days: u32) -> PatientResult<()> {
    if days == 0 {
        return Err(PatientError::InvalidInput(
            "days stayed must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Parses a currency amount such as `2500` or `1999.50`.
///
/// # Errors
///
/// Returns [`PatientError::InvalidInput`] naming `field` if the text is not a decimal number
/// or the amount is negative.
pub fn parse_amount(field: &'static str, input: &str) -> PatientResult<Decimal> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed).map_err(|_| {
        PatientError::InvalidInput(format!("{field} must be a number, got '{trimmed}'"))
    })?;
    ensure_non_negative(field, amount)?;
    Ok(amount)
}

pub(crate) fn ensure_non_negative(field: &'static str, amount: Decimal) -> PatientResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PatientError::InvalidInput(format!(
            "{field} cannot be negative"
        )));
    }
    Ok(())
}
