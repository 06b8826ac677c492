//! Input checks shared by the directory, catalog and recorder.
//!
//! Everything here runs before any store write.

use crate::error::{Error, Result};

/// Reject empty or whitespace-only input.
///
/// # Errors
///
/// Returns a validation error naming `field` when `value` is blank.
pub fn require_non_blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be blank"));
    }
    Ok(())
}

/// Reject a partial update that would blank a field.
///
/// # Errors
///
/// Returns a validation error naming `field` when `value` is `Some` and blank.
pub fn reject_blank_update(field: &'static str, value: Option<&String>) -> Result<()> {
    match value {
        Some(v) => require_non_blank(field, v),
        None => Ok(()),
    }
}

/// Parse a user-entered amount as a positive integer.
///
/// # Errors
///
/// Returns a validation error for blank, malformed, non-positive or
/// out-of-range input.
///
/// # Examples
///
/// ```
/// use palcharity::parse_amount;
///
/// assert_eq!(parse_amount(" 150 ").unwrap(), 150);
/// assert!(parse_amount("0").is_err());
/// assert!(parse_amount("12.5").is_err());
/// ```
pub fn parse_amount(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("amount", "is required"));
    }

    let value: i64 = trimmed
        .parse()
        .map_err(|_| Error::validation("amount", format!("'{trimmed}' is not a whole number")))?;

    if value <= 0 {
        return Err(Error::validation("amount", "must be a positive integer"));
    }

    u32::try_from(value).map_err(|_| Error::validation("amount", format!("{value} is too large")))
}
