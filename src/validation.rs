//! Field checks shared by the request payloads.

use crate::error::AppError;
use crate::Result;

/// Length bounds are counted in characters, not bytes.
pub fn require_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min {
        return Err(AppError::validation(
            field,
            format!("{} must be at least {} characters", field, min),
        ));
    }
    if len > max {
        return Err(AppError::validation(
            field,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(())
}

pub fn require_min_length(field: &str, value: &str, min: usize) -> Result<()> {
    require_length(field, value, min, usize::MAX)
}

pub fn require_email(field: &str, value: &str) -> Result<()> {
    let invalid = || AppError::validation(field, format!("{} is not a valid email address", field));

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(
            field,
            format!("{} must be a non-negative number", field),
        ));
    }
    Ok(())
}
