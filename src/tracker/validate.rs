//! Input validation at the form boundary.
//!
//! Every create/edit form runs its raw text through these before touching a
//! core mutator, so the core never sees empty names or non-numeric values.

use crate::error::{Result, TrackerError};

use super::buttons::magnitude_from_f64;

/// Non-empty, trimmed label.
pub fn label(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::InvalidInput("name must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

fn number(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| TrackerError::InvalidInput(format!("not a number: {:?}", raw.trim())))
}

/// Magnitude for a new action: numeric, non-zero, and within `MAX_MAGNITUDE`.
/// Sign is irrelevant.
pub fn new_magnitude(raw: &str) -> Result<i64> {
    let value = magnitude_from_f64(number(raw)?)?;
    if value == 0 {
        return Err(TrackerError::InvalidInput(
            "please enter a non-zero number".into(),
        ));
    }
    Ok(value)
}

/// Magnitude for an edit: any in-range number, zero included.
pub fn edit_magnitude(raw: &str) -> Result<f64> {
    let value = number(raw)?;
    magnitude_from_f64(value)?;
    Ok(value)
}

/// Store price: a positive whole number of points.
pub fn price(raw: &str) -> Result<u64> {
    let value = number(raw)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(TrackerError::InvalidInput(
            "please enter a valid price".into(),
        ));
    }
    let rounded = value.round();
    if rounded < 1.0 {
        return Err(TrackerError::InvalidInput(
            "please enter a valid price".into(),
        ));
    }
    Ok(rounded as u64)
}

/// Optional text field: blank keeps `fallback`.
pub fn or_keep(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
