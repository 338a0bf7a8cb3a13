//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use shared::error::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: project, building, zone label
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: building code, apartment number, color codes
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Viewbox strings
pub const MAX_VIEWBOX_LEN: usize = 128;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        ));
    }
    Ok(())
}

/// Validate an optional CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`).
pub fn validate_color(value: &Option<String>, field: &str) -> Result<(), AppError> {
    let Some(color) = value.as_deref().filter(|c| !c.is_empty()) else {
        return Ok(());
    };
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be a hex color like #22c55e"),
        ));
    }
    Ok(())
}

/// Validate an optional non-negative number (prices, areas).
pub fn validate_non_negative(value: Option<f64>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value
        && (!v.is_finite() || v < 0.0)
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be a non-negative number"),
        ));
    }
    Ok(())
}

/// Validate an optional fraction in `0.0..=1.0` (opacity).
pub fn validate_fraction(value: Option<f64>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value
        && !(0.0..=1.0).contains(&v)
    {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be between 0 and 1"),
        ));
    }
    Ok(())
}

/// Validate an optional pixel size.
pub fn validate_positive(value: Option<i64>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value
        && v <= 0
    {
        return Err(AppError::invalid_field(field, format!("{field} must be positive")));
    }
    Ok(())
}

/// Empty strings clear optional text fields.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Tower A", "name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("  ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.details.unwrap().get("field").unwrap(), "name");
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_color() {
        assert!(validate_color(&Some("#22c55e".into()), "fill_color").is_ok());
        assert!(validate_color(&Some("#fff".into()), "fill_color").is_ok());
        assert!(validate_color(&Some(String::new()), "fill_color").is_ok());
        assert!(validate_color(&None, "fill_color").is_ok());
        assert!(validate_color(&Some("green".into()), "fill_color").is_err());
        assert!(validate_color(&Some("#12345".into()), "fill_color").is_err());
    }

    #[test]
    fn test_non_negative() {
        assert!(validate_non_negative(Some(0.0), "price").is_ok());
        assert!(validate_non_negative(None, "price").is_ok());
        assert!(validate_non_negative(Some(-1.0), "price").is_err());
    }

    #[test]
    fn test_fraction_and_positive() {
        assert!(validate_fraction(Some(0.0), "opacity").is_ok());
        assert!(validate_fraction(Some(1.0), "opacity").is_ok());
        assert!(validate_fraction(Some(1.5), "opacity").is_err());
        assert!(validate_fraction(Some(f64::NAN), "opacity").is_err());
        assert!(validate_positive(Some(0), "width").is_err());
        assert!(validate_positive(None, "width").is_ok());
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" A ".into())), Some("A".into()));
    }
}
