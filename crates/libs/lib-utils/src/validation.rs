//! # Validation Utilities
//!
//! Input validation helpers.

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate that a number lies within `min..=max`.
pub fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<(), String>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        Err(format!("{} must be between {} and {}", field_name, min, max))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_is_empty() {
        assert!(validate_not_empty("   ", "username").is_err());
        assert!(validate_not_empty(" alice ", "username").is_ok());
    }

    #[test]
    fn range_is_inclusive() {
        assert!(validate_range(1, 1, 100, "attempts").is_ok());
        assert!(validate_range(100, 1, 100, "attempts").is_ok());
        assert_eq!(
            validate_range(0, 1, 100, "attempts").unwrap_err(),
            "attempts must be between 1 and 100"
        );
    }
}
