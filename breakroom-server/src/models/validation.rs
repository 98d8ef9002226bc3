//! Validation error types

use std::fmt;

/// Validation error for request input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field missing or blank
    Required { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Value outside a fixed set
    InvalidVariant {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required { field } => write!(f, "{} is required", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::InvalidVariant {
                field, expected, ..
            } => write!(f, "{} must be {}", field, expected),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trimmed, non-blank text or `Required`.
pub fn require_text(field: &'static str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_owned()),
        _ => Err(ValidationError::Required { field }),
    }
}

/// Optional text where an empty string means "not given".
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            ValidationError::Required { field: "Title" }.to_string(),
            "Title is required"
        );
        let err = ValidationError::InvalidVariant {
            field: "Platform",
            value: "ios".into(),
            expected: "\"web\" or \"android\"",
        };
        assert_eq!(err.to_string(), "Platform must be \"web\" or \"android\"");
    }

    #[test]
    fn require_text_trims() {
        assert_eq!(require_text("Name", Some("  Docs ")).unwrap(), "Docs");
        assert_eq!(
            require_text("Name", Some("   ")).unwrap_err(),
            ValidationError::Required { field: "Name" }
        );
        assert!(require_text("Name", None).is_err());
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(blank_to_none(Some(String::new())), None);
        assert_eq!(blank_to_none(Some("rock".into())), Some("rock".into()));
    }
}
