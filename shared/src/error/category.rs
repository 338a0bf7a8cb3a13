//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Validation errors
/// - 2xxx: Not-found errors
/// - 3xxx: External process errors
/// - 4xxx: Storage errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Validation errors (1xxx)
    Validation,
    /// Not-found errors (2xxx)
    NotFound,
    /// External process errors (3xxx)
    ExternalProcess,
    /// Storage errors (4xxx)
    Storage,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Validation,
            2000..3000 => Self::NotFound,
            3000..4000 => Self::ExternalProcess,
            4000..5000 => Self::Storage,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::ExternalProcess => "external_process",
            Self::Storage => "storage",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::from_code(2005), ErrorCategory::NotFound);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::ExternalProcess);
        assert_eq!(ErrorCategory::from_code(4002), ErrorCategory::Storage);
        assert_eq!(ErrorCategory::from_code(5000), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::ValidationFailed.category(), ErrorCategory::General);
        assert_eq!(
            ErrorCode::PolygonTooFewPoints.category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCode::ZoneNotFound.category(), ErrorCategory::NotFound);
        assert_eq!(
            ErrorCode::DetectionTimeout.category(),
            ErrorCategory::ExternalProcess
        );
        assert_eq!(
            ErrorCode::ImageReplaceFailed.category(),
            ErrorCategory::Storage
        );
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::ExternalProcess).unwrap();
        assert_eq!(json, "\"external_process\"");
        assert_eq!(ErrorCategory::NotFound.name(), "not_found");
    }
}
