//! # Error Types
//!
//! Domain-specific error types for agro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  agro-core errors (this file)                                          │
//! │  ├── CoreError        - Producer lifecycle rule violations             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  agro-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  agro-service errors                                                   │
//! │  └── ServiceError     - CoreError | DbError                            │
//! │                                                                         │
//! │  HTTP errors (in app)                                                  │
//! │  └── ApiError         - What clients see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (document, ID, areas)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a client-facing message

use thiserror::Error;

use crate::area::Area;

// =============================================================================
// Core Error
// =============================================================================

/// Producer lifecycle errors.
///
/// All of these are detected before a write commits and are reported to the
/// client as-is. None of them is ever retried automatically.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Agricultural plus vegetation area exceeds the total area.
    ///
    /// ## When This Occurs
    /// - Create with an inconsistent triple
    /// - Update carrying all three area fields with an inconsistent triple
    #[error("The sum of agricultural area ({agricultural}) and vegetation area ({vegetation}) cannot exceed the total area ({total})")]
    InvalidArea {
        total: Area,
        agricultural: Area,
        vegetation: Area,
    },

    /// An update carried some, but not all, of the three area fields.
    ///
    /// ## Why
    /// Checking a mix of stored and requested values would let the stored
    /// triple drift into a state the area invariant never saw.
    #[error("If one of the areas (total, agricultural or vegetation) is provided, the other two must be provided as well")]
    InconsistentAreaFields,

    /// Some requested crop ids do not exist in the crop catalog.
    #[error("Some of the provided crops are invalid: requested {requested}, found {found}")]
    InvalidCropReference { requested: usize, found: usize },

    /// Another producer already holds this document.
    #[error("A producer with document {0} already exists")]
    DuplicateDocument(String),

    /// Producer cannot be found.
    #[error("Producer not found: {0}")]
    ProducerNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet field requirements.
/// Used for early validation before any store access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid document).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A list that must carry at least one element is empty.
    #[error("{field} must not be empty")]
    EmptyList { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_area_message() {
        let err = CoreError::InvalidArea {
            total: Area::from_hundredths(10_000),
            agricultural: Area::from_hundredths(8_000),
            vegetation: Area::from_hundredths(3_000),
        };
        assert_eq!(
            err.to_string(),
            "The sum of agricultural area (80.00 ha) and vegetation area (30.00 ha) cannot exceed the total area (100.00 ha)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "producerName".to_string(),
        };
        assert_eq!(err.to_string(), "producerName is required");

        let err = ValidationError::EmptyList {
            field: "crops".to_string(),
        };
        assert_eq!(err.to_string(), "crops must not be empty");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Negative {
            field: "totalArea".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
