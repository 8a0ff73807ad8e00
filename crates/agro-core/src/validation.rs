//! # Validation Module
//!
//! Input validation and business rules for the producer registry.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json)                                   │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Area values must be finite numbers                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called by the service)                          │
//! │  ├── Field rules (blank, length, document checksum, UUIDs)             │
//! │  ├── Area co-presence on update                                        │
//! │  └── Area consistency: agricultural + vegetation <= total              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (document), UNIQUE (producer_id, crop_id)                  │
//! │  └── Foreign keys with ON DELETE CASCADE                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::area::Area;
use crate::document::is_valid_document;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{CreateProducerInput, UpdateProducerInput};
use crate::MAX_PAGE_LIMIT;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_PLACE_LEN: usize = 100;

// =============================================================================
// Area Rules
// =============================================================================

/// Validates that agricultural plus vegetation area fits inside the total.
///
/// Equality is valid. A sum that overflows is treated as exceeding.
///
/// ## Example
/// ```rust
/// use agro_core::area::Area;
/// use agro_core::validation::validate_area_consistency;
///
/// let ha = |h: i64| Area::from_hundredths(h * 100);
/// assert!(validate_area_consistency(ha(100), ha(70), ha(30)).is_ok());
/// assert!(validate_area_consistency(ha(100), ha(80), ha(30)).is_err());
/// ```
pub fn validate_area_consistency(total: Area, agricultural: Area, vegetation: Area) -> CoreResult<()> {
    match agricultural.checked_add(vegetation) {
        Some(used) if used <= total => Ok(()),
        _ => Err(CoreError::InvalidArea {
            total,
            agricultural,
            vegetation,
        }),
    }
}

/// Validates that an update carries none or all three of the area fields.
pub fn validate_area_co_presence(input: &UpdateProducerInput) -> CoreResult<()> {
    match input.area_fields_present() {
        0 | 3 => Ok(()),
        _ => Err(CoreError::InconsistentAreaFields),
    }
}

/// Validates that an area is not negative.
pub fn validate_non_negative(field: &str, area: Area) -> ValidationResult<()> {
    if area.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a free-text field: not blank, at most `max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a producer document (CPF or CNPJ).
pub fn validate_document(document: &str) -> ValidationResult<()> {
    if document.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "document".to_string(),
        });
    }

    if !is_valid_document(document) {
        return Err(ValidationError::InvalidFormat {
            field: "document".to_string(),
            reason: "must be a valid CPF or CNPJ".to_string(),
        });
    }

    Ok(())
}

/// Validates a crop id list: non-empty, every entry a UUID.
pub fn validate_crop_ids(ids: &[String]) -> ValidationResult<()> {
    if ids.is_empty() {
        return Err(ValidationError::EmptyList {
            field: "crops".to_string(),
        });
    }

    if let Some(bad) = ids.iter().find(|id| Uuid::parse_str(id).is_err()) {
        return Err(ValidationError::InvalidFormat {
            field: "crops".to_string(),
            reason: format!("'{}' is not a valid id", bad),
        });
    }

    Ok(())
}

/// Validates pagination parameters and clamps the limit.
///
/// ## Returns
/// `(offset, limit)` ready for the store.
pub fn validate_pagination(page: i64, limit: i64) -> ValidationResult<(i64, i64)> {
    if page < 1 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    if limit < 1 {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_LIMIT,
        });
    }

    let limit = limit.min(MAX_PAGE_LIMIT);
    let offset = (page - 1).saturating_mul(limit);
    Ok((offset, limit))
}

// =============================================================================
// Input Validators
// =============================================================================

/// Validates a create request, field rules first, then the area invariant.
pub fn validate_create_input(input: &CreateProducerInput) -> CoreResult<()> {
    validate_document(&input.document)?;
    validate_text("producerName", &input.producer_name, MAX_NAME_LEN)?;
    validate_text("farmName", &input.farm_name, MAX_NAME_LEN)?;
    validate_text("city", &input.city, MAX_PLACE_LEN)?;
    validate_text("state", &input.state, MAX_PLACE_LEN)?;
    validate_non_negative("totalArea", input.total_area)?;
    validate_non_negative("agriculturalArea", input.agricultural_area)?;
    validate_non_negative("vegetationArea", input.vegetation_area)?;
    validate_crop_ids(&input.crops)?;

    validate_area_consistency(input.total_area, input.agricultural_area, input.vegetation_area)
}

/// Validates the fields an update provides.
///
/// Absent fields are not checked; a present crop list must still be non-empty.
pub fn validate_update_input(input: &UpdateProducerInput) -> CoreResult<()> {
    if let Some(document) = &input.document {
        validate_document(document)?;
    }
    if let Some(producer_name) = &input.producer_name {
        validate_text("producerName", producer_name, MAX_NAME_LEN)?;
    }
    if let Some(farm_name) = &input.farm_name {
        validate_text("farmName", farm_name, MAX_NAME_LEN)?;
    }
    if let Some(city) = &input.city {
        validate_text("city", city, MAX_PLACE_LEN)?;
    }
    if let Some(state) = &input.state {
        validate_text("state", state, MAX_PLACE_LEN)?;
    }
    if let Some(crops) = &input.crops {
        validate_crop_ids(crops)?;
    }

    validate_area_co_presence(input)?;

    if let Some((total, agricultural, vegetation)) = input.area_triple() {
        validate_non_negative("totalArea", total)?;
        validate_non_negative("agriculturalArea", agricultural)?;
        validate_non_negative("vegetationArea", vegetation)?;
        validate_area_consistency(total, agricultural, vegetation)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
