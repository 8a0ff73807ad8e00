//! Service-level error: a rule the request broke, or a store that failed.

use agro_core::{CoreError, ValidationError};
use agro_db::{DbError, PRODUCER_DOCUMENT_COLUMN};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request violates a registry rule. Never retried.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Storage failed. The unit of work was rolled back.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Domain(CoreError::Validation(err))
    }
}

impl ServiceError {
    /// Maps a unique-index hit on the document column to `DuplicateDocument`.
    ///
    /// This is how a concurrent insert that slipped past the in-transaction
    /// lookup is reported.
    pub(crate) fn from_write(err: DbError, document: &str) -> Self {
        if err.is_unique_violation_on(PRODUCER_DOCUMENT_COLUMN) {
            ServiceError::Domain(CoreError::DuplicateDocument(document.to_string()))
        } else {
            ServiceError::Store(err)
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
