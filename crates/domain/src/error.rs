//! Error taxonomy for template operations.

use thiserror::Error;
use validator::ValidationErrors;

/// Failure raised by a datastore implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The datastore could not be reached or timed out.
    #[error("Datastore unavailable: {0}")]
    Unavailable(String),

    /// Any other datastore failure, including aborted transactions.
    #[error("Database error: {0}")]
    Database(String),
}

/// Error returned by every template operation.
///
/// Each variant maps to a distinct outward status in the HTTP layer.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Template rendering failed: {0}")]
    Rendering(String),

    /// The write (if any) was rolled back; callers must treat it as no effect.
    #[error("Persistence error: {0}")]
    Persistence(StoreError),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

impl TemplateError {
    /// Stable machine-readable code for this failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            TemplateError::Validation(_) => "validation_error",
            TemplateError::NotFound(_) => "not_found",
            TemplateError::Conflict(_) => "conflict",
            TemplateError::Rendering(_) => "rendering_error",
            TemplateError::Persistence(_) => "internal_error",
        }
    }
}

impl From<StoreError> for TemplateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => TemplateError::Conflict(
                "Template with this name and language already exists".into(),
            ),
            other => TemplateError::Persistence(other),
        }
    }
}

impl From<ValidationErrors> for TemplateError {
    fn from(errors: ValidationErrors) -> Self {
        TemplateError::Validation(shared::validation::summarize(&errors))
    }
}
