use thiserror::Error;

use models::errors::ModelError;
use models::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(ModelError),
}

impl DirectoryError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Field errors when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for DirectoryError {
    fn from(e: ValidationErrors) -> Self { Self::Invalid(e) }
}

impl From<ModelError> for DirectoryError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Db(msg) => Self::Db(msg),
            other => Self::Model(other),
        }
    }
}
