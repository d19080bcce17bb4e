//! Model errors

use thiserror::Error;

/// Errors raised while loading model metadata or adapting resources
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("Property not found: {parent}.{property}")]
    PropertyNotFound { parent: String, property: String },

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Failed to parse model info: {0}")]
    ParseError(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
