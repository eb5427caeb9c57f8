//! # DomainError
//!
//! Centralized error handling for Pressroom.
//! Every port and service returns this type; transports map it to status codes.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No valid caller identity.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Identity is valid but the role or target is not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed or missing input (e.g. empty title).
    #[error("validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced entity does not exist (e.g. Article, User)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint hit (e.g. duplicate clap, duplicate email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation switched off by configuration
    #[error("feature disabled: {0}")]
    FeatureDisabled(String),

    /// Infrastructure failure (e.g. DB down). Never carries internal detail to clients.
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// A specialized Result type for Pressroom logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
