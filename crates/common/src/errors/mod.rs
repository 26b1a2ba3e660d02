//! Error types for Chronograph
//!
//! Provides a single error taxonomy shared by the analytics and retrieval crates:
//! - Distinct variants for input, reference and structural failures
//! - Machine-readable error codes
//! - Classification into recoverable input errors and fatal errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingField,
    InvalidFormat,
    SelfLoop,

    // Reference errors (2xxx)
    UnknownNode,
    NotFound,

    // Graph structure errors (3xxx)
    EmptyGraph,

    // Data access errors (4xxx)
    IoError,
    SerializationError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::InvalidFormat => 1003,
            ErrorCode::SelfLoop => 1004,

            // References (2xxx)
            ErrorCode::UnknownNode => 2001,
            ErrorCode::NotFound => 2002,

            // Structure (3xxx)
            ErrorCode::EmptyGraph => 3001,

            // Data access (4xxx)
            ErrorCode::IoError => 4001,
            ErrorCode::SerializationError => 4002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Record validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Self-loop edge on node: {title}")]
    SelfLoop { title: String },

    // Reference errors
    #[error("Unknown node: {title}")]
    UnknownNode { title: String },

    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    // Structural errors
    #[error("Graph is empty; cannot run {stage}")]
    EmptyGraph { stage: String },

    // Data access errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for the empty-graph condition raised by a named stage
    pub fn empty_graph(stage: impl Into<String>) -> Self {
        AppError::EmptyGraph {
            stage: stage.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::SelfLoop { .. } => ErrorCode::SelfLoop,
            AppError::UnknownNode { .. } => ErrorCode::UnknownNode,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::EmptyGraph { .. } => ErrorCode::EmptyGraph,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Record-level problem: the loaders skip the record and continue
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::MissingField { .. }
                | AppError::InvalidFormat { .. }
                | AppError::SelfLoop { .. }
        )
    }

    /// Anything that is not a recoverable input error
    pub fn is_fatal(&self) -> bool {
        !self.is_input_error()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let field = errs.field_errors().keys().next().map(|k| k.to_string());
        AppError::Validation {
            message: errs.to_string(),
            field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::UnknownNode { title: "Gia Long".into() };
        assert_eq!(err.code(), ErrorCode::UnknownNode);
        assert_eq!(err.code().as_code(), 2001);
    }

    #[test]
    fn test_input_errors_are_recoverable() {
        let err = AppError::MissingField { field: "title".into() };
        assert!(err.is_input_error());
        assert!(!err.is_fatal());

        let err = AppError::SelfLoop { title: "Huế".into() };
        assert!(err.is_input_error());
    }

    #[test]
    fn test_empty_graph_is_fatal() {
        let err = AppError::empty_graph("pagerank");
        assert_eq!(err.code(), ErrorCode::EmptyGraph);
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Graph is empty; cannot run pagerank");
    }
}
