//! Error types for client configuration.
//!
//! This module contains the error type used when building configuration
//! values and the resource type registry.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use workbench_api::{ApiToken, ConfigError};
//!
//! let result = ApiToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring the client.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API token cannot be empty.
    #[error("API token cannot be empty. Please provide a valid Workbench API token.")]
    EmptyApiToken,

    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide a URL with scheme (e.g., 'https://workbench.example.com').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A schema declares the same name as both an attribute and a relationship.
    #[error("Schema '{type_name}' declares {fields:?} as both attributes and relationships")]
    OverlappingFields {
        /// The resource type being registered.
        type_name: String,
        /// The names present in both sets.
        fields: Vec<String>,
    },

    /// The same type name was registered twice.
    #[error("Resource type '{type_name}' is already registered")]
    DuplicateType {
        /// The duplicated type name.
        type_name: String,
    },

    /// A registry document could not be parsed.
    #[error("Invalid registry document: {reason}")]
    InvalidRegistry {
        /// The parser error message.
        reason: String,
    },
}
