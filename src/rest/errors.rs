//! Error types for the resource layer.
//!
//! Every failure raised by operators, the query builder, resource instances
//! and collections is a [`ResourceError`]. Variants fall into five kinds,
//! exposed through [`ResourceError::kind`]:
//!
//! - [`ErrorKind::Validation`]: unknown field names, bad relationship paths,
//!   bad sort directions. Raised before any network call.
//! - [`ErrorKind::Lookup`]: unknown resource types, missing relationship
//!   targets, records the server could not find.
//! - [`ErrorKind::State`]: mutating a deleted record, saving without a client.
//! - [`ErrorKind::Transport`]: non-2xx responses and undecodable payloads.
//! - [`ErrorKind::Confirmation`]: a destructive call that was not confirmed.
//!
//! # Example
//!
//! ```rust,ignore
//! use workbench_api::rest::{ErrorKind, ResourceError};
//!
//! match investigations.get("56f00b9b").await {
//!     Ok(inv) => println!("{inv}"),
//!     Err(e) if e.kind() == ErrorKind::Lookup => println!("no such record: {e}"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use thiserror::Error;

use crate::clients::{HttpError, InvalidHttpRequestError};

/// The broad category of a [`ResourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied an illegal name, path or argument.
    Validation,
    /// A type, relationship target or record could not be found.
    Lookup,
    /// The instance is in a state that forbids the operation.
    State,
    /// The server rejected the call or answered with an unusable payload.
    Transport,
    /// A destructive call was not confirmed.
    Confirmation,
}

/// Raised when an interactive delete confirmation is not obtained.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    /// The user answered no.
    #[error("User does not want to execute delete API")]
    Declined,

    /// The user never gave a recognisable answer.
    #[error("User did not confirm delete!")]
    NotConfirmed {
        /// How many times the user was asked.
        attempts: u32,
    },

    /// The prompt could not be read.
    #[error("Could not read delete confirmation: {reason}")]
    Unreadable {
        /// The underlying I/O error message.
        reason: String,
    },
}

/// Error type for resource layer operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Field names that are neither attributes nor relationships of the type.
    #[error("Unknown field(s) for {type_name}: {}", fields.join(", "))]
    UnknownFields {
        /// The resource type being queried.
        type_name: String,
        /// Every offending name, sorted.
        fields: Vec<String>,
    },

    /// Attempt to set something that is not a declared attribute.
    #[error("'{name}' is not a settable attribute of {type_name}")]
    NotAnAttribute {
        /// The resource type.
        type_name: String,
        /// The rejected name.
        name: String,
    },

    /// Attempt to set a relationship the type does not declare.
    #[error("'{name}' is not a defined relationship of {type_name}")]
    NotARelationship {
        /// The resource type.
        type_name: String,
        /// The rejected name.
        name: String,
    },

    /// A relationship path with more than one hop.
    #[error("Relationship path '{path}' may traverse at most one relationship")]
    RelationshipDepth {
        /// The offending path.
        path: String,
    },

    /// A sort direction other than `+`, `asc`, `-` or `desc`.
    #[error("Invalid sort direction '{direction}', expected one of: +, asc, -, desc")]
    InvalidSortDirection {
        /// The rejected direction.
        direction: String,
    },

    /// A record of one type where another was required.
    #[error("Expected a {expected} record, got {actual}")]
    TypeMismatch {
        /// The required type.
        expected: &'static str,
        /// The type of the record given.
        actual: String,
    },

    /// An operator used somewhere it cannot render.
    #[error("{message}")]
    InvalidOperator {
        /// What went wrong.
        message: String,
    },

    /// The resource type is not registered.
    #[error("Unknown resource type '{type_name}'")]
    UnknownType {
        /// The unregistered type name.
        type_name: String,
    },

    /// A read of a name that is neither an attribute nor a relationship.
    #[error("'{name}' is not an attribute or relationship of {type_name}")]
    UnknownField {
        /// The resource type.
        type_name: String,
        /// The requested name.
        name: String,
    },

    /// A relationship with nothing to resolve.
    #[error("Relationship '{name}' of {type_name} has no related link or identifier")]
    MissingRelationship {
        /// The resource type.
        type_name: String,
        /// The relationship name.
        name: String,
    },

    /// The server has no record with this id (HTTP 404).
    #[error("{type_name} with id {id} not found")]
    NotFound {
        /// The resource type.
        type_name: String,
        /// The requested id.
        id: String,
    },

    /// The instance was deleted and can only be read.
    #[error("{type_name} {id} has been deleted")]
    Deleted {
        /// The resource type.
        type_name: String,
        /// The deleted record id.
        id: String,
    },

    /// The operation needs a persisted record.
    #[error("Cannot {operation} a {type_name} that has not been saved")]
    NotPersisted {
        /// The resource type.
        type_name: String,
        /// The attempted operation.
        operation: &'static str,
    },

    /// The instance has no client to issue requests through.
    #[error("{type_name} instance is not bound to a client")]
    Detached {
        /// The resource type.
        type_name: String,
    },

    /// The server answered with a payload that is not a usable document.
    #[error("Malformed response: {reason}")]
    MalformedResponse {
        /// Why decoding failed.
        reason: String,
    },

    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A delete was not confirmed.
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),
}

impl ResourceError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFields { .. }
            | Self::NotAnAttribute { .. }
            | Self::NotARelationship { .. }
            | Self::RelationshipDepth { .. }
            | Self::InvalidSortDirection { .. }
            | Self::TypeMismatch { .. }
            | Self::InvalidOperator { .. } => ErrorKind::Validation,
            Self::UnknownType { .. }
            | Self::UnknownField { .. }
            | Self::MissingRelationship { .. }
            | Self::NotFound { .. } => ErrorKind::Lookup,
            Self::Deleted { .. } | Self::NotPersisted { .. } | Self::Detached { .. } => {
                ErrorKind::State
            }
            Self::MalformedResponse { .. } | Self::Http(_) => ErrorKind::Transport,
            Self::Confirmation(_) => ErrorKind::Confirmation,
        }
    }

    /// Maps an HTTP error for a single record lookup.
    ///
    /// A 404 becomes [`ResourceError::NotFound`]; anything else is wrapped
    /// unchanged.
    #[must_use]
    pub fn from_http_error(error: HttpError, type_name: &str, id: &str) -> Self {
        match error.status() {
            Some(404) => Self::NotFound {
                type_name: type_name.to_string(),
                id: id.to_string(),
            },
            _ => Self::Http(error),
        }
    }

    /// Returns the request ID if available.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Http(HttpError::Response(e)) => e.error_reference.as_deref(),
            Self::Http(HttpError::MaxRetries(e)) => e.error_reference.as_deref(),
            _ => None,
        }
    }
}

impl From<InvalidHttpRequestError> for ResourceError {
    fn from(error: InvalidHttpRequestError) -> Self {
        Self::Http(HttpError::InvalidRequest(error))
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedResponse {
            reason: error.to_string(),
        }
    }
}

// Verify ResourceError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceError>();
};
