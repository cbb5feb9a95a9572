//! Typed error handling for the entity store
//!
//! Every gateway and validator operation returns [`StoreResult`]. Each
//! [`StoreError`] variant corresponds to one failure kind, exposed through
//! [`StoreError::error_code`], so callers can match on the kind while the
//! `Display` text names the offending field or value.
//!
//! # Example
//!
//! ```rust,ignore
//! use recur::prelude::*;
//!
//! match store.locations().remove("Place").await {
//!     Ok(removed) => println!("Removed {}", removed.name),
//!     Err(StoreError::DependencyViolation { release, .. }) => {
//!         println!("Still used by release {}", release);
//!     }
//!     Err(e) => eprintln!("{} ({})", e, e.error_code()),
//! }
//! ```

use crate::core::time::TimeOfDayError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The error type for every entity store operation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required input was absent or empty
    #[error("{0}")]
    MissingField(String),

    /// A value could not be resolved against its enum registry
    #[error("{label} '{value}' is not a valid type")]
    InvalidType { label: &'static str, value: String },

    /// A time-of-day input was rejected by the parser
    #[error("Invalid {label} time: {source}")]
    InvalidTime {
        label: &'static str,
        #[source]
        source: TimeOfDayError,
    },

    /// Opening time is not strictly before closing time
    #[error("Opening time must be before closing time")]
    TimeOrder,

    /// A quantity is not a non-negative integer
    #[error("Quantity {label} '{value}' must be a non-negative integer")]
    InvalidQuantity { label: &'static str, value: String },

    /// Both quantities are zero
    #[error("At least one quantity must be positive")]
    ZeroQuantity,

    /// A date input could not be parsed
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),

    /// Cutoff date is not strictly after acceptance date
    #[error("Cutoff '{cutoff}' is before acceptance date '{acceptance}'")]
    DateOrder { acceptance: String, cutoff: String },

    /// A release would start and end at the same location
    #[error("Source and destination addresses are identical")]
    IdenticalEndpoints,

    /// A location or external address cannot be resolved
    #[error("Cannot find address '{0}'")]
    AddressNotFound(String),

    /// A uniqueness constraint was violated
    #[error("{0}")]
    Conflict(String),

    /// No stored document matched the identifier query
    #[error("No entry in {collection} matches {query}")]
    NotFound { collection: String, query: String },

    /// Credential check for a username that does not exist
    #[error("No user exists with username '{0}'")]
    UnknownUser(String),

    /// A location is still referenced by a release
    #[error("Cannot remove location '{location}': release '{release}' references it")]
    DependencyViolation { location: String, release: String },

    /// A partial update named a field the entity does not have
    #[error("'{0}' is not a valid property")]
    InvalidProperty(String),

    /// A password did not match the stored hash
    #[error("Password does not match")]
    AuthMismatch,

    /// A request body could not be decoded into the expected shape
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The underlying store failed
    #[error("{backend} error: {message}")]
    Storage { backend: String, message: String },

    /// A stored document could not be converted to or from its entity
    #[error("Failed to (de)serialize {entity}: {message}")]
    Serialization { entity: String, message: String },

    /// The external address service could not answer
    #[error("Address lookup failed: {0}")]
    Lookup(String),

    /// Password hashing failed
    #[error("Failed to hash password: {0}")]
    Hashing(String),
}

/// A specialized Result type for entity store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl StoreError {
    pub fn storage(backend: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Storage {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }

    pub fn serialization(entity: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Serialization {
            entity: entity.to_string(),
            message: err.to_string(),
        }
    }

    /// Get the failure kind of this error
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::MissingField(_) => "MISSING_FIELD",
            StoreError::InvalidType { .. } => "INVALID_TYPE",
            StoreError::InvalidTime { .. } => "INVALID_TIME",
            StoreError::TimeOrder => "TIME_ORDER_VIOLATION",
            StoreError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            StoreError::ZeroQuantity => "ZERO_QUANTITY",
            StoreError::InvalidDate(_) => "INVALID_DATE",
            StoreError::DateOrder { .. } => "DATE_ORDER_VIOLATION",
            StoreError::IdenticalEndpoints => "IDENTICAL_ENDPOINTS",
            StoreError::AddressNotFound(_) => "ADDRESS_NOT_FOUND",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::NotFound { .. } | StoreError::UnknownUser(_) => "NOT_FOUND",
            StoreError::DependencyViolation { .. } => "DEPENDENCY_VIOLATION",
            StoreError::InvalidProperty(_) => "INVALID_PROPERTY",
            StoreError::AuthMismatch => "AUTH_MISMATCH",
            StoreError::InvalidBody(_) => "INVALID_BODY",
            StoreError::Storage { .. } => "STORAGE_ERROR",
            StoreError::Serialization { .. } => "SERIALIZATION_ERROR",
            StoreError::Lookup(_) => "ADDRESS_LOOKUP_ERROR",
            StoreError::Hashing(_) => "HASHING_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound { .. } | StoreError::UnknownUser(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) | StoreError::DependencyViolation { .. } => {
                StatusCode::CONFLICT
            }
            StoreError::AuthMismatch => StatusCode::UNAUTHORIZED,
            StoreError::Lookup(_) => StatusCode::BAD_GATEWAY,
            StoreError::Storage { .. }
            | StoreError::Serialization { .. }
            | StoreError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidBody(err.to_string())
    }
}
