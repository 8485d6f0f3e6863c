//! Error types for SensorThings core operations.
//!
//! Errors carry a kind and a human-readable message only. Mapping a kind to a
//! transport status code is left to the request-handling layer.

use thiserror::Error;

/// Result type alias using StaError.
pub type StaResult<T> = Result<T, StaError>;

/// Coarse error classification consumed by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Conflict,
    Unsupported,
    Internal,
}

/// Primary error type for SensorThings operations.
#[derive(Debug, Error)]
pub enum StaError {
    // === Request Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid query: {message} (at '{fragment}')")]
    InvalidQuery { fragment: String, message: String },

    #[error("Unsupported function: {name} with {arity} argument(s)")]
    UnsupportedFunction { name: String, arity: usize },

    // === Entity Errors ===
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} with id '{id}' already exists")]
    Conflict { entity: String, id: String },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    // === Infrastructure Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl StaError {
    /// Create an InvalidRequest error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an InvalidRequest error for a missing required field.
    pub fn missing_field(entity: &str, field: &str) -> Self {
        Self::InvalidRequest(format!("{} is missing required property '{}'", entity, field))
    }

    /// Create an InvalidQuery error naming the offending fragment.
    pub fn invalid_query(fragment: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidQuery {
            fragment: fragment.into(),
            message: msg.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a Conflict error.
    pub fn conflict(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::Conflict {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Classify this error for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StaError::InvalidRequest(_)
            | StaError::InvalidQuery { .. }
            | StaError::UnsupportedFunction { .. } => ErrorKind::InvalidRequest,

            StaError::NotFound { .. } => ErrorKind::NotFound,
            StaError::Conflict { .. } => ErrorKind::Conflict,
            StaError::Unsupported(_) => ErrorKind::Unsupported,

            StaError::DatabaseError(_) | StaError::InternalError(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for StaError {
    fn from(err: serde_json::Error) -> Self {
        StaError::InternalError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(StaError::invalid("x").kind(), ErrorKind::InvalidRequest);
        assert_eq!(
            StaError::invalid_query("foo()", "bad").kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(
            StaError::UnsupportedFunction {
                name: "foo".to_string(),
                arity: 2
            }
            .kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(StaError::not_found("Thing", "1").kind(), ErrorKind::NotFound);
        assert_eq!(StaError::conflict("Thing", "1").kind(), ErrorKind::Conflict);
        assert_eq!(StaError::unsupported("PUT").kind(), ErrorKind::Unsupported);
        assert_eq!(
            StaError::DatabaseError("down".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_error_display() {
        let err = StaError::not_found("Datastream", "ds-1");
        let display = format!("{}", err);
        assert!(display.contains("Datastream"));
        assert!(display.contains("ds-1"));

        let err = StaError::UnsupportedFunction {
            name: "st_buffer".to_string(),
            arity: 2,
        };
        assert!(err.to_string().contains("st_buffer"));
    }
}
