//! Filter evaluation errors.

use sta_common::StaError;
use thiserror::Error;

/// Errors raised while compiling or evaluating a filter.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    /// An expression the evaluator cannot express as a predicate.
    #[error("Invalid query: {message} (at '{fragment}')")]
    InvalidQuery { fragment: String, message: String },

    /// No method is registered for this name and argument count.
    #[error("Unsupported function: {name} with {arity} argument(s)")]
    UnsupportedFunction { name: String, arity: usize },
}

impl FilterError {
    pub fn invalid(fragment: impl ToString, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            fragment: fragment.to_string(),
            message: message.into(),
        }
    }
}

impl From<FilterError> for StaError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidQuery { fragment, message } => {
                StaError::InvalidQuery { fragment, message }
            }
            FilterError::UnsupportedFunction { name, arity } => {
                StaError::UnsupportedFunction { name, arity }
            }
        }
    }
}

/// Result type for filter operations.
pub type FilterResult<T> = std::result::Result<T, FilterError>;
