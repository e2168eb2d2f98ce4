//! Error types for the filter query engine
//!
//! The compiler itself never fails. Errors only come from loading
//! configuration and from executing a query against a backend.

use thiserror::Error;

/// Main error type for the filter query engine
#[derive(Error, Debug)]
pub enum FilterQueryError {
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Malformed filter expression: {0}")]
    MalformedExpression(String),
}

#[cfg(feature = "python")]
impl From<FilterQueryError> for pyo3::PyErr {
    fn from(err: FilterQueryError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyValueError};

        match err {
            FilterQueryError::Deserialization(e) => {
                PyValueError::new_err(format!("Deserialization error: {}", e))
            }
            FilterQueryError::InvalidConfig(msg) => {
                PyValueError::new_err(format!("Invalid config: {}", msg))
            }
            FilterQueryError::UnknownTable(name) => {
                PyKeyError::new_err(format!("Unknown table: {}", name))
            }
            FilterQueryError::MalformedExpression(expr) => {
                PyValueError::new_err(format!("Malformed filter expression: {}", expr))
            }
        }
    }
}

/// Result type alias for the filter query engine
pub type Result<T> = std::result::Result<T, FilterQueryError>;
