//! Error types for the preprocessor and their Python counterparts.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::{create_exception, PyErr};
use thiserror::Error;

create_exception!(
    sftpack_rs,
    PreprocessError,
    PyRuntimeError,
    "Error during sequence preprocessing"
);

create_exception!(
    sftpack_rs,
    PackingOverflowError,
    PreprocessError,
    "Packed example does not fit into max_source_length + max_target_length"
);

#[derive(Error, Debug)]
pub enum PackError {
    /// Prompt, response and eos together exceed the fixed training length.
    #[error("packed example has {length} tokens but the maximum is {max_length}; max_source_length + max_target_length must leave room for the eos token")]
    PackingOverflow { length: usize, max_length: usize },

    #[error("column '{0}' not found in batch")]
    MissingColumn(String),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Raised by the Python tokenizer; handed back to Python unchanged.
    #[error(transparent)]
    Python(#[from] PyErr),
}

pub type Result<T> = std::result::Result<T, PackError>;

impl From<PackError> for PyErr {
    fn from(err: PackError) -> PyErr {
        match err {
            PackError::Python(inner) => inner,
            PackError::PackingOverflow { .. } => PackingOverflowError::new_err(err.to_string()),
            PackError::InvalidConfig(_) => PyValueError::new_err(err.to_string()),
            _ => PreprocessError::new_err(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_message() {
        let err = PackError::PackingOverflow {
            length: 10,
            max_length: 9,
        };
        assert!(err.to_string().starts_with("packed example has 10 tokens"));
        assert!(err.to_string().contains("maximum is 9"));
    }
}
