//! Error types for the beat estimation engine

use std::fmt;

/// Errors that can occur during beat estimation
#[derive(Debug, Clone)]
pub enum EstimationError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Processing error during estimation
    ProcessingError(String),

    /// Numerical error (non-finite intermediate, degenerate ratio, etc.)
    NumericalError(String),
}

impl fmt::Display for EstimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimationError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            EstimationError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            EstimationError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for EstimationError {}
