//! Error types for the Fitts engine

use thiserror::Error;

/// Errors that can occur while running or analysing an experiment
#[derive(Debug, Error)]
pub enum FittsError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Data set not found: {0}")]
    NotFound(u32),

    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FittsError {
    /// Whether the error only reports ignored interactive input.
    ///
    /// Acquiring without a live target, or after the battery finished, is
    /// reported as `IllegalTransition` and leaves every piece of state intact.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, FittsError::IllegalTransition(_))
    }
}
