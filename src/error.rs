//! Error types for the nudge engine
//!
//! The scoring core itself is total and never returns an error. These variants
//! cover the boundary: parsing requests, validating categories and amounts,
//! and loading configuration.

use thiserror::Error;

/// Errors that can occur while preparing or serializing a scoring request
#[derive(Debug, Error)]
pub enum NudgeError {
    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
