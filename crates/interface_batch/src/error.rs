//! Runner errors

use thiserror::Error;

/// The input document could not be read as a list of applications
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of applications, found {0}")]
    NotAnArray(&'static str),
}
