//! View error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// Template parsing or rendering failed; the message carries the cause chain
    #[error("Template error: {0}")]
    TemplateError(String),

    /// An embedded file could not be read as UTF-8
    #[error("Invalid embedded asset: {0}")]
    InvalidAsset(String),
}
