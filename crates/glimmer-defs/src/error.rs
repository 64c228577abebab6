//! Error types for glimmer-defs

use thiserror::Error;

/// Definition loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Unknown reference: {0}")]
    UnknownReference(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
