// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An observed currency has no rate. Stops the batch.
    #[error("Conversion rate for currency '{currency}' is not available")]
    MissingRate { currency: String },

    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    /// Table missing a column the pipeline reads.
    #[error("Table error: missing column '{column}' in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
