use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Source '{collection}' not found at {}", path.display())]
    SourceNotFound { collection: String, path: PathBuf },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid {column} date '{value}' for '{title}' (row {row}); expected YYYY-MM-DD")]
    InvalidDate {
        column: &'static str,
        row: usize,
        title: String,
        value: String,
    },

    #[error("Config: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<LedgerError> for pyo3::PyErr {
    fn from(err: LedgerError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
