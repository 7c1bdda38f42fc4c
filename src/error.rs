//! Error types shared by the loader and the report functions.

use crate::types::Column;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A report needs a column the source table never had.
    #[error("column '{0}' not found in dataset")]
    MissingColumn(Column),

    #[error("line {line}: required field '{column}' is empty")]
    MissingField { line: u64, column: Column },

    #[error("line {line}: invalid {column} {value:?}")]
    InvalidValue {
        line: u64,
        column: Column,
        value: String,
    },

    #[error("line {line}: cannot parse timestamp {value:?}")]
    InvalidTimestamp { line: u64, value: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
