//! Importer error types

use thiserror::Error;
use uuid::Uuid;

use crate::fact::ImportKind;

/// Failures that stop an import run
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input has no header row")]
    EmptyInput,

    #[error("Missing '{column}' column for {kind} import")]
    MissingColumn {
        column: &'static str,
        kind: ImportKind,
    },

    #[error("Invalid mapping file: {0}")]
    Mapping(#[from] toml::de::Error),

    #[error("Retailer {retailer_id} does not belong to tenant {tenant_id}")]
    UnknownRetailer { tenant_id: Uuid, retailer_id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// A data row that could not be parsed; the run continues without it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {reason}")]
pub struct RowError {
    pub line: u64,
    pub reason: String,
}
