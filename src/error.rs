use thiserror::Error;

/// Failures of the ingestion stage (Source Reader and Schema Normalizer).
/// All of them are caught at the load boundary, reported to the user, and
/// turned into the empty-dataset sentinel; there is no partial-success mode.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Data file not found: {0}")]
    FileNotFound(String),

    #[error("Could not decode '{0}' with any supported encoding")]
    Encoding(String),

    #[error(
        "Access denied (HTTP {status}). Make sure the sheet is shared as \
         'Anyone with the link' with Viewer access"
    )]
    AccessDenied { status: u16 },

    #[error("Failed to fetch data: {0}")]
    Fetch(String),

    #[error("Required column '{missing}' not found. Available columns: {available}")]
    SchemaMismatch { missing: String, available: String },

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

pub type IngestResult<T> = Result<T, IngestError>;
