//! Error taxonomy for the compliance domain.
//!
//! Domain operations (table lookups, sizing, report rendering) return
//! [`SstError`]. Application glue (database, filesystem, CLI) uses
//! `anyhow::Result` and wraps these where needed. The HTTP layer maps each
//! variant to a status code through [`SstError::kind`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SstError {
    /// Malformed request data: non-positive headcount, unknown report kind,
    /// unrecognised checklist status.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unrecognised risk grade or a table definition that fails validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A source document could not be fetched or its text extracted.
    /// Ingestion logs and skips; search callers never see it.
    #[error("external resource unavailable: {0}")]
    ExternalResourceUnavailable(String),

    #[error("report rendering failed: {0}")]
    Rendering(String),
}

impl SstError {
    /// Machine-readable kind used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            SstError::InvalidInput(_) => "invalid_input",
            SstError::Configuration(_) => "configuration_error",
            SstError::ExternalResourceUnavailable(_) => "external_resource_unavailable",
            SstError::Rendering(_) => "rendering_failure",
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        SstError::InvalidInput(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        SstError::Configuration(message.into())
    }
}
