//! Error types for the enrichment pipeline

use thiserror::Error;

/// Every failure the pipeline can report.
///
/// Statistical errors are never recovered from locally: a run either produces a
/// complete result table or one of these.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("No overlap with {reference}: none of the {n_drivers} driver(s) are present")]
    NoOverlap { reference: String, n_drivers: usize },

    #[error("Data integrity violation: {reason}")]
    DataIntegrity { reason: String },

    #[error("Not supported: {reason}")]
    NotSupported { reason: String },

    #[error("Data provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

impl EnrichError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        EnrichError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn data_integrity(reason: impl Into<String>) -> Self {
        EnrichError::DataIntegrity {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_supported(reason: impl Into<String>) -> Self {
        EnrichError::NotSupported {
            reason: reason.into(),
        }
    }
}

/// Result type alias for enrichment operations
pub type Result<T> = std::result::Result<T, EnrichError>;
