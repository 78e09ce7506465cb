use providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(#[from] ProviderError),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("reference corpus has no entries")]
    EmptyCorpus,
    #[error("failed to read corpus file {path}: {source}")]
    Corpus {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClassifyError {
    /// Errors the caller caused, as opposed to service or configuration faults.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClassifyError::InvalidInput(_))
    }
}
