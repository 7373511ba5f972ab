//! Classification and pipeline error taxonomy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Rate-limiting or connectivity failure; eligible for retry with
    /// backoff. Tagged once at the classifier-client boundary.
    #[error("transient classifier failure: {0}")]
    Transient(String),

    /// Any other classifier failure; propagates immediately.
    #[error("classifier failure: {0}")]
    Permanent(String),

    /// Retry budget exhausted on a transient failure class.
    #[error("classification failed after {attempts} attempts; last error: {last}")]
    Exhausted { attempts: u32, last: String },

    /// Contract violation: a distinct description missed the cache after
    /// classification completed.
    #[error("internal error: no cached category for description {0:?}")]
    MissingCacheEntry(String),
}

impl ClassifyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClassifyError::Transient(_))
    }
}

/// Terminal failure of a whole pipeline run. There is no partial-success
/// mode: a run either completes with a fully classified record set or
/// fails before producing output.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] fatura_ingest::IngestError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}
