//! Ingestion error taxonomy.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// No (delimiter, encoding) candidate parsed the source.
    #[error("unrecognized statement format: no delimiter/encoding candidate parsed ({last})")]
    Format { last: String },

    /// Required column role(s) missing after header normalization.
    #[error("required columns not found; headers present: {headers:?}")]
    Schema { headers: Vec<String> },

    /// A statement directory yielded no transactions at all.
    #[error("no transactions found in {0}")]
    Empty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
