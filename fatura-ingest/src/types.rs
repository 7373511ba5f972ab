use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized output of statement readers (source-agnostic).
///
/// This is the pre-enrichment shape: date and amount already typed,
/// description whitespace-normalized, nothing else derived yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub date: NaiveDate,
    pub description: String,
    /// Negative means charge/expense; positive means credit/refund.
    pub amount: f64,
}
