//! Installment-marker extraction from free-text statement descriptions.
//!
//! Card statements embed split purchases as `DD/DD` markers ("current
//! installment / total installments"). The same pattern also shows up in
//! false positives (dates, store codes), so every candidate is validated
//! before being accepted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::transaction::Installment;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2})/(\d{2})").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Find the installment position encoded in a description, if any.
///
/// All non-overlapping `DD/DD` matches are scanned from last to first; the
/// first one satisfying `total >= 2` and `1 <= current <= total` wins.
/// Rightmost-wins matters in practice: a description can carry both a
/// date-like fragment and a real marker.
pub fn extract_installment(description: &str) -> Option<Installment> {
    for caps in MARKER
        .captures_iter(description)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
    {
        // Two-digit captures always parse
        let current: u32 = caps[1].parse().ok()?;
        let total: u32 = caps[2].parse().ok()?;
        if total >= 2 && current >= 1 && current <= total {
            return Some(Installment { current, total });
        }
    }
    None
}

/// Strip every `DD/DD` occurrence and collapse whitespace runs.
///
/// Runs unconditionally: a rejected marker (e.g. `00/00`) is still removed
/// from the cleaned text.
pub fn clean_description(description: &str) -> String {
    let stripped = MARKER.replace_all(description, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
