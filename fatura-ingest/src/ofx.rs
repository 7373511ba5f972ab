//! Bank OFX statement reader.
//!
//! Brazilian bank exports are OFX 1.x SGML, habitually encoded as
//! ISO-8859-1 and without closing tags on leaf elements. A tolerant
//! tag-scan over `<STMTTRN>` blocks is enough; a full SGML parser is not.

use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use fatura_core::parse_amount;

use crate::error::IngestError;
use crate::types::StatementRecord;

static STMTTRN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<STMTTRN>(.*?)</STMTTRN>").unwrap());
static DTPOSTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<DTPOSTED>([^\r\n<]+)").unwrap());
static TRNAMT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<TRNAMT>([^\r\n<]+)").unwrap());
static MEMO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<MEMO>([^\r\n<]+)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Read every `.ofx`/`.qfx` file in a directory into statement records.
///
/// Files are decoded as Latin-1. An empty overall result is an error; a
/// directory of statements that yields nothing means the wrong directory,
/// not an empty month.
pub fn read_ofx_dir(dir: impl AsRef<Path>) -> Result<Vec<StatementRecord>, IngestError> {
    let dir = dir.as_ref();
    let mut out = Vec::new();

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();

    for path in entries {
        let is_ofx = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                e == "ofx" || e == "qfx"
            })
            .unwrap_or(false);
        if !is_ofx {
            continue;
        }

        let bytes = std::fs::read(&path)?;
        let text: String = bytes.iter().map(|&b| b as char).collect();
        let parsed = parse_ofx_text(&text);
        debug!(file = %path.display(), records = parsed.len(), "ofx file read");
        out.extend(parsed);
    }

    if out.is_empty() {
        return Err(IngestError::Empty(dir.display().to_string()));
    }
    Ok(out)
}

/// Extract statement records from one OFX document's text.
///
/// Transactions missing a parseable date or amount, or with an empty memo,
/// are dropped silently, matching the CSV reader's data-quality rules.
pub fn parse_ofx_text(text: &str) -> Vec<StatementRecord> {
    STMTTRN
        .captures_iter(text)
        .filter_map(|block| parse_block(&block[1]))
        .collect()
}

fn parse_block(block: &str) -> Option<StatementRecord> {
    let date = parse_dtposted(DTPOSTED.captures(block)?[1].trim())?;
    let amount = parse_amount(TRNAMT.captures(block)?[1].trim())?;

    let memo = MEMO.captures(block)?;
    let description = WHITESPACE.replace_all(memo[1].trim(), " ").to_string();
    if description.is_empty() {
        return None;
    }

    Some(StatementRecord {
        date,
        description,
        amount,
    })
}

/// OFX dates come as `YYYYMMDD` optionally followed by time and a timezone
/// suffix (`20240310120000[-3:BRT]`); only the date part matters here.
fn parse_dtposted(raw: &str) -> Option<NaiveDate> {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 {
        return None;
    }
    NaiveDate::parse_from_str(&digits[..8], "%Y%m%d").ok()
}
