//! Credit-card CSV reader.
//!
//! Card exports arrive with an undeclared delimiter and encoding, and with
//! localized header names. The reader tries a fixed candidate list over a
//! fully buffered source, resolves column roles by name, and applies the
//! data-quality drop rules.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use fatura_core::parse_amount;

use crate::error::IngestError;
use crate::types::StatementRecord;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Latin1,
}

/// (delimiter, encoding) candidates, tried in order. The first one that
/// decodes and parses without structural error wins.
const CANDIDATES: [(u8, Encoding); 4] = [
    (b',', Encoding::Utf8),
    (b';', Encoding::Utf8),
    (b',', Encoding::Latin1),
    (b';', Encoding::Latin1),
];

/// Date formats accepted for the date column, tried in order. Anything
/// else coerces to a dropped row, not an error.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d/%m/%y",
    "%m/%d/%Y",
];

/// Read a card CSV from a file path.
pub fn read_card_csv(path: impl AsRef<Path>) -> Result<Vec<StatementRecord>, IngestError> {
    let bytes = std::fs::read(path.as_ref())?;
    read_card_csv_bytes(&bytes)
}

/// Read a card CSV from an in-memory byte buffer (e.g. an upload).
///
/// Buffering the whole source up front means every candidate attempt starts
/// from the beginning; no seeking is needed.
pub fn read_card_csv_bytes(bytes: &[u8]) -> Result<Vec<StatementRecord>, IngestError> {
    let (headers, rows) = parse_with_candidates(bytes)?;
    let roles = resolve_columns(&headers)?;

    let mut out = Vec::new();
    let mut dropped = 0usize;
    for row in &rows {
        match map_row(row, &roles) {
            Some(rec) => out.push(rec),
            None => dropped += 1,
        }
    }

    debug!(kept = out.len(), dropped, "card csv read");
    Ok(out)
}

/// Indices of the three semantic columns in the source header.
struct ColumnRoles {
    date: usize,
    description: usize,
    amount: usize,
}

fn parse_with_candidates(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), IngestError> {
    let mut last_err = String::from("empty input");

    for (delimiter, encoding) in CANDIDATES {
        let text = match decode(bytes, encoding) {
            Ok(t) => t,
            Err(e) => {
                last_err = e;
                continue;
            }
        };

        match parse_csv(&text, delimiter) {
            Ok(parsed) => {
                debug!(delimiter = %(delimiter as char), ?encoding, "csv candidate accepted");
                return Ok(parsed);
            }
            Err(e) => last_err = e.to_string(),
        }
    }

    Err(IngestError::Format { last: last_err })
}

fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, String> {
    match encoding {
        Encoding::Utf8 => std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|e| format!("invalid UTF-8: {e}")),
        // Latin-1 maps every byte to the code point of the same value
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn parse_csv(text: &str, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>), csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok((headers, rows))
}

/// Locate the date/description/amount columns by lowercased substring match
/// on the header names. Fails closed when any role is unresolved.
fn resolve_columns(headers: &[String]) -> Result<ColumnRoles, IngestError> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let find = |tokens: &[&str]| {
        normalized
            .iter()
            .position(|h| tokens.iter().any(|t| h.contains(t)))
    };

    let date = find(&["data", "date"]);
    let description = find(&["lan", "descr"]);
    let amount = find(&["valor", "amount"]);

    match (date, description, amount) {
        (Some(date), Some(description), Some(amount)) => Ok(ColumnRoles {
            date,
            description,
            amount,
        }),
        _ => Err(IngestError::Schema {
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
        }),
    }
}

/// Map one raw row to a record, or `None` when it fails the drop rules
/// (unparseable date or amount, empty description).
fn map_row(row: &[String], roles: &ColumnRoles) -> Option<StatementRecord> {
    let date = parse_date(row.get(roles.date)?)?;
    let amount = parse_amount(row.get(roles.amount)?)?;

    let description = normalize_description(row.get(roles.description)?);
    if description.is_empty() {
        return None;
    }

    Some(StatementRecord {
        date,
        description,
        amount,
    })
}

fn parse_date(raw: &str) -> Option<chrono::NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveDate::parse_from_str(raw, fmt).ok())
}

fn normalize_description(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}
