//! fatura-ingest: statement ingestion — delimiter/encoding-tolerant card CSV
//! reading and bank OFX statement parsing, normalized into one record shape.

pub mod card_csv;
pub mod error;
pub mod ofx;
pub mod types;

pub use card_csv::{read_card_csv, read_card_csv_bytes};
pub use error::IngestError;
pub use ofx::read_ofx_dir;
pub use types::StatementRecord;
