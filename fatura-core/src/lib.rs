//! fatura-core: domain types and pure parsing utilities for personal
//! card/bank statement processing.

pub mod amount;
pub mod installment;
pub mod transaction;

pub use amount::parse_amount;
pub use installment::{clean_description, extract_installment};
pub use transaction::{Category, Installment, Transaction};
