//! Run orchestrator: read -> extract installments -> classify -> override.
//!
//! One pipeline run processes one uploaded batch. All inputs (source and
//! classifier capability) are explicit parameters; the only state owned by
//! a run is the classification cache inside the batcher and the run-state
//! marker used for observability.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use fatura_core::{clean_description, extract_installment, Category, Transaction};
use fatura_ingest::{read_card_csv_bytes, read_card_csv, read_ofx_dir, StatementRecord};

use crate::batcher::{BatchConfig, Batcher, ProgressFn};
use crate::error::PipelineError;
use crate::Classifier;

/// Administrative entries (credit-card bill payments) removed before
/// classification; matched case-insensitively as a substring of the
/// cleaned description.
pub const PAYMENT_SENTINEL: &str = "PAGAMENTO EFETUADO";

/// Input source for one run.
#[derive(Debug, Clone)]
pub enum Source {
    /// Card CSV on disk.
    CardCsvPath(PathBuf),
    /// Card CSV already in memory (e.g. an upload).
    CardCsvBytes(Vec<u8>),
    /// Directory of bank OFX statements.
    OfxDir(PathBuf),
}

/// Stage marker for one run. No state is re-entered; a failed run restarts
/// from `Reading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Reading,
    Extracting,
    Classifying,
    Overriding,
    Done,
    Failed,
}

pub struct Pipeline {
    batcher: Batcher,
    state: RunState,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn Classifier>, config: BatchConfig) -> Self {
        Self {
            batcher: Batcher::new(classifier, config),
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute one full run. Either every returned record carries a
    /// category, or the run fails outright before producing output.
    pub async fn run(
        &mut self,
        source: &Source,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<Transaction>, PipelineError> {
        match self.run_stages(source, on_progress).await {
            Ok(records) => {
                self.state = RunState::Done;
                Ok(records)
            }
            Err(e) => {
                self.state = RunState::Failed;
                Err(e)
            }
        }
    }

    async fn run_stages(
        &mut self,
        source: &Source,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<Transaction>, PipelineError> {
        self.state = RunState::Reading;
        let raw = match source {
            Source::CardCsvPath(path) => read_card_csv(path)?,
            Source::CardCsvBytes(bytes) => read_card_csv_bytes(bytes)?,
            Source::OfxDir(dir) => read_ofx_dir(dir)?,
        };
        info!(rows = raw.len(), "statement read");

        self.state = RunState::Extracting;
        let mut records = enrich(raw);
        info!(rows = records.len(), "installments extracted, sentinel rows dropped");

        self.state = RunState::Classifying;
        self.batcher.categorize(&mut records, on_progress).await?;

        self.state = RunState::Overriding;
        apply_refund_override(&mut records);

        Ok(records)
    }
}

/// Installment-extraction stage: derive the cleaned description and the
/// validated installment pair, and drop bill-payment sentinel rows.
pub fn enrich(raw: Vec<StatementRecord>) -> Vec<Transaction> {
    raw.into_iter()
        .filter_map(|rec| {
            let cleaned = clean_description(&rec.description);
            if cleaned.to_uppercase().contains(PAYMENT_SENTINEL) {
                return None;
            }
            Some(Transaction {
                installment: extract_installment(&rec.description),
                date: rec.date,
                raw_description: rec.description,
                cleaned_description: cleaned,
                amount: rec.amount,
                category: None,
            })
        })
        .collect()
}

/// Business override, always last, always wins: negative amounts are
/// credits/refunds regardless of what the classifier said.
pub fn apply_refund_override(records: &mut [Transaction]) {
    for record in records.iter_mut() {
        if record.amount < 0.0 {
            record.category = Some(Category::ReembolsosCreditos.label().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClassifier;

    const CSV: &str = "\
Data,Lançamento,Valor
2024-05-10,COMPRA LOJA 01/06 PARC,\"1.234,56\"
2024-05-11,UBER TRIP,-72.39
2024-05-11,UBER TRIP,-15.00
2024-05-12,PAGAMENTO EFETUADO 10/05,\"-3.000,00\"
2024-05-13,MERCADO BOM PRECO,-250.10
not-a-date,LOJA QUEBRADA,-1.00
";

    fn fast_config() -> BatchConfig {
        BatchConfig {
            sleep_seconds: 0.0,
            ..BatchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_full_run_over_card_csv() {
        let mut pipeline = Pipeline::new(Arc::new(MockClassifier::new()), fast_config());
        assert_eq!(pipeline.state(), RunState::Idle);

        let source = Source::CardCsvBytes(CSV.as_bytes().to_vec());
        let records = pipeline.run(&source, None).await.unwrap();
        assert_eq!(pipeline.state(), RunState::Done);

        // 6 input rows: 1 dropped (bad date), 1 dropped (payment sentinel)
        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.cleaned_description, "COMPRA LOJA PARC");
        assert_eq!(first.installment.map(|p| (p.current, p.total)), Some((1, 6)));
        assert_eq!(first.installment_label(), "01/06");

        // Every surviving record got a category
        assert!(records.iter().all(|r| r.category.is_some()));
    }

    #[tokio::test]
    async fn test_negative_amount_override_always_wins() {
        let mut pipeline = Pipeline::new(Arc::new(MockClassifier::new()), fast_config());
        let source = Source::CardCsvBytes(CSV.as_bytes().to_vec());
        let records = pipeline.run(&source, None).await.unwrap();

        for record in records.iter().filter(|r| r.amount < 0.0) {
            assert_eq!(
                record.category.as_deref(),
                Some("Reembolsos & Créditos"),
                "negative row {:?} must be a refund/credit",
                record.raw_description
            );
        }
        // Positive rows keep what the classifier assigned
        let positive = records.iter().find(|r| r.amount > 0.0).unwrap();
        assert_ne!(positive.category.as_deref(), Some("Reembolsos & Créditos"));
    }

    #[tokio::test]
    async fn test_failed_read_moves_to_failed_state() {
        let mut pipeline = Pipeline::new(Arc::new(MockClassifier::new()), fast_config());
        let source = Source::CardCsvBytes(b"a,b\n1,2,3\nx;y\n4;5;6\n".to_vec());
        let err = pipeline.run(&source, None).await.unwrap_err();

        assert!(matches!(err, PipelineError::Ingest(_)));
        assert_eq!(pipeline.state(), RunState::Failed);
    }

    #[test]
    fn test_enrich_drops_sentinel_even_lowercase() {
        let raw = vec![StatementRecord {
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            description: "pagamento efetuado 10/05".to_string(),
            amount: -3000.0,
        }];
        assert!(enrich(raw).is_empty());
    }

    #[test]
    fn test_enrich_strips_rejected_markers() {
        let raw = vec![StatementRecord {
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            description: "ITEM 00/00".to_string(),
            amount: -10.0,
        }];
        let records = enrich(raw);
        assert_eq!(records[0].cleaned_description, "ITEM");
        assert_eq!(records[0].installment, None);
    }
}
