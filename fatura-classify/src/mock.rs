//! Mock classifiers for tests and offline development.
//!
//! [`MockClassifier`] answers deterministically from keyword rules and
//! counts invocations, which makes deduplication and idempotence
//! observable. [`FlakyClassifier`] fails a configured number of times with
//! a transient error before succeeding, for retry/backoff tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use fatura_core::Category;

use crate::error::ClassifyError;
use crate::Classifier;

#[derive(Default)]
pub struct MockClassifier {
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of classify invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let upper = text.to_uppercase();
        let category = if upper.contains("UBER") || upper.contains("IFOOD") {
            Category::DeliveryRestaurantes
        } else if upper.contains("MERCADO") || upper.contains("SUPERMERCADO") {
            Category::Mercado
        } else if upper.contains("NETFLIX") || upper.contains("SPOTIFY") {
            Category::Streaming
        } else if upper.contains("FARMACIA") || upper.contains("DROGASIL") {
            Category::Saude
        } else if upper.contains("ALUGUEL") {
            Category::Moradia
        } else {
            Category::Outros
        };

        // Labels come back from the real service with stray whitespace;
        // the batcher is responsible for trimming
        Ok(format!("{}\n", category.label()))
    }
}

/// Fails `failures` times with a rate-limit-signature transient error,
/// then answers `label` on every subsequent call.
pub struct FlakyClassifier {
    remaining: AtomicUsize,
    label: String,
    calls: AtomicUsize,
}

impl FlakyClassifier {
    pub fn new(failures: usize, label: impl Into<String>) -> Self {
        Self {
            remaining: AtomicUsize::new(failures),
            label: label.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FlakyClassifier {
    async fn classify(&self, _text: &str) -> Result<String, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(ClassifyError::Transient(
                "rate limit reached for model".to_string(),
            ));
        }
        Ok(self.label.clone())
    }
}
