//! Deduplicated, batched classification with rate-limit-aware retry.
//!
//! Each distinct cleaned description is classified exactly once; results
//! are broadcast onto every record sharing the description. Batches bound
//! the request rate together with a fixed inter-batch delay; transient
//! failures are retried per item with exponential backoff.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, warn};

use fatura_core::Transaction;

use crate::error::ClassifyError;
use crate::Classifier;

/// Tunables for one classification run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Distinct descriptions per batch.
    pub batch_size: usize,
    /// Bounded fan-out across the items of one batch. 1 = serialized,
    /// which is what an on-demand requests-per-minute ceiling wants.
    pub max_concurrency: usize,
    /// Fixed delay after each batch, independent of its outcome.
    pub sleep_seconds: f64,
    /// Retry attempt budget per item for transient failures.
    pub max_retries: u32,
    /// First backoff delay; doubles per retry up to `backoff_cap`.
    pub backoff_seed: Duration,
    pub backoff_cap: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_concurrency: 1,
            sleep_seconds: 3.0,
            max_retries: 6,
            backoff_seed: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(30),
        }
    }
}

/// Progress observer: `(done, total)` over distinct descriptions.
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Sync);

pub struct Batcher {
    classifier: Arc<dyn Classifier>,
    config: BatchConfig,
}

impl Batcher {
    pub fn new(classifier: Arc<dyn Classifier>, config: BatchConfig) -> Self {
        Self { classifier, config }
    }

    /// Assign a category to every record.
    ///
    /// On success every record carries `Some(category)`. On any error the
    /// records are left untouched and the run must be considered failed;
    /// there is no partial assignment.
    pub async fn categorize(
        &self,
        records: &mut [Transaction],
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<(), ClassifyError> {
        let cache = self
            .classify_distinct(
                records.iter().map(|r| r.cleaned_description.as_str()),
                on_progress,
            )
            .await?;

        for record in records.iter_mut() {
            let category = cache
                .get(&record.cleaned_description)
                .ok_or_else(|| {
                    ClassifyError::MissingCacheEntry(record.cleaned_description.clone())
                })?;
            record.category = Some(category.clone());
        }

        Ok(())
    }

    /// Classify every distinct description exactly once, in first-seen
    /// order, returning the description -> category cache for this run.
    async fn classify_distinct<'a>(
        &self,
        descriptions: impl Iterator<Item = &'a str>,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<HashMap<String, String>, ClassifyError> {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = descriptions.filter(|d| seen.insert(*d)).collect();

        let total = distinct.len();
        let mut cache = HashMap::with_capacity(total);
        let mut done = 0usize;

        if let Some(progress) = on_progress {
            progress(0, total);
        }

        for chunk in distinct.chunks(self.config.batch_size.max(1)) {
            let results: Vec<(String, String)> = stream::iter(chunk.iter().copied())
                .map(|text| async move {
                    let label = self.classify_with_retry(text).await?;
                    Ok::<_, ClassifyError>((text.to_string(), label))
                })
                .buffered(self.config.max_concurrency.max(1))
                .try_collect()
                .await?;

            // Cache is written only once the whole batch has completed
            cache.extend(results);

            done += chunk.len();
            debug!(done, total, "batch classified");
            if let Some(progress) = on_progress {
                progress(done, total);
            }

            tokio::time::sleep(Duration::from_secs_f64(self.config.sleep_seconds)).await;
        }

        Ok(cache)
    }

    /// One item with the transient-failure retry policy: exponential
    /// backoff seeded at `backoff_seed`, doubling, capped, bounded attempt
    /// count. Permanent failures propagate on the spot.
    async fn classify_with_retry(&self, text: &str) -> Result<String, ClassifyError> {
        let mut delay = self.config.backoff_seed;
        let mut last = String::new();

        for attempt in 1..=self.config.max_retries {
            match self.classifier.classify(text).await {
                Ok(label) => return Ok(label.trim().to_string()),
                Err(ClassifyError::Transient(msg)) => {
                    warn!(attempt, delay_s = delay.as_secs_f64(), %msg, "transient classifier failure, backing off");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.config.backoff_cap);
                    last = msg;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ClassifyError::Exhausted {
            attempts: self.config.max_retries,
            last,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    use crate::mock::{FlakyClassifier, MockClassifier};

    fn txn(desc: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            raw_description: desc.to_string(),
            cleaned_description: desc.to_string(),
            amount,
            installment: None,
            category: None,
        }
    }

    fn fast_config() -> BatchConfig {
        BatchConfig {
            sleep_seconds: 0.0,
            ..BatchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_deduplicates_classifier_calls() {
        let mock = Arc::new(MockClassifier::new());
        let batcher = Batcher::new(mock.clone(), fast_config());

        let mut records = vec![
            txn("UBER TRIP", -20.0),
            txn("UBER TRIP", -25.0),
            txn("UBER TRIP", -30.0),
            txn("MERCADO X", -50.0),
        ];
        batcher.categorize(&mut records, None).await.unwrap();

        // 2 distinct descriptions -> exactly 2 calls for 4 rows
        assert_eq!(mock.calls(), 2);
        assert_eq!(records[0].category.as_deref(), Some("Delivery/Restaurantes"));
        assert_eq!(records[2].category.as_deref(), Some("Delivery/Restaurantes"));
        assert_eq!(records[3].category.as_deref(), Some("Mercado"));
    }

    #[tokio::test]
    async fn test_labels_trimmed_before_caching() {
        // MockClassifier appends a trailing newline on purpose
        let batcher = Batcher::new(Arc::new(MockClassifier::new()), fast_config());
        let mut records = vec![txn("NETFLIX.COM", -39.90)];
        batcher.categorize(&mut records, None).await.unwrap();
        assert_eq!(records[0].category.as_deref(), Some("Streaming/Assinaturas"));
    }

    #[tokio::test]
    async fn test_idempotent_for_stable_classifier() {
        let batcher = Batcher::new(Arc::new(MockClassifier::new()), fast_config());

        let mut first = vec![txn("UBER TRIP", -20.0), txn("ALUGUEL", -1200.0)];
        let mut second = first.clone();
        batcher.categorize(&mut first, None).await.unwrap();
        batcher.categorize(&mut second, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_progress_events_per_batch() {
        let config = BatchConfig {
            batch_size: 2,
            ..fast_config()
        };
        let batcher = Batcher::new(Arc::new(MockClassifier::new()), config);

        let mut records = vec![txn("A", -1.0), txn("B", -1.0), txn("C", -1.0)];
        let events = Mutex::new(Vec::new());
        let progress = |done: usize, total: usize| {
            events.lock().unwrap().push((done, total));
        };

        batcher.categorize(&mut records, Some(&progress)).await.unwrap();
        assert_eq!(*events.lock().unwrap(), vec![(0, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backs_off_then_succeeds() {
        // Fails twice with a rate-limit signature, then answers
        let flaky = Arc::new(FlakyClassifier::new(2, "Outros"));
        let batcher = Batcher::new(flaky.clone(), fast_config());

        let start = tokio::time::Instant::now();
        let mut records = vec![txn("LOJA X", -10.0)];
        batcher.categorize(&mut records, None).await.unwrap();

        assert_eq!(records[0].category.as_deref(), Some("Outros"));
        assert_eq!(flaky.calls(), 3);
        // Exactly the two backoff waits: 1s then 2s (virtual time)
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_retry_budget() {
        let flaky = Arc::new(FlakyClassifier::new(usize::MAX, "never"));
        let batcher = Batcher::new(flaky.clone(), fast_config());

        let mut records = vec![txn("LOJA X", -10.0)];
        let err = batcher.categorize(&mut records, None).await.unwrap_err();

        match err {
            ClassifyError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 6);
                assert!(last.contains("rate limit"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(flaky.calls(), 6);
        assert!(records[0].category.is_none());
    }

    #[tokio::test]
    async fn test_permanent_failure_propagates_without_retry() {
        struct Broken;

        #[async_trait]
        impl Classifier for Broken {
            async fn classify(&self, _text: &str) -> Result<String, ClassifyError> {
                Err(ClassifyError::Permanent("invalid api key".to_string()))
            }
        }

        let batcher = Batcher::new(Arc::new(Broken), fast_config());
        let mut records = vec![txn("LOJA X", -10.0)];
        let err = batcher.categorize(&mut records, None).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Permanent(_)));
    }
}
