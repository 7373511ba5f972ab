//! fatura-classify: remote text classification of statement descriptions —
//! classifier capability trait, Groq chat client, deduplicated batched
//! classification with rate-limit-aware retry, and the run orchestrator.

pub mod batcher;
pub mod client;
pub mod error;
pub mod mock;
pub mod pipeline;
pub mod prompt;

pub use batcher::{BatchConfig, Batcher};
pub use client::GroqClassifier;
pub use error::{ClassifyError, PipelineError};
pub use mock::{FlakyClassifier, MockClassifier};
pub use pipeline::{Pipeline, RunState, Source};

use async_trait::async_trait;

/// External classification capability.
///
/// Implementations take one free-text statement description and return a
/// single-line category label. Failure classification (transient vs
/// permanent) happens inside the implementation, at the collaborator
/// boundary; callers only branch on the returned error variant.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<String, error::ClassifyError>;
}
