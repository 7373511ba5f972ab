//! Groq chat-completions client implementing the [`Classifier`] capability.
//!
//! Failures are tagged transient/permanent here, at the boundary: HTTP 429
//! and connection-level errors (connect, timeout, DNS) are transient and
//! eligible for retry; everything else is permanent. The recognized
//! transient message signatures are kept for responses that surface
//! rate-limiting only in the body text.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClassifyError;
use crate::prompt;
use crate::Classifier;

const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Message substrings recognized as rate-limit / transient-connectivity
/// signatures when the error is not already structurally classified.
const TRANSIENT_SIGNATURES: [&str; 6] = [
    "rate limit",
    "rate_limit",
    "429",
    "connection error",
    "getaddrinfo",
    "connecterror",
];

pub struct GroqClassifier {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GroqClassifier {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct Msg {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct Req {
    model: String,
    messages: Vec<Msg>,
    temperature: f32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: Option<String>,
}

fn has_transient_signature(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    TRANSIENT_SIGNATURES.iter().any(|s| msg.contains(s))
}

/// Tag a low-level reqwest failure.
fn tag_request_error(e: reqwest::Error) -> ClassifyError {
    let msg = e.to_string();
    if e.is_connect() || e.is_timeout() || has_transient_signature(&msg) {
        ClassifyError::Transient(msg)
    } else {
        ClassifyError::Permanent(msg)
    }
}

#[async_trait]
impl Classifier for GroqClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifyError> {
        let body = Req {
            model: self.model.clone(),
            messages: vec![Msg {
                role: "user".to_string(),
                content: prompt::card_prompt(text),
            }],
            temperature: 0.0,
        };

        let resp = self
            .client
            .post(GROQ_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(tag_request_error)?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            let msg = format!("groq error: {status} {txt}");
            if status == StatusCode::TOO_MANY_REQUESTS || has_transient_signature(&msg) {
                return Err(ClassifyError::Transient(msg));
            }
            return Err(ClassifyError::Permanent(msg));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| ClassifyError::Permanent(format!("parse groq response: {e}")))?;

        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        let label = content.trim().to_string();
        debug!(%label, "classified description");
        Ok(label)
    }
}
