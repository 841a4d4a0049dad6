//! Blocking client for OpenAI-compatible `/embeddings` endpoints.
//!
//! Inputs are sent in chunks of `batch_size`; each response is re-ordered by
//! its `index` field. Any failure aborts the whole encode call: the engine
//! never receives a partial batch.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embedding::Embedder;
use crate::error::EmbeddingError;

pub struct HttpEmbedder {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    batch_size: usize,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        batch_size: usize,
        api_key: Option<String>,
    ) -> Result<Self, EmbeddingError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("plancheck/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            batch_size: batch_size.max(1),
            timeout,
        })
    }

    /// Client from the `[embedding]` section. The API key, when configured,
    /// is read from the named environment variable.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| EmbeddingError::Setup("embedding.endpoint is not set".into()))?;

        let api_key = match &config.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                EmbeddingError::Setup(format!("environment variable {var} is not set"))
            })?),
            None => None,
        };

        Self::new(
            endpoint,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
            config.batch_size,
            api_key,
        )
    }

    fn request(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = serde_json::json!({ "model": self.model, "input": chunk });
        let mut req = self.http.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Http { status: status.as_u16(), body });
        }

        let parsed: EmbeddingResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout { after: self.timeout }
            } else {
                EmbeddingError::Malformed(e.to_string())
            }
        })?;

        if parsed.data.len() != chunk.len() {
            return Err(EmbeddingError::CountMismatch { expected: chunk.len(), got: parsed.data.len() });
        }

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; chunk.len()];
        for item in parsed.data {
            let slot = slots
                .get_mut(item.index)
                .ok_or_else(|| EmbeddingError::Malformed(format!("index {} out of range", item.index)))?;
            if slot.replace(item.embedding).is_some() {
                return Err(EmbeddingError::Malformed(format!("duplicate index {}", item.index)));
            }
        }
        slots
            .into_iter()
            .map(|v| v.ok_or_else(|| EmbeddingError::Malformed("missing index".into())))
            .collect()
    }

    fn transport_error(&self, e: reqwest::Error) -> EmbeddingError {
        if e.is_timeout() {
            EmbeddingError::Timeout { after: self.timeout }
        } else {
            EmbeddingError::Transport(e.to_string())
        }
    }
}

impl Embedder for HttpEmbedder {
    fn name(&self) -> String {
        format!("http:{}", self.model)
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            debug!(endpoint = %self.endpoint, size = chunk.len(), "embedding request");
            out.extend(self.request(chunk)?);
        }

        if let Some(first) = out.first() {
            let expected = first.len();
            if let Some(bad) = out.iter().find(|v| v.len() != expected) {
                return Err(EmbeddingError::DimensionMismatch { expected, got: bad.len() });
            }
        }
        Ok(out)
    }
}
