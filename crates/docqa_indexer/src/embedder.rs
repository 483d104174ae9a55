use std::time::Duration;

use anyhow::{Context, anyhow};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequest, EmbeddingInput};
use async_trait::async_trait;
use docqa_domain::{Error, RagConfig, Result};
use futures::future::join_all;
use tracing::debug;

use crate::traits::Embedder;

/// Builds an OpenAI-compatible client from the provider settings.
pub(crate) fn openai_client(config: &RagConfig) -> Client<OpenAIConfig> {
    let mut openai = OpenAIConfig::new();
    if let Some(key) = &config.api_key {
        openai = openai.with_api_key(key);
    }
    if let Some(base) = &config.api_base {
        openai = openai.with_api_base(base);
    }
    Client::with_config(openai)
}

/// Embeddings API client. Inputs are split into batches that are sent
/// concurrently; every batch is bounded by the request timeout.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    model: String,
    client: Client<OpenAIConfig>,
    batch_size: usize,
    timeout: Duration,
}

impl OpenAiEmbedder {
    pub fn new(config: &RagConfig) -> Self {
        Self {
            model: config.embedding_model.clone(),
            client: openai_client(config),
            batch_size: config.embed_batch_size.max(1),
            timeout: config.request_timeout(),
        }
    }

    async fn embed_batch(&self, batch: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        let expected = batch.len();
        let request = CreateEmbeddingRequest {
            model: self.model.clone(),
            input: EmbeddingInput::StringArray(batch),
            ..Default::default()
        };
        let response = tokio::time::timeout(self.timeout, self.client.embeddings().create(request))
            .await
            .map_err(|_| anyhow!("embedding request timed out after {:?}", self.timeout))?
            .context("embedding provider returned an error")?;

        let mut data = response.data;
        if data.len() != expected {
            return Err(anyhow!("expected {expected} embeddings, provider returned {}", data.len()));
        }
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batches = texts
            .chunks(self.batch_size)
            .map(|batch| batch.to_vec())
            .collect::<Vec<_>>();
        debug!(model = %self.model, texts = texts.len(), batches = batches.len(), "Requesting embeddings");

        // Kick off all embedding requests in parallel
        let vectors = join_all(batches.into_iter().map(|batch| self.embed_batch(batch)))
            .await
            .into_iter()
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(Error::Embedding)?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        check_dimensions(&vectors).map_err(Error::Embedding)?;
        Ok(vectors)
    }
}

fn check_dimensions(vectors: &[Vec<f32>]) -> anyhow::Result<()> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    match vectors.iter().find(|v| v.len() != first.len() || v.is_empty()) {
        Some(v) => Err(anyhow!(
            "inconsistent embedding dimensions: {} and {}",
            first.len(),
            v.len()
        )),
        None => Ok(()),
    }
}
