use std::path::PathBuf;
use std::time::Duration;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Runtime configuration for the ingestion and query pipelines.
///
/// Built once at startup and passed into every component that needs it.
#[derive(Debug, Clone, PartialEq, Setters, Serialize, Deserialize, fake::Dummy)]
#[serde(rename_all = "snake_case")]
#[setters(strip_option, into)]
pub struct RagConfig {
    /// Credential for the embedding and chat provider.
    #[serde(default)]
    #[dummy(default)]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible provider. Uses the provider default
    /// when unset.
    #[serde(default)]
    #[dummy(default)]
    pub api_base: Option<String>,
    /// Embedding model; recorded in every index it builds.
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    /// Directory holding one subdirectory per collection.
    pub vectorstores_root: PathBuf,
    /// Maximum characters per chunk.
    #[dummy(faker = "200..2000")]
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks. Must be below `chunk_size`.
    #[dummy(faker = "0..200")]
    pub chunk_overlap: usize,
    #[dummy(faker = "1..10")]
    pub top_k: usize,
    /// Texts sent per embedding request.
    #[dummy(faker = "1..100")]
    pub embed_batch_size: usize,
    /// Upper bound on the context handed to the chat model.
    pub max_context_chars: usize,
    /// Applies to each embedding and chat call.
    pub request_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            vectorstores_root: PathBuf::from("vectorstores"),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            embed_batch_size: 100,
            max_context_chars: 12_000,
            request_timeout_secs: 60,
        }
    }
}

impl RagConfig {
    /// Loads the configuration from the embedded `defaults.json`, overridden
    /// by `DOCQA_`-prefixed environment variables.
    ///
    /// # Examples of environment variables:
    /// - `DOCQA_CHUNK_SIZE` -> `chunk_size`
    /// - `DOCQA_EMBEDDING_MODEL` -> `embedding_model`
    /// - `DOCQA_VECTORSTORES_ROOT` -> `vectorstores_root`
    ///
    /// When no `DOCQA_API_KEY` is set, `OPENAI_API_KEY` is used.
    ///
    /// # Errors
    /// Returns an error if a variable cannot be parsed into the expected type.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let env = config::Environment::with_prefix("DOCQA")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self::from_source(env, std::env::var("OPENAI_API_KEY").ok())
    }

    fn from_source(
        env: config::Environment,
        fallback_api_key: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        const DEFAULT_CONFIG: &str = include_str!("../defaults.json");

        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Json,
            ))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Ok(match (&config.api_key, fallback_api_key) {
            (None, Some(key)) => config.api_key(key),
            _ => config,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
