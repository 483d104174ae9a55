use std::time::Duration;

use anyhow::{Context, anyhow};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use docqa_domain::{Error, RagConfig, Result};

use crate::embedder::openai_client;
use crate::traits::ChatModel;

/// Chat completions API client making one non-streaming call per prompt.
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    model: String,
    temperature: f32,
    client: Client<OpenAIConfig>,
    timeout: Duration,
}

impl OpenAiChatModel {
    pub fn new(config: &RagConfig) -> Self {
        Self {
            model: config.chat_model.clone(),
            temperature: config.temperature,
            client: openai_client(config),
            timeout: config.request_timeout(),
        }
    }

    async fn request(&self, prompt: String) -> anyhow::Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .build()?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| anyhow!("chat request timed out after {:?}", self.timeout))?
            .context("chat provider returned an error")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("chat provider returned an empty completion"))
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        self.request(prompt).await.map_err(Error::Synthesis)
    }
}
