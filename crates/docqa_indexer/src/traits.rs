use async_trait::async_trait;
use docqa_domain::Result;

/// Maps text to fixed-dimension vectors.
///
/// Implementations return one vector per input, in input order, and fail with
/// an embedding error instead of returning a partial result.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier recorded in every index built with this embedder.
    fn model_id(&self) -> &str;

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Single-turn text completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn complete(&self, prompt: String) -> Result<String>;
}
