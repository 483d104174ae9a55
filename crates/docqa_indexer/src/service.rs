use std::sync::Arc;

use docqa_domain::{
    AnswerResult, CollectionId, IngestReport, IngestRequest, QueryRequest, RagConfig, Result,
};

use crate::chat::OpenAiChatModel;
use crate::collection::CollectionStore;
use crate::embedder::OpenAiEmbedder;
use crate::ingest::IngestionPipeline;
use crate::query::QueryPipeline;
use crate::traits::{ChatModel, Embedder};

/// Entry point for callers: ingestion, querying and collection management
/// over one storage root.
pub struct DocQa<E, C> {
    store: Arc<CollectionStore>,
    ingestion: IngestionPipeline<E>,
    query: QueryPipeline<E, C>,
}

impl DocQa<OpenAiEmbedder, OpenAiChatModel> {
    /// Uses the OpenAI-compatible provider named in `config`.
    pub fn openai(config: RagConfig) -> Self {
        let embedder = Arc::new(OpenAiEmbedder::new(&config));
        let chat = Arc::new(OpenAiChatModel::new(&config));
        Self::new(config, embedder, chat)
    }
}

impl<E: Embedder, C: ChatModel> DocQa<E, C> {
    pub fn new(config: RagConfig, embedder: Arc<E>, chat: Arc<C>) -> Self {
        let store = Arc::new(CollectionStore::new(config.vectorstores_root.clone()));
        let ingestion = IngestionPipeline::new(config.clone(), store.clone(), embedder.clone());
        let query = QueryPipeline::new(config, store.clone(), embedder, chat);
        Self { store, ingestion, query }
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport> {
        self.ingestion.ingest(request).await
    }

    pub async fn query(&self, request: QueryRequest) -> Result<AnswerResult> {
        self.query.query(request).await
    }

    pub async fn delete(&self, collection_id: &str) -> Result<()> {
        self.store.delete(&CollectionId::new(collection_id)?).await
    }

    pub async fn list(&self) -> Result<Vec<CollectionId>> {
        self.store.list().await
    }
}
