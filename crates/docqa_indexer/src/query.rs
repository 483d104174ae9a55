use std::sync::Arc;

use docqa_domain::{AnswerResult, CollectionId, Error, QueryRequest, RagConfig, Result};
use strum_macros::Display;
use tracing::{debug, error, info};

use crate::collection::CollectionStore;
use crate::retriever::Retriever;
use crate::synthesizer::AnswerSynthesizer;
use crate::traits::{ChatModel, Embedder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum QueryStage {
    Validating,
    LoadingIndex,
    EmbeddingQuestion,
    Retrieving,
    Synthesizing,
    Done,
}

/// Answers a question against one collection: load the index, embed the
/// question, retrieve the nearest chunks, synthesize an answer.
pub struct QueryPipeline<E, C> {
    config: RagConfig,
    store: Arc<CollectionStore>,
    embedder: Arc<E>,
    retriever: Retriever<E>,
    synthesizer: AnswerSynthesizer<C>,
}

impl<E: Embedder, C: ChatModel> QueryPipeline<E, C> {
    pub fn new(
        config: RagConfig,
        store: Arc<CollectionStore>,
        embedder: Arc<E>,
        chat: Arc<C>,
    ) -> Self {
        let synthesizer = AnswerSynthesizer::new(chat, config.max_context_chars);
        let retriever = Retriever::new(embedder.clone());
        Self { config, store, embedder, retriever, synthesizer }
    }

    pub async fn query(&self, request: QueryRequest) -> Result<AnswerResult> {
        let mut stage = QueryStage::Validating;
        let result = self.run(&request, &mut stage).await;
        match &result {
            Ok(answer) => info!(
                collection = %request.collection_id,
                stage = %QueryStage::Done,
                sources = answer.sources.len(),
                "Query answered"
            ),
            Err(e) => error!(
                collection = %request.collection_id,
                stage = %stage,
                kind = %e.kind(),
                error = %e,
                "Query failed"
            ),
        }
        result
    }

    async fn run(&self, request: &QueryRequest, stage: &mut QueryStage) -> Result<AnswerResult> {
        let id = CollectionId::new(request.collection_id.as_str())?;
        let question = request.question.trim();
        if question.is_empty() {
            return Err(Error::Validation("question is required".to_string()));
        }
        let k = request.top_k.unwrap_or(self.config.top_k);
        if k == 0 {
            return Err(Error::InvalidK);
        }
        let collection = self.store.collection(&id);
        if collection.manifest().await?.is_none() {
            self.store.release(collection);
            return Err(Error::IndexNotFound(id.to_string()));
        }

        // The read lock is released once the index is in memory
        *stage = QueryStage::LoadingIndex;
        debug!(collection = %id, stage = %stage);
        let index = collection.load_index().await?;
        if index.model_id() != self.embedder.model_id() {
            return Err(Error::ModelMismatch {
                indexed: index.model_id().to_string(),
                requested: self.embedder.model_id().to_string(),
            });
        }

        *stage = QueryStage::EmbeddingQuestion;
        debug!(collection = %id, stage = %stage);
        let retrieved = self
            .retriever
            .retrieve(&index, question, k, || {
                *stage = QueryStage::Retrieving;
                debug!(collection = %id, stage = %stage, k, vectors = index.len());
            })
            .await?;

        *stage = QueryStage::Synthesizing;
        debug!(collection = %id, stage = %stage, chunks = retrieved.len());
        self.synthesizer.synthesize(question, &retrieved).await
    }
}
