use std::sync::Arc;

use anyhow::anyhow;
use docqa_domain::{
    ChunkVector, CollectionId, Error, IngestMode, IngestReport, IngestRequest, RagConfig, Result,
};
use strum_macros::Display;
use tracing::{debug, error, info};

use crate::chunker::TextChunker;
use crate::collection::CollectionStore;
use crate::loader::PdfLoader;
use crate::store::VectorIndex;
use crate::traits::Embedder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IngestStage {
    Validating,
    Extracting,
    Chunking,
    Embedding,
    Indexing,
    Done,
}

/// Loads one PDF, chunks and embeds it, and stores the vectors in a
/// collection.
///
/// The new index is assembled in memory; the final save is the only step
/// that touches the collection on disk.
pub struct IngestionPipeline<E> {
    config: RagConfig,
    store: Arc<CollectionStore>,
    loader: PdfLoader,
    embedder: Arc<E>,
}

impl<E: Embedder> IngestionPipeline<E> {
    pub fn new(config: RagConfig, store: Arc<CollectionStore>, embedder: Arc<E>) -> Self {
        Self { config, store, loader: PdfLoader, embedder }
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestReport> {
        let mut stage = IngestStage::Validating;
        let result = self.run(&request, &mut stage).await;
        match &result {
            Ok(report) => info!(
                collection = %report.collection_id,
                stage = %IngestStage::Done,
                pages = report.pages_loaded,
                chunks = report.chunks_created,
                vectors = report.vector_count,
                "Ingestion finished"
            ),
            Err(e) => error!(
                collection = %request.collection_id,
                stage = %stage,
                kind = %e.kind(),
                error = %e,
                "Ingestion failed"
            ),
        }
        result
    }

    async fn run(&self, request: &IngestRequest, stage: &mut IngestStage) -> Result<IngestReport> {
        let id = CollectionId::new(request.collection_id.as_str())?;
        if request.file_path.as_os_str().is_empty() {
            return Err(Error::Validation("file path is required".to_string()));
        }
        let chunker = TextChunker::try_new(
            request.chunk_size.unwrap_or(self.config.chunk_size),
            request.chunk_overlap.unwrap_or(self.config.chunk_overlap),
        )?;

        let collection = self.store.collection(&id);
        let _ingest = collection.lock_ingest().await;

        *stage = IngestStage::Extracting;
        debug!(collection = %id, stage = %stage, path = %request.file_path.display());
        let pages = self.loader.load(&request.file_path).await?;

        *stage = IngestStage::Chunking;
        debug!(collection = %id, stage = %stage, pages = pages.len());
        let chunks = chunker.chunk(&pages)?;
        if chunks.is_empty() {
            return Err(Error::EmptyInput(format!(
                "no text could be extracted from {}",
                request.file_path.display()
            )));
        }

        *stage = IngestStage::Embedding;
        debug!(collection = %id, stage = %stage, chunks = chunks.len());
        let texts = chunks.iter().map(|c| c.text.clone()).collect::<Vec<_>>();
        let vectors = self.embedder.embed(texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::Embedding(anyhow!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        let chunks_created = chunks.len();
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkVector::new(chunk, vector))
            .collect::<Vec<_>>();

        *stage = IngestStage::Indexing;
        debug!(collection = %id, stage = %stage, mode = %request.mode);
        let model_id = self.embedder.model_id();
        let index = match request.mode {
            IngestMode::Replace => VectorIndex::create(entries, model_id)?,
            IngestMode::Append => match collection.load_index().await {
                Ok(mut index) => {
                    index.append(entries, model_id)?;
                    index
                }
                Err(e) if e.is_not_found() => VectorIndex::create(entries, model_id)?,
                Err(e) => return Err(e),
            },
        };
        let manifest = collection.save_index(&index).await?;

        Ok(IngestReport {
            collection_id: id,
            mode: request.mode,
            pages_loaded: pages.len(),
            chunks_created,
            vector_count: manifest.vector_count,
            index_location: collection.dir().to_path_buf(),
        })
    }
}
