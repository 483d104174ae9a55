/// Provider-neutral model interfaces
pub mod traits;

/// PDF text extraction
pub mod loader;

pub mod chunker;
pub mod embedder;
pub mod chat;

/// On-disk layout of a collection's index
pub mod manifest;
/// Vector index with create, append, query and persistence
pub mod store;
/// Storage root and per-collection locking
pub mod collection;

pub mod retriever;
pub mod synthesizer;

/// Ingestion and query pipelines
pub mod ingest;
pub mod query;

mod service;

#[cfg(test)]
mod fixtures;

pub use chat::*;
pub use chunker::*;
pub use collection::*;
pub use embedder::OpenAiEmbedder;
pub use ingest::*;
pub use loader::*;
pub use manifest::{DistanceMetric, IndexManifest};
pub use query::*;
pub use retriever::*;
pub use service::*;
pub use store::*;
pub use synthesizer::*;
pub use traits::*;
