use std::path::PathBuf;

use derive_setters::Setters;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{CollectionId, Error, Result};

/// How an ingestion treats an existing index in the target collection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IngestMode {
    /// The collection ends up containing only the ingested document.
    #[default]
    Replace,
    /// The document is added to whatever the collection already holds.
    Append,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[setters(strip_option, into)]
pub struct IngestRequest {
    pub collection_id: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub mode: IngestMode,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
}

impl IngestRequest {
    pub fn new(collection_id: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            collection_id: collection_id.into(),
            file_path: file_path.into(),
            mode: IngestMode::default(),
            chunk_size: None,
            chunk_overlap: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        parse(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[setters(strip_option, into)]
pub struct QueryRequest {
    pub collection_id: String,
    pub question: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    pub fn new(collection_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self { collection_id: collection_id.into(), question: question.into(), top_k: None }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        parse(json)
    }
}

fn parse<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| Error::Validation(e.to_string()))
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub collection_id: CollectionId,
    pub mode: IngestMode,
    pub pages_loaded: usize,
    pub chunks_created: usize,
    /// Vectors in the collection after this ingestion
    pub vector_count: usize,
    pub index_location: PathBuf,
}
