use std::path::PathBuf;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Text extracted from one page of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct Page {
    pub text: String,
    /// 1-based page number, when the document reports one
    pub page_number: Option<u32>,
    pub source_path: PathBuf,
}

impl Page {
    pub fn new(text: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self { text: text.into(), page_number: None, source_path: source_path.into() }
    }
}

/// Character span of a chunk within the text of its page. `end_char` is
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Setters)]
pub struct Position {
    pub start_char: usize,
    pub end_char: usize,
}

impl Position {
    pub fn new(start_char: usize, end_char: usize) -> Self {
        Self { start_char, end_char }
    }
}

/// A bounded span of page text together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct Chunk {
    pub text: String,
    pub source_path: PathBuf,
    pub page_number: Option<u32>,
    /// Emission order across the whole document, starting at 0
    pub sequence_index: usize,
    pub position: Position,
}

impl Chunk {
    pub fn new(
        text: impl Into<String>,
        source_path: impl Into<PathBuf>,
        sequence_index: usize,
        position: Position,
    ) -> Self {
        Self {
            text: text.into(),
            source_path: source_path.into(),
            page_number: None,
            sequence_index,
            position,
        }
    }
}

/// A chunk with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkVector {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl ChunkVector {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A chunk returned by a nearest-neighbor search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

impl RetrievedChunk {
    pub fn new(chunk: Chunk, distance: f32) -> Self {
        Self { chunk, distance }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub source_path: PathBuf,
    pub page_number: Option<u32>,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub answer_text: String,
    /// Best match first
    pub sources: Vec<Source>,
}
