//! Test doubles shared by the module tests.

use std::sync::Mutex;

use async_trait::async_trait;
use docqa_domain::{Error, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::{ChatModel, Embedder};

/// Builds a PDF with one page per entry. Each line of an entry becomes one
/// text line on the page.
pub fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![12.into()]),
            Operation::new("Td", vec![40.into(), 800.into()]),
        ];
        for line in text.lines() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Deterministic embedder: letter frequencies plus a constant component so
/// no vector is ever zero.
pub struct LetterEmbedder {
    model: String,
    calls: Mutex<Vec<usize>>,
}

impl LetterEmbedder {
    pub fn new(model: &str) -> Self {
        Self { model: model.to_string(), calls: Mutex::new(Vec::new()) }
    }

    /// Batch sizes seen so far.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; 27];
        for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
            vector[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        vector[26] = 1.0;
        vector
    }
}

#[async_trait]
impl Embedder for LetterEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.calls.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Embedder whose provider is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "letters"
    }

    async fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Err(Error::Embedding(anyhow::anyhow!("provider unavailable")))
    }
}

/// Chat model that records prompts and replies with a fixed answer.
pub struct RecordingChat {
    answer: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingChat {
    pub fn new(answer: &str) -> Self {
        Self { answer: Some(answer.to_string()), prompts: Mutex::new(Vec::new()) }
    }

    /// A model whose calls always fail.
    pub fn failing() -> Self {
        Self { answer: None, prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for RecordingChat {
    fn model_id(&self) -> &str {
        "recording"
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt);
        self.answer
            .clone()
            .ok_or_else(|| Error::Synthesis(anyhow::anyhow!("model unavailable")))
    }
}
