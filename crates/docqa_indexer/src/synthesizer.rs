use std::sync::Arc;

use anyhow::Context;
use docqa_domain::{AnswerResult, Error, Result, RetrievedChunk, Source};
use handlebars::{Handlebars, no_escape};
use serde::Serialize;
use tracing::debug;

use crate::traits::ChatModel;

const ANSWER_PROMPT: &str = include_str!("../../../templates/answer-prompt.md");

/// Placed between chunks so the model can tell where one ends.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub const SNIPPET_CHARS: usize = 180;

#[derive(Serialize)]
struct PromptContext<'a> {
    context: &'a str,
    question: &'a str,
}

/// Context assembled from retrieved chunks, with the chunks that made it in.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedContext {
    pub text: String,
    /// Number of leading retrieved chunks included
    pub used: usize,
}

/// Answers a question from retrieved chunks with a single chat call.
pub struct AnswerSynthesizer<C> {
    chat: Arc<C>,
    max_context_chars: usize,
    hb: Handlebars<'static>,
}

impl<C: ChatModel> AnswerSynthesizer<C> {
    pub fn new(chat: Arc<C>, max_context_chars: usize) -> Self {
        let mut hb = Handlebars::new();
        hb.set_strict_mode(true);
        hb.register_escape_fn(no_escape);
        Self { chat, max_context_chars, hb }
    }

    pub fn render_prompt(&self, question: &str, context: &str) -> Result<String> {
        self.hb
            .render_template(ANSWER_PROMPT, &PromptContext { context, question })
            .context("failed to render answer prompt")
            .map_err(Error::Synthesis)
    }

    pub async fn synthesize(
        &self,
        question: &str,
        retrieved: &[RetrievedChunk],
    ) -> Result<AnswerResult> {
        let context = build_context(retrieved, self.max_context_chars);
        let prompt = self.render_prompt(question, &context.text)?;
        debug!(
            model = self.chat.model_id(),
            chunks = context.used,
            context_chars = context.text.chars().count(),
            "Requesting answer"
        );

        let answer_text = self.chat.complete(prompt).await?;
        let sources = retrieved[..context.used].iter().map(source).collect();
        Ok(AnswerResult { answer_text, sources })
    }
}

/// Joins chunk texts in retrieval order, keeping whole chunks while they fit
/// in `max_chars`. The first chunk is always included, cut to the budget if
/// it alone exceeds it.
pub fn build_context(retrieved: &[RetrievedChunk], max_chars: usize) -> BoundedContext {
    let separator_chars = CONTEXT_SEPARATOR.chars().count();
    let mut text = String::new();
    let mut chars = 0;
    let mut used = 0;

    for (i, item) in retrieved.iter().enumerate() {
        let len = item.chunk.text.chars().count();
        if i == 0 {
            text.extend(item.chunk.text.chars().take(max_chars));
            chars = len.min(max_chars);
        } else {
            if chars + separator_chars + len > max_chars {
                break;
            }
            text.push_str(CONTEXT_SEPARATOR);
            text.push_str(&item.chunk.text);
            chars += separator_chars + len;
        }
        used += 1;
    }
    BoundedContext { text, used }
}

/// Whitespace runs collapse to one space; at most [`SNIPPET_CHARS`]
/// characters are kept.
pub fn snippet(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(SNIPPET_CHARS)
        .collect()
}

fn source(item: &RetrievedChunk) -> Source {
    Source {
        source_path: item.chunk.source_path.clone(),
        page_number: item.chunk.page_number,
        snippet: snippet(&item.chunk.text),
    }
}
