use std::fmt::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docqa_domain::{AnswerResult, CollectionId, IngestMode, IngestReport};

#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Ingest PDFs into collections and ask questions about them")]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Index a PDF into a collection
    Ingest {
        #[arg(long)]
        collection: String,
        /// Path to the PDF file
        #[arg(long)]
        file: PathBuf,
        /// `replace` keeps only this document, `append` adds to the collection
        #[arg(long, default_value_t = IngestMode::Replace)]
        mode: IngestMode,
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Ask a question against a collection
    Query {
        #[arg(long)]
        collection: String,
        #[arg(long)]
        question: String,
        /// Number of chunks to retrieve
        #[arg(long, alias = "top_k")]
        top_k: Option<usize>,
    },
    /// Remove a collection and its index
    Delete {
        #[arg(long)]
        collection: String,
    },
    /// List collections that have an index
    List,
}

pub fn render_report(report: &IngestReport) -> String {
    format!(
        "Loaded {} page(s), created {} chunk(s)\nIndex saved to {} ({} vector(s), mode {})",
        report.pages_loaded,
        report.chunks_created,
        report.index_location.display(),
        report.vector_count,
        report.mode
    )
}

pub fn render_answer(answer: &AnswerResult) -> String {
    let mut out = format!("Answer:\n{}\n", answer.answer_text);
    if !answer.sources.is_empty() {
        out.push_str("\nSources:\n");
        for (i, source) in answer.sources.iter().enumerate() {
            let page = source
                .page_number
                .map(|p| p.to_string())
                .unwrap_or_else(|| "?".to_string());
            let _ = writeln!(
                out,
                "{}. {} (page {}) - {}...",
                i + 1,
                source.source_path.display(),
                page,
                source.snippet
            );
        }
    }
    out
}

pub fn render_list(ids: &[CollectionId]) -> String {
    if ids.is_empty() {
        return "No collections found.".to_string();
    }
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join("\n")
}
