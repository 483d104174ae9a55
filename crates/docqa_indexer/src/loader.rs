use std::path::{Path, PathBuf};

use docqa_domain::{Error, Page, Result};
use lopdf::Document;
use tracing::{debug, warn};

/// Reads a PDF from disk into one [`Page`] per document page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub async fn load(&self, path: &Path) -> Result<Vec<Page>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(Error::FileNotFound(path.to_path_buf())),
        }
        if !is_pdf_path(path) {
            return Err(Error::unsupported(path, "only .pdf files can be ingested"));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::storage(path, e))?;
        if !is_pdf(&bytes) {
            return Err(Error::unsupported(path, "missing %PDF header"));
        }

        let source = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes, source))
            .await
            .map_err(|e| Error::unsupported(path, format!("text extraction aborted: {e}")))??;
        debug!(path = %path.display(), pages = pages.len(), "Extracted PDF text");
        Ok(pages)
    }
}

fn extract_pages(bytes: &[u8], source: PathBuf) -> Result<Vec<Page>> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| Error::unsupported(&source, format!("failed to parse PDF: {e}")))?;

    let numbers = doc.get_pages();
    if numbers.is_empty() {
        return Err(Error::unsupported(&source, "document has no pages"));
    }

    let pages = numbers
        .into_keys()
        .map(|number| {
            let text = doc.extract_text(&[number]).unwrap_or_else(|e| {
                warn!(path = %source.display(), page = number, error = %e, "Could not extract page text");
                String::new()
            });
            Page::new(text, source.clone()).page_number(number)
        })
        .collect();
    Ok(pages)
}

/// True when the path has a `.pdf` extension, ignoring case.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Check if a file is a PDF based on its magic bytes
pub fn is_pdf(file_data: &[u8]) -> bool {
    file_data.starts_with(b"%PDF")
}
