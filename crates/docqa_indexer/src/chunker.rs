use docqa_domain::{Chunk, Error, Page, Position, Result};
use text_splitter::{ChunkConfig, TextSplitter};

use crate::loader::is_pdf_path;

/// Splits page text into overlapping, character-bounded chunks.
///
/// Boundaries prefer paragraphs, then sentences, then words, falling back to
/// a hard character cut. Chunks are trimmed and never empty.
#[derive(Debug)]
pub struct TextChunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn try_new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Validation("chunk size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Validation(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| Error::Validation(e.to_string()))?;

        Ok(Self { splitter: TextSplitter::new(config), chunk_size, chunk_overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Chunks the pages of one document. Sequence indices run across pages
    /// in emission order.
    pub fn chunk(&self, pages: &[Page]) -> Result<Vec<Chunk>> {
        if let Some(page) = pages.iter().find(|p| !is_pdf_path(&p.source_path)) {
            return Err(Error::unsupported(
                &page.source_path,
                "only text extracted from PDF documents can be chunked",
            ));
        }

        let chunks = pages
            .iter()
            .flat_map(|page| {
                self.splitter
                    .chunk_char_indices(&page.text)
                    .map(move |item| (page, item))
            })
            .enumerate()
            .map(|(sequence_index, (page, item))| {
                let end_char = item.char_offset + item.chunk.chars().count();
                let mut chunk = Chunk::new(
                    item.chunk,
                    page.source_path.clone(),
                    sequence_index,
                    Position::new(item.char_offset, end_char),
                );
                chunk.page_number = page.page_number;
                chunk
            })
            .collect();
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use docqa_domain::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn page(text: &str, number: u32) -> Page {
        Page::new(text, "docs/manual.pdf").page_number(number)
    }

    fn long_text() -> String {
        (0..40)
            .map(|i| {
                format!(
                    "Paragraph {i} explains how the pump assembly is serviced. \
                     Remove the housing before inspecting seal number {i}.\n\n"
                )
            })
            .collect()
    }

    /// Non-whitespace characters of `text` not covered by any chunk span.
    fn uncovered(text: &str, chunks: &[Chunk]) -> String {
        let chars = text.chars().collect::<Vec<_>>();
        let mut covered = vec![false; chars.len()];
        for chunk in chunks {
            covered[chunk.position.start_char..chunk.position.end_char].fill(true);
        }
        chars
            .iter()
            .zip(covered)
            .filter(|(c, covered)| !covered && !c.is_whitespace())
            .map(|(c, _)| *c)
            .collect()
    }

    #[test]
    fn test_chunks_cover_page_text() {
        let fixture = page(&long_text(), 1);
        let chunker = TextChunker::try_new(200, 40).unwrap();

        let chunks = chunker.chunk(std::slice::from_ref(&fixture)).unwrap();

        let actual = uncovered(&fixture.text, &chunks);
        let expected = "";
        assert_eq!(actual, expected);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_chunks_respect_size() {
        let fixture = page(&long_text(), 1);
        let chunker = TextChunker::try_new(120, 30).unwrap();

        let chunks = chunker.chunk(&[fixture]).unwrap();

        let actual = chunks.iter().all(|c| c.text.chars().count() <= 120);
        assert!(actual);
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
    }

    #[test]
    fn test_positions_map_back_to_page_text() {
        let fixture = page(&format!("Überblick über Ventile. {}", long_text()), 1);
        let chunker = TextChunker::try_new(150, 20).unwrap();

        let chunks = chunker.chunk(std::slice::from_ref(&fixture)).unwrap();

        let chars = fixture.text.chars().collect::<Vec<_>>();
        for chunk in chunks {
            let actual = chars[chunk.position.start_char..chunk.position.end_char]
                .iter()
                .collect::<String>();
            let expected = chunk.text.clone();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap_within_bound() {
        let fixture = page(&long_text(), 1);
        let chunker = TextChunker::try_new(1000, 200).unwrap();

        let chunks = chunker.chunk(&[fixture]).unwrap();

        let overlaps = chunks
            .windows(2)
            .map(|pair| pair[0].position.end_char.saturating_sub(pair[1].position.start_char))
            .collect::<Vec<_>>();
        assert!(overlaps.iter().any(|overlap| *overlap > 0));
        assert!(overlaps.iter().all(|overlap| *overlap <= 200));
    }

    #[test]
    fn test_sequence_and_provenance_across_pages() {
        let fixture = vec![page("First page text.", 1), page("", 2), page("Third page text.", 3)];
        let chunker = TextChunker::try_new(1000, 200).unwrap();

        let chunks = chunker.chunk(&fixture).unwrap();

        let actual = chunks
            .iter()
            .map(|c| (c.sequence_index, c.page_number, c.text.as_str()))
            .collect::<Vec<_>>();
        let expected = vec![(0, Some(1), "First page text."), (1, Some(3), "Third page text.")];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_rejects_invalid_overlap() {
        let fixture = [(1000, 1000), (100, 200), (0, 0)];
        let actual = fixture
            .iter()
            .map(|(size, overlap)| TextChunker::try_new(*size, *overlap).unwrap_err().kind())
            .collect::<Vec<_>>();
        let expected = vec![ErrorKind::Validation; 3];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_rejects_non_pdf_source() {
        let fixture = Page::new("text", "notes.md");
        let chunker = TextChunker::try_new(1000, 200).unwrap();

        let actual = chunker.chunk(&[fixture]).unwrap_err().kind();
        let expected = ErrorKind::UnsupportedFormat;
        assert_eq!(actual, expected);
    }
}
