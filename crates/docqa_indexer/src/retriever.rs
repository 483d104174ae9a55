use std::sync::Arc;

use anyhow::anyhow;
use docqa_domain::{Error, Result, RetrievedChunk};

use crate::store::VectorIndex;
use crate::traits::Embedder;

/// Embeds a question and finds its nearest chunks. Nothing is cached between
/// questions.
pub struct Retriever<E> {
    embedder: Arc<E>,
}

impl<E: Embedder> Retriever<E> {
    pub fn new(embedder: Arc<E>) -> Self {
        Self { embedder }
    }

    async fn embed_question(&self, question: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(vec![question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding(anyhow!("no embedding returned for the question")))
    }

    /// `on_embedded` runs once the question vector is ready, before the
    /// index is searched.
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
        on_embedded: impl FnOnce(),
    ) -> Result<Vec<RetrievedChunk>> {
        let vector = self.embed_question(question).await?;
        on_embedded();
        index.query(&vector, k)
    }
}

#[cfg(test)]
mod tests {
    use docqa_domain::{Chunk, ChunkVector, ErrorKind, Position};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixtures::{FailingEmbedder, LetterEmbedder};

    fn index(texts: &[&str]) -> VectorIndex {
        let vectors = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let chunk = Chunk::new(*text, "doc.pdf", i, Position::new(0, text.len()));
                ChunkVector::new(chunk, LetterEmbedder::vector(text))
            })
            .collect();
        VectorIndex::create(vectors, "letters").unwrap()
    }

    #[tokio::test]
    async fn test_retrieves_nearest_chunks_first() {
        let embedder = Arc::new(LetterEmbedder::new("letters"));
        let fixture = Retriever::new(embedder.clone());
        let index = index(&["zzz zzz zzz", "aaab", "abba abba"]);

        let actual = fixture
            .retrieve(&index, "abba", 2, || {})
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.chunk.text)
            .collect::<Vec<_>>();
        let expected = vec!["abba abba".to_string(), "aaab".to_string()];
        assert_eq!(actual, expected);
        assert_eq!(embedder.calls(), vec![1]);
    }

    #[tokio::test]
    async fn test_each_question_is_embedded() {
        let embedder = Arc::new(LetterEmbedder::new("letters"));
        let fixture = Retriever::new(embedder.clone());
        let index = index(&["abc"]);

        fixture.retrieve(&index, "abc", 1, || {}).await.unwrap();
        fixture.retrieve(&index, "abc", 1, || {}).await.unwrap();

        let actual = embedder.calls();
        let expected = vec![1, 1];
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_search() {
        let fixture = Retriever::new(Arc::new(FailingEmbedder));
        let mut searched = false;

        let actual = fixture
            .retrieve(&index(&["abc"]), "abc", 1, || searched = true)
            .await
            .unwrap_err()
            .kind();
        let expected = ErrorKind::Embedding;
        assert_eq!(actual, expected);
        assert!(!searched);
    }
}
