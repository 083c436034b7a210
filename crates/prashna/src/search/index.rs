//! In-memory vector index over the chunks of a single document.
//!
//! Vectors are L2-normalized by the embedder, so cosine similarity is the
//! scoring function throughout. The index lives and dies with its session;
//! nothing here touches disk.

use std::sync::Arc;
use uuid::Uuid;

use crate::embeddings::EmbeddingModel;
use crate::error::{EmbeddingError, QueryError};
use crate::types::{Chunk, SearchHit};

struct IndexEntry {
    chunk_index: usize,
    start: usize,
    end: usize,
    text: String,
    vector: Vec<f32>,
}

pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingModel>,
    document_id: Uuid,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embeds every chunk and builds the index. Fails atomically: any
    /// embedding error discards the whole index.
    pub fn build(
        embedder: Arc<dyn EmbeddingModel>,
        document_id: Uuid,
        chunks: &[Chunk],
    ) -> Result<Self, EmbeddingError> {
        for chunk in chunks {
            if chunk.text.trim().is_empty() {
                return Err(EmbeddingError::EmptyChunk { index: chunk.index });
            }
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = embedder.embed_documents(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(EmbeddingError::Inference(format!(
                "expected {} vectors, embedder returned {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let expected = embedder.dimension();
        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if vector.len() != expected {
                return Err(EmbeddingError::Dimension {
                    expected,
                    got: vector.len(),
                });
            }
            entries.push(IndexEntry {
                chunk_index: chunk.index,
                start: chunk.start,
                end: chunk.end,
                text: chunk.text.clone(),
                vector,
            });
        }

        tracing::debug!(
            document_id = %document_id,
            vectors = entries.len(),
            dimension = expected,
            "Vector index built"
        );

        Ok(Self {
            embedder,
            document_id,
            entries,
        })
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k chunks by cosine similarity, best first. Ties break toward the
    /// earlier chunk so results are stable across runs.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, QueryError> {
        if self.entries.is_empty() {
            return Err(QueryError::EmptyIndex);
        }

        let query_vector = self.embedder.embed_query(query)?;

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk_index: entry.chunk_index,
                text: entry.text.clone(),
                start: entry.start,
                end: entry.end,
                score: cosine_similarity(&query_vector, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Cosine similarity of two vectors. Mismatched lengths and zero vectors
/// score 0.0 instead of poisoning the ranking with NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::stub::HashEmbedder;
    use crate::types::Chunk;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            text: text.to_string(),
            start: index * 100,
            end: index * 100 + text.len(),
        }
    }

    fn build_index(texts: &[&str]) -> VectorIndex {
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| chunk(i, t))
            .collect();
        VectorIndex::build(Arc::new(HashEmbedder::new()), Uuid::new_v4(), &chunks).unwrap()
    }

    #[test]
    fn test_search_ranks_overlapping_vocabulary_first() {
        let index = build_index(&[
            "the student completed a machine learning project",
            "hostel fees are due in january",
            "machine learning coursework and a deep learning project",
        ]);

        let hits = index.search("machine learning project", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
        // Both hits should be the ML chunks, not the fees chunk.
        assert!(hits.iter().all(|h| h.chunk_index != 1));
    }

    #[test]
    fn test_search_scores_are_descending_and_trimmed_to_k() {
        let index = build_index(&["alpha beta", "beta gamma", "gamma delta", "delta epsilon"]);
        let hits = index.search("beta", 3).unwrap();
        assert_eq!(hits.len(), 3);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_tied_scores_break_toward_earlier_chunk() {
        // Identical texts embed identically, so scores tie exactly.
        let index = build_index(&["same text", "same text", "same text"]);
        let hits = index.search("same text", 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_index_reports_empty_index_error() {
        let index =
            VectorIndex::build(Arc::new(HashEmbedder::new()), Uuid::new_v4(), &[]).unwrap();
        assert!(index.is_empty());
        match index.search("anything", 5) {
            Err(QueryError::EmptyIndex) => {}
            other => panic!("expected EmptyIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_chunk_is_rejected_at_build() {
        let chunks = vec![chunk(0, "real text"), chunk(1, "   \n  ")];
        match VectorIndex::build(Arc::new(HashEmbedder::new()), Uuid::new_v4(), &chunks) {
            Err(EmbeddingError::EmptyChunk { index }) => assert_eq!(index, 1),
            other => panic!("expected EmptyChunk, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_wrong_width_vectors_are_rejected_at_build() {
        struct BadWidthEmbedder;
        impl EmbeddingModel for BadWidthEmbedder {
            fn embed_query(&self, _: &str) -> Result<Vec<f32>, EmbeddingError> {
                Ok(vec![1.0, 0.0])
            }
            fn embed_document(&self, _: &str) -> Result<Vec<f32>, EmbeddingError> {
                Ok(vec![1.0, 0.0])
            }
            fn dimension(&self) -> usize {
                384
            }
        }

        let chunks = vec![chunk(0, "text")];
        match VectorIndex::build(Arc::new(BadWidthEmbedder), Uuid::new_v4(), &chunks) {
            Err(EmbeddingError::Dimension { expected, got }) => {
                assert_eq!(expected, 384);
                assert_eq!(got, 2);
            }
            other => panic!("expected Dimension, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
