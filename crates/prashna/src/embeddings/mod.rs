pub mod download;
pub mod minilm;

pub use minilm::MiniLmEmbedder;

use crate::error::EmbeddingError;

/// Sentence embedding backend. The session layer holds this behind
/// `Arc<dyn EmbeddingModel>` so tests can swap in a deterministic stub.
///
/// The model is symmetric: queries and documents share one embedding space,
/// so both paths route through the same encoder.
pub trait EmbeddingModel: Send + Sync {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_document(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Batch embedding. Backends override this when they can run several
    /// texts through one forward pass.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed_document(t)).collect()
    }

    fn dimension(&self) -> usize;
}
