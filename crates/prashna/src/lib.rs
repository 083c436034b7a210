//! Single-session PDF question answering.
//!
//! Upload one PDF and ask questions about it. Questions that name a known
//! structured field (name, grades, contact details) are answered exactly
//! from a declarative rule table; everything else is answered by cosine
//! search over MiniLM embeddings of the document's chunks.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod fields;
pub mod processing;
pub mod router;
pub mod search;
pub mod session;
pub mod summary;
pub mod types;

// Re-export primary types for convenience
pub use config::QaConfig;
pub use embeddings::{EmbeddingModel, MiniLmEmbedder};
pub use error::{EmbeddingError, ExtractionError, QueryError};
pub use session::DocumentSession;
pub use types::{Answer, Chunk, Document, FieldKind, FieldSet, IngestReport, SearchHit};

// Re-export common types
pub use uuid::Uuid;
