use thiserror::Error;

/// Why an uploaded PDF could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("not a parseable PDF: {0}")]
    InvalidPdf(String),

    #[error("document is encrypted")]
    Encrypted,

    #[error("document has no extractable text layer")]
    NoTextLayer,
}

impl ExtractionError {
    /// Short message for the hosting UI. Technical detail stays in `Display`.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::TooLarge { .. } => "This file is too large to process.",
            Self::InvalidPdf(_) => "Could not read this file. Please upload a valid PDF.",
            Self::Encrypted => "This PDF is password-protected and cannot be read.",
            Self::NoTextLayer => {
                "No text could be found in this PDF. It may contain only scanned images."
            }
        }
    }
}

/// Embedding failures. Fatal for the semantic path only: field extraction and
/// exact answers keep working, so the session stores the cause and replays it
/// when a semantic answer is requested. `Clone` exists for that replay.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    #[error("embedding model failed to load: {0}")]
    ModelLoad(String),

    #[error("chunk {index} is empty and cannot be embedded")]
    EmptyChunk { index: usize },

    #[error("embedding inference failed: {0}")]
    Inference(String),

    #[error("model produced a {got}-dim vector, expected {expected}")]
    Dimension { expected: usize, got: usize },
}

impl EmbeddingError {
    pub fn user_message(&self) -> &'static str {
        "Semantic search is unavailable for this document. Answers from extracted fields still work."
    }
}

/// Why a question could not be answered at all.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("no document has been processed in this session")]
    EmptyIndex,

    #[error("semantic search unavailable: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl QueryError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyIndex => "Please upload a document first.",
            Self::Embedding(e) => e.user_message(),
        }
    }
}
