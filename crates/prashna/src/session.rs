//! Per-session document state and the question-answering entry points.
//!
//! A `DocumentSession` holds at most one processed document. Uploading a new
//! document replaces the previous one wholesale; a failed upload leaves the
//! previous document untouched. Nothing is shared between sessions and
//! nothing is persisted.

use std::sync::Arc;
use uuid::Uuid;

use crate::config::QaConfig;
use crate::embeddings::{download, EmbeddingModel, MiniLmEmbedder};
use crate::error::{EmbeddingError, ExtractionError, QueryError};
use crate::fields::extract_fields;
use crate::processing::{PdfTextExtractor, TextChunker};
use crate::router::QueryRouter;
use crate::search::VectorIndex;
use crate::summary;
use crate::types::{Answer, Chunk, Document, DocumentInfo, FieldSet, IngestReport, SearchHit};

struct ActiveDocument {
    document: Document,
    fields: FieldSet,
    chunks: Vec<Chunk>,
    /// The index, or the error that prevented it from being built. A failed
    /// embed degrades the session to field answers instead of killing it.
    semantic: Result<VectorIndex, EmbeddingError>,
}

pub struct DocumentSession {
    embedder: Arc<dyn EmbeddingModel>,
    config: QaConfig,
    extractor: PdfTextExtractor,
    chunker: TextChunker,
    router: QueryRouter,
    active: Option<ActiveDocument>,
}

impl DocumentSession {
    /// Session over an injected embedding backend.
    pub fn new(embedder: Arc<dyn EmbeddingModel>, config: QaConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

        let extractor = PdfTextExtractor::new(config.limits.max_pdf_bytes);
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap);
        let router = QueryRouter::new(&config.search);

        Ok(Self {
            embedder,
            config,
            extractor,
            chunker,
            router,
            active: None,
        })
    }

    /// Session over the bundled MiniLM model, downloading it on first run.
    pub fn with_local_model(config: QaConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

        let model_dir = download::ensure_minilm_model(&config.embedding.model_dir)?;
        let embedder = MiniLmEmbedder::load(&model_dir, &config.embedding)?;
        Self::new(Arc::new(embedder), config)
    }

    /// Extract, analyze and index an uploaded PDF, replacing any previously
    /// active document. On extraction failure the previous document stays
    /// active. On embedding failure the document is installed anyway and
    /// only semantic search is disabled.
    pub fn process_document(
        &mut self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<IngestReport, ExtractionError> {
        let extracted = self.extractor.extract(bytes)?;

        let document = Document {
            id: Uuid::new_v4(),
            info: DocumentInfo {
                filename: filename.to_string(),
                page_count: extracted.pages.len(),
                text_bytes: extracted.text.len(),
                ingested_at: chrono::Utc::now().timestamp(),
            },
            text: extracted.text,
            page_spans: extracted.page_spans,
        };

        let fields = extract_fields(&document.text);
        let chunks = self.chunker.chunk(&document.text);

        let semantic = VectorIndex::build(Arc::clone(&self.embedder), document.id, &chunks);
        if let Err(e) = &semantic {
            tracing::warn!(
                error = %e,
                "Embedding failed; continuing with field answers only"
            );
        }

        let report = IngestReport {
            document_id: document.id,
            filename: document.info.filename.clone(),
            page_count: document.info.page_count,
            chunk_count: chunks.len(),
            fields_extracted: fields.len(),
            semantic_ready: semantic.is_ok(),
        };

        tracing::info!(
            document_id = %report.document_id,
            pages = report.page_count,
            chunks = report.chunk_count,
            fields = report.fields_extracted,
            semantic = report.semantic_ready,
            "Document processed"
        );

        self.active = Some(ActiveDocument {
            document,
            fields,
            chunks,
            semantic,
        });
        Ok(report)
    }

    /// Answer a question about the active document.
    pub fn ask(&self, question: &str) -> Result<Answer, QueryError> {
        let active = self.active.as_ref().ok_or(QueryError::EmptyIndex)?;
        let semantic = match &active.semantic {
            Ok(index) => {
                debug_assert_eq!(index.document_id(), active.document.id);
                Ok(index)
            }
            Err(e) => Err(QueryError::Embedding(e.clone())),
        };
        self.router.answer(question, &active.fields, semantic)
    }

    /// Raw top-k semantic search, bypassing the field router.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, QueryError> {
        let active = self.active.as_ref().ok_or(QueryError::EmptyIndex)?;
        match &active.semantic {
            Ok(index) => index.search(query, k),
            Err(e) => Err(QueryError::Embedding(e.clone())),
        }
    }

    /// Field summary of the active document, if any.
    pub fn summary(&self) -> Option<String> {
        self.active.as_ref().map(|a| summary::summarize(&a.fields))
    }

    /// Field summary plus the opening words of the document text.
    pub fn overview(&self, max_words: usize) -> Option<String> {
        self.active
            .as_ref()
            .map(|a| summary::overview(&a.fields, &a.document.text, max_words))
    }

    pub fn document(&self) -> Option<&Document> {
        self.active.as_ref().map(|a| &a.document)
    }

    pub fn fields(&self) -> Option<&FieldSet> {
        self.active.as_ref().map(|a| &a.fields)
    }

    pub fn chunks(&self) -> Option<&[Chunk]> {
        self.active.as_ref().map(|a| a.chunks.as_slice())
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }
}
