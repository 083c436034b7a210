use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Metadata captured when a document is ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub page_count: usize,
    pub text_bytes: usize,
    pub ingested_at: i64,
}

/// A fully extracted document. Immutable once built; a new upload replaces it
/// wholesale rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    /// Cleaned page texts joined with '\f'.
    pub text: String,
    /// Byte range of each page within `text`.
    pub page_spans: Vec<(usize, usize)>,
    pub info: DocumentInfo,
}

impl Document {
    /// 1-based page number containing the given byte offset. Offsets on a
    /// page separator are attributed to the following page.
    pub fn page_at(&self, offset: usize) -> usize {
        self.page_spans
            .iter()
            .position(|&(_, end)| offset < end)
            .map(|i| i + 1)
            .unwrap_or_else(|| self.page_spans.len().max(1))
    }
}

/// The closed set of structured fields the extractor knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FieldKind {
    Name,
    Semester,
    Gpa,
    Cgpa,
    Email,
    Phone,
    Github,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Name,
        FieldKind::Semester,
        FieldKind::Gpa,
        FieldKind::Cgpa,
        FieldKind::Email,
        FieldKind::Phone,
        FieldKind::Github,
    ];

    /// Display label used in summaries and exact answers.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Name => "Name",
            FieldKind::Semester => "Semester",
            FieldKind::Gpa => "GPA",
            FieldKind::Cgpa => "CGPA",
            FieldKind::Email => "Email",
            FieldKind::Phone => "Phone",
            FieldKind::Github => "GitHub",
        }
    }
}

/// Structured fields extracted from one document.
///
/// A field that never matched has no entry, and values are never empty, so
/// `get` returning `None` always means "absent from the document".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    entries: BTreeMap<FieldKind, String>,
}

impl FieldSet {
    /// Insert a value; blank values are dropped rather than stored.
    pub fn insert(&mut self, field: FieldKind, value: String) {
        if !value.trim().is_empty() {
            self.entries.insert(field, value);
        }
    }

    pub fn get(&self, field: FieldKind) -> Option<&str> {
        self.entries.get(&field).map(|v| v.as_str())
    }

    pub fn contains(&self, field: FieldKind) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `FieldKind` declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKind, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// A contiguous span of document text. `text` is the exact slice
/// `document.text[start..end]`; consecutive chunks overlap by the configured
/// amount, so concatenating spans covers the document with no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// One scored chunk returned by semantic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

/// Outcome of one question, tagged by how it was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Answer {
    /// Matched a field alias and the field was extracted.
    Exact { field: FieldKind, value: String },
    /// Best chunk over the similarity floor.
    Semantic {
        chunk_index: usize,
        text: String,
        score: f32,
    },
    /// Recognized field that is absent, or no chunk scored high enough.
    NotFound,
}

/// What `process_document` produced, for display by the hosting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: Uuid,
    pub filename: String,
    pub page_count: usize,
    pub chunk_count: usize,
    pub fields_extracted: usize,
    /// False when embedding failed; exact field answers still work.
    pub semantic_ready: bool,
}
