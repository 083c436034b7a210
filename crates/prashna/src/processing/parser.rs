//! PDF text extraction: pdf-extract for the text layer, lopdf content-stream
//! parsing as fallback. Page texts are cleaned line by line and joined with
//! '\f' so downstream offsets can be mapped back to pages.

use lopdf::{Document as PdfDocument, Object};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::ExtractionError;

/// Text pulled out of one PDF, page by page.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Cleaned page texts, in order. A page without a text layer is empty.
    pub pages: Vec<String>,
    /// All pages joined with '\f'.
    pub text: String,
    /// Byte span of each page within `text`.
    pub page_spans: Vec<(usize, usize)>,
}

pub struct PdfTextExtractor {
    max_bytes: usize,
}

impl PdfTextExtractor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
        if bytes.len() > self.max_bytes {
            return Err(ExtractionError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let doc = match PdfDocument::load_mem(bytes) {
            Ok(doc) => doc,
            // Encrypted files often fail structural parsing outright, so
            // classify before reporting a generic parse failure.
            Err(e) if looks_encrypted(bytes) => {
                tracing::debug!(error = %e, "Rejecting encrypted PDF");
                return Err(ExtractionError::Encrypted);
            }
            Err(e) => return Err(ExtractionError::InvalidPdf(e.to_string())),
        };

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(ExtractionError::Encrypted);
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(ExtractionError::NoTextLayer);
        }

        // Layer 1: pdf_extract. It can panic on malformed files, so the call
        // is isolated and any panic falls through to the lopdf layer.
        let mut pages = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes).ok()
        }))
        .ok()
        .flatten()
        .map(|raw| raw.iter().map(|p| clean_page(p)).collect::<Vec<_>>())
        .unwrap_or_default();

        // Layer 2: walk the content streams directly.
        if pages.iter().all(|p| p.is_empty()) {
            pages = content_stream_pages(&doc);
        }

        if pages.len() != page_count {
            pages.resize(page_count, String::new());
        }

        if pages.iter().all(|p| p.is_empty()) {
            return Err(ExtractionError::NoTextLayer);
        }

        tracing::debug!(pages = pages.len(), "PDF text extracted");
        Ok(assemble(pages))
    }
}

fn assemble(pages: Vec<String>) -> ExtractedText {
    let mut text = String::new();
    let mut page_spans = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            text.push('\u{c}');
        }
        let start = text.len();
        text.push_str(page);
        page_spans.push((start, text.len()));
    }
    ExtractedText {
        pages,
        text,
        page_spans,
    }
}

/// Trim each line and drop blank lines, preserving line structure.
fn clean_page(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Raw byte scan for an encryption dictionary, used when the file cannot be
/// structurally parsed at all.
fn looks_encrypted(bytes: &[u8]) -> bool {
    bytes.windows(8).any(|w| w == b"/Encrypt")
}

// ── lopdf fallback ───────────────────────────────────────────────────

fn content_stream_pages(doc: &PdfDocument) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&page_id| clean_page(&page_text(doc, page_id)))
        .collect()
}

fn page_text(doc: &PdfDocument, page_id: (u32, u16)) -> String {
    let mut out = String::new();
    let page = match doc.get_object(page_id) {
        Ok(obj) => obj,
        Err(_) => return out,
    };
    let dict = match page.as_dict() {
        Ok(dict) => dict,
        Err(_) => return out,
    };
    if let Ok(contents) = dict.get(b"Contents") {
        collect_content_text(doc, contents, &mut out);
    }
    out
}

fn collect_content_text(doc: &PdfDocument, contents: &Object, out: &mut String) {
    match contents {
        Object::Reference(id) => {
            if let Ok(obj) = doc.get_object(*id) {
                collect_content_text(doc, obj, out);
            }
        }
        Object::Array(items) => {
            for item in items {
                collect_content_text(doc, item, out);
            }
        }
        Object::Stream(stream) => {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            if let Ok(content) = lopdf::content::Content::decode(&data) {
                push_operations_text(&content.operations, out);
            }
        }
        _ => {}
    }
}

/// Collect text-showing operators (Tj, TJ, ', ") into `out`, emitting line
/// breaks on text positioning moves.
fn push_operations_text(ops: &[lopdf::content::Operation], out: &mut String) {
    for op in ops {
        match op.operator.as_str() {
            "Tj" | "'" | "\"" => {
                for operand in &op.operands {
                    if let Object::String(bytes, _) = operand {
                        out.push_str(&decode_text_bytes(bytes));
                    }
                }
                out.push(' ');
            }
            "TJ" => {
                for operand in &op.operands {
                    if let Object::Array(parts) = operand {
                        for part in parts {
                            if let Object::String(bytes, _) = part {
                                out.push_str(&decode_text_bytes(bytes));
                            }
                        }
                    }
                }
                out.push(' ');
            }
            "Td" | "TD" | "T*" => out.push('\n'),
            _ => {}
        }
    }
}

/// Decode a PDF string: UTF-16BE when BOM-marked, lossy UTF-8 otherwise.
fn decode_text_bytes(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).into_owned()
}
