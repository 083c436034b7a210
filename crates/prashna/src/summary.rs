//! Renders the extracted fields as a short human-readable summary.
//!
//! Grade information leads: CGPA when present, otherwise GPA, with GPA on
//! the second line when both were extracted. The remaining fields follow in
//! a fixed order so summaries for similar documents line up.

use crate::types::{FieldKind, FieldSet};

/// Shown when extraction found nothing to summarize.
pub const NO_FIELDS_MESSAGE: &str = "No structured fields were extracted from this document.";

const SUMMARY_ORDER: [FieldKind; 5] = [
    FieldKind::Name,
    FieldKind::Semester,
    FieldKind::Email,
    FieldKind::Phone,
    FieldKind::Github,
];

/// One "Label: value" line per extracted field, grade lines first.
pub fn summarize(fields: &FieldSet) -> String {
    if fields.is_empty() {
        return NO_FIELDS_MESSAGE.to_string();
    }

    let mut lines = Vec::with_capacity(fields.len());
    match (fields.get(FieldKind::Cgpa), fields.get(FieldKind::Gpa)) {
        (Some(cgpa), Some(gpa)) => {
            lines.push(format!("{}: {}", FieldKind::Cgpa.label(), cgpa));
            lines.push(format!("{}: {}", FieldKind::Gpa.label(), gpa));
        }
        (Some(cgpa), None) => lines.push(format!("{}: {}", FieldKind::Cgpa.label(), cgpa)),
        (None, Some(gpa)) => lines.push(format!("{}: {}", FieldKind::Gpa.label(), gpa)),
        (None, None) => {}
    }

    for kind in SUMMARY_ORDER {
        if let Some(value) = fields.get(kind) {
            lines.push(format!("{}: {}", kind.label(), value));
        }
    }

    lines.join("\n")
}

/// Field summary followed by the opening words of the document text, for a
/// quick "what did I just upload" view.
pub fn overview(fields: &FieldSet, text: &str, max_words: usize) -> String {
    let mut out = summarize(fields);

    let words: Vec<&str> = text.split_whitespace().take(max_words + 1).collect();
    if words.is_empty() {
        return out;
    }

    out.push_str("\n\n");
    if words.len() > max_words {
        out.push_str(&words[..max_words].join(" "));
        out.push_str(" ...");
    } else {
        out.push_str(&words.join(" "));
    }
    out
}
