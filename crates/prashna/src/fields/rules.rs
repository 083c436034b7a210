//! Declarative extraction rules: one row per structured field, patterns
//! ordered most-specific-first. Adding a field means adding a row here.
//!
//! Patterns run over the raw multi-line text. Value classes never include
//! '\n' and separator gaps use `[ \t]*`, so a labeled capture cannot bleed
//! onto the next line and swallow the following label.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::FieldKind;

pub(crate) struct FieldRule {
    pub(crate) field: FieldKind,
    pub(crate) patterns: Vec<Regex>,
    /// Validates and cleans a raw capture; `None` rejects the match and the
    /// scan moves to the next occurrence.
    pub(crate) normalize: fn(&str) -> Option<String>,
}

impl FieldRule {
    /// First normalizer-accepted match: patterns most-specific-first,
    /// occurrences in document order.
    pub(crate) fn first_match(&self, text: &str) -> Option<String> {
        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                if let Some(group) = caps.get(1) {
                    if let Some(value) = (self.normalize)(group.as_str()) {
                        return Some(value);
                    }
                }
            }
        }
        None
    }
}

pub(crate) static RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule {
            field: FieldKind::Name,
            patterns: compile(&[
                r"(?i)\bname[ \t]+of[ \t]+(?:the[ \t]+)?student[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z .,'-]{1,60})",
                r"(?i)\b(?:student|candidate)[ \t]+name[ \t]*[:\-]?[ \t]*([A-Za-z][A-Za-z .,'-]{1,60})",
                r"(?i)\bname[ \t]*[:\-][ \t]*([A-Za-z][A-Za-z .,'-]{1,60})",
            ]),
            normalize: normalize_name,
        },
        FieldRule {
            field: FieldKind::Semester,
            patterns: compile(&[
                r"(?i)\bsem(?:ester)?\b[ \t]*[:\-]?[ \t]*([0-9]{1,2}(?:st|nd|rd|th)?|[ivx]{1,4}|first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth)\b",
                r"(?i)\b([0-9]{1,2})(?:st|nd|rd|th)?[ \t]+sem(?:ester)?\b",
            ]),
            normalize: normalize_semester,
        },
        FieldRule {
            field: FieldKind::Gpa,
            // No boundary exists inside "CGPA" or "SGPA", so \bGPA\b can
            // never steal a CGPA label; SGPA is folded into GPA.
            patterns: compile(&[
                r"(?i)\b(?:GPA|SGPA)\b[ \t]*[:=\-]?[ \t]*([0-9]{1,2}(?:\.[0-9]{1,4})?)",
            ]),
            normalize: normalize_grade_point,
        },
        FieldRule {
            field: FieldKind::Cgpa,
            patterns: compile(&[
                r"(?i)\b(?:CGPA|CPI)\b[ \t]*[:=\-]?[ \t]*([0-9]{1,2}(?:\.[0-9]{1,4})?)",
            ]),
            normalize: normalize_grade_point,
        },
        FieldRule {
            field: FieldKind::Email,
            patterns: compile(&[r"([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})"]),
            normalize: normalize_email,
        },
        FieldRule {
            field: FieldKind::Phone,
            patterns: compile(&[
                r"(?i)\b(?:(?:tele)?phone|mobile|contact|cell|tel)(?:[ \t]*(?:no|num|number))?\.?[ \t]*[:\-]?[ \t]*(\+?[0-9][0-9 ()\-]{7,18}[0-9])",
                r"(\+?[0-9][0-9 \-]{8,14}[0-9])",
            ]),
            normalize: normalize_phone,
        },
        FieldRule {
            field: FieldKind::Github,
            patterns: compile(&[
                r"(?i)\b(https?://(?:www\.)?github\.com/[A-Za-z0-9_./-]+)",
                r"(?i)\b((?:www\.)?github\.com/[A-Za-z0-9_./-]+)",
            ]),
            normalize: normalize_github,
        },
    ]
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("field pattern is valid"))
        .collect()
}

fn normalize_name(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | '-'))
        .trim();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.len() < 2 {
        return None;
    }
    Some(collapsed)
}

fn normalize_semester(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    // "5th" → "5"
    if value.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
        return Some(digits);
    }
    // Roman numerals read better uppercased.
    if value
        .chars()
        .all(|c| matches!(c.to_ascii_lowercase(), 'i' | 'v' | 'x'))
    {
        return Some(value.to_uppercase());
    }
    Some(value.to_string())
}

/// GPA-family values must parse as a decimal in a plausible (0, 10] range;
/// anything else (percentages, years) rejects the occurrence.
fn normalize_grade_point(raw: &str) -> Option<String> {
    let value = raw.trim();
    let parsed: f32 = value.parse().ok()?;
    if parsed <= 0.0 || parsed > 10.0 {
        return None;
    }
    Some(value.to_string())
}

fn normalize_email(raw: &str) -> Option<String> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    Some(value)
}

fn normalize_phone(raw: &str) -> Option<String> {
    let value = raw.trim();
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !(10..=15).contains(&digits) {
        return None;
    }
    Some(value.to_string())
}

fn normalize_github(raw: &str) -> Option<String> {
    let mut value = raw.trim().to_lowercase();
    while value.ends_with(|c: char| matches!(c, '/' | '.' | ',')) {
        value.pop();
    }
    if value.is_empty() {
        return None;
    }
    if !value.starts_with("http") {
        value = format!("https://{}", value);
    }
    Some(value)
}
