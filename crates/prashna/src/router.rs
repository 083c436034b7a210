//! Routes each question down one of two paths: a field-alias match answers
//! straight from the extracted fields, anything else goes to semantic search
//! over the chunk index.
//!
//! The field path is authoritative. When a question names a known field that
//! the document does not carry, the answer is "not found", never a semantic
//! guess that could surface a lookalike number from an unrelated chunk.

use crate::config::SearchConfig;
use crate::error::QueryError;
use crate::search::VectorIndex;
use crate::types::{Answer, FieldKind, FieldSet};

/// Alias tables scanned in order; the first alias contained in the question
/// decides the field. CGPA outranks GPA so "cumulative gpa" is not swallowed
/// by the shorter alias, and "name" sits last because it is the most generic
/// token in the table.
const FIELD_ALIASES: &[(FieldKind, &[&str])] = &[
    (
        FieldKind::Cgpa,
        &["cgpa", "cpi", "cumulative gpa", "cumulative grade point"],
    ),
    (
        FieldKind::Gpa,
        &["gpa", "sgpa", "grade point average", "grade points"],
    ),
    (FieldKind::Semester, &["semester", "sem"]),
    (
        FieldKind::Email,
        &["email", "e mail", "mail id", "email address", "email id"],
    ),
    (
        FieldKind::Phone,
        &[
            "phone",
            "phone number",
            "mobile",
            "mobile number",
            "contact number",
        ],
    ),
    (
        FieldKind::Github,
        &["github", "github profile", "github link", "github url"],
    ),
    (
        FieldKind::Name,
        &["name", "student name", "name of student", "candidate name"],
    ),
];

pub struct QueryRouter {
    k: usize,
    min_score: f32,
}

impl QueryRouter {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            k: config.default_k,
            min_score: config.min_score,
        }
    }

    /// Answer a question against the extracted fields and, when no field
    /// alias matches, the vector index. `semantic` carries the index or the
    /// error that prevented it from being built; the error only surfaces if
    /// the question actually needs semantic search.
    pub fn answer(
        &self,
        question: &str,
        fields: &FieldSet,
        semantic: Result<&VectorIndex, QueryError>,
    ) -> Result<Answer, QueryError> {
        if let Some(kind) = match_field_alias(question) {
            return Ok(match resolve_field(kind, fields) {
                Some((field, value)) => {
                    tracing::debug!(
                        field = field.label(),
                        "Question answered from extracted fields"
                    );
                    Answer::Exact {
                        field,
                        value: value.to_string(),
                    }
                }
                // A recognized field question never falls through to
                // semantic search; absence is the definitive answer.
                None => Answer::NotFound,
            });
        }

        let index = semantic?;
        let hits = index.search(question, self.k)?;
        match hits.into_iter().next() {
            Some(best) if best.score >= self.min_score => {
                tracing::debug!(
                    chunk_index = best.chunk_index,
                    score = best.score,
                    "Question answered from semantic search"
                );
                Ok(Answer::Semantic {
                    chunk_index: best.chunk_index,
                    text: best.text,
                    score: best.score,
                })
            }
            _ => Ok(Answer::NotFound),
        }
    }
}

/// Look up the field, falling back to its GPA-family sibling when only one
/// of GPA/CGPA was extracted. Returns the field that actually held the value
/// so the answer names its real source.
fn resolve_field(kind: FieldKind, fields: &FieldSet) -> Option<(FieldKind, &str)> {
    if let Some(value) = fields.get(kind) {
        return Some((kind, value));
    }
    let sibling = match kind {
        FieldKind::Gpa => Some(FieldKind::Cgpa),
        FieldKind::Cgpa => Some(FieldKind::Gpa),
        _ => None,
    }?;
    fields.get(sibling).map(|value| (sibling, value))
}

fn match_field_alias(question: &str) -> Option<FieldKind> {
    let padded = format!(" {} ", normalize_question(question));
    for (kind, aliases) in FIELD_ALIASES {
        for alias in *aliases {
            if padded.contains(&format!(" {} ", alias)) {
                return Some(*kind);
            }
        }
    }
    None
}

/// Lowercase, strip punctuation, collapse whitespace. Alias containment then
/// works on whole tokens, so "username" never matches "name".
fn normalize_question(question: &str) -> String {
    question
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::embeddings::stub::HashEmbedder;
    use crate::error::EmbeddingError;
    use crate::search::VectorIndex;
    use crate::types::Chunk;
    use std::sync::Arc;
    use uuid::Uuid;

    fn router() -> QueryRouter {
        QueryRouter::new(&SearchConfig {
            default_k: 5,
            min_score: 0.25,
        })
    }

    fn fields_with(entries: &[(FieldKind, &str)]) -> FieldSet {
        let mut fields = FieldSet::default();
        for (kind, value) in entries {
            fields.insert(*kind, value.to_string());
        }
        fields
    }

    fn index_over(texts: &[&str]) -> VectorIndex {
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk {
                index: i,
                text: t.to_string(),
                start: i * 100,
                end: i * 100 + t.len(),
            })
            .collect();
        VectorIndex::build(Arc::new(HashEmbedder::new()), Uuid::new_v4(), &chunks).unwrap()
    }

    #[test]
    fn test_field_alias_answers_without_touching_semantic_path() {
        let fields = fields_with(&[(FieldKind::Cgpa, "9.1")]);
        // Passing an error proves the field path never consults the index.
        let answer = router()
            .answer("What is my CGPA?", &fields, Err(QueryError::EmptyIndex))
            .unwrap();
        assert_eq!(
            answer,
            Answer::Exact {
                field: FieldKind::Cgpa,
                value: "9.1".to_string()
            }
        );
    }

    #[test]
    fn test_recognized_absent_field_is_not_found_without_search() {
        let fields = fields_with(&[(FieldKind::Name, "Jane Doe")]);
        let answer = router()
            .answer(
                "What is the phone number?",
                &fields,
                Err(QueryError::EmptyIndex),
            )
            .unwrap();
        assert_eq!(answer, Answer::NotFound);
    }

    #[test]
    fn test_gpa_question_bridges_to_cgpa_when_only_cgpa_extracted() {
        let fields = fields_with(&[(FieldKind::Cgpa, "8.9")]);
        let answer = router()
            .answer("What is my GPA?", &fields, Err(QueryError::EmptyIndex))
            .unwrap();
        assert_eq!(
            answer,
            Answer::Exact {
                field: FieldKind::Cgpa,
                value: "8.9".to_string()
            }
        );
    }

    #[test]
    fn test_cgpa_question_bridges_to_gpa_when_only_gpa_extracted() {
        let fields = fields_with(&[(FieldKind::Gpa, "8.4")]);
        let answer = router()
            .answer("cgpa?", &fields, Err(QueryError::EmptyIndex))
            .unwrap();
        assert_eq!(
            answer,
            Answer::Exact {
                field: FieldKind::Gpa,
                value: "8.4".to_string()
            }
        );
    }

    #[test]
    fn test_cumulative_gpa_answers_cgpa_when_both_extracted() {
        let fields = fields_with(&[(FieldKind::Gpa, "8.4"), (FieldKind::Cgpa, "9.1")]);
        let answer = router()
            .answer(
                "What is my cumulative GPA?",
                &fields,
                Err(QueryError::EmptyIndex),
            )
            .unwrap();
        assert_eq!(
            answer,
            Answer::Exact {
                field: FieldKind::Cgpa,
                value: "9.1".to_string()
            }
        );
        // The shorter alias still owns the unqualified question.
        let answer = router()
            .answer("What is my GPA?", &fields, Err(QueryError::EmptyIndex))
            .unwrap();
        assert_eq!(
            answer,
            Answer::Exact {
                field: FieldKind::Gpa,
                value: "8.4".to_string()
            }
        );
    }

    #[test]
    fn test_sibling_bridge_stays_inside_gpa_family() {
        let fields = fields_with(&[(FieldKind::Cgpa, "8.9")]);
        let answer = router()
            .answer(
                "What is the email address?",
                &fields,
                Err(QueryError::EmptyIndex),
            )
            .unwrap();
        assert_eq!(answer, Answer::NotFound);
    }

    #[test]
    fn test_unrecognized_question_goes_to_semantic_search() {
        let index = index_over(&[
            "machine learning with onnx runtime",
            "hostel mess timings are posted weekly",
        ]);
        let answer = router()
            .answer(
                "machine learning with onnx runtime",
                &FieldSet::default(),
                Ok(&index),
            )
            .unwrap();
        match answer {
            Answer::Semantic {
                chunk_index, score, ..
            } => {
                assert_eq!(chunk_index, 0);
                assert!(score >= 0.25);
            }
            other => panic!("expected Semantic, got {:?}", other),
        }
    }

    #[test]
    fn test_best_hit_below_floor_is_not_found() {
        let strict = QueryRouter::new(&SearchConfig {
            default_k: 5,
            min_score: 0.99,
        });
        let index = index_over(&["training accuracy improved after regularization"]);
        let answer = strict
            .answer("library", &FieldSet::default(), Ok(&index))
            .unwrap();
        assert_eq!(answer, Answer::NotFound);
    }

    #[test]
    fn test_semantic_error_surfaces_only_for_semantic_questions() {
        let err = QueryError::Embedding(EmbeddingError::Inference("stub failure".to_string()));
        let result = router().answer(
            "tell me about the final year project",
            &FieldSet::default(),
            Err(err),
        );
        assert!(matches!(result, Err(QueryError::Embedding(_))));
    }

    #[test]
    fn test_alias_matching_is_token_based() {
        assert_eq!(match_field_alias("What's the e-mail ID?"), Some(FieldKind::Email));
        assert_eq!(match_field_alias("current SEM?"), Some(FieldKind::Semester));
        assert_eq!(
            match_field_alias("what is my cumulative grade point average"),
            Some(FieldKind::Cgpa)
        );
        // Substrings of larger tokens must not match.
        assert_eq!(match_field_alias("what is the username policy"), None);
        assert_eq!(match_field_alias("explain the assembly process"), None);
    }
}
