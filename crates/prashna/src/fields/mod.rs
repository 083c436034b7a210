//! Pattern-based field extraction over a closed set of student-document
//! fields. Extraction never fails: a field whose patterns find no accepted
//! occurrence is simply absent from the result.

mod rules;

use crate::types::{FieldKind, FieldSet};
use rules::RULES;

/// Runs every extraction rule over the document text and collects the
/// accepted values. Each field is resolved independently, so a noisy match
/// for one field never affects another.
pub fn extract_fields(text: &str) -> FieldSet {
    let mut fields = FieldSet::default();
    for rule in RULES.iter() {
        if let Some(value) = rule.first_match(text) {
            fields.insert(rule.field, value);
        }
    }
    tracing::debug!(extracted = fields.len(), "Field extraction complete");
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_canonical_transcript_fields() {
        let text = "Name: Jane Doe\nSemester: 6\nCGPA: 9.1\nEmail: Jane.Doe@Example.com\nPhone: +91 98765 43210\nGitHub: https://github.com/janedoe\n";
        let fields = extract_fields(text);

        assert_eq!(fields.get(FieldKind::Name), Some("Jane Doe"));
        assert_eq!(fields.get(FieldKind::Semester), Some("6"));
        assert_eq!(fields.get(FieldKind::Cgpa), Some("9.1"));
        assert_eq!(fields.get(FieldKind::Email), Some("jane.doe@example.com"));
        assert_eq!(fields.get(FieldKind::Phone), Some("+91 98765 43210"));
        assert_eq!(
            fields.get(FieldKind::Github),
            Some("https://github.com/janedoe")
        );
        assert!(fields.get(FieldKind::Gpa).is_none());
    }

    #[test]
    fn test_gpa_and_cgpa_extracted_independently() {
        let fields = extract_fields("SGPA: 8.4\nCGPA: 8.9\n");
        assert_eq!(fields.get(FieldKind::Gpa), Some("8.4"));
        assert_eq!(fields.get(FieldKind::Cgpa), Some("8.9"));
    }

    #[test]
    fn test_gpa_pattern_does_not_match_inside_cgpa() {
        let fields = extract_fields("CGPA: 8.7\n");
        assert_eq!(fields.get(FieldKind::Cgpa), Some("8.7"));
        assert!(fields.get(FieldKind::Gpa).is_none());
    }

    #[test]
    fn test_first_occurrence_in_document_order_wins() {
        let fields = extract_fields("Name: Alice Kumar\nName: Bob Singh\n");
        assert_eq!(fields.get(FieldKind::Name), Some("Alice Kumar"));
    }

    #[test]
    fn test_implausible_grade_values_are_skipped() {
        // The percentage fails the range check, so the later plausible
        // occurrence is taken instead.
        let fields = extract_fields("CGPA: 85\nCGPA: 8.5\n");
        assert_eq!(fields.get(FieldKind::Cgpa), Some("8.5"));
    }

    #[test]
    fn test_name_of_student_label_captures_only_the_name() {
        let fields = extract_fields("Name of Student - Priya Sharma\n");
        assert_eq!(fields.get(FieldKind::Name), Some("Priya Sharma"));
    }

    #[test]
    fn test_labeled_capture_stops_at_end_of_line() {
        let fields = extract_fields("Name:\nCGPA: 9.1\n");
        // The blank Name label must not swallow the next line.
        assert!(fields.get(FieldKind::Name).is_none());
        assert_eq!(fields.get(FieldKind::Cgpa), Some("9.1"));
    }

    #[test]
    fn test_semester_label_variants() {
        assert_eq!(
            extract_fields("Semester: VI\n").get(FieldKind::Semester),
            Some("VI")
        );
        assert_eq!(
            extract_fields("Sem - 3\n").get(FieldKind::Semester),
            Some("3")
        );
        assert_eq!(
            extract_fields("Currently in 5th Semester\n").get(FieldKind::Semester),
            Some("5")
        );
        assert_eq!(
            extract_fields("Semester: First\n").get(FieldKind::Semester),
            Some("First")
        );
    }

    #[test]
    fn test_phone_requires_plausible_digit_count() {
        assert!(extract_fields("Phone: 12345\n")
            .get(FieldKind::Phone)
            .is_none());
        assert_eq!(
            extract_fields("Mobile No: 9876543210\n").get(FieldKind::Phone),
            Some("9876543210")
        );
    }

    #[test]
    fn test_github_handle_is_normalized() {
        assert_eq!(
            extract_fields("github.com/JaneDoe\n").get(FieldKind::Github),
            Some("https://github.com/janedoe")
        );
        assert_eq!(
            extract_fields("Profile: https://www.github.com/jdoe.\n").get(FieldKind::Github),
            Some("https://www.github.com/jdoe")
        );
    }

    #[test]
    fn test_email_is_lowercased() {
        assert_eq!(
            extract_fields("Reach me at First.Last@Uni.EDU today\n").get(FieldKind::Email),
            Some("first.last@uni.edu")
        );
    }

    #[test]
    fn test_absent_fields_produce_no_entries() {
        let fields = extract_fields("Just some prose about nothing in particular.\n");
        assert!(fields.is_empty());
    }
}
