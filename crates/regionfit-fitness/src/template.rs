//! Candidate source assembly.
//!
//! The ground-truth model doubles as a template: everything before its
//! `### END OF TEMPLATE ###` marker (parameters, sets, variable
//! declarations) is shared by every candidate, and a candidate's phenotype
//! supplies the constraints that follow.

use std::fs;
use std::path::Path;

use crate::error::{EvaluationError, Result};

/// Placeholder the grammar emits for constraint names.
pub const NAME_PLACEHOLDER: &str = "name_seq";

/// Ground-truth source plus the shared prefix cut from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTemplate {
    ground_truth: String,
    prefix: String,
}

impl CandidateTemplate {
    pub fn from_ground_truth(source: impl Into<String>) -> Self {
        let ground_truth = source.into();
        let prefix = strip_template_marker(&ground_truth).to_string();
        Self {
            ground_truth,
            prefix,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| EvaluationError::io(path, e))?;
        Ok(Self::from_ground_truth(source))
    }

    pub fn ground_truth(&self) -> &str {
        &self.ground_truth
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full candidate source: the prefix followed by the phenotype with its
    /// placeholders numbered.
    pub fn merge(&self, phenotype: &str) -> String {
        let mut program = String::with_capacity(self.prefix.len() + phenotype.len());
        program.push_str(&self.prefix);
        program.push_str(&number_constraint_names(phenotype));
        program
    }
}

/// `text` up to the first end-of-template marker: a run of `#`, one
/// whitespace, `END`, whitespace, `OF`, whitespace, `TEMPLATE`, whitespace
/// and another run of `#`. Keywords match case-insensitively.
///
/// # Example
///
/// ```
/// use regionfit_fitness::template::strip_template_marker;
///
/// let text = "set I := {1..3};\n# end of template ##\nsubto c: x <= 1;\n";
/// assert_eq!(strip_template_marker(text), "set I := {1..3};\n");
/// ```
pub fn strip_template_marker(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'#' {
            i += 1;
            continue;
        }
        if marker_at(&bytes[i..]) {
            return &text[..i];
        }
        while i < bytes.len() && bytes[i] == b'#' {
            i += 1;
        }
    }
    text
}

fn marker_at(bytes: &[u8]) -> bool {
    let mut rest = bytes;
    let hashes = rest.iter().take_while(|&&b| b == b'#').count();
    rest = &rest[hashes..];
    for keyword in [&b"END"[..], b"OF", b"TEMPLATE"] {
        let Some((&first, tail)) = rest.split_first() else {
            return false;
        };
        if !is_space(first) || tail.len() < keyword.len() {
            return false;
        }
        if !tail[..keyword.len()].eq_ignore_ascii_case(keyword) {
            return false;
        }
        rest = &tail[keyword.len()..];
    }
    matches!(rest, [space, b'#', ..] if is_space(*space))
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Replaces each `name_seq` with `constraint1`, `constraint2`, … in order.
///
/// ```
/// use regionfit_fitness::template::number_constraint_names;
///
/// assert_eq!(
///     number_constraint_names("subto name_seq: x <= 1;\nsubto name_seq: y <= 2;"),
///     "subto constraint1: x <= 1;\nsubto constraint2: y <= 2;",
/// );
/// ```
pub fn number_constraint_names(phenotype: &str) -> String {
    let mut output = String::with_capacity(phenotype.len());
    for (i, piece) in phenotype.split(NAME_PLACEHOLDER).enumerate() {
        if i > 0 {
            output.push_str("constraint");
            output.push_str(&i.to_string());
        }
        output.push_str(piece);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_variants() {
        assert_eq!(strip_template_marker("a\n### END OF TEMPLATE ###\nb"), "a\n");
        assert_eq!(strip_template_marker("a #\tEnd\nof TEMPLATE #b"), "a ");
        assert_eq!(strip_template_marker("no marker here"), "no marker here");
        assert_eq!(strip_template_marker("### END OF TEMPLATE"), "### END OF TEMPLATE");
        assert_eq!(strip_template_marker("#END OF TEMPLATE #"), "#END OF TEMPLATE #");
    }

    #[test]
    fn test_first_marker_wins() {
        let text = "head\n# END OF TEMPLATE #\nmid\n# END OF TEMPLATE #\ntail";
        assert_eq!(strip_template_marker(text), "head\n");
    }

    #[test]
    fn test_hash_comments_before_marker_survive() {
        let text = "# params\nparam n := 3;\n## END OF TEMPLATE ##\n";
        assert_eq!(strip_template_marker(text), "# params\nparam n := 3;\n");
    }

    #[test]
    fn test_merge_numbers_placeholders() {
        let template = CandidateTemplate::from_ground_truth(
            "var x integer <= 9;\n# END OF TEMPLATE #\nsubto truth: x <= 3;\n",
        );
        assert_eq!(template.prefix(), "var x integer <= 9;\n");
        assert_eq!(
            template.merge("subto name_seq: x <= 4;\nsubto name_seq: x >= 1;\n"),
            "var x integer <= 9;\nsubto constraint1: x <= 4;\nsubto constraint2: x >= 1;\n",
        );
        assert!(template.ground_truth().contains("subto truth"));
    }

    #[test]
    fn test_no_placeholder_is_identity() {
        assert_eq!(number_constraint_names("subto c: x <= 1;"), "subto c: x <= 1;");
        assert_eq!(number_constraint_names(""), "");
    }
}
