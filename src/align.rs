//! Target ↔ predicted phoneme alignment.
//!
//! Unit-cost edit distance (substitution 1, deletion 1, insertion 1) over two
//! phoneme sequences, followed by a backtrack that recovers one optimal path
//! and classifies every non-match step as a [`PhonemeError`].
//!
//! ## Tie-break
//!
//! When several paths reach the optimal cost the backtrack prefers, at every
//! cell: diagonal (match / substitution) → vertical (deletion) → horizontal
//! (insertion). An adjacent swap `[a b]` vs `[b a]` therefore reports two
//! substitutions, never a deletion plus an insertion.

use crate::{
    inventory::PhoneticInventory,
    types::{ErrorKind, PhonemeError},
};

/// Severity of a target unit that was never spoken.
pub const DELETION_SEVERITY: f64 = 1.0;

/// Severity of an extra spoken unit; kept just below [`DELETION_SEVERITY`].
pub const INSERTION_SEVERITY: f64 = 0.8;

// ─────────────────────────────────────────────────────────────────────────────
// Edit-distance table
// ─────────────────────────────────────────────────────────────────────────────

/// `(rows × cols)` cost table, row-major. `cell(i, j)` is the distance between
/// the first `i` target units and the first `j` predicted units.
#[derive(Debug, Clone)]
pub struct CostTable {
    cols: usize,
    cells: Vec<usize>,
}

impl CostTable {
    pub fn build<S: AsRef<str>>(target: &[S], predicted: &[S]) -> Self {
        let (n, m) = (target.len(), predicted.len());
        let cols = m + 1;
        let mut cells = vec![0usize; (n + 1) * cols];

        for i in 1..=n {
            cells[i * cols] = i;
        }
        for j in 1..=m {
            cells[j] = j;
        }
        for i in 1..=n {
            for j in 1..=m {
                let cost = usize::from(target[i - 1].as_ref() != predicted[j - 1].as_ref());
                let deletion = cells[(i - 1) * cols + j] + 1;
                let insertion = cells[i * cols + j - 1] + 1;
                let diagonal = cells[(i - 1) * cols + j - 1] + cost;
                cells[i * cols + j] = deletion.min(insertion).min(diagonal);
            }
        }
        Self { cols, cells }
    }

    pub fn cell(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.cols + j]
    }

    /// Total edit distance (bottom-right cell).
    pub fn distance(&self) -> usize {
        self.cells.last().copied().unwrap_or(0)
    }
}

/// Edit distance between two unit sequences.
pub fn edit_distance<S: AsRef<str>>(target: &[S], predicted: &[S]) -> usize {
    CostTable::build(target, predicted).distance()
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit operations
// ─────────────────────────────────────────────────────────────────────────────

/// One step of an optimal alignment path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp<'a> {
    Match(&'a str),
    Substitute { expected: &'a str, actual: &'a str },
    Delete(&'a str),
    Insert(&'a str),
}

/// Recover one minimum-cost path, in left-to-right order.
pub fn edit_operations<'a, S: AsRef<str>>(target: &'a [S], predicted: &'a [S]) -> Vec<EditOp<'a>> {
    let table = CostTable::build(target, predicted);
    let mut ops = Vec::with_capacity(target.len().max(predicted.len()));
    let (mut i, mut j) = (target.len(), predicted.len());

    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let expected = target[i - 1].as_ref();
            let actual = predicted[j - 1].as_ref();
            let cost = usize::from(expected != actual);
            if table.cell(i, j) == table.cell(i - 1, j - 1) + cost {
                ops.push(if cost == 0 {
                    EditOp::Match(expected)
                } else {
                    EditOp::Substitute { expected, actual }
                });
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && table.cell(i, j) == table.cell(i - 1, j) + 1 {
            ops.push(EditOp::Delete(target[i - 1].as_ref()));
            i -= 1;
        } else {
            ops.push(EditOp::Insert(predicted[j - 1].as_ref()));
            j -= 1;
        }
    }

    ops.reverse();
    ops
}

// ─────────────────────────────────────────────────────────────────────────────
// Aligner
// ─────────────────────────────────────────────────────────────────────────────

/// Classifies alignment discrepancies, grading substitutions by similarity.
#[derive(Debug, Clone, Copy)]
pub struct Aligner<'a> {
    inventory: &'a PhoneticInventory,
}

impl<'a> Aligner<'a> {
    pub fn new(inventory: &'a PhoneticInventory) -> Self {
        Self { inventory }
    }

    /// Align `predicted` against `target` and list every discrepancy.
    ///
    /// Total over all inputs: an empty target yields only insertions, an
    /// empty prediction only deletions.
    pub fn align<S: AsRef<str>>(&self, target: &[S], predicted: &[S]) -> Vec<PhonemeError> {
        let mut errors = Vec::new();
        // Advances on match, substitution and deletion; not on insertion.
        let mut cursor = 0usize;

        for op in edit_operations(target, predicted) {
            match op {
                EditOp::Match(_) => cursor += 1,
                EditOp::Substitute { expected, actual } => {
                    errors.push(PhonemeError {
                        kind: ErrorKind::Substitution,
                        position: cursor,
                        expected: Some(expected.to_string()),
                        actual: Some(actual.to_string()),
                        severity: 1.0 - self.inventory.similarity(expected, actual),
                    });
                    cursor += 1;
                }
                EditOp::Delete(expected) => {
                    errors.push(PhonemeError {
                        kind: ErrorKind::Deletion,
                        position: cursor,
                        expected: Some(expected.to_string()),
                        actual: None,
                        severity: DELETION_SEVERITY,
                    });
                    cursor += 1;
                }
                EditOp::Insert(actual) => {
                    errors.push(PhonemeError {
                        kind: ErrorKind::Insertion,
                        position: cursor.saturating_sub(1),
                        expected: None,
                        actual: Some(actual.to_string()),
                        severity: INSERTION_SEVERITY,
                    });
                }
            }
        }
        errors
    }
}

/// Sum of error severities.
pub fn total_severity(errors: &[PhonemeError]) -> f64 {
    errors.iter().map(|e| e.severity).sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::tests::test_inventory;
    use approx::assert_relative_eq;

    fn seq(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_identical_sequences_have_no_errors() {
        let inv = test_inventory();
        let a = seq("k æ t d ɔ ɡ");
        assert!(Aligner::new(&inv).align(&a, &a).is_empty());
        assert_eq!(edit_distance(&a, &a), 0);
    }

    #[test]
    fn test_empty_prediction_is_all_deletions() {
        let inv = test_inventory();
        let target = seq("p l eɪ");
        let errors = Aligner::new(&inv).align(&target, &[]);
        assert_eq!(errors.len(), 3);
        for (i, e) in errors.iter().enumerate() {
            assert_eq!(e.kind, ErrorKind::Deletion);
            assert_eq!(e.position, i);
            assert_eq!(e.severity, DELETION_SEVERITY);
            assert_eq!(e.actual, None);
        }
    }

    #[test]
    fn test_empty_target_is_all_insertions() {
        let inv = test_inventory();
        let predicted = seq("k æ");
        let errors = Aligner::new(&inv).align(&[], &predicted);
        assert_eq!(errors.len(), 2);
        for e in &errors {
            assert_eq!(e.kind, ErrorKind::Insertion);
            assert_eq!(e.position, 0);
            assert_eq!(e.severity, INSERTION_SEVERITY);
            assert_eq!(e.expected, None);
        }
    }

    #[test]
    fn test_both_empty() {
        let inv = test_inventory();
        let empty: Vec<String> = Vec::new();
        assert!(Aligner::new(&inv).align(&empty, &empty).is_empty());
        assert_eq!(edit_distance(&empty, &empty), 0);
    }

    #[test]
    fn test_substitution_graded_by_similarity() {
        let json = r#"{
            "arpabet_to_ipa": {},
            "ipa_phones": ["k", "æ", "ɛ", "t"],
            "similarity_groups": [["æ", "ɛ"]]
        }"#;
        let inv = PhoneticInventory::from_json(json).unwrap();
        let errors = Aligner::new(&inv).align(&seq("k æ t"), &seq("k ɛ t"));
        assert_eq!(errors.len(), 1);
        let e = &errors[0];
        assert_eq!(e.kind, ErrorKind::Substitution);
        assert_eq!(e.position, 1);
        assert_eq!(e.expected.as_deref(), Some("æ"));
        assert_eq!(e.actual.as_deref(), Some("ɛ"));
        assert_relative_eq!(e.severity, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_swap_prefers_two_substitutions() {
        let expected = seq("k t");
        let actual = seq("t k");
        let ops = edit_operations(&expected, &actual);
        assert_eq!(
            ops,
            vec![
                EditOp::Substitute { expected: "k", actual: "t" },
                EditOp::Substitute { expected: "t", actual: "k" },
            ]
        );
    }

    #[test]
    fn test_insertion_attaches_to_previous_target() {
        let inv = test_inventory();
        let errors = Aligner::new(&inv).align(&seq("k t"), &seq("k ə t"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Insertion);
        assert_eq!(errors[0].position, 0);
        assert_eq!(errors[0].actual.as_deref(), Some("ə"));

        let errors = Aligner::new(&inv).align(&seq("k t l"), &seq("k t ə l"));
        assert_eq!(errors[0].position, 1);
    }

    #[test]
    fn test_deletion_in_the_middle() {
        let inv = test_inventory();
        let errors = Aligner::new(&inv).align(&seq("k æ t"), &seq("k t"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Deletion);
        assert_eq!(errors[0].position, 1);
        assert_eq!(errors[0].expected.as_deref(), Some("æ"));
    }

    #[test]
    fn test_error_count_matches_edit_distance() {
        let inv = test_inventory();
        let cases = [
            ("k æ t", "k ɛ t"),
            ("p l eɪ", ""),
            ("", "k æ"),
            ("t ʃ æ t", "æ t ʃ"),
            ("d ɔ ɡ", "d ɔ ɡ ɡ l"),
            ("k æ t d ɔ ɡ", "k ʌ d ɔ"),
        ];
        for (t, p) in cases {
            let (t, p) = (seq(t), seq(p));
            let errors = Aligner::new(&inv).align(&t, &p);
            let distance = edit_distance(&t, &p);
            assert_eq!(errors.len(), distance, "{t:?} vs {p:?}");
            assert!(total_severity(&errors) <= distance as f64 + 1e-9);
        }
    }

    #[test]
    fn test_cost_table_edges() {
        let table = CostTable::build(&seq("a b c"), &seq("a c"));
        assert_eq!(table.cell(3, 0), 3);
        assert_eq!(table.cell(0, 2), 2);
        assert_eq!(table.distance(), 1);
    }
}
