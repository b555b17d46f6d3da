//! Value objects produced by a scoring request.

use std::fmt;

use serde::Serialize;

/// Kind of discrepancy between target and predicted phonemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A target unit was pronounced as a different unit.
    Substitution,
    /// A target unit is missing from the prediction.
    Deletion,
    /// The prediction contains a unit with no target counterpart.
    Insertion,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Substitution => "substitution",
            ErrorKind::Deletion => "deletion",
            ErrorKind::Insertion => "insertion",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discrepancy found by the aligner.
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemeError {
    pub kind: ErrorKind,
    /// Index into the target sequence. Insertions attach to the target unit
    /// completed just before them.
    pub position: usize,
    /// `None` for insertions.
    pub expected: Option<String>,
    /// `None` for deletions.
    pub actual: Option<String>,
    /// Penalty in `[0, 1]`.
    pub severity: f64,
}

/// Coarse per-word quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Excellent = 1,
    Good = 2,
    NeedsWork = 3,
}

impl Label {
    /// Numeric form used in serialized output.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Outcome for one reference word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordScore {
    pub word: String,
    /// Space-joined target units.
    pub target_ipa: String,
    /// Space-joined predicted units; `None` when no units were assigned.
    pub predicted_ipa: Option<String>,
    pub accuracy: f64,
    pub label: Label,
    pub errors: Vec<PhonemeError>,
}

/// Request-level settings echoed back with the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    pub model_used: String,
    pub thresholds: (f64, f64),
    pub total_phonemes: usize,
    pub error_count: usize,
}

/// Whole-utterance outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PronunciationResult {
    /// `floor(accuracy × 100)`.
    pub overall_score: u32,
    pub accuracy: f64,
    pub words: Vec<WordScore>,
    /// Every word's errors, in word order.
    pub global_errors: Vec<PhonemeError>,
    pub target_ipa: String,
    pub predicted_ipa: String,
    pub metadata: ResultMetadata,
}
