//! Serialized result shape handed to transports, the CLI and the FFI.
//!
//! ```json
//! {
//!   "overall_score": 90,
//!   "accuracy": 0.9,
//!   "target_ipa": "k æ t",
//!   "predicted_ipa": "k ɛ t",
//!   "words": [{
//!     "word": "cat", "target_ipa": "k æ t", "predicted_ipa": "k ɛ t",
//!     "accuracy": 0.9, "label": 1, "error_count": 1,
//!     "errors": [{"type": "substitution", "position": 1,
//!                 "expected": "æ", "actual": "ɛ", "severity": 0.3}]
//!   }],
//!   "metadata": { ... }
//! }
//! ```

use serde::Serialize;

use crate::types::{ErrorKind, PhonemeError, PronunciationResult, ResultMetadata, WordScore};

/// Round to `places` decimal digits, exact ties to even.
///
/// Goes through fixed-precision formatting, which rounds the exact binary
/// value: `0.8125` becomes `0.812`, not `0.813`.
fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub position: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordReport {
    pub word: String,
    pub target_ipa: String,
    pub predicted_ipa: Option<String>,
    pub accuracy: f64,
    pub label: u8,
    pub error_count: usize,
    pub errors: Vec<ErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub overall_score: u32,
    pub accuracy: f64,
    pub target_ipa: String,
    pub predicted_ipa: String,
    pub words: Vec<WordReport>,
    pub metadata: ResultMetadata,
}

impl From<&PhonemeError> for ErrorReport {
    fn from(e: &PhonemeError) -> Self {
        Self {
            kind: e.kind,
            position: e.position,
            expected: e.expected.clone(),
            actual: e.actual.clone(),
            severity: round_to(e.severity, 2),
        }
    }
}

impl From<&WordScore> for WordReport {
    fn from(w: &WordScore) -> Self {
        Self {
            word: w.word.clone(),
            target_ipa: w.target_ipa.clone(),
            predicted_ipa: w.predicted_ipa.clone(),
            accuracy: round_to(w.accuracy, 3),
            label: w.label.code(),
            error_count: w.errors.len(),
            errors: w.errors.iter().map(ErrorReport::from).collect(),
        }
    }
}

impl From<&PronunciationResult> for ScoreReport {
    fn from(r: &PronunciationResult) -> Self {
        Self {
            overall_score: r.overall_score,
            accuracy: round_to(r.accuracy, 3),
            target_ipa: r.target_ipa.clone(),
            predicted_ipa: r.predicted_ipa.clone(),
            words: r.words.iter().map(WordReport::from).collect(),
            metadata: r.metadata.clone(),
        }
    }
}

impl PronunciationResult {
    pub fn to_report(&self) -> ScoreReport {
        ScoreReport::from(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_report())
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_report())
    }
}
