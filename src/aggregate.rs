//! Per-word and whole-utterance scores.
//!
//! Per word: `accuracy = max(0, 1 − Σseverity / len(target))`, or `1.0` for a
//! word with no target units. The error rate `Σseverity / len(target)` picks
//! the label against two thresholds.
//!
//! Overall: the same ratio over all words, `0.0` when there is no target at
//! all, and `overall_score = floor(accuracy × 100)`.
//!
//! Words are independent, so they are aligned in parallel on the rayon pool;
//! results always come back in script order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    align::{total_severity, Aligner},
    types::{Label, WordScore},
};

/// Error-rate cut-offs for [`Label::Excellent`] and [`Label::Good`].
///
/// Deserializes from `{"excellent": .., "good": ..}` or a `[excellent, good]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ThresholdsRepr")]
pub struct Thresholds {
    /// `error_rate ≤ excellent` → label 1.
    pub excellent: f64,
    /// `error_rate ≤ good` → label 2, otherwise label 3.
    pub good: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ThresholdsRepr {
    Pair(f64, f64),
    Named { excellent: f64, good: f64 },
}

impl From<ThresholdsRepr> for Thresholds {
    fn from(repr: ThresholdsRepr) -> Self {
        match repr {
            ThresholdsRepr::Pair(excellent, good) | ThresholdsRepr::Named { excellent, good } => {
                Self { excellent, good }
            }
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { excellent: 0.15, good: 0.35 }
    }
}

impl Thresholds {
    pub fn new(excellent: f64, good: f64) -> Self {
        Self { excellent, good }
    }

    pub fn label(&self, error_rate: f64) -> Label {
        if error_rate <= self.excellent {
            Label::Excellent
        } else if error_rate <= self.good {
            Label::Good
        } else {
            Label::NeedsWork
        }
    }

    pub fn as_pair(&self) -> (f64, f64) {
        (self.excellent, self.good)
    }
}

/// `max(0, 1 − severity / len)`, or `empty` when `len == 0`.
fn accuracy_ratio(severity: f64, len: usize, empty: f64) -> f64 {
    if len == 0 {
        empty
    } else {
        (1.0 - severity / len as f64).max(0.0)
    }
}

/// Accuracy of a single word; a word with no target units is perfect.
pub fn word_accuracy(severity: f64, target_len: usize) -> f64 {
    accuracy_ratio(severity, target_len, 1.0)
}

/// Accuracy over a whole utterance; an empty target scores zero.
pub fn overall_accuracy(severity: f64, target_len: usize) -> f64 {
    accuracy_ratio(severity, target_len, 0.0)
}

pub fn error_rate(severity: f64, target_len: usize) -> f64 {
    if target_len == 0 {
        0.0
    } else {
        severity / target_len as f64
    }
}

/// Integer score in `[0, 100]`.
pub fn overall_score(accuracy: f64) -> u32 {
    (accuracy * 100.0).floor().clamp(0.0, 100.0) as u32
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregator
// ─────────────────────────────────────────────────────────────────────────────

/// Scores reference words against their predicted chunks.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    aligner: Aligner<'a>,
    thresholds: Thresholds,
}

impl<'a> Aggregator<'a> {
    pub fn new(aligner: Aligner<'a>, thresholds: Thresholds) -> Self {
        Self { aligner, thresholds }
    }

    /// Score one word from its (already normalized) target and predicted units.
    pub fn score_word(&self, word: &str, target: &[String], predicted: &[String]) -> WordScore {
        let errors = self.aligner.align(target, predicted);
        let severity = total_severity(&errors);
        let accuracy = word_accuracy(severity, target.len());
        let label = self.thresholds.label(error_rate(severity, target.len()));

        WordScore {
            word: word.to_string(),
            target_ipa: target.join(" "),
            predicted_ipa: (!predicted.is_empty()).then(|| predicted.join(" ")),
            accuracy,
            label,
            errors,
        }
    }

    /// Score every word, in script order.
    ///
    /// A word without a matching target or chunk is scored against an empty
    /// sequence. With `parallel`, words are dispatched to the rayon pool.
    pub fn score_words<W: AsRef<str> + Sync>(
        &self,
        words: &[W],
        targets: &[Vec<String>],
        chunks: &[Vec<String>],
        parallel: bool,
    ) -> Vec<WordScore> {
        let empty: Vec<String> = Vec::new();
        let score = |i: usize| {
            let target = targets.get(i).unwrap_or(&empty);
            let chunk = chunks.get(i).unwrap_or(&empty);
            self.score_word(words[i].as_ref(), target, chunk)
        };

        if parallel {
            (0..words.len()).into_par_iter().map(score).collect()
        } else {
            (0..words.len()).map(score).collect()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
