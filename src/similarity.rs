//! Phonetic similarity between two units, used to grade substitutions.
//!
//! | Relationship                                  | Score |
//! |-----------------------------------------------|-------|
//! | identical after canonicalization + variants   | 1.0   |
//! | listed together in an equivalence triple      | 0.9   |
//! | members of the same similarity group          | 0.7   |
//! | anything else                                 | 0.0   |

use std::collections::HashMap;

use crate::inventory::PhoneticInventory;

pub const IDENTICAL_SIMILARITY: f64 = 1.0;
pub const EQUIVALENT_SIMILARITY: f64 = 0.9;
pub const GROUP_SIMILARITY: f64 = 0.7;

/// Vowel clusters that are commonly confused by learners.
pub const DEFAULT_VOWEL_GROUPS: &[&[&str]] = &[
    &["i", "ɪ"],
    &["e", "ɛ"],
    &["æ", "ʌ"],
    &["ɑ", "ɔ"],
    &["u", "ʊ"],
    &["o", "ɔ"],
];

/// Consonant clusters differing mostly in voicing.
pub const DEFAULT_CONSONANT_GROUPS: &[&[&str]] = &[
    &["p", "b"],
    &["t", "d"],
    &["k", "ɡ"],
    &["f", "v"],
    &["θ", "ð"],
    &["s", "z"],
];

/// Ordered-pair similarity scores, fixed at construction.
#[derive(Debug, Default, Clone)]
pub struct SimilarityTable {
    scores: HashMap<String, HashMap<String, f64>>,
}

impl SimilarityTable {
    /// Every ordered pair of distinct members within a group scores
    /// [`GROUP_SIMILARITY`].
    pub fn from_groups<G, S>(groups: &[G]) -> Self
    where
        G: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for group in groups {
            let group = group.as_ref();
            for (i, a) in group.iter().enumerate() {
                for (j, b) in group.iter().enumerate() {
                    if i != j {
                        table
                            .scores
                            .entry(a.as_ref().to_string())
                            .or_default()
                            .insert(b.as_ref().to_string(), GROUP_SIMILARITY);
                    }
                }
            }
        }
        table
    }

    /// Table built from [`DEFAULT_VOWEL_GROUPS`] and [`DEFAULT_CONSONANT_GROUPS`].
    pub fn default_groups() -> Self {
        let groups: Vec<&[&str]> = DEFAULT_VOWEL_GROUPS
            .iter()
            .chain(DEFAULT_CONSONANT_GROUPS)
            .copied()
            .collect();
        Self::from_groups(&groups)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.scores.get(a)?.get(b).copied()
    }
}

impl PhoneticInventory {
    /// Similarity of two units in `[0, 1]`.
    ///
    /// Units are compared after canonicalization and variant normalization.
    /// The equivalence check uses the surface pair. The group table is probed
    /// with the normalized pair first, then the surface pair, so groups
    /// written in either form take effect.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let an = self.normalize(self.canonical(a));
        let bn = self.normalize(self.canonical(b));
        if an == bn {
            return IDENTICAL_SIMILARITY;
        }
        if self.equiv_pairs().contains_either(a, b) {
            return EQUIVALENT_SIMILARITY;
        }
        let table = self.similarity_table();
        table
            .get(an, bn)
            .or_else(|| table.get(a, b))
            .unwrap_or(0.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
