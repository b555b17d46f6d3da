//! Phonetic tokenizer — raw phonetic text → canonical phoneme units.
//!
//! 1. Split on whitespace (whitespace never belongs to a unit).
//! 2. Greedy longest match against the inventory alphabet; a character with
//!    no match becomes a singleton unit, so input is always fully consumed.
//! 3. One left-to-right pass of merge rules over adjacent pairs.
//! 4. One left-to-right pass of equivalence rules over adjacent pairs.
//!
//! Unknown characters are kept rather than dropped so they remain visible in
//! the scored output.

use crate::inventory::{PairTable, PhoneticInventory};

impl PhoneticInventory {
    /// Tokenize `text` into canonical phonetic units.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let raw = self.scan_units(text);
        let merged = apply_pair_rules(raw, self.merge_pairs());
        apply_pair_rules(merged, self.equiv_pairs())
    }

    /// Greedy longest-match scan without any rewrite rules.
    pub fn scan_units(&self, text: &str) -> Vec<String> {
        let mut units = Vec::new();
        for chunk in text.split_whitespace() {
            let mut rest = chunk;
            while let Some(first) = rest.chars().next() {
                let len = self
                    .units_by_length()
                    .iter()
                    .find(|unit| rest.starts_with(unit.as_str()))
                    .map_or(first.len_utf8(), |unit| unit.len());
                units.push(rest[..len].to_string());
                rest = &rest[len..];
            }
        }
        units
    }

    /// Element-wise variant normalization; identity when no rules are loaded.
    pub fn normalize_variants<S: AsRef<str>>(&self, units: &[S]) -> Vec<String> {
        units
            .iter()
            .map(|u| self.normalize(u.as_ref()).to_string())
            .collect()
    }
}

/// Single greedy pass over adjacent pairs.
///
/// At each index `(current, next)` is checked, then `(next, current)`; a hit
/// replaces both units and skips ahead by two. Replacements are not rescanned,
/// so rules never chain within one pass.
pub fn apply_pair_rules(mut units: Vec<String>, table: &PairTable) -> Vec<String> {
    if table.is_empty() || units.len() < 2 {
        return units;
    }
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        if i + 1 < units.len() {
            let (a, b) = (&units[i], &units[i + 1]);
            if let Some(replacement) = table.get(a, b).or_else(|| table.get(b, a)) {
                out.push(replacement.to_string());
                i += 2;
                continue;
            }
        }
        out.push(std::mem::take(&mut units[i]));
        i += 1;
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
