//! Split a flat predicted phoneme stream into one chunk per reference word.
//!
//! The decoder may tag tokens with a leading boundary marker (`▁` or `|`)
//! meaning "a new word-like group starts here". When markers are present they
//! define the chunks; otherwise the flat unit sequence is split evenly.
//!
//! Whatever the policy produces is then forced to exactly one chunk per word:
//!
//! | Chunks vs words | Action                                                       |
//! |-----------------|--------------------------------------------------------------|
//! | too many        | merge the adjacent pair with the smallest combined size      |
//! | too few         | append empty chunks for the trailing words (never split)     |
//!
//! A count mismatch is never an error.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::GopError, inventory::PhoneticInventory};

/// Word-boundary marker used by sentencepiece-style vocabularies.
pub const WORD_MARKER: char = '\u{2581}';

/// Word-boundary marker used by wav2vec2-style vocabularies.
pub const BAR_MARKER: char = '|';

/// How predicted units are assigned to reference words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationPolicy {
    /// Use boundary markers when the tokens carry any; otherwise split evenly.
    #[default]
    Marker,
    /// Always split the flat unit sequence evenly, ignoring markers.
    #[serde(alias = "alignment")]
    EvenSplit,
}

impl FromStr for SegmentationPolicy {
    type Err = GopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" => Ok(Self::Marker),
            "even-split" | "even_split" | "alignment" => Ok(Self::EvenSplit),
            other => Err(GopError::UnknownPolicy(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `true` if the token opens a new group.
pub fn has_marker(token: &str) -> bool {
    token.contains(WORD_MARKER) || token.starts_with(BAR_MARKER)
}

fn starts_with_marker(token: &str) -> bool {
    token.starts_with(WORD_MARKER) || token.starts_with(BAR_MARKER)
}

/// Expand tokens holding several space-separated pieces into atomic tokens.
///
/// A leading marker on the original token is kept on the first piece.
pub fn split_grouped_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let s = token.as_ref().trim();
        if s.is_empty() {
            continue;
        }
        if !s.contains(char::is_whitespace) {
            out.push(s.to_string());
            continue;
        }
        let lead = if s.starts_with(WORD_MARKER) {
            Some(WORD_MARKER)
        } else if s.starts_with(BAR_MARKER) {
            Some(BAR_MARKER)
        } else {
            None
        };
        for (i, piece) in s.split_whitespace().enumerate() {
            match lead {
                Some(marker) if i == 0 && !starts_with_marker(piece) => {
                    out.push(format!("{marker}{piece}"));
                }
                _ => out.push(piece.to_string()),
            }
        }
    }
    out
}

/// Text of a token with markers removed (`▁` becomes a space).
fn strip_markers(token: &str) -> String {
    token.replace(BAR_MARKER, "").replace(WORD_MARKER, " ")
}

/// Tokenize the whole token stream as one flat unit sequence.
pub fn flat_units<S: AsRef<str>>(inventory: &PhoneticInventory, tokens: &[S]) -> Vec<String> {
    let text = tokens
        .iter()
        .map(|t| t.as_ref().replace([WORD_MARKER, BAR_MARKER], " ").trim().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    inventory.tokenize(&text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Chunking strategies
// ─────────────────────────────────────────────────────────────────────────────

/// Distribute `units` over `n` chunks in order; the first `len % n` chunks
/// get one extra unit.
pub fn even_split(units: &[String], n: usize) -> Vec<Vec<String>> {
    if n == 0 {
        return Vec::new();
    }
    let (base, rem) = (units.len() / n, units.len() % n);
    let mut chunks = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < rem);
        chunks.push(units[start..start + size].to_vec());
        start += size;
    }
    chunks
}

fn group_by_markers(inventory: &PhoneticInventory, tokens: &[String]) -> Vec<Vec<String>> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let flush = |group: &[&str]| -> Vec<String> {
        group
            .iter()
            .flat_map(|tok| inventory.tokenize(&strip_markers(tok)))
            .collect()
    };

    for token in tokens {
        if has_marker(token) && !current.is_empty() {
            chunks.push(flush(&current));
            current.clear();
        }
        current.push(token);
    }
    if !current.is_empty() {
        chunks.push(flush(&current));
    }
    chunks
}

/// Force `chunks` to exactly `n` entries (see module docs).
pub fn reconcile(mut chunks: Vec<Vec<String>>, n: usize) -> Vec<Vec<String>> {
    if n == 0 {
        return Vec::new();
    }

    while chunks.len() > n {
        let mut best = 0;
        let mut best_size = usize::MAX;
        for i in 0..chunks.len() - 1 {
            let size = chunks[i].len() + chunks[i + 1].len();
            if size < best_size {
                best = i;
                best_size = size;
            }
        }
        let right = chunks.remove(best + 1);
        chunks[best].extend(right);
        debug!(at = best, size = best_size, remaining = chunks.len(), "merged adjacent chunks");
    }

    if chunks.len() < n {
        debug!(chunks = chunks.len(), words = n, "padding trailing words with empty chunks");
        chunks.resize_with(n, Vec::new);
    }

    if chunks.len() != n {
        let flat: Vec<String> = chunks.into_iter().flatten().collect();
        return even_split(&flat, n);
    }
    chunks
}

// ─────────────────────────────────────────────────────────────────────────────
// Segmenter
// ─────────────────────────────────────────────────────────────────────────────

/// Assigns predicted units to reference words.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter<'a> {
    inventory: &'a PhoneticInventory,
}

impl<'a> Segmenter<'a> {
    pub fn new(inventory: &'a PhoneticInventory) -> Self {
        Self { inventory }
    }

    /// Split the prediction into exactly `target_per_word.len()` chunks.
    ///
    /// `tokens` is the raw decoder output (possibly marker-tagged);
    /// `predicted_units` is its flat tokenization (see [`flat_units`]).
    pub fn segment<S, T>(
        &self,
        tokens: &[S],
        predicted_units: &[String],
        target_per_word: &[T],
        policy: SegmentationPolicy,
    ) -> Vec<Vec<String>>
    where
        S: AsRef<str>,
    {
        let n = target_per_word.len();
        if n == 0 {
            return Vec::new();
        }

        let tokens = split_grouped_tokens(tokens);
        let use_markers =
            policy == SegmentationPolicy::Marker && tokens.iter().any(|t| has_marker(t));

        let chunks = if use_markers {
            group_by_markers(self.inventory, &tokens)
        } else {
            even_split(predicted_units, n)
        };
        debug!(?policy, use_markers, chunks = chunks.len(), words = n, "segmented prediction");

        reconcile(chunks, n)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
