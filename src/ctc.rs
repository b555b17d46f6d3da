//! Upstream decoder seam and greedy CTC post-processing.
//!
//! Acoustic inference itself lives outside this crate. A [`PhonemeDecoder`]
//! turns audio samples into a token stream; the helpers here turn raw
//! per-frame CTC output into that stream the same way every caller should:
//!
//! ```text
//! frame ids  → argmax per frame        (argmax_frames)
//!            → drop blanks and repeats (greedy_collapse)
//!            → fold separators into a leading ▁ on the next group
//!                                      (attach_markers)
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::{error::Result, segment::WORD_MARKER};

/// Produces a predicted token stream for a block of mono samples.
///
/// Tokens may carry a leading `▁` or `|` boundary marker and may hold
/// several phonetic units each.
pub trait PhonemeDecoder: Send + Sync {
    fn decode(&self, samples: &[f32], model_id: &str) -> anyhow::Result<Vec<String>>;
}

/// Index of the highest logit in each frame of a row-major
/// `(frames × vocab_size)` matrix. A trailing partial frame is ignored.
pub fn argmax_frames(logits: &[f32], vocab_size: usize) -> Vec<u32> {
    if vocab_size == 0 {
        return Vec::new();
    }
    logits
        .chunks_exact(vocab_size)
        .map(|frame| {
            let mut best = 0usize;
            for (i, &v) in frame.iter().enumerate() {
                if v > frame[best] {
                    best = i;
                }
            }
            best as u32
        })
        .collect()
}

/// Standard CTC collapse: drop blanks, then drop a frame equal to the one
/// before it. Ids missing from `id_to_token` (or mapping to `""`) are skipped.
pub fn greedy_collapse(frame_ids: &[u32], id_to_token: &HashMap<u32, String>, blank_id: u32) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut prev: Option<u32> = None;
    for &id in frame_ids {
        if id == blank_id || prev == Some(id) {
            prev = Some(id);
            continue;
        }
        if let Some(token) = id_to_token.get(&id).filter(|t| !t.is_empty()) {
            tokens.push(token.clone());
        }
        prev = Some(id);
    }
    tokens
}

fn is_separator(token: &str) -> bool {
    token.chars().all(|c| c.is_whitespace() || c == WORD_MARKER || c == '|')
}

/// Concatenate consecutive tokens into groups split at separator tokens
/// (whitespace, `▁`, `|`); every group after a separator gets a leading `▁`.
pub fn attach_markers<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut pending_marker = false;

    for token in tokens {
        let token = token.as_ref();
        if token.is_empty() {
            continue;
        }
        if is_separator(token) {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            pending_marker = true;
            continue;
        }
        if current.is_empty() && pending_marker {
            current.push(WORD_MARKER);
            pending_marker = false;
        }
        current.push_str(token);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

// ─────────────────────────────────────────────────────────────────────────────
// Vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// CTC output vocabulary (`vocab.json` of a wav2vec2-style tokenizer).
#[derive(Debug, Clone)]
pub struct CtcVocab {
    id_to_token: HashMap<u32, String>,
    blank_id: u32,
}

#[derive(Deserialize)]
struct RawVocab(HashMap<String, u32>);

impl CtcVocab {
    pub fn new(id_to_token: HashMap<u32, String>, blank_id: u32) -> Self {
        Self { id_to_token, blank_id }
    }

    /// Parse a `{"token": id}` map. The blank is `<pad>` when present, else id 0.
    pub fn from_json(json: &str) -> Result<Self> {
        let RawVocab(vocab) = serde_json::from_str(json)?;
        let blank_id = vocab.get("<pad>").copied().unwrap_or(0);
        let id_to_token = vocab.into_iter().map(|(t, i)| (i, t)).collect();
        Ok(Self { id_to_token, blank_id })
    }

    pub fn blank_id(&self) -> u32 {
        self.blank_id
    }

    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Full greedy pipeline over per-frame ids.
    pub fn decode_ids(&self, frame_ids: &[u32]) -> Vec<String> {
        attach_markers(&greedy_collapse(frame_ids, &self.id_to_token, self.blank_id))
    }

    /// Full greedy pipeline over a `(frames × vocab_size)` logit matrix.
    pub fn decode_logits(&self, logits: &[f32], vocab_size: usize) -> Vec<String> {
        self.decode_ids(&argmax_frames(logits, vocab_size))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
