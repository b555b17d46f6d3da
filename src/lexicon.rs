//! Reference pronunciations for the words of a script.
//!
//! Lookup order for each word:
//! 1. a pronunciation dictionary ([`Lexicon`], e.g. [`CmuDict`]);
//! 2. a grapheme-to-phoneme model ([`Grapheme2Phoneme`]) when one is attached;
//! 3. the word itself as a single unit, so the word still shows up in results.
//!
//! Dictionary and G2P output are source-alphabet (ARPAbet) tokens, converted
//! to phonetic units through the [`PhoneticInventory`].

use std::{collections::HashMap, path::Path};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::{
    error::{GopError, Result},
    inventory::PhoneticInventory,
};

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// One ARPAbet symbol with an optional stress digit, e.g. `AH0`, `K`.
static RE_ARPABET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]+\d?$").unwrap());

/// Lower-cased word tokens of a script (`\w+` runs).
pub fn extract_words(script: &str) -> Vec<String> {
    let lower = script.to_lowercase();
    RE_WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborator seams
// ─────────────────────────────────────────────────────────────────────────────

/// Word → source-alphabet pronunciation.
pub trait Lexicon: Send + Sync {
    /// Primary pronunciation of a lower-cased word.
    fn lookup(&self, word: &str) -> Option<&[String]>;
}

impl Lexicon for HashMap<String, Vec<String>> {
    fn lookup(&self, word: &str) -> Option<&[String]> {
        self.get(word).map(Vec::as_slice)
    }
}

/// Grapheme-to-phoneme conversion for words missing from the dictionary.
pub trait Grapheme2Phoneme: Send + Sync {
    /// Source-alphabet tokens for `word`. Non-symbol tokens in the output
    /// (spaces, punctuation) are filtered by the caller.
    fn convert(&self, word: &str) -> anyhow::Result<Vec<String>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// CMU pronouncing dictionary
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory CMU pronouncing dictionary.
///
/// Accepts the plain-text format:
/// ```text
/// ;;; comment line
/// cat  K AE1 T
/// read  R IY1 D
/// read(2)  R EH1 D
/// achill AE1 K IH0 L # place, irish
/// ```
#[derive(Debug, Default, Clone)]
pub struct CmuDict {
    entries: HashMap<String, Vec<Vec<String>>>,
}

impl CmuDict {
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries: HashMap<String, Vec<Vec<String>>> = HashMap::new();

        for (idx, line) in text.lines().enumerate() {
            if line.starts_with(";;;") {
                continue;
            }
            let line = line.split('#').next().unwrap_or_default().trim();
            let mut fields = line.split_whitespace();
            let Some(term) = fields.next() else {
                continue;
            };
            let phonemes: Vec<String> = fields.map(str::to_string).collect();
            if phonemes.is_empty() {
                return Err(GopError::Dictionary {
                    line: idx + 1,
                    message: format!("entry '{term}' has no phonemes"),
                });
            }
            entries.entry(base_term(term).to_lowercase()).or_default().push(phonemes);
        }

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        // The upstream file is mostly ASCII with a few Latin-1 bytes.
        let bytes = std::fs::read(path)?;
        let dict = Self::parse(&String::from_utf8_lossy(&bytes))?;
        info!(path = %path.display(), words = dict.len(), "loaded pronunciation dictionary");
        Ok(dict)
    }

    /// Every listed pronunciation of `word`, primary first.
    pub fn variants(&self, word: &str) -> &[Vec<String>] {
        self.entries.get(word).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lexicon for CmuDict {
    fn lookup(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word)?.first().map(Vec::as_slice)
    }
}

/// `read(2)` → `read`.
fn base_term(term: &str) -> &str {
    match term.find('(') {
        Some(open) if term.ends_with(')') && open > 0 => &term[..open],
        _ => term,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Target resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Produces target phonetic units for each script word.
#[derive(Clone, Copy)]
pub struct TargetResolver<'a> {
    inventory: &'a PhoneticInventory,
    lexicon: &'a dyn Lexicon,
    g2p: Option<&'a dyn Grapheme2Phoneme>,
    ignore_stress: bool,
}

impl<'a> TargetResolver<'a> {
    pub fn new(inventory: &'a PhoneticInventory, lexicon: &'a dyn Lexicon) -> Self {
        Self { inventory, lexicon, g2p: None, ignore_stress: true }
    }

    pub fn with_g2p(mut self, g2p: Option<&'a dyn Grapheme2Phoneme>) -> Self {
        self.g2p = g2p;
        self
    }

    pub fn ignore_stress(mut self, ignore: bool) -> Self {
        self.ignore_stress = ignore;
        self
    }

    pub fn resolve_word(&self, word: &str) -> Vec<String> {
        if let Some(pron) = self.lexicon.lookup(word) {
            return self.inventory.to_phonetic(pron, self.ignore_stress);
        }

        if let Some(g2p) = self.g2p {
            match g2p.convert(word) {
                Ok(tokens) => {
                    let symbols: Vec<&str> = tokens
                        .iter()
                        .map(String::as_str)
                        .filter(|t| RE_ARPABET.is_match(t))
                        .collect();
                    if !symbols.is_empty() {
                        debug!(word, "pronunciation from g2p");
                        return self.inventory.to_phonetic(&symbols, self.ignore_stress);
                    }
                }
                Err(e) => warn!(word, error = %e, "g2p failed"),
            }
        }

        debug!(word, "no pronunciation found; using the word itself");
        vec![word.to_string()]
    }

    pub fn resolve<S: AsRef<str>>(&self, words: &[S]) -> Vec<Vec<String>> {
        words.iter().map(|w| self.resolve_word(w.as_ref())).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
