//! Phonetic inventory — the alphabet, conversion table and rewrite rules the
//! rest of the engine consults.
//!
//! Built once from `data/ipa_data.json` and read-only afterwards, so a single
//! instance can be shared across threads scoring words in parallel.
//!
//! ## Data file schema
//!
//! | Key                      | Shape                    | Required |
//! |--------------------------|--------------------------|----------|
//! | `arpabet_to_ipa`         | `{ "AA": "ɑ", … }`       | yes      |
//! | `ipa_phones`             | `["ɑ", "æ", "tʃ", …]`    | yes      |
//! | `default_merge_pairs`    | `[["t", "ʃ", "tʃ"], …]`  | no       |
//! | `default_equiv_pairs`    | `[["ɚ", "ɝ", "ɝ"], …]`   | no       |
//! | `normalize_ipa_variants` | `{ "g": "ɡ", … }`        | no       |
//! | `similarity_groups`      | `[["i", "ɪ"], …]`        | no       |

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::info;

use crate::{
    error::{GopError, Result},
    similarity::SimilarityTable,
};

/// Environment variable that overrides the data file location.
pub const DATA_ENV_VAR: &str = "GOPSCORE_DATA";

/// Data file name, looked up under a `data/` directory.
pub const DATA_FILE_NAME: &str = "ipa_data.json";

// ─────────────────────────────────────────────────────────────────────────────
// ipa_data.json schema
// ─────────────────────────────────────────────────────────────────────────────

/// Deserialised inventory data file.
#[derive(Debug, Deserialize)]
pub struct InventoryData {
    /// Source-alphabet (ARPAbet) token → phonetic unit. Empty or `null`
    /// values mark tokens with no phonetic counterpart.
    pub arpabet_to_ipa: BTreeMap<String, Option<String>>,

    /// Every valid canonical phonetic unit, used for greedy tokenization.
    pub ipa_phones: Vec<String>,

    /// `[a, b, replacement]` — adjacent units fused after tokenization.
    #[serde(default)]
    pub default_merge_pairs: Vec<Vec<String>>,

    /// `[a, b, canonical]` — adjacent units collapsed in a second pass;
    /// also the source of the canonical-form groups.
    #[serde(default)]
    pub default_equiv_pairs: Vec<Vec<String>>,

    /// Surface variant → normalized unit.
    #[serde(default)]
    pub normalize_ipa_variants: HashMap<String, String>,

    /// Groups of mutually similar units. Built-in groups apply when absent.
    #[serde(default)]
    pub similarity_groups: Option<Vec<Vec<String>>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Ordered pair table
// ─────────────────────────────────────────────────────────────────────────────

/// Lookup from an ordered pair of units to a replacement unit.
///
/// Nested maps so a probe with two `&str` never allocates a tuple key.
#[derive(Debug, Default, Clone)]
pub struct PairTable {
    pairs: HashMap<String, HashMap<String, String>>,
    len: usize,
}

impl PairTable {
    fn from_triples(triples: &[Vec<String>], what: &str) -> Result<Self> {
        let mut table = Self::default();
        for (i, triple) in triples.iter().enumerate() {
            let [a, b, replacement] = match triple.as_slice() {
                [a, b, c, ..] => [a, b, c],
                _ => {
                    return Err(GopError::InvalidData(format!(
                        "{what}[{i}] needs three members, got {triple:?}"
                    )))
                }
            };
            table.insert(a, b, replacement);
        }
        Ok(table)
    }

    fn insert(&mut self, a: &str, b: &str, replacement: &str) {
        let previous = self
            .pairs
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), replacement.to_string());
        if previous.is_none() {
            self.len += 1;
        }
    }

    /// Replacement for the ordered pair `(a, b)`.
    pub fn get(&self, a: &str, b: &str) -> Option<&str> {
        self.pairs.get(a)?.get(b).map(String::as_str)
    }

    /// `true` if `(a, b)` or `(b, a)` is present.
    pub fn contains_either(&self, a: &str, b: &str) -> bool {
        self.get(a, b).is_some() || self.get(b, a).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical form
// ─────────────────────────────────────────────────────────────────────────────

/// Map every unit named in an equivalence triple to its canonical unit.
///
/// The last triple naming a unit decides its target, and the canonical member
/// of each triple maps to itself. Chains left by later triples (`a → c`,
/// `c → e`) are followed to their end, so the result is idempotent.
fn build_canonical_map(triples: &[Vec<String>]) -> HashMap<String, String> {
    let mut direct: HashMap<&str, &str> = HashMap::new();
    for triple in triples {
        if let [a, b, c, ..] = triple.as_slice() {
            direct.insert(a, c);
            direct.insert(b, c);
            direct.insert(c, c);
        }
    }

    direct
        .keys()
        .map(|&unit| {
            let mut current = unit;
            // Bounded walk; each step moves to a later triple's canonical member.
            for _ in 0..direct.len() {
                match direct.get(current) {
                    Some(&next) if next != current => current = next,
                    _ => break,
                }
            }
            (unit.to_string(), current.to_string())
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// PhoneticInventory
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable phonetic alphabet plus every derived lookup table.
#[derive(Debug, Clone)]
pub struct PhoneticInventory {
    alphabet_to_phonetic: BTreeMap<String, String>,
    phonetic_to_alphabet: HashMap<String, String>,
    phonetic_alphabet: HashSet<String>,
    units_by_length: Vec<String>,
    merge_pairs: PairTable,
    equiv_pairs: PairTable,
    canonical_form: HashMap<String, String>,
    variant_normalization: HashMap<String, String>,
    similarity: SimilarityTable,
}

impl PhoneticInventory {
    /// Build an inventory from already-parsed data.
    pub fn from_data(data: InventoryData) -> Result<Self> {
        if data.ipa_phones.is_empty() {
            return Err(GopError::InvalidData("ipa_phones is empty".into()));
        }

        let merge_pairs = PairTable::from_triples(&data.default_merge_pairs, "default_merge_pairs")?;
        let equiv_pairs = PairTable::from_triples(&data.default_equiv_pairs, "default_equiv_pairs")?;
        let canonical_form = build_canonical_map(&data.default_equiv_pairs);

        let alphabet_to_phonetic: BTreeMap<String, String> = data
            .arpabet_to_ipa
            .into_iter()
            .map(|(k, v)| (k, v.unwrap_or_default()))
            .collect();

        // Reverse mapping: the first source token (in sorted order) wins.
        let mut phonetic_to_alphabet = HashMap::new();
        for (token, unit) in &alphabet_to_phonetic {
            if !unit.is_empty() {
                phonetic_to_alphabet.entry(unit.clone()).or_insert_with(|| token.clone());
            }
        }

        // Stable sort keeps data-file order among units of equal length.
        let mut units_by_length = data.ipa_phones.clone();
        units_by_length.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        units_by_length.retain(|u| !u.is_empty());

        let similarity = match &data.similarity_groups {
            Some(groups) => SimilarityTable::from_groups(groups),
            None => SimilarityTable::default_groups(),
        };

        let inventory = Self {
            alphabet_to_phonetic,
            phonetic_to_alphabet,
            phonetic_alphabet: data.ipa_phones.into_iter().collect(),
            units_by_length,
            merge_pairs,
            equiv_pairs,
            canonical_form,
            variant_normalization: data.normalize_ipa_variants,
            similarity,
        };

        info!(
            units = inventory.phonetic_alphabet.len(),
            merge_rules = inventory.merge_pairs.len(),
            equiv_rules = inventory.equiv_pairs.len(),
            variants = inventory.variant_normalization.len(),
            "phonetic inventory ready"
        );
        Ok(inventory)
    }

    /// Parse an inventory from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: InventoryData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    /// Load an inventory from a JSON data file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(GopError::DataNotFound { searched: vec![path.to_path_buf()] });
        }
        let bytes = std::fs::read(path)?;
        let data: InventoryData = serde_json::from_slice(&bytes)?;
        info!(path = %path.display(), "loading phonetic inventory");
        Self::from_data(data)
    }

    /// Load the inventory from the first data file found in:
    /// 1. `$GOPSCORE_DATA`
    /// 2. `<crate dir>/data/ipa_data.json`
    /// 3. `<cwd>/data/ipa_data.json`
    pub fn load_default() -> Result<Self> {
        let candidates = default_data_paths();
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::load(path),
            None => Err(GopError::DataNotFound { searched: candidates }),
        }
    }

    // ── Lookups ───────────────────────────────────────────────────────────────

    /// `true` if `unit` is a member of the phonetic alphabet.
    pub fn is_unit(&self, unit: &str) -> bool {
        self.phonetic_alphabet.contains(unit)
    }

    /// Alphabet units, longest first (by character count).
    pub fn units_by_length(&self) -> &[String] {
        &self.units_by_length
    }

    pub fn merge_pairs(&self) -> &PairTable {
        &self.merge_pairs
    }

    pub fn equiv_pairs(&self) -> &PairTable {
        &self.equiv_pairs
    }

    /// Canonical representative of `unit`'s equivalence group, or `unit` itself.
    pub fn canonical<'a>(&'a self, unit: &'a str) -> &'a str {
        self.canonical_form.get(unit).map(String::as_str).unwrap_or(unit)
    }

    /// Normalized form of a surface variant, or `unit` itself.
    pub fn normalize<'a>(&'a self, unit: &'a str) -> &'a str {
        self.variant_normalization.get(unit).map(String::as_str).unwrap_or(unit)
    }

    pub(crate) fn similarity_table(&self) -> &SimilarityTable {
        &self.similarity
    }

    // ── Alphabet conversion ───────────────────────────────────────────────────

    /// Convert source-alphabet tokens (ARPAbet) to phonetic units.
    ///
    /// With `ignore_stress`, digits are stripped first (`AH0` → `AH`).
    /// Tokens without a mapping become `"[TOKEN]"` so they stay visible.
    pub fn to_phonetic<S: AsRef<str>>(&self, tokens: &[S], ignore_stress: bool) -> Vec<String> {
        tokens
            .iter()
            .map(|token| {
                let token = token.as_ref();
                let clean: String = if ignore_stress {
                    token.chars().filter(|c| !c.is_ascii_digit()).collect()
                } else {
                    token.to_string()
                };
                match self.alphabet_to_phonetic.get(&clean) {
                    Some(unit) if !unit.is_empty() => unit.clone(),
                    _ => format!("[{clean}]"),
                }
            })
            .collect()
    }

    /// Source-alphabet token that produces `unit`, if any.
    pub fn to_alphabet(&self, unit: &str) -> Option<&str> {
        self.phonetic_to_alphabet.get(unit).map(String::as_str)
    }
}

fn default_data_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = std::env::var_os(DATA_ENV_VAR) {
        paths.push(PathBuf::from(p));
    }
    paths.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(DATA_FILE_NAME));
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("data").join(DATA_FILE_NAME));
    }
    paths
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
