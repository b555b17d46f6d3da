//! # gopscore
//!
//! Phoneme alignment and pronunciation scoring ("goodness of pronunciation").
//!
//! Compares the phonemes a reader *should* have produced for a script against
//! the phonemes an acoustic model *heard*, and reports per-word and overall
//! quality with every substitution, deletion and insertion located.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::{path::Path, sync::Arc};
//! use gopscore::{CmuDict, PhoneticInventory, PronunciationScorer, ScoreOptions};
//!
//! let inventory = PhoneticInventory::load_default().unwrap();
//! let dict = CmuDict::load(Path::new("cmudict.dict")).unwrap();
//! let scorer = PronunciationScorer::new(Arc::new(inventory)).with_lexicon(dict);
//!
//! // Tokens as emitted by a CTC phoneme recognizer; `▁` opens a new word.
//! let tokens = ["▁kæt", "▁dɔɡ"];
//! let result = scorer.score("cat dog", &tokens, &ScoreOptions::default());
//! println!("{}", result.to_json().unwrap());
//! ```
//!
//! ## Pipeline
//! 1. **Targets** — script words → dictionary / G2P → phonetic units.
//! 2. **Tokenization** — decoder tokens → canonical units (longest match,
//!    merge rules, equivalence rules).
//! 3. **Segmentation** — predicted units split into one chunk per word.
//! 4. **Alignment** — edit-distance path per word, discrepancies graded by
//!    phonetic similarity.
//! 5. **Aggregation** — accuracy, labels, `overall_score`.
//!
//! Acoustic inference is not part of this crate; plug one in through
//! [`ctc::PhonemeDecoder`].

pub mod aggregate;
pub mod align;
pub mod ctc;
pub mod error;

// C FFI for mobile hosts — exposes gopscore_scorer_load / score_json / free.
pub mod ffi;

pub mod inventory;
pub mod lexicon;
pub mod report;
pub mod scorer;
pub mod segment;
pub mod similarity;
pub mod tokenize;
pub mod types;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use aggregate::Thresholds;
pub use error::{GopError, Result};
pub use inventory::PhoneticInventory;
pub use lexicon::{CmuDict, Grapheme2Phoneme, Lexicon};
pub use report::ScoreReport;
pub use scorer::{PronunciationScorer, ScoreOptions};
pub use segment::SegmentationPolicy;
pub use types::{ErrorKind, Label, PhonemeError, PronunciationResult, WordScore};
