//! End-to-end scoring against the shipped `data/ipa_data.json`.

use std::{io::Write, path::PathBuf, sync::Arc};

use approx::assert_relative_eq;
use gopscore::{
    CmuDict, ErrorKind, Label, PhoneticInventory, PronunciationScorer, ScoreOptions, SegmentationPolicy,
};

const DICT: &str = ";;; fixture\n\
                    the DH AH0\n\
                    the(2) DH IY0\n\
                    cat K AE1 T\n\
                    sat S AE1 T\n";

fn data_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("ipa_data.json")
}

fn inventory() -> PhoneticInventory {
    PhoneticInventory::load(&data_path()).expect("shipped data file should load")
}

fn scorer() -> PronunciationScorer {
    let dict = CmuDict::parse(DICT).unwrap();
    PronunciationScorer::new(Arc::new(inventory())).with_lexicon(dict)
}

#[test]
fn test_shipped_inventory_conversions() {
    let inv = inventory();
    assert_eq!(inv.to_phonetic(&["HH", "AH0", "L", "OW1"], true), vec!["h", "ʌ", "l", "oʊ"]);
    assert_eq!(inv.to_phonetic(&["SIL", "XX"], true), vec!["[SIL]", "[XX]"]);
    assert_eq!(inv.to_alphabet("tʃ"), Some("CH"));
    assert_eq!(inv.tokenize("tʃeɪn"), vec!["tʃ", "eɪ", "n"]);
    assert_eq!(inv.tokenize("d ʒ ɔ ɪ"), vec!["dʒ", "ɔɪ"]);
}

#[test]
fn test_shipped_canonical_map_is_idempotent() {
    let inv = inventory();
    for unit in inv.units_by_length() {
        let once = inv.canonical(unit);
        assert_eq!(inv.canonical(once), once, "canonical form of {unit} is not stable");
    }
    assert_eq!(inv.canonical("ə"), "ʌ");
    assert_eq!(inv.canonical("ɚ"), "ɝ");
}

#[test]
fn test_shipped_similarity() {
    let inv = inventory();
    assert_eq!(inv.similarity("ə", "ʌ"), 1.0);
    assert_eq!(inv.similarity("æ", "ʌ"), 0.7);
    assert_eq!(inv.similarity("p", "b"), 0.7);
    assert_eq!(inv.similarity("p", "k"), 0.0);
    assert_eq!(inv.similarity("ɒ", "ɑ"), 1.0, "variant normalization applies");
}

#[test]
fn test_perfect_reading() {
    let r = scorer().score("The cat sat.", &["▁ðʌ", "▁kæt", "▁sæt"], &ScoreOptions::default());
    assert_eq!(r.overall_score, 100);
    assert_eq!(r.words.len(), 3);
    assert!(r.words.iter().all(|w| w.label == Label::Excellent));
    assert_eq!(r.target_ipa, "ð ʌ k æ t s æ t");
}

#[test]
fn test_equivalent_vowel_costs_nothing() {
    let r = scorer().score("the cat sat", &["▁ðə", "▁kæt", "▁sæt"], &ScoreOptions::default());
    assert_eq!(r.overall_score, 100);
    let the = &r.words[0];
    assert_eq!(the.errors.len(), 1, "ə vs ʌ is still reported");
    assert_eq!(the.errors[0].severity, 0.0);
}

#[test]
fn test_similar_vowel_substitution() {
    let r = scorer().score("the cat sat", &["▁ðʌ", "▁kʌt", "▁sæt"], &ScoreOptions::default());
    let cat = &r.words[1];
    assert_eq!(cat.errors.len(), 1);
    assert_eq!(cat.errors[0].kind, ErrorKind::Substitution);
    assert_eq!(cat.errors[0].position, 1);
    assert_relative_eq!(cat.errors[0].severity, 0.3, epsilon = 1e-9);
    assert_relative_eq!(cat.accuracy, 0.9, epsilon = 1e-9);
    assert_eq!(cat.label, Label::Excellent);
    assert_eq!(r.overall_score, 96);
}

#[test]
fn test_unrelated_vowel_substitution() {
    let r = scorer().score("the cat sat", &["▁ðʌ", "▁kɛt", "▁sæt"], &ScoreOptions::default());
    assert_eq!(r.words[1].label, Label::Good);
    assert_eq!(r.overall_score, 87);
}

#[test]
fn test_missing_trailing_word() {
    let r = scorer().score("the cat sat", &["▁ðʌ", "▁kæt"], &ScoreOptions::default());
    let sat = &r.words[2];
    assert_eq!(sat.predicted_ipa, None);
    assert_eq!(sat.errors.len(), 3);
    assert!(sat.errors.iter().all(|e| e.kind == ErrorKind::Deletion));
    assert_eq!(sat.label, Label::NeedsWork);
    assert_eq!(r.overall_score, 62);
}

#[test]
fn test_extra_chunk_merges_into_neighbour() {
    let r = scorer().score("the cat sat", &["▁ðʌ", "▁kæt", "▁ə", "▁sæt"], &ScoreOptions::default());
    let cat = &r.words[1];
    assert_eq!(cat.predicted_ipa.as_deref(), Some("k æ t ə"));
    assert_eq!(cat.errors.len(), 1);
    assert_eq!(cat.errors[0].kind, ErrorKind::Insertion);
    assert_eq!(cat.errors[0].position, 2);
    assert_eq!(r.overall_score, 90);
}

#[test]
fn test_even_split_policy() {
    let opts = ScoreOptions { policy: SegmentationPolicy::EvenSplit, ..ScoreOptions::default() };
    let r = scorer().score("cat sat", &["k", "æ", "t", "s", "æ", "t"], &opts);
    assert_eq!(r.overall_score, 100);
    assert_eq!(r.words[1].predicted_ipa.as_deref(), Some("s æ t"));
}

#[test]
fn test_report_rounding_and_nulls() {
    let r = scorer().score("the cat sat", &["▁ðʌ", "▁kʌt"], &ScoreOptions::default());
    let value: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
    assert_eq!(value["words"][1]["errors"][0]["severity"], 0.3);
    assert_eq!(value["words"][1]["accuracy"], 0.9);
    assert!(value["words"][2]["predicted_ipa"].is_null());
    assert_eq!(value["words"][2]["error_count"], 3);
    assert_eq!(value["metadata"]["total_phonemes"], 8);
}

#[test]
fn test_dictionary_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DICT.as_bytes()).unwrap();
    let scorer = PronunciationScorer::from_paths(Some(data_path().as_path()), Some(file.path())).unwrap();
    let r = scorer.score("cat", &["kæt"], &ScoreOptions::default());
    assert_eq!(r.overall_score, 100);
}

#[test]
fn test_missing_data_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = PhoneticInventory::load(&dir.path().join("ipa_data.json")).unwrap_err();
    assert!(matches!(err, gopscore::GopError::DataNotFound { .. }), "got: {err}");
}
