//! Scoring entry point: script + predicted tokens → [`PronunciationResult`].
//!
//! Targets come from the lower-cased script words via the dictionary / G2P
//! chain. The flat prediction is every token tokenized as one stream with
//! markers turned into spaces. Both sides are variant-normalized before
//! per-word alignment.

use std::{collections::HashMap, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    aggregate::{overall_accuracy, overall_score, Aggregator, Thresholds},
    align::{total_severity, Aligner},
    ctc::PhonemeDecoder,
    error::Result,
    inventory::PhoneticInventory,
    lexicon::{extract_words, CmuDict, Grapheme2Phoneme, Lexicon, TargetResolver},
    segment::{flat_units, SegmentationPolicy, Segmenter},
    types::{PronunciationResult, ResultMetadata},
};

/// Acoustic model recorded in result metadata when none is given.
pub const DEFAULT_MODEL_ID: &str = "mrrubino/wav2vec2-large-xlsr-53-l2-arctic-phoneme";

/// Per-request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreOptions {
    /// Upstream model identifier, echoed in metadata and passed to decoders.
    pub model_id: String,
    pub thresholds: Thresholds,
    pub policy: SegmentationPolicy,
    /// Align words on the rayon pool.
    pub parallel: bool,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            thresholds: Thresholds::default(),
            policy: SegmentationPolicy::default(),
            parallel: true,
        }
    }
}

/// Long-lived scoring engine. Cheap to share: every request only reads it.
pub struct PronunciationScorer {
    inventory: Arc<PhoneticInventory>,
    lexicon: Box<dyn Lexicon>,
    g2p: Option<Box<dyn Grapheme2Phoneme>>,
}

impl PronunciationScorer {
    /// Scorer with an empty dictionary and no G2P; every word falls back to
    /// itself until a lexicon is attached.
    pub fn new(inventory: Arc<PhoneticInventory>) -> Self {
        Self {
            inventory,
            lexicon: Box::new(HashMap::<String, Vec<String>>::new()),
            g2p: None,
        }
    }

    pub fn with_lexicon(mut self, lexicon: impl Lexicon + 'static) -> Self {
        self.lexicon = Box::new(lexicon);
        self
    }

    pub fn with_g2p(mut self, g2p: impl Grapheme2Phoneme + 'static) -> Self {
        self.g2p = Some(Box::new(g2p));
        self
    }

    /// Load the inventory (default search path when `data` is `None`) and,
    /// optionally, a CMU-format dictionary.
    pub fn from_paths(data: Option<&Path>, dict: Option<&Path>) -> Result<Self> {
        let inventory = match data {
            Some(path) => PhoneticInventory::load(path)?,
            None => PhoneticInventory::load_default()?,
        };
        let scorer = Self::new(Arc::new(inventory));
        Ok(match dict {
            Some(path) => scorer.with_lexicon(CmuDict::load(path)?),
            None => scorer,
        })
    }

    pub fn inventory(&self) -> &PhoneticInventory {
        &self.inventory
    }

    fn resolver(&self) -> TargetResolver<'_> {
        TargetResolver::new(&self.inventory, self.lexicon.as_ref()).with_g2p(self.g2p.as_deref())
    }

    /// Target units for each word of `script`, paired with the words.
    pub fn targets(&self, script: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let words = extract_words(script);
        let targets = self.resolver().resolve(&words);
        (words, targets)
    }

    /// Score an already-decoded token stream against `script`.
    ///
    /// An empty `tokens` list is valid and scores every word as fully deleted.
    pub fn score<S: AsRef<str>>(&self, script: &str, tokens: &[S], opts: &ScoreOptions) -> PronunciationResult {
        let inv = self.inventory.as_ref();

        let predicted = flat_units(inv, tokens);
        let (words, targets) = self.targets(script);
        info!(words = words.len(), tokens = tokens.len(), units = predicted.len(), "scoring request");

        let chunks = Segmenter::new(inv).segment(tokens, &predicted, &targets, opts.policy);

        let norm_targets: Vec<Vec<String>> = targets.iter().map(|t| inv.normalize_variants(t)).collect();
        let norm_chunks: Vec<Vec<String>> = chunks.iter().map(|c| inv.normalize_variants(c)).collect();

        let aggregator = Aggregator::new(Aligner::new(inv), opts.thresholds);
        let word_scores = aggregator.score_words(&words, &norm_targets, &norm_chunks, opts.parallel);

        let global_errors: Vec<_> = word_scores.iter().flat_map(|w| w.errors.iter().cloned()).collect();
        let flat_target: Vec<&str> = targets.iter().flatten().map(String::as_str).collect();
        let accuracy = overall_accuracy(total_severity(&global_errors), flat_target.len());
        let score = overall_score(accuracy);

        info!(score, errors = global_errors.len(), "scored");

        PronunciationResult {
            overall_score: score,
            accuracy,
            metadata: ResultMetadata {
                model_used: opts.model_id.clone(),
                thresholds: opts.thresholds.as_pair(),
                total_phonemes: flat_target.len(),
                error_count: global_errors.len(),
            },
            target_ipa: flat_target.join(" "),
            predicted_ipa: chunks.iter().flatten().map(String::as_str).collect::<Vec<_>>().join(" "),
            words: word_scores,
            global_errors,
        }
    }

    /// Decode `samples` with `decoder`, then [`score`](Self::score).
    ///
    /// A decoder failure is logged and scored as "nothing predicted".
    pub fn score_audio(
        &self,
        decoder: &dyn PhonemeDecoder,
        samples: &[f32],
        script: &str,
        opts: &ScoreOptions,
    ) -> PronunciationResult {
        let tokens = decoder.decode(samples, &opts.model_id).unwrap_or_else(|e| {
            warn!(model = %opts.model_id, error = %e, "decoder failed; scoring without predicted tokens");
            Vec::new()
        });
        self.score(script, &tokens, opts)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        inventory::tests::test_inventory,
        types::{ErrorKind, Label},
    };

    fn scorer() -> PronunciationScorer {
        let dict: HashMap<String, Vec<String>> = [
            ("cat", "K AE1 T"),
            ("dog", "D AO1 G"),
            ("play", "P L EY1"),
        ]
        .into_iter()
        .map(|(w, p)| (w.to_string(), p.split_whitespace().map(str::to_string).collect()))
        .collect();
        PronunciationScorer::new(Arc::new(test_inventory())).with_lexicon(dict)
    }

    struct FixedDecoder(Vec<&'static str>);

    impl PhonemeDecoder for FixedDecoder {
        fn decode(&self, _samples: &[f32], _model_id: &str) -> anyhow::Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct BrokenDecoder;

    impl PhonemeDecoder for BrokenDecoder {
        fn decode(&self, _samples: &[f32], model_id: &str) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("model {model_id} unavailable")
        }
    }

    #[test]
    fn test_perfect_two_word_utterance() {
        let tokens = ["▁k", "æ", "t", "▁", "d", "ɔ", "ɡ"];
        let r = scorer().score("Cat, dog.", &tokens, &ScoreOptions::default());
        assert_eq!(r.overall_score, 100);
        assert_eq!(r.words.len(), 2);
        assert_eq!(r.words[0].predicted_ipa.as_deref(), Some("k æ t"));
        assert_eq!(r.words[1].predicted_ipa.as_deref(), Some("d ɔ ɡ"));
        assert!(r.global_errors.is_empty());
        assert_eq!(r.target_ipa, "k æ t d ɔ ɡ");
        assert_eq!(r.predicted_ipa, "k æ t d ɔ ɡ");
    }

    #[test]
    fn test_no_tokens_is_all_deletions() {
        let r = scorer().score::<&str>("play", &[], &ScoreOptions::default());
        assert_eq!(r.overall_score, 0);
        assert_eq!(r.accuracy, 0.0);
        assert_eq!(r.words[0].label, Label::NeedsWork);
        assert_eq!(r.words[0].predicted_ipa, None);
        assert_eq!(r.global_errors.len(), 3);
        assert!(r.global_errors.iter().all(|e| e.kind == ErrorKind::Deletion));
        assert_eq!(r.metadata.total_phonemes, 3);
        assert_eq!(r.metadata.error_count, 3);
        assert_eq!(r.predicted_ipa, "");
    }

    #[test]
    fn test_variants_normalized_before_alignment() {
        // "g" (U+0067) is not in the alphabet; normalization maps it to "ɡ".
        let r = scorer().score("dog", &["▁dɔg"], &ScoreOptions::default());
        assert_eq!(r.overall_score, 100, "got: {:?}", r.global_errors);
        assert_eq!(r.words[0].predicted_ipa.as_deref(), Some("d ɔ ɡ"));
        assert_eq!(r.predicted_ipa, "d ɔ g", "top-level rendering keeps surface units");
    }

    #[test]
    fn test_unknown_word_falls_back_to_itself() {
        let r = scorer().score("zyx", &["k"], &ScoreOptions::default());
        assert_eq!(r.words[0].target_ipa, "zyx");
        assert_eq!(r.global_errors.len(), 1);
        assert_eq!(r.global_errors[0].kind, ErrorKind::Substitution);
    }

    #[test]
    fn test_metadata_echoes_options() {
        let opts = ScoreOptions {
            model_id: "local-test".into(),
            thresholds: Thresholds::new(0.1, 0.2),
            policy: SegmentationPolicy::EvenSplit,
            parallel: false,
        };
        let r = scorer().score("cat", &["kæt"], &opts);
        assert_eq!(r.metadata.model_used, "local-test");
        assert_eq!(r.metadata.thresholds, (0.1, 0.2));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let tokens = ["▁k", "ɛ", "t", "▁d", "ɔ", "▁p", "l", "eɪ", "ə"];
        let mut opts = ScoreOptions::default();
        let par = scorer().score("cat dog play", &tokens, &opts);
        opts.parallel = false;
        let seq = scorer().score("cat dog play", &tokens, &opts);
        assert_eq!(par, seq);
    }

    #[test]
    fn test_empty_script() {
        let r = scorer().score("  !! ", &["▁k"], &ScoreOptions::default());
        assert!(r.words.is_empty());
        assert_eq!(r.overall_score, 0);
        assert_eq!(r.target_ipa, "");
    }

    #[test]
    fn test_score_audio_uses_decoder() {
        let decoder = FixedDecoder(vec!["kæt", "▁dɔɡ"]);
        let r = scorer().score_audio(&decoder, &[0.0; 160], "cat dog", &ScoreOptions::default());
        assert_eq!(r.overall_score, 100);
    }

    #[test]
    fn test_score_audio_decoder_failure_scores_empty() {
        let r = scorer().score_audio(&BrokenDecoder, &[], "cat", &ScoreOptions::default());
        assert_eq!(r.overall_score, 0);
        assert_eq!(r.global_errors.len(), 3);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: ScoreOptions = serde_json::from_str(r#"{"policy": "alignment"}"#).unwrap();
        assert_eq!(opts.policy, SegmentationPolicy::EvenSplit);
        assert_eq!(opts.model_id, DEFAULT_MODEL_ID);
        assert!(opts.parallel);
    }

    #[test]
    fn test_options_accept_threshold_pair() {
        let opts: ScoreOptions = serde_json::from_str(r#"{"thresholds": [0.1, 0.2]}"#).unwrap();
        assert_eq!(opts.thresholds, Thresholds::new(0.1, 0.2));
        assert_eq!(opts.policy, SegmentationPolicy::Marker);
    }
}
