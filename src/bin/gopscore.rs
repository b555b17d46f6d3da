//! Command-line pronunciation scorer.
//!
//! ```text
//! gopscore --script "cat dog" --tokens "▁k æ t ▁d ɔ ɡ" --dict cmudict.dict
//! ```
//!
//! Prints the score report as pretty JSON on stdout; logs go to stderr
//! (`RUST_LOG=gopscore=debug` for segmentation details).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gopscore::{PronunciationScorer, ScoreOptions, SegmentationPolicy, Thresholds};
use tracing::info;

#[derive(Parser)]
#[command(name = "gopscore")]
#[command(about = "Score pronunciation of decoded phoneme tokens against a script", long_about = None)]
struct Cli {
    /// Reference text the speaker was asked to read
    #[arg(short, long)]
    script: String,

    /// Whitespace-separated decoder tokens (`▁` or `|` marks a new word)
    #[arg(short, long, conflicts_with = "tokens_file")]
    tokens: Option<String>,

    /// File holding a JSON array of tokens, or whitespace-separated tokens
    #[arg(long)]
    tokens_file: Option<PathBuf>,

    /// Phonetic inventory data file (default: $GOPSCORE_DATA or ./data/ipa_data.json)
    #[arg(long)]
    data: Option<PathBuf>,

    /// CMU-format pronunciation dictionary
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Error-rate threshold for label 1 (excellent)
    #[arg(long, default_value_t = 0.15)]
    excellent: f64,

    /// Error-rate threshold for label 2 (good)
    #[arg(long, default_value_t = 0.35)]
    good: f64,

    /// How predicted phonemes are split into words: marker, or even-split (alias alignment)
    #[arg(long, default_value = "marker")]
    policy: SegmentationPolicy,

    /// Acoustic model identifier recorded in the result metadata
    #[arg(long, default_value = gopscore::scorer::DEFAULT_MODEL_ID)]
    model: String,

    /// Align words on the current thread only
    #[arg(long)]
    sequential: bool,
}

fn read_tokens(cli: &Cli) -> Result<Vec<String>> {
    if let Some(path) = &cli.tokens_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tokens file {}", path.display()))?;
        if text.trim_start().starts_with('[') {
            return serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON token array in {}", path.display()));
        }
        return Ok(text.split_whitespace().map(str::to_string).collect());
    }
    Ok(cli
        .tokens
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gopscore=info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.excellent > cli.good {
        bail!("--excellent ({}) must not exceed --good ({})", cli.excellent, cli.good);
    }

    let tokens = read_tokens(&cli)?;
    let scorer = PronunciationScorer::from_paths(cli.data.as_deref(), cli.dict.as_deref())
        .context("Failed to load scorer")?;
    info!(tokens = tokens.len(), "scorer ready");

    let opts = ScoreOptions {
        model_id: cli.model.clone(),
        thresholds: Thresholds::new(cli.excellent, cli.good),
        policy: cli.policy,
        parallel: !cli.sequential,
    };
    let result = scorer.score(&cli.script, &tokens, &opts);
    println!("{}", result.to_json_pretty()?);
    Ok(())
}
