use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by gopscore.
///
/// Only loading can fail: once a [`PhoneticInventory`](crate::inventory::PhoneticInventory)
/// exists, tokenization, alignment, segmentation and scoring are infallible.
#[derive(Debug, Error)]
pub enum GopError {
    #[error("phonetic data file not found (searched: {searched:?})")]
    DataNotFound { searched: Vec<PathBuf> },

    #[error("invalid phonetic data: {0}")]
    InvalidData(String),

    #[error("unknown segmentation policy '{0}' (expected marker or even-split)")]
    UnknownPolicy(String),

    #[error("dictionary line {line}: {message}")]
    Dictionary { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GopError>;
