//! Errors raised while building trace inputs

use thiserror::Error;

/// Errors produced while decoding bytecode, stack words or trace JSON
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("invalid bytecode: odd hex length ({0} digits)")]
    OddHexLength(usize),

    #[error("invalid bytecode: {0}")]
    InvalidHex(hex::FromHexError),

    #[error("invalid word {0:?}: expected decimal or 0x-prefixed hex")]
    InvalidWord(String),

    #[error("invalid trace json: {0}")]
    Json(#[from] serde_json::Error),
}
