//! Store errors

use recordchain_core::RecordError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Journal IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Journal serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt journal at line {line}: {reason}")]
    CorruptJournal { line: usize, reason: String },

    #[error("Journal sequence gap at line {line}: expected {expected}, got {actual}")]
    SequenceGap { line: usize, expected: u64, actual: u64 },

    #[error("Journal unusable after failed append: {0}")]
    JournalPoisoned(String),
}

impl From<StoreError> for RecordError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CorruptJournal { .. } => RecordError::Encoding(err.to_string()),
            other => RecordError::Storage(other.to_string()),
        }
    }
}
