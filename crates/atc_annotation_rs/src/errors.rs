use std::path::PathBuf;

use thiserror::Error;
#[derive(Error, Debug)]
pub enum Error {
    #[error("Std Io Error!")]
    StdIo(#[from] std::io::Error),
    #[error("No grammar available at {path:?}")]
    GrammarUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed grammar row {row}: {reason}")]
    MalformedGrammarRow { row: usize, reason: String },
    #[error("Invalid confidence value {value:?} on token {token:?}")]
    InvalidConfidence { token: String, value: String },
    #[error("Invalid {kind} frame: {frame}")]
    InvalidFrame { kind: &'static str, frame: String },
    #[error("Search exceeded its hard deadline of {0:?}")]
    Timeout(std::time::Duration),
    #[error("Ron deserialization failed!")]
    RonDeserialize(#[from] ron::error::SpannedError),
    #[error("Aviation Helper")]
    AviationHelper(#[from] aviation_helper_rs::errors::Error),
}
