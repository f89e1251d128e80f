use arrow::error::ArrowError;
use thiserror::Error;

use crate::kind::{Key, StreamKey, ValueKind};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("already writing")]
    AlreadyWriting,

    #[error("must be writing to call {op}")]
    NotWriting { op: &'static str },

    #[error("{stream}: can't advance `{key}` without setting it")]
    AdvanceWithoutSet { stream: StreamKey, key: String },

    #[error("{stream}: `{key}` must be set before advance_all")]
    UnsetAppender { stream: StreamKey, key: String },

    #[error("{stream}: `{key}` is set, but not advanced")]
    NotAdvanced { stream: StreamKey, key: String },

    #[error(
        "{stream}: appenders are not in sync, `{first}` is at pos {first_pos} but `{other}` is at pos {other_pos}"
    )]
    OutOfSync {
        stream: StreamKey,
        first: String,
        first_pos: u64,
        other: String,
        other_pos: u64,
    },

    #[error("type mismatch for `{key}`: expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: String,
        got: String,
    },

    #[error("key `{key}` not found")]
    KeyNotFound { key: String },

    #[error("{stream} not found")]
    StreamNotFound { stream: StreamKey },

    #[error("column {column} out of bounds for a stream of {len} columns")]
    ColumnOutOfBounds { column: usize, len: usize },

    #[error("duplicate key `{key}`")]
    DuplicateKey { key: String },

    #[error("unsupported kind {kind} for `{key}`")]
    UnsupportedKind { key: String, kind: ValueKind },

    #[error("conversion error: {0}")]
    Conversion(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl SinkError {
    pub(crate) fn type_mismatch(key: &Key, got: impl ToString) -> Self {
        SinkError::TypeMismatch {
            key: key.name().to_string(),
            expected: key.kind().to_string(),
            got: got.to_string(),
        }
    }

    pub(crate) fn key_not_found(key: &Key) -> Self {
        SinkError::KeyNotFound {
            key: key.name().to_string(),
        }
    }
}
