//! Protobuf producer: decodes protobuf messages into stream rows.
//!
//! Each field of the root message maps to one column through a typed
//! extraction function, so the same functions can also be composed with the
//! transforms in [`crate::function`] before binding.

mod schema;
mod transcoder;

pub use schema::{field_kind, ProtobufSchema};
pub use transcoder::{field_function, record_writer, transcode};

use thiserror::Error;

use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum ProtobufError {
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("failed to create descriptor pool: {0}")]
    DescriptorPool(String),

    #[error("message type not found: {0}")]
    MessageNotFound(String),

    #[error("unsupported field {field} of kind {kind}")]
    UnsupportedField { field: String, kind: String },

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}
