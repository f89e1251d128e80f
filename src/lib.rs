//! Typed column sinks for columnar ingestion.
//!
//! Producers write rows into a [`sink::Sink`]: a coordinator plus streams of
//! lock-step columns, each column bound to one [`kind::ValueKind`]. Concrete
//! sinks in this crate:
//!
//! - [`arrow`]: buffers rows in Arrow builders and publishes a `RecordBatch`
//!   per stream at every synchronization point.
//! - [`logging`]: emits a `tracing` event for every call.
//! - [`strict`]: wraps any sink with protocol and row-consistency checks.
//!
//! Producers extract column values with the kind-specialized functions in
//! [`function`], bind them to columns with [`adapter::RecordWriter`], and
//! [`protobuf`] builds such writers from protobuf descriptors.

pub mod adapter;
pub mod arrow;
pub mod config;
pub mod function;
pub mod kind;
pub mod logging;
pub mod protobuf;
pub mod sink;
pub mod strict;

pub use config::SinkConfig;
pub use kind::{Key, Keys, Object, StreamKey, ValueKind};
pub use sink::{Sink, SinkError, Stream};
