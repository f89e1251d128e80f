//! In-memory Arrow sink.
//!
//! Each stream owns one Arrow builder per column. `set_*` stages a value,
//! `advance` commits it into the builder, and at every synchronization point
//! the buffered rows of each stream are finished into a `RecordBatch` and
//! handed to a [`BatchConsumer`] in a single call.

mod column;
mod sink;

pub use column::{data_type, NullEncoding};
pub use sink::{ArrowSinkBuilder, BatchCollector, BatchConsumer, Published};

/// Starts building an Arrow sink.
pub fn builder() -> ArrowSinkBuilder {
    ArrowSinkBuilder::default()
}
