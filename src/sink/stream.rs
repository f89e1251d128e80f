use chrono::DateTime;

use super::SinkError;
use crate::kind::{Key, Keys, Object};

/// An ordered bundle of columns written in lock-step.
///
/// Columns are addressed by index into [`Stream::keys`]. Each column has a
/// "current" slot filled by a `set_*` call and committed by [`Stream::advance`]
/// (one column) or [`Stream::advance_all`] (every column). Callers normally go
/// through the typed appender handles ([`super::IntAppender`] etc.), which
/// check the column kind once at bind time.
///
/// A stream is owned by a [`super::Sink`] and is only touched by the single
/// writer driving that sink.
pub trait Stream: Send {
    fn keys(&self) -> &Keys;

    /// Hint that at least `n` more rows will be written before the next
    /// capacity check.
    fn ensure_remaining_capacity(&mut self, n: usize) -> Result<(), SinkError>;

    /// Commits the current row across every column.
    fn advance_all(&mut self) -> Result<(), SinkError>;

    fn set_boolean(&mut self, column: usize, value: bool) -> Result<(), SinkError>;
    fn set_char(&mut self, column: usize, value: u16) -> Result<(), SinkError>;
    fn set_byte(&mut self, column: usize, value: i8) -> Result<(), SinkError>;
    fn set_short(&mut self, column: usize, value: i16) -> Result<(), SinkError>;
    fn set_int(&mut self, column: usize, value: i32) -> Result<(), SinkError>;
    fn set_long(&mut self, column: usize, value: i64) -> Result<(), SinkError>;
    fn set_float(&mut self, column: usize, value: f32) -> Result<(), SinkError>;
    fn set_double(&mut self, column: usize, value: f64) -> Result<(), SinkError>;
    fn set_object(&mut self, column: usize, value: Object) -> Result<(), SinkError>;

    /// Sets a timestamp column from epoch nanoseconds.
    fn set_timestamp_nanos(&mut self, column: usize, nanos: i64) -> Result<(), SinkError> {
        self.set_object(column, Object::Timestamp(DateTime::from_timestamp_nanos(nanos)))
    }

    /// Sets the current slot to null: the kind's sentinel for primitives,
    /// `None` for generic columns.
    fn set_null(&mut self, column: usize) -> Result<(), SinkError>;

    /// Commits the current slot of one column.
    fn advance(&mut self, column: usize) -> Result<(), SinkError>;

    /// Rows committed to `column` since the stream was created, if tracked.
    fn pos(&self, _column: usize) -> Option<u64> {
        None
    }

    /// Called by the sink after its coordinator enters writing.
    fn on_writing(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Called by the sink on every stream before any of them is synced.
    fn verify(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Called by the sink at a synchronization point, before its coordinator
    /// leaves writing.
    fn on_sync(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// The key of `column`, or `ColumnOutOfBounds`.
pub fn column_key(keys: &Keys, column: usize) -> Result<&Key, SinkError> {
    keys.get(column).ok_or(SinkError::ColumnOutOfBounds {
        column,
        len: keys.len(),
    })
}

/// The column index of `key`, or `KeyNotFound`.
pub fn column_of(keys: &Keys, key: &Key) -> Result<usize, SinkError> {
    keys.index_of(key).ok_or_else(|| SinkError::key_not_found(key))
}
