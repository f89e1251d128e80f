//! Strict verification decorator.
//!
//! [`of`] wraps a sink so that every protocol and row-consistency violation
//! fails at the call that commits it, with a distinct error:
//!
//! - `writing()` while already writing.
//! - `sync()`, `ensure_remaining_capacity`, `advance_all`, `set_*` or
//!   `advance` while idle.
//! - `advance` on a column that was not set since its last advance.
//! - `advance_all` with an unset column, or with columns at differing
//!   positions (checked before anything is committed).
//! - `sync()` with a column that is set but not advanced, or with columns of
//!   one stream at differing positions.
//!
//! Setting a column more than once before advancing is allowed; the last value
//! wins.
//!
//! Every check scans the stream's columns, so this is meant for tests and
//! development builds rather than the hot path.

use tracing::warn;

use crate::kind::{Keys, Object, StreamKey};
use crate::sink::{column_key, Coordinator, CoordinatorState, Sink, SinkError, Stream};

/// Wraps the coordinator and every stream of `sink` in strict checks.
///
/// The sink must be idle.
pub fn of(sink: Sink) -> Sink {
    let (coordinator, streams) = sink.into_parts();
    let streams = streams
        .into_iter()
        .map(|(key, stream)| {
            let strict: Box<dyn Stream> = Box::new(StrictStream::new(key, stream));
            (key, strict)
        })
        .collect();
    Sink::from_parts(Box::new(StrictCoordinator::new(coordinator)), streams)
}

fn reject(err: SinkError) -> SinkError {
    warn!(error = %err, "strict check failed");
    err
}

struct StrictCoordinator {
    delegate: Box<dyn Coordinator>,
    state: CoordinatorState,
}

impl StrictCoordinator {
    fn new(delegate: Box<dyn Coordinator>) -> Self {
        Self {
            delegate,
            state: CoordinatorState::default(),
        }
    }
}

impl Coordinator for StrictCoordinator {
    fn writing(&mut self) -> Result<(), SinkError> {
        self.state.begin().map_err(reject)?;
        self.delegate.writing()
    }

    fn check_sync(&self) -> Result<(), SinkError> {
        self.state.ensure_writing("sync").map_err(reject)?;
        self.delegate.check_sync()
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        self.state.end().map_err(reject)?;
        self.delegate.sync()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnState {
    pos: u64,
    is_set: bool,
}

struct StrictStream {
    stream_key: StreamKey,
    delegate: Box<dyn Stream>,
    columns: Vec<ColumnState>,
    writing: bool,
}

impl StrictStream {
    fn new(stream_key: StreamKey, delegate: Box<dyn Stream>) -> Self {
        let columns = vec![ColumnState::default(); delegate.keys().len()];
        Self {
            stream_key,
            delegate,
            columns,
            writing: false,
        }
    }

    fn check_writing(&self, op: &'static str) -> Result<(), SinkError> {
        if self.writing {
            Ok(())
        } else {
            Err(reject(SinkError::NotWriting { op }))
        }
    }

    fn name(&self, column: usize) -> String {
        self.delegate
            .keys()
            .get(column)
            .map(|k| k.name().to_string())
            .unwrap_or_default()
    }

    fn column_mut(&mut self, column: usize) -> Result<&mut ColumnState, SinkError> {
        let len = self.columns.len();
        self.columns
            .get_mut(column)
            .ok_or_else(|| reject(SinkError::ColumnOutOfBounds { column, len }))
    }

    /// Checks writing and bounds ahead of a `set_*` call.
    fn before_set(&self, column: usize) -> Result<(), SinkError> {
        self.check_writing("set")?;
        column_key(self.delegate.keys(), column).map_err(reject)?;
        Ok(())
    }

    fn after_set(&mut self, column: usize) -> Result<(), SinkError> {
        self.column_mut(column)?.is_set = true;
        Ok(())
    }

    fn check_all_set(&self) -> Result<(), SinkError> {
        match self.columns.iter().position(|c| !c.is_set) {
            Some(column) => Err(reject(SinkError::UnsetAppender {
                stream: self.stream_key,
                key: self.name(column),
            })),
            None => Ok(()),
        }
    }

    fn check_none_set(&self) -> Result<(), SinkError> {
        match self.columns.iter().position(|c| c.is_set) {
            Some(column) => Err(reject(SinkError::NotAdvanced {
                stream: self.stream_key,
                key: self.name(column),
            })),
            None => Ok(()),
        }
    }

    fn check_in_sync(&self) -> Result<(), SinkError> {
        let Some(first) = self.columns.first() else {
            return Ok(());
        };
        match self.columns.iter().position(|c| c.pos != first.pos) {
            Some(other) => Err(reject(SinkError::OutOfSync {
                stream: self.stream_key,
                first: self.name(0),
                first_pos: first.pos,
                other: self.name(other),
                other_pos: self.columns[other].pos,
            })),
            None => Ok(()),
        }
    }
}

macro_rules! strict_set {
    ($($set:ident: $ty:ty),* $(,)?) => {
        $(
            fn $set(&mut self, column: usize, value: $ty) -> Result<(), SinkError> {
                self.before_set(column)?;
                self.delegate.$set(column, value)?;
                self.after_set(column)
            }
        )*
    };
}

impl Stream for StrictStream {
    fn keys(&self) -> &Keys {
        self.delegate.keys()
    }

    fn ensure_remaining_capacity(&mut self, n: usize) -> Result<(), SinkError> {
        self.check_writing("ensure_remaining_capacity")?;
        self.delegate.ensure_remaining_capacity(n)
    }

    fn advance_all(&mut self) -> Result<(), SinkError> {
        self.check_writing("advance_all")?;
        self.check_all_set()?;
        self.check_in_sync()?;
        self.delegate.advance_all()?;
        for column in &mut self.columns {
            column.is_set = false;
            column.pos += 1;
        }
        Ok(())
    }

    strict_set! {
        set_boolean: bool,
        set_char: u16,
        set_byte: i8,
        set_short: i16,
        set_int: i32,
        set_long: i64,
        set_float: f32,
        set_double: f64,
        set_object: Object,
        set_timestamp_nanos: i64,
    }

    fn set_null(&mut self, column: usize) -> Result<(), SinkError> {
        self.before_set(column)?;
        self.delegate.set_null(column)?;
        self.after_set(column)
    }

    fn advance(&mut self, column: usize) -> Result<(), SinkError> {
        self.check_writing("advance")?;
        if !self.column_mut(column)?.is_set {
            return Err(reject(SinkError::AdvanceWithoutSet {
                stream: self.stream_key,
                key: self.name(column),
            }));
        }
        self.delegate.advance(column)?;
        let state = &mut self.columns[column];
        state.is_set = false;
        state.pos += 1;
        Ok(())
    }

    fn pos(&self, column: usize) -> Option<u64> {
        self.columns.get(column).map(|c| c.pos)
    }

    fn on_writing(&mut self) -> Result<(), SinkError> {
        self.writing = true;
        self.delegate.on_writing()
    }

    fn verify(&self) -> Result<(), SinkError> {
        self.check_writing("sync")?;
        self.check_none_set()?;
        self.check_in_sync()?;
        self.delegate.verify()
    }

    fn on_sync(&mut self) -> Result<(), SinkError> {
        self.writing = false;
        self.delegate.on_sync()
    }
}
