//! Arrow-backed sink: columns accumulate in builders and are published as
//! `RecordBatch`es at each synchronization point.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::column::{Column, NullEncoding};
use crate::kind::{Keys, Object, StreamKey, ValueKind};
use crate::sink::{column_key, Coordinator, CoordinatorState, Sink, SinkError, Stream};

/// Batches delivered at one synchronization point, in stream order.
pub type Published = Vec<(StreamKey, RecordBatch)>;

/// Receives the batches of each synchronization point.
///
/// Streams with no rows since the previous point are left out. `accept` is not
/// called when no stream has rows.
pub trait BatchConsumer: Send {
    fn accept(&mut self, batches: Published);
}

impl<F> BatchConsumer for F
where
    F: FnMut(Published) + Send,
{
    fn accept(&mut self, batches: Published) {
        self(batches)
    }
}

/// A consumer that keeps every publication for later inspection.
#[derive(Clone, Default)]
pub struct BatchCollector {
    published: Arc<Mutex<Vec<Published>>>,
}

impl BatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the publications received so far.
    pub fn take(&self) -> Vec<Published> {
        std::mem::take(&mut *self.published.lock())
    }
}

impl BatchConsumer for BatchCollector {
    fn accept(&mut self, batches: Published) {
        self.published.lock().push(batches);
    }
}

type Staging = Arc<Mutex<Published>>;

pub struct ArrowSinkBuilder {
    streams: Vec<(StreamKey, Keys)>,
    capacity: usize,
    null_encoding: NullEncoding,
}

impl Default for ArrowSinkBuilder {
    fn default() -> Self {
        Self {
            streams: Vec::new(),
            capacity: 1024,
            null_encoding: NullEncoding::default(),
        }
    }
}

impl ArrowSinkBuilder {
    pub fn stream(mut self, key: StreamKey, keys: Keys) -> Self {
        self.streams.push((key, keys));
        self
    }

    /// Initial per-column builder capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn null_encoding(mut self, null_encoding: NullEncoding) -> Self {
        self.null_encoding = null_encoding;
        self
    }

    /// Fails with `UnsupportedKind` if any column has no Arrow mapping.
    pub fn build(self, consumer: impl BatchConsumer + 'static) -> Result<Sink, SinkError> {
        let staging = Staging::default();
        let mut builder = Sink::builder(ArrowCoordinator {
            state: CoordinatorState::default(),
            staging: staging.clone(),
            consumer: Box::new(consumer),
        });
        for (stream_key, keys) in self.streams {
            let stream = ArrowStream::new(
                stream_key,
                keys,
                self.capacity,
                self.null_encoding,
                staging.clone(),
            )?;
            builder = builder.stream(stream_key, stream);
        }
        Ok(builder.build())
    }
}

struct ArrowCoordinator {
    state: CoordinatorState,
    staging: Staging,
    consumer: Box<dyn BatchConsumer>,
}

impl Coordinator for ArrowCoordinator {
    fn writing(&mut self) -> Result<(), SinkError> {
        self.state.begin()
    }

    fn check_sync(&self) -> Result<(), SinkError> {
        self.state.ensure_writing("sync")
    }

    fn sync(&mut self) -> Result<(), SinkError> {
        self.state.end()?;
        let batches = std::mem::take(&mut *self.staging.lock());
        if !batches.is_empty() {
            debug!(streams = batches.len(), "publishing batches");
            self.consumer.accept(batches);
        }
        Ok(())
    }
}

struct ArrowStream {
    stream_key: StreamKey,
    keys: Keys,
    schema: SchemaRef,
    columns: Vec<Column>,
    staging: Staging,
    writing: bool,
}

impl ArrowStream {
    fn new(
        stream_key: StreamKey,
        keys: Keys,
        capacity: usize,
        null_encoding: NullEncoding,
        staging: Staging,
    ) -> Result<Self, SinkError> {
        let columns = keys
            .iter()
            .map(|key| Column::new(key.clone(), capacity, null_encoding))
            .collect::<Result<Vec<_>, _>>()?;
        let schema = Arc::new(Schema::new(
            columns.iter().map(Column::field).collect::<Vec<_>>(),
        ));
        Ok(Self {
            stream_key,
            keys,
            schema,
            columns,
            staging,
            writing: false,
        })
    }

    /// Builders only change between `writing` and `sync`.
    fn check_writing(&self, op: &'static str) -> Result<(), SinkError> {
        if self.writing {
            Ok(())
        } else {
            Err(SinkError::NotWriting { op })
        }
    }

    fn column(&mut self, column: usize) -> Result<&mut Column, SinkError> {
        self.check_writing("set")?;
        column_key(&self.keys, column)?;
        Ok(&mut self.columns[column])
    }

    fn set_primitive(
        &mut self,
        column: usize,
        kind: ValueKind,
        value: Object,
    ) -> Result<(), SinkError> {
        self.column(column)?.set_primitive(kind, value)
    }

    /// Buffered rows, or `OutOfSync` if the columns disagree.
    fn rows(&self) -> Result<usize, SinkError> {
        let Some(first) = self.columns.first() else {
            return Ok(0);
        };
        let rows = first.rows();
        match self.columns.iter().find(|c| c.rows() != rows) {
            Some(ragged) => Err(SinkError::OutOfSync {
                stream: self.stream_key,
                first: first.key().name().to_string(),
                first_pos: first.committed(),
                other: ragged.key().name().to_string(),
                other_pos: ragged.committed(),
            }),
            None => Ok(rows),
        }
    }

    /// Finishes the buffered rows into a batch.
    fn finish(&mut self) -> Result<Option<RecordBatch>, SinkError> {
        let rows = self.rows()?;
        if rows == 0 {
            return Ok(None);
        }
        let arrays: Vec<ArrayRef> = self.columns.iter_mut().map(Column::finish).collect();
        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        Ok(Some(RecordBatch::try_new_with_options(
            self.schema.clone(),
            arrays,
            &options,
        )?))
    }
}

impl Stream for ArrowStream {
    fn keys(&self) -> &Keys {
        &self.keys
    }

    fn ensure_remaining_capacity(&mut self, n: usize) -> Result<(), SinkError> {
        self.check_writing("ensure_remaining_capacity")?;
        let mut reserved = 0;
        for column in &mut self.columns {
            if column.reserve(n) {
                reserved += 1;
            }
        }
        trace!(stream = %self.stream_key, n, reserved, "reserved capacity");
        Ok(())
    }

    fn advance_all(&mut self) -> Result<(), SinkError> {
        self.check_writing("advance_all")?;
        for column in &self.columns {
            column.check()?;
        }
        for column in &mut self.columns {
            column.advance()?;
        }
        Ok(())
    }

    fn set_boolean(&mut self, column: usize, value: bool) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Boolean, Object::Boolean(value))
    }

    fn set_char(&mut self, column: usize, value: u16) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Char, Object::Char(value))
    }

    fn set_byte(&mut self, column: usize, value: i8) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Byte, Object::Byte(value))
    }

    fn set_short(&mut self, column: usize, value: i16) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Short, Object::Short(value))
    }

    fn set_int(&mut self, column: usize, value: i32) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Int, Object::Int(value))
    }

    fn set_long(&mut self, column: usize, value: i64) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Long, Object::Long(value))
    }

    fn set_float(&mut self, column: usize, value: f32) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Float, Object::Float(value))
    }

    fn set_double(&mut self, column: usize, value: f64) -> Result<(), SinkError> {
        self.set_primitive(column, ValueKind::Double, Object::Double(value))
    }

    fn set_object(&mut self, column: usize, value: Object) -> Result<(), SinkError> {
        self.column(column)?.set_object(value)
    }

    fn set_null(&mut self, column: usize) -> Result<(), SinkError> {
        self.column(column)?.set_null();
        Ok(())
    }

    fn advance(&mut self, column: usize) -> Result<(), SinkError> {
        self.check_writing("advance")?;
        column_key(&self.keys, column)?;
        self.columns[column].advance()
    }

    fn pos(&self, column: usize) -> Option<u64> {
        self.columns.get(column).map(Column::committed)
    }

    fn on_writing(&mut self) -> Result<(), SinkError> {
        self.writing = true;
        Ok(())
    }

    fn verify(&self) -> Result<(), SinkError> {
        self.rows().map(drop)
    }

    fn on_sync(&mut self) -> Result<(), SinkError> {
        self.writing = false;
        if let Some(batch) = self.finish()? {
            debug!(stream = %self.stream_key, rows = batch.num_rows(), "staged batch");
            self.staging.lock().push((self.stream_key, batch));
        }
        Ok(())
    }
}
