//! Binding of record-level extraction functions to stream columns.
//!
//! A [`RecordWriter`] is a registration table: one [`TypedFunction`] per
//! column key. Binding it to a stream checks every column kind up front, so
//! the per-record path only dispatches on the function variant.

use tracing::debug;

use crate::function::TypedFunction;
use crate::kind::{Key, Keys, NullSentinel};
use crate::sink::{column_of, SinkError, Stream};

/// Column extraction functions over records of type `T`.
pub struct RecordWriter<T> {
    fields: Vec<(Key, TypedFunction<T>)>,
}

impl<T: 'static> RecordWriter<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Registers `f` as the producer for `key`.
    pub fn field(mut self, key: Key, f: impl Into<TypedFunction<T>>) -> Self {
        self.fields.push((key, f.into()));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Key, &TypedFunction<T>)> {
        self.fields.iter().map(|(k, f)| (k, f))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The stream keys for this writer, in registration order.
    pub fn keys(&self) -> Result<Keys, SinkError> {
        Keys::builder()
            .add_all(self.fields.iter().map(|(key, _)| key.clone()))
            .build()
    }

    /// Resolves each registered key to a column of `stream` and checks that
    /// the function produces the column's kind.
    pub fn bind(&self, stream: &dyn Stream) -> Result<BoundWriter<T>, SinkError> {
        let mut columns = Vec::with_capacity(self.fields.len());
        for (key, f) in &self.fields {
            let column = column_of(stream.keys(), key)?;
            let kind = f.kind();
            if kind != *key.kind() {
                return Err(SinkError::type_mismatch(key, kind));
            }
            columns.push(BoundColumn {
                column,
                f: f.clone(),
            });
        }
        debug!(columns = columns.len(), "bound record writer");
        Ok(BoundWriter { columns })
    }
}

impl<T: 'static> Default for RecordWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct BoundColumn<T> {
    column: usize,
    f: TypedFunction<T>,
}

/// A [`RecordWriter`] resolved against one stream's columns.
pub struct BoundWriter<T> {
    columns: Vec<BoundColumn<T>>,
}

fn set_primitive<V: NullSentinel>(
    stream: &mut dyn Stream,
    column: usize,
    value: V,
    set: impl FnOnce(&mut dyn Stream, usize, V) -> Result<(), SinkError>,
) -> Result<(), SinkError> {
    if value.is_null() {
        stream.set_null(column)
    } else {
        set(stream, column, value)
    }
}

impl<T: 'static> BoundWriter<T> {
    /// Writes one record as one row and advances every column.
    pub fn write(&self, stream: &mut dyn Stream, record: &T) -> Result<(), SinkError> {
        for BoundColumn { column, f } in &self.columns {
            let column = *column;
            match f {
                TypedFunction::Boolean(g) => stream.set_boolean(column, g.apply(record))?,
                TypedFunction::Char(g) => {
                    set_primitive(stream, column, g.apply(record), |s, c, v| s.set_char(c, v))?
                }
                TypedFunction::Byte(g) => {
                    set_primitive(stream, column, g.apply(record), |s, c, v| s.set_byte(c, v))?
                }
                TypedFunction::Short(g) => {
                    set_primitive(stream, column, g.apply(record), |s, c, v| s.set_short(c, v))?
                }
                TypedFunction::Int(g) => {
                    set_primitive(stream, column, g.apply(record), |s, c, v| s.set_int(c, v))?
                }
                TypedFunction::Long(g) => {
                    set_primitive(stream, column, g.apply(record), |s, c, v| s.set_long(c, v))?
                }
                TypedFunction::Float(g) => {
                    set_primitive(stream, column, g.apply(record), |s, c, v| s.set_float(c, v))?
                }
                TypedFunction::Double(g) => {
                    set_primitive(stream, column, g.apply(record), |s, c, v| s.set_double(c, v))?
                }
                TypedFunction::Object(g) => match g.apply(record) {
                    Some(value) => stream.set_object(column, value)?,
                    None => stream.set_null(column)?,
                },
            }
        }
        stream.advance_all()
    }

    /// Reserves capacity for `records`, then writes each as one row.
    pub fn write_all(&self, stream: &mut dyn Stream, records: &[T]) -> Result<(), SinkError> {
        stream.ensure_remaining_capacity(records.len())?;
        for record in records {
            self.write(stream, record)?;
        }
        Ok(())
    }
}
