//! Kind-typed handles over one column of a [`Stream`].
//!
//! A handle borrows the stream mutably and checks the column's kind once, when
//! it is bound. After that `set`/`set_null`/`advance` go straight to the
//! stream's per-kind methods, with no boxing for primitive kinds.

use chrono::{DateTime, Utc};

use super::stream::{column_key, column_of};
use super::{SinkError, Stream};
use crate::kind::{
    epoch_nanos_from_double, epoch_nanos_from_long, GenericKind, Key, Object, RoundingMode,
    TimeUnit, ValueKind,
};

/// Fails unless `column` exists and `accept` holds for its kind.
fn bind(
    stream: &dyn Stream,
    column: usize,
    accept: impl FnOnce(&ValueKind) -> bool,
    expected: &str,
) -> Result<(), SinkError> {
    let key = column_key(stream.keys(), column)?;
    if accept(key.kind()) {
        Ok(())
    } else {
        Err(SinkError::TypeMismatch {
            key: key.name().to_string(),
            expected: expected.to_string(),
            got: key.kind().to_string(),
        })
    }
}

macro_rules! primitive_appender {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $kind:ident, $set:ident) => {
        $(#[$doc])*
        pub struct $name<'a> {
            stream: &'a mut dyn Stream,
            column: usize,
        }

        impl<'a> $name<'a> {
            /// Binds to the column of `key`, failing if it is absent or of
            /// another kind.
            pub fn get(stream: &'a mut dyn Stream, key: &Key) -> Result<Self, SinkError> {
                let column = column_of(stream.keys(), key)?;
                Self::at(stream, column)
            }

            /// Like [`Self::get`], but `Ok(None)` when the key is absent.
            pub fn get_if_present(
                stream: &'a mut dyn Stream,
                key: &Key,
            ) -> Result<Option<Self>, SinkError> {
                match stream.keys().index_of(key) {
                    Some(column) => Self::at(stream, column).map(Some),
                    None => Ok(None),
                }
            }

            pub fn at(stream: &'a mut dyn Stream, column: usize) -> Result<Self, SinkError> {
                bind(
                    &*stream,
                    column,
                    |kind| *kind == ValueKind::$kind,
                    ValueKind::$kind.to_string().as_str(),
                )?;
                Ok(Self { stream, column })
            }

            pub fn column(&self) -> usize {
                self.column
            }

            pub fn set(&mut self, value: $ty) -> Result<(), SinkError> {
                self.stream.$set(self.column, value)
            }

            pub fn set_null(&mut self) -> Result<(), SinkError> {
                self.stream.set_null(self.column)
            }

            pub fn advance(&mut self) -> Result<(), SinkError> {
                self.stream.advance(self.column)
            }

            pub fn pos(&self) -> Option<u64> {
                self.stream.pos(self.column)
            }
        }
    };
}

primitive_appender!(BooleanAppender, bool, Boolean, set_boolean);
primitive_appender!(
    /// Appender for UTF-16 code units.
    CharAppender,
    u16,
    Char,
    set_char
);
primitive_appender!(ByteAppender, i8, Byte, set_byte);
primitive_appender!(ShortAppender, i16, Short, set_short);
primitive_appender!(IntAppender, i32, Int, set_int);
primitive_appender!(LongAppender, i64, Long, set_long);
primitive_appender!(FloatAppender, f32, Float, set_float);
primitive_appender!(DoubleAppender, f64, Double, set_double);

/// Appender for a generic column. Values are checked against the column's
/// generic sub-tag before they reach the stream.
pub struct ObjectAppender<'a> {
    stream: &'a mut dyn Stream,
    column: usize,
    kind: GenericKind,
}

impl<'a> ObjectAppender<'a> {
    pub fn get(stream: &'a mut dyn Stream, key: &Key) -> Result<Self, SinkError> {
        let column = column_of(stream.keys(), key)?;
        Self::at(stream, column)
    }

    pub fn get_if_present(stream: &'a mut dyn Stream, key: &Key) -> Result<Option<Self>, SinkError> {
        match stream.keys().index_of(key) {
            Some(column) => Self::at(stream, column).map(Some),
            None => Ok(None),
        }
    }

    pub fn at(stream: &'a mut dyn Stream, column: usize) -> Result<Self, SinkError> {
        let key = column_key(stream.keys(), column)?;
        let kind = match key.kind() {
            ValueKind::Generic(g) => g.clone(),
            other => {
                return Err(SinkError::TypeMismatch {
                    key: key.name().to_string(),
                    expected: "generic".to_string(),
                    got: other.to_string(),
                })
            }
        };
        Ok(Self {
            stream,
            column,
            kind,
        })
    }

    pub fn kind(&self) -> &GenericKind {
        &self.kind
    }

    pub fn set(&mut self, value: Object) -> Result<(), SinkError> {
        if !value.is_instance(&self.kind) {
            let key = column_key(self.stream.keys(), self.column)?;
            return Err(SinkError::type_mismatch(key, value.describe()));
        }
        self.stream.set_object(self.column, value)
    }

    /// Sets `value`, or null for `None`.
    pub fn set_option(&mut self, value: Option<Object>) -> Result<(), SinkError> {
        match value {
            Some(v) => self.set(v),
            None => self.set_null(),
        }
    }

    pub fn set_null(&mut self) -> Result<(), SinkError> {
        self.stream.set_null(self.column)
    }

    pub fn advance(&mut self) -> Result<(), SinkError> {
        self.stream.advance(self.column)
    }

    pub fn pos(&self) -> Option<u64> {
        self.stream.pos(self.column)
    }
}

fn bind_timestamp(stream: &dyn Stream, column: usize) -> Result<(), SinkError> {
    bind(
        stream,
        column,
        |kind| *kind == ValueKind::timestamp(),
        "timestamp",
    )
}

/// Appender for a timestamp column.
///
/// The epoch views write through to the same column, so using a view is
/// observably identical to using this appender.
pub struct TimestampAppender<'a> {
    stream: &'a mut dyn Stream,
    column: usize,
}

impl<'a> TimestampAppender<'a> {
    pub fn get(stream: &'a mut dyn Stream, key: &Key) -> Result<Self, SinkError> {
        let column = column_of(stream.keys(), key)?;
        Self::at(stream, column)
    }

    pub fn at(stream: &'a mut dyn Stream, column: usize) -> Result<Self, SinkError> {
        bind_timestamp(&*stream, column)?;
        Ok(Self { stream, column })
    }

    pub fn set(&mut self, value: DateTime<Utc>) -> Result<(), SinkError> {
        self.stream.set_object(self.column, Object::Timestamp(value))
    }

    pub fn set_epoch_nanos(&mut self, nanos: i64) -> Result<(), SinkError> {
        self.stream.set_timestamp_nanos(self.column, nanos)
    }

    pub fn set_null(&mut self) -> Result<(), SinkError> {
        self.stream.set_null(self.column)
    }

    pub fn advance(&mut self) -> Result<(), SinkError> {
        self.stream.advance(self.column)
    }

    pub fn pos(&self) -> Option<u64> {
        self.stream.pos(self.column)
    }

    /// View that accepts epoch longs in `unit`.
    pub fn as_epoch_long(&mut self, unit: TimeUnit) -> EpochLongAppender<'_> {
        EpochLongAppender {
            stream: &mut *self.stream,
            column: self.column,
            unit,
        }
    }

    /// View that accepts fractional epoch values in `unit`, rounded to whole
    /// nanoseconds with `rounding`.
    pub fn as_epoch_double(
        &mut self,
        unit: TimeUnit,
        rounding: RoundingMode,
    ) -> EpochDoubleAppender<'_> {
        EpochDoubleAppender {
            stream: &mut *self.stream,
            column: self.column,
            unit,
            rounding,
        }
    }
}

pub struct EpochLongAppender<'a> {
    stream: &'a mut dyn Stream,
    column: usize,
    unit: TimeUnit,
}

impl<'a> EpochLongAppender<'a> {
    pub fn get(stream: &'a mut dyn Stream, key: &Key, unit: TimeUnit) -> Result<Self, SinkError> {
        let column = column_of(stream.keys(), key)?;
        bind_timestamp(&*stream, column)?;
        Ok(Self {
            stream,
            column,
            unit,
        })
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn set(&mut self, value: i64) -> Result<(), SinkError> {
        let nanos = epoch_nanos_from_long(value, self.unit).ok_or_else(|| {
            SinkError::Conversion(format!("{}{} overflows epoch nanoseconds", value, self.unit))
        })?;
        self.stream.set_timestamp_nanos(self.column, nanos)
    }

    pub fn set_null(&mut self) -> Result<(), SinkError> {
        self.stream.set_null(self.column)
    }

    pub fn advance(&mut self) -> Result<(), SinkError> {
        self.stream.advance(self.column)
    }

    pub fn pos(&self) -> Option<u64> {
        self.stream.pos(self.column)
    }
}

pub struct EpochDoubleAppender<'a> {
    stream: &'a mut dyn Stream,
    column: usize,
    unit: TimeUnit,
    rounding: RoundingMode,
}

impl<'a> EpochDoubleAppender<'a> {
    pub fn get(
        stream: &'a mut dyn Stream,
        key: &Key,
        unit: TimeUnit,
        rounding: RoundingMode,
    ) -> Result<Self, SinkError> {
        let column = column_of(stream.keys(), key)?;
        bind_timestamp(&*stream, column)?;
        Ok(Self {
            stream,
            column,
            unit,
            rounding,
        })
    }

    pub fn set(&mut self, value: f64) -> Result<(), SinkError> {
        let nanos = epoch_nanos_from_double(value, self.unit, self.rounding).ok_or_else(|| {
            SinkError::Conversion(format!(
                "{}{} is not representable as epoch nanoseconds with {:?} rounding",
                value, self.unit, self.rounding
            ))
        })?;
        self.stream.set_timestamp_nanos(self.column, nanos)
    }

    pub fn set_null(&mut self) -> Result<(), SinkError> {
        self.stream.set_null(self.column)
    }

    pub fn advance(&mut self) -> Result<(), SinkError> {
        self.stream.advance(self.column)
    }

    pub fn pos(&self) -> Option<u64> {
        self.stream.pos(self.column)
    }
}
