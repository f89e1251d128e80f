//! One Arrow-backed column: a builder plus the pending slot of the current row.

use std::sync::Arc;

use arrow::array::{
    ArrayBuilder, ArrayRef, BooleanBuilder, Float32Builder, Float64Builder, Int16Builder,
    Int32Builder, Int64Builder, Int8Builder, ListArray, PrimitiveBuilder, StringBuilder,
    TimestampNanosecondBuilder, UInt16Builder,
};
use arrow::buffer::{NullBuffer, OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{ArrowPrimitiveType, DataType, Field, TimeUnit as ArrowTimeUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kind::{GenericKind, Key, NullSentinel, Object, ValueKind};
use crate::sink::SinkError;

/// How nulls reach primitive Arrow arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullEncoding {
    /// Nulls, and top-level values equal to the kind's null sentinel, are
    /// written to the validity bitmap. List elements are stored verbatim.
    #[default]
    Validity,
    /// Nulls are written as the kind's null sentinel value. Boolean, string
    /// and list columns have no sentinel and always use the validity bitmap.
    Sentinel,
}

/// Arrow type for a column of `kind`, `None` for kinds with no Arrow mapping.
pub fn data_type(kind: &ValueKind) -> Option<DataType> {
    let data_type = match kind {
        ValueKind::Boolean => DataType::Boolean,
        ValueKind::Char => DataType::UInt16,
        ValueKind::Byte => DataType::Int8,
        ValueKind::Short => DataType::Int16,
        ValueKind::Int => DataType::Int32,
        ValueKind::Long => DataType::Int64,
        ValueKind::Float => DataType::Float32,
        ValueKind::Double => DataType::Float64,
        ValueKind::Generic(generic) => match generic {
            GenericKind::String => DataType::Utf8,
            GenericKind::Timestamp => DataType::Timestamp(ArrowTimeUnit::Nanosecond, None),
            GenericKind::Boxed(p) => return data_type(&ValueKind::from(*p)),
            GenericKind::Array(element) => {
                DataType::List(Arc::new(Field::new("item", data_type(element)?, true)))
            }
            GenericKind::Custom(_) => return None,
        },
    };
    Some(data_type)
}

enum Builder {
    Boolean(BooleanBuilder),
    Char(UInt16Builder),
    Byte(Int8Builder),
    Short(Int16Builder),
    Int(Int32Builder),
    Long(Int64Builder),
    Float(Float32Builder),
    Double(Float64Builder),
    String(StringBuilder),
    TimestampNs(TimestampNanosecondBuilder),
    List(ListState),
}

/// State for building a variable-length list.
struct ListState {
    element: Box<Builder>,
    offsets: Vec<i32>,
    /// One entry per list, true when valid.
    nulls: Vec<bool>,
    element_type: DataType,
}

impl ListState {
    fn close(&mut self, len: usize, valid: bool) -> Result<(), SinkError> {
        let last = self.offsets.last().copied().unwrap_or(0);
        let next = i32::try_from(len)
            .ok()
            .and_then(|len| last.checked_add(len))
            .ok_or_else(|| SinkError::Conversion("list offsets overflow i32".to_string()))?;
        self.offsets.push(next);
        self.nulls.push(valid);
        Ok(())
    }
}

fn append_native<T>(builder: &mut PrimitiveBuilder<T>, value: T::Native, sentinel_nulls: bool)
where
    T: ArrowPrimitiveType,
    T::Native: NullSentinel,
{
    if !sentinel_nulls && value.is_null() {
        builder.append_null();
    } else {
        builder.append_value(value);
    }
}

fn append_native_null<T>(builder: &mut PrimitiveBuilder<T>, sentinel_nulls: bool)
where
    T: ArrowPrimitiveType,
    T::Native: NullSentinel,
{
    if sentinel_nulls {
        builder.append_value(T::Native::NULL);
    } else {
        builder.append_null();
    }
}

fn epoch_nanos(v: &DateTime<Utc>) -> Result<i64, SinkError> {
    v.timestamp_nanos_opt()
        .ok_or_else(|| SinkError::Conversion(format!("{v} is out of range for epoch nanoseconds")))
}

fn cannot_append(value: &Object) -> SinkError {
    SinkError::Conversion(format!("cannot append {} to this column", value.describe()))
}

impl Builder {
    fn new(kind: &ValueKind, capacity: usize) -> Option<Self> {
        let builder = match kind {
            ValueKind::Boolean => Builder::Boolean(BooleanBuilder::with_capacity(capacity)),
            ValueKind::Char => Builder::Char(UInt16Builder::with_capacity(capacity)),
            ValueKind::Byte => Builder::Byte(Int8Builder::with_capacity(capacity)),
            ValueKind::Short => Builder::Short(Int16Builder::with_capacity(capacity)),
            ValueKind::Int => Builder::Int(Int32Builder::with_capacity(capacity)),
            ValueKind::Long => Builder::Long(Int64Builder::with_capacity(capacity)),
            ValueKind::Float => Builder::Float(Float32Builder::with_capacity(capacity)),
            ValueKind::Double => Builder::Double(Float64Builder::with_capacity(capacity)),
            ValueKind::Generic(generic) => match generic {
                GenericKind::String => {
                    Builder::String(StringBuilder::with_capacity(capacity, capacity * 16))
                }
                GenericKind::Timestamp => {
                    Builder::TimestampNs(TimestampNanosecondBuilder::with_capacity(capacity))
                }
                GenericKind::Boxed(p) => return Self::new(&ValueKind::from(*p), capacity),
                GenericKind::Array(element) => Builder::List(ListState {
                    element: Box::new(Self::new(element, capacity)?),
                    offsets: vec![0],
                    nulls: Vec::with_capacity(capacity),
                    element_type: data_type(element)?,
                }),
                GenericKind::Custom(_) => return None,
            },
        };
        Some(builder)
    }

    fn len(&self) -> usize {
        match self {
            Builder::Boolean(b) => b.len(),
            Builder::Char(b) => b.len(),
            Builder::Byte(b) => b.len(),
            Builder::Short(b) => b.len(),
            Builder::Int(b) => b.len(),
            Builder::Long(b) => b.len(),
            Builder::Float(b) => b.len(),
            Builder::Double(b) => b.len(),
            Builder::String(b) => b.len(),
            Builder::TimestampNs(b) => b.len(),
            Builder::List(state) => state.nulls.len(),
        }
    }

    fn append_null(&mut self, sentinel_nulls: bool) -> Result<(), SinkError> {
        match self {
            Builder::Boolean(b) => b.append_null(),
            Builder::Char(b) => append_native_null(b, sentinel_nulls),
            Builder::Byte(b) => append_native_null(b, sentinel_nulls),
            Builder::Short(b) => append_native_null(b, sentinel_nulls),
            Builder::Int(b) => append_native_null(b, sentinel_nulls),
            Builder::Long(b) => append_native_null(b, sentinel_nulls),
            Builder::Float(b) => append_native_null(b, sentinel_nulls),
            Builder::Double(b) => append_native_null(b, sentinel_nulls),
            Builder::String(b) => b.append_null(),
            Builder::TimestampNs(b) => append_native_null(b, sentinel_nulls),
            Builder::List(state) => state.close(0, false)?,
        }
        Ok(())
    }

    /// Fails if `value` cannot be appended, without touching the builder.
    fn check(&self, value: &Object) -> Result<(), SinkError> {
        match (self, value) {
            (Builder::Boolean(_), Object::Boolean(_))
            | (Builder::Char(_), Object::Char(_))
            | (Builder::Byte(_), Object::Byte(_))
            | (Builder::Short(_), Object::Short(_))
            | (Builder::Int(_), Object::Int(_))
            | (Builder::Long(_), Object::Long(_))
            | (Builder::Float(_), Object::Float(_))
            | (Builder::Double(_), Object::Double(_))
            | (Builder::String(_), Object::String(_)) => Ok(()),
            (Builder::TimestampNs(_), Object::Timestamp(v)) => epoch_nanos(v).map(drop),
            (Builder::List(state), Object::Array(values)) => {
                values.iter().try_for_each(|v| state.element.check(v))
            }
            (_, value) => Err(cannot_append(value)),
        }
    }

    fn append(&mut self, value: &Object, sentinel_nulls: bool) -> Result<(), SinkError> {
        match (self, value) {
            (Builder::Boolean(b), Object::Boolean(v)) => b.append_value(*v),
            (Builder::Char(b), Object::Char(v)) => append_native(b, *v, sentinel_nulls),
            (Builder::Byte(b), Object::Byte(v)) => append_native(b, *v, sentinel_nulls),
            (Builder::Short(b), Object::Short(v)) => append_native(b, *v, sentinel_nulls),
            (Builder::Int(b), Object::Int(v)) => append_native(b, *v, sentinel_nulls),
            (Builder::Long(b), Object::Long(v)) => append_native(b, *v, sentinel_nulls),
            (Builder::Float(b), Object::Float(v)) => append_native(b, *v, sentinel_nulls),
            (Builder::Double(b), Object::Double(v)) => append_native(b, *v, sentinel_nulls),
            (Builder::String(b), Object::String(v)) => b.append_value(v),
            (Builder::TimestampNs(b), Object::Timestamp(v)) => {
                append_native(b, epoch_nanos(v)?, sentinel_nulls)
            }
            (Builder::List(state), Object::Array(values)) => {
                // All or nothing, so a bad element cannot leave children
                // without an offset.
                values.iter().try_for_each(|v| state.element.check(v))?;
                // Elements are never null, so sentinel values are data.
                for v in values.iter() {
                    state.element.append(v, true)?;
                }
                state.close(values.len(), true)?
            }
            (_, value) => return Err(cannot_append(value)),
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Builder::Boolean(b) => Arc::new(b.finish()),
            Builder::Char(b) => Arc::new(b.finish()),
            Builder::Byte(b) => Arc::new(b.finish()),
            Builder::Short(b) => Arc::new(b.finish()),
            Builder::Int(b) => Arc::new(b.finish()),
            Builder::Long(b) => Arc::new(b.finish()),
            Builder::Float(b) => Arc::new(b.finish()),
            Builder::Double(b) => Arc::new(b.finish()),
            Builder::String(b) => Arc::new(b.finish()),
            Builder::TimestampNs(b) => Arc::new(b.finish()),
            Builder::List(state) => {
                let values = state.element.finish();
                let offsets = OffsetBuffer::new(ScalarBuffer::from(std::mem::replace(
                    &mut state.offsets,
                    vec![0],
                )));
                let nulls_vec = std::mem::take(&mut state.nulls);
                let nulls = if nulls_vec.iter().all(|&n| n) {
                    None
                } else {
                    Some(NullBuffer::from(nulls_vec))
                };
                let field = Arc::new(Field::new("item", state.element_type.clone(), true));
                Arc::new(ListArray::new(field, offsets, values, nulls))
            }
        }
    }
}

/// The current row's slot.
enum Slot {
    Empty,
    Null,
    Value(Object),
}

pub(crate) struct Column {
    key: Key,
    data_type: DataType,
    builder: Builder,
    slot: Slot,
    sentinel_nulls: bool,
    committed: u64,
}

impl Column {
    pub(crate) fn new(key: Key, capacity: usize, nulls: NullEncoding) -> Result<Self, SinkError> {
        let unsupported = || SinkError::UnsupportedKind {
            key: key.name().to_string(),
            kind: key.kind().clone(),
        };
        let data_type = data_type(key.kind()).ok_or_else(unsupported)?;
        let builder = Builder::new(key.kind(), capacity).ok_or_else(unsupported)?;
        Ok(Self {
            key,
            data_type,
            builder,
            slot: Slot::Empty,
            sentinel_nulls: nulls == NullEncoding::Sentinel,
            committed: 0,
        })
    }

    pub(crate) fn field(&self) -> Field {
        Field::new(self.key.name(), self.data_type.clone(), true)
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    /// Rows committed since the last [`Column::finish`].
    pub(crate) fn rows(&self) -> usize {
        self.builder.len()
    }

    /// Rows committed since the column was created.
    pub(crate) fn committed(&self) -> u64 {
        self.committed
    }

    /// Stages a primitive value after checking it matches the column kind.
    pub(crate) fn set_primitive(&mut self, kind: ValueKind, value: Object) -> Result<(), SinkError> {
        if *self.key.kind() != kind {
            return Err(SinkError::type_mismatch(&self.key, kind));
        }
        self.slot = Slot::Value(value);
        Ok(())
    }

    pub(crate) fn set_object(&mut self, value: Object) -> Result<(), SinkError> {
        match self.key.kind() {
            ValueKind::Generic(generic) if value.is_instance(generic) => {
                self.slot = Slot::Value(value);
                Ok(())
            }
            _ => Err(SinkError::type_mismatch(&self.key, value.describe())),
        }
    }

    pub(crate) fn set_null(&mut self) {
        self.slot = Slot::Null;
    }

    /// Fails if [`Column::advance`] would reject the staged value.
    pub(crate) fn check(&self) -> Result<(), SinkError> {
        match &self.slot {
            Slot::Value(value) => self.builder.check(value),
            Slot::Empty | Slot::Null => Ok(()),
        }
    }

    /// Commits the slot. An empty slot commits a null. A rejected value stays
    /// staged.
    pub(crate) fn advance(&mut self) -> Result<(), SinkError> {
        self.check()?;
        match std::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Empty | Slot::Null => self.builder.append_null(self.sentinel_nulls)?,
            Slot::Value(value) => self.builder.append(&value, self.sentinel_nulls)?,
        }
        self.committed += 1;
        Ok(())
    }

    /// Recreates the builder with room for `n` rows if nothing is buffered.
    pub(crate) fn reserve(&mut self, n: usize) -> bool {
        if self.builder.len() != 0 {
            return false;
        }
        match Builder::new(self.key.kind(), n) {
            Some(builder) => {
                self.builder = builder;
                true
            }
            None => false,
        }
    }

    /// Finishes the buffered rows into an array and resets the builder.
    pub(crate) fn finish(&mut self) -> ArrayRef {
        self.builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::nulls::NULL_INT;
    use crate::kind::PrimitiveKind;
    use arrow::array::{Array, Int32Array, Int8Array, StringArray, TimestampNanosecondArray};

    #[test]
    fn test_data_types() {
        assert_eq!(data_type(&ValueKind::Char), Some(DataType::UInt16));
        assert_eq!(
            data_type(&ValueKind::boxed(PrimitiveKind::Long)),
            Some(DataType::Int64)
        );
        assert_eq!(
            data_type(&ValueKind::array_of(ValueKind::Double)),
            Some(DataType::List(Arc::new(Field::new(
                "item",
                DataType::Float64,
                true
            ))))
        );
        assert_eq!(data_type(&ValueKind::custom::<u8>("U8")), None);
        assert_eq!(
            data_type(&ValueKind::array_of(ValueKind::custom::<u8>("U8"))),
            None
        );
    }

    #[test]
    fn test_custom_kind_rejected() {
        let key = Key::of("c", ValueKind::custom::<u8>("U8"));
        assert!(matches!(
            Column::new(key, 4, NullEncoding::Validity),
            Err(SinkError::UnsupportedKind { .. })
        ));
    }

    #[test]
    fn test_null_encodings() {
        let key = Key::of("x", ValueKind::Int);
        for (encoding, expected) in [
            (NullEncoding::Validity, vec![Some(1), None, None, None]),
            (
                NullEncoding::Sentinel,
                vec![Some(1), Some(NULL_INT), Some(NULL_INT), Some(NULL_INT)],
            ),
        ] {
            let mut column = Column::new(key.clone(), 4, encoding).unwrap();
            column.set_primitive(ValueKind::Int, Object::Int(1)).unwrap();
            column.advance().unwrap();
            column.set_null();
            column.advance().unwrap();
            column.advance().unwrap();
            column
                .set_primitive(ValueKind::Int, Object::Int(NULL_INT))
                .unwrap();
            column.advance().unwrap();

            let array = column.finish();
            let ints = array.as_any().downcast_ref::<Int32Array>().unwrap();
            assert_eq!(ints.iter().collect::<Vec<_>>(), expected);
            assert_eq!(column.rows(), 0);
            assert_eq!(column.committed(), 4);
        }
    }

    #[test]
    fn test_set_checks_kind() {
        let mut column = Column::new(Key::of("s", ValueKind::string()), 4, NullEncoding::Validity)
            .unwrap();
        assert!(matches!(
            column.set_primitive(ValueKind::Int, Object::Int(1)),
            Err(SinkError::TypeMismatch { .. })
        ));
        assert!(matches!(
            column.set_object(Object::Long(1)),
            Err(SinkError::TypeMismatch { .. })
        ));
        column.set_object(Object::string("a")).unwrap();
        column.set_object(Object::string("b")).unwrap();
        column.advance().unwrap();

        let array = column.finish();
        let strings = array.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(strings.value(0), "b");
    }

    #[test]
    fn test_list_column() {
        let kind = ValueKind::array_of(ValueKind::Int);
        let mut column = Column::new(Key::of("l", kind), 4, NullEncoding::Validity).unwrap();
        column
            .set_object(Object::array([Object::Int(1), Object::Int(2)]))
            .unwrap();
        column.advance().unwrap();
        column.set_null();
        column.advance().unwrap();
        column.set_object(Object::array([Object::Int(3)])).unwrap();
        column.advance().unwrap();

        let array = column.finish();
        let list = array.as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.is_null(1));
        assert_eq!(list.value_offsets(), &[0, 2, 2, 3]);
        let values = list.values().as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(&values.values()[..], &[1, 2, 3]);

        // Offsets restart after finish.
        column.set_object(Object::array([Object::Int(4)])).unwrap();
        column.advance().unwrap();
        let array = column.finish();
        let list = array.as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.value_offsets(), &[0, 1]);
    }

    #[test]
    fn test_list_elements_keep_sentinels() {
        let kind = ValueKind::array_of(ValueKind::Byte);
        let mut column = Column::new(Key::of("b", kind), 4, NullEncoding::Validity).unwrap();
        column
            .set_object(Object::array([
                Object::Byte(0x01),
                Object::Byte(i8::MIN),
                Object::Byte(-1),
            ]))
            .unwrap();
        column.advance().unwrap();

        let array = column.finish();
        let list = array.as_any().downcast_ref::<ListArray>().unwrap();
        let values = list.values().as_any().downcast_ref::<Int8Array>().unwrap();
        assert_eq!(values.null_count(), 0);
        assert_eq!(&values.values()[..], &[1, i8::MIN, -1]);
    }

    #[test]
    fn test_failed_list_append_leaves_column_intact() {
        let kind = ValueKind::array_of(ValueKind::timestamp());
        let mut column = Column::new(Key::of("ts", kind), 4, NullEncoding::Validity).unwrap();
        column
            .set_object(Object::array([
                Object::Timestamp(DateTime::from_timestamp_nanos(1)),
                Object::Timestamp(DateTime::<Utc>::MAX_UTC),
            ]))
            .unwrap();
        assert!(matches!(column.advance(), Err(SinkError::Conversion(_))));
        assert_eq!(column.rows(), 0);
        assert_eq!(column.committed(), 0);

        column
            .set_object(Object::array([Object::Timestamp(
                DateTime::from_timestamp_nanos(2),
            )]))
            .unwrap();
        column.advance().unwrap();

        let array = column.finish();
        let list = array.as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.value_offsets(), &[0, 1]);
        let values = list
            .values()
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()
            .unwrap();
        assert_eq!(&values.values()[..], &[2]);
    }

    #[test]
    fn test_reserve_only_when_empty() {
        let mut column = Column::new(Key::of("x", ValueKind::Long), 1, NullEncoding::Validity)
            .unwrap();
        assert!(column.reserve(64));
        column.set_null();
        column.advance().unwrap();
        assert!(!column.reserve(64));
    }
}
