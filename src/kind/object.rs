use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{GenericKind, PrimitiveKind, ValueKind};

/// A value of the generic kind.
///
/// Null is not a variant: generic columns and functions use `Option<Object>`.
#[derive(Clone)]
pub enum Object {
    Boolean(bool),
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
    Timestamp(DateTime<Utc>),
    Array(Arc<[Object]>),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Object {
    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Object::String(value.into())
    }

    pub fn array(values: impl IntoIterator<Item = Object>) -> Self {
        Object::Array(values.into_iter().collect())
    }

    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Object::Custom(Arc::new(value))
    }

    /// The primitive kind a boxed value holds.
    pub fn boxed_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Object::Boolean(_) => Some(PrimitiveKind::Boolean),
            Object::Char(_) => Some(PrimitiveKind::Char),
            Object::Byte(_) => Some(PrimitiveKind::Byte),
            Object::Short(_) => Some(PrimitiveKind::Short),
            Object::Int(_) => Some(PrimitiveKind::Int),
            Object::Long(_) => Some(PrimitiveKind::Long),
            Object::Float(_) => Some(PrimitiveKind::Float),
            Object::Double(_) => Some(PrimitiveKind::Double),
            _ => None,
        }
    }

    /// Whether this value may be stored under `kind`.
    pub fn is_instance(&self, kind: &GenericKind) -> bool {
        match (kind, self) {
            (GenericKind::String, Object::String(_)) => true,
            (GenericKind::Timestamp, Object::Timestamp(_)) => true,
            (GenericKind::Boxed(p), value) => value.boxed_kind() == Some(*p),
            (GenericKind::Array(element), Object::Array(values)) => {
                values.iter().all(|v| v.is_element_of(element))
            }
            (GenericKind::Custom(custom), Object::Custom(value)) => custom.accepts(value.as_ref()),
            _ => false,
        }
    }

    fn is_element_of(&self, kind: &ValueKind) -> bool {
        match kind {
            ValueKind::Generic(g) => self.is_instance(g),
            primitive => self.boxed_kind() == primitive.primitive(),
        }
    }

    /// A short description of the value's shape, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Object::String(_) => "string".to_string(),
            Object::Timestamp(_) => "timestamp".to_string(),
            Object::Array(_) => "array".to_string(),
            Object::Custom(_) => "custom".to_string(),
            boxed => match boxed.boxed_kind() {
                Some(p) => format!("boxed<{}>", p),
                None => "object".to_string(),
            },
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<u16> {
        match self {
            Object::Char(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            Object::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            Object::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Object::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Object::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Object::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Object::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Object::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Object::Custom(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Char(a), Object::Char(b)) => a == b,
            (Object::Byte(a), Object::Byte(b)) => a == b,
            (Object::Short(a), Object::Short(b)) => a == b,
            (Object::Int(a), Object::Int(b)) => a == b,
            (Object::Long(a), Object::Long(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::Double(a), Object::Double(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Timestamp(a), Object::Timestamp(b)) => a == b,
            (Object::Array(a), Object::Array(b)) => a == b,
            (Object::Custom(a), Object::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Boolean(v) => write!(f, "Boolean({v})"),
            Object::Char(v) => write!(f, "Char({v})"),
            Object::Byte(v) => write!(f, "Byte({v})"),
            Object::Short(v) => write!(f, "Short({v})"),
            Object::Int(v) => write!(f, "Int({v})"),
            Object::Long(v) => write!(f, "Long({v})"),
            Object::Float(v) => write!(f, "Float({v})"),
            Object::Double(v) => write!(f, "Double({v})"),
            Object::String(v) => write!(f, "String({v:?})"),
            Object::Timestamp(v) => write!(f, "Timestamp({v})"),
            Object::Array(v) => f.debug_tuple("Array").field(v).finish(),
            Object::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Boolean(v) => write!(f, "{v}"),
            Object::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "{c}"),
                None => write!(f, "\\u{v:04x}"),
            },
            Object::Byte(v) => write!(f, "{v}"),
            Object::Short(v) => write!(f, "{v}"),
            Object::Int(v) => write!(f, "{v}"),
            Object::Long(v) => write!(f, "{v}"),
            Object::Float(v) => write!(f, "{v}"),
            Object::Double(v) => write!(f, "{v}"),
            Object::String(v) => f.write_str(v),
            Object::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Object::Array(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Object::Custom(_) => f.write_str("<custom>"),
        }
    }
}
