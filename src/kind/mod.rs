//! Value kinds: the closed set of representations a column or function can have.
//!
//! There are eight primitive kinds, each with a fixed-width native
//! representation, and one generic kind for everything else. The generic kind
//! carries a sub-tag (string, timestamp, array, boxed primitive, custom) so
//! that consumers can still recognize well-known shapes.
//!
//! | Kind    | Native type | Arrow type       |
//! |---------|-------------|------------------|
//! | boolean | `bool`      | `Boolean`        |
//! | char    | `u16`       | `UInt16`         |
//! | byte    | `i8`        | `Int8`           |
//! | short   | `i16`       | `Int16`          |
//! | int     | `i32`       | `Int32`          |
//! | long    | `i64`       | `Int64`          |
//! | float   | `f32`       | `Float32`        |
//! | double  | `f64`       | `Float64`        |
//! | generic | [`Object`]  | depends on sub-tag |

mod key;
pub mod nulls;
mod object;
mod time;

pub use key::{Key, Keys, KeysBuilder, StreamKey};
pub use nulls::NullSentinel;
pub use object::Object;
pub use time::{epoch_nanos_from_double, epoch_nanos_from_long, RoundingMode, TimeUnit};

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// The eight fixed-width kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime descriptor for a user-defined generic type.
///
/// Values of a custom kind are carried as [`Object::Custom`]; the descriptor
/// remembers the Rust type so that values can be checked against it.
#[derive(Clone)]
pub struct CustomKind {
    name: Arc<str>,
    type_id: TypeId,
}

impl CustomKind {
    pub fn of<T: Any + Send + Sync>(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether `value` is an instance of the described type.
    pub fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool {
        value.type_id() == self.type_id
    }
}

impl PartialEq for CustomKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for CustomKind {}

impl std::hash::Hash for CustomKind {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for CustomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomKind({})", self.name)
    }
}

/// Sub-tag of the generic kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericKind {
    String,
    /// A point in time, carried as `DateTime<Utc>`.
    Timestamp,
    /// An array whose elements are of the given kind.
    Array(Arc<ValueKind>),
    /// A nullable primitive.
    Boxed(PrimitiveKind),
    Custom(CustomKind),
}

impl GenericKind {
    pub fn array_of(element: ValueKind) -> Self {
        GenericKind::Array(Arc::new(element))
    }
}

impl fmt::Display for GenericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericKind::String => f.write_str("string"),
            GenericKind::Timestamp => f.write_str("timestamp"),
            GenericKind::Array(element) => write!(f, "array<{}>", element),
            GenericKind::Boxed(p) => write!(f, "boxed<{}>", p),
            GenericKind::Custom(c) => write!(f, "custom<{}>", c.name()),
        }
    }
}

/// One of the nine kinds: eight primitives plus generic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Generic(GenericKind),
}

impl ValueKind {
    pub fn string() -> Self {
        ValueKind::Generic(GenericKind::String)
    }

    pub fn timestamp() -> Self {
        ValueKind::Generic(GenericKind::Timestamp)
    }

    pub fn array_of(element: ValueKind) -> Self {
        ValueKind::Generic(GenericKind::array_of(element))
    }

    pub fn boxed(primitive: PrimitiveKind) -> Self {
        ValueKind::Generic(GenericKind::Boxed(primitive))
    }

    pub fn custom<T: Any + Send + Sync>(name: impl Into<Arc<str>>) -> Self {
        ValueKind::Generic(GenericKind::Custom(CustomKind::of::<T>(name)))
    }

    /// The primitive kind, if this is one of the eight fixed-width kinds.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            ValueKind::Boolean => Some(PrimitiveKind::Boolean),
            ValueKind::Char => Some(PrimitiveKind::Char),
            ValueKind::Byte => Some(PrimitiveKind::Byte),
            ValueKind::Short => Some(PrimitiveKind::Short),
            ValueKind::Int => Some(PrimitiveKind::Int),
            ValueKind::Long => Some(PrimitiveKind::Long),
            ValueKind::Float => Some(PrimitiveKind::Float),
            ValueKind::Double => Some(PrimitiveKind::Double),
            ValueKind::Generic(_) => None,
        }
    }

    pub fn generic(&self) -> Option<&GenericKind> {
        match self {
            ValueKind::Generic(g) => Some(g),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive().is_some()
    }
}

impl From<PrimitiveKind> for ValueKind {
    fn from(p: PrimitiveKind) -> Self {
        match p {
            PrimitiveKind::Boolean => ValueKind::Boolean,
            PrimitiveKind::Char => ValueKind::Char,
            PrimitiveKind::Byte => ValueKind::Byte,
            PrimitiveKind::Short => ValueKind::Short,
            PrimitiveKind::Int => ValueKind::Int,
            PrimitiveKind::Long => ValueKind::Long,
            PrimitiveKind::Float => ValueKind::Float,
            PrimitiveKind::Double => ValueKind::Double,
        }
    }
}

impl From<GenericKind> for ValueKind {
    fn from(g: GenericKind) -> Self {
        ValueKind::Generic(g)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Boolean => f.write_str("boolean"),
            ValueKind::Char => f.write_str("char"),
            ValueKind::Byte => f.write_str("byte"),
            ValueKind::Short => f.write_str("short"),
            ValueKind::Int => f.write_str("int"),
            ValueKind::Long => f.write_str("long"),
            ValueKind::Float => f.write_str("float"),
            ValueKind::Double => f.write_str("double"),
            ValueKind::Generic(g) => g.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_round_trip() {
        for p in PrimitiveKind::ALL {
            let kind = ValueKind::from(p);
            assert_eq!(kind.primitive(), Some(p));
            assert!(kind.is_primitive());
            assert!(kind.generic().is_none());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueKind::Int.to_string(), "int");
        assert_eq!(ValueKind::string().to_string(), "string");
        assert_eq!(
            ValueKind::array_of(ValueKind::boxed(PrimitiveKind::Long)).to_string(),
            "array<boxed<long>>"
        );
        assert_eq!(
            ValueKind::custom::<Vec<u8>>("Blob").to_string(),
            "custom<Blob>"
        );
    }

    #[test]
    fn test_custom_kind_identity() {
        let a = CustomKind::of::<String>("Text");
        let b = CustomKind::of::<String>("Text");
        let c = CustomKind::of::<Vec<u8>>("Text");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let value: Arc<dyn Any + Send + Sync> = Arc::new(String::from("x"));
        assert!(a.accepts(value.as_ref()));
        assert!(!c.accepts(value.as_ref()));
    }
}
