use std::fmt;
use std::hash::{Hash, Hasher};

use super::{
    BooleanFunction, ByteFunction, CharFunction, DoubleFunction, FloatFunction, Func,
    FunctionError, IntFunction, LongFunction, ObjectFunction, ShortFunction,
};
use crate::kind::{GenericKind, ValueKind};

/// A function of exactly one of the nine kinds.
pub enum TypedFunction<T> {
    Boolean(BooleanFunction<T>),
    Char(CharFunction<T>),
    Byte(ByteFunction<T>),
    Short(ShortFunction<T>),
    Int(IntFunction<T>),
    Long(LongFunction<T>),
    Float(FloatFunction<T>),
    Double(DoubleFunction<T>),
    Object(ObjectFunction<T>),
}

/// Applies `$body` to the inner function of every variant, rewrapping the
/// result in the same variant.
macro_rules! each_variant {
    ($value:expr, $f:ident => $body:expr) => {
        match $value {
            TypedFunction::Boolean($f) => TypedFunction::Boolean($body),
            TypedFunction::Char($f) => TypedFunction::Char($body),
            TypedFunction::Byte($f) => TypedFunction::Byte($body),
            TypedFunction::Short($f) => TypedFunction::Short($body),
            TypedFunction::Int($f) => TypedFunction::Int($body),
            TypedFunction::Long($f) => TypedFunction::Long($body),
            TypedFunction::Float($f) => TypedFunction::Float($body),
            TypedFunction::Double($f) => TypedFunction::Double($body),
            TypedFunction::Object($f) => TypedFunction::Object($body),
        }
    };
}

macro_rules! checked_view {
    ($($name:ident: $variant:ident => $alias:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> Result<&$alias<T>, FunctionError> {
                match self {
                    TypedFunction::$variant(f) => Ok(f),
                    other => Err(FunctionError::TypeMismatch {
                        expected: ValueKind::$variant.to_string(),
                        got: other.kind().to_string(),
                    }),
                }
            }
        )*
    };
}

impl<T: 'static> TypedFunction<T> {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedFunction::Boolean(_) => ValueKind::Boolean,
            TypedFunction::Char(_) => ValueKind::Char,
            TypedFunction::Byte(_) => ValueKind::Byte,
            TypedFunction::Short(_) => ValueKind::Short,
            TypedFunction::Int(_) => ValueKind::Int,
            TypedFunction::Long(_) => ValueKind::Long,
            TypedFunction::Float(_) => ValueKind::Float,
            TypedFunction::Double(_) => ValueKind::Double,
            TypedFunction::Object(f) => ValueKind::Generic(f.kind().clone()),
        }
    }

    /// Pre-composes `g`; the kind is unchanged.
    pub fn map_input<U: 'static>(&self, g: &Func<U, T>) -> TypedFunction<U> {
        each_variant!(self, f => f.map_input(g))
    }

    checked_view! {
        as_boolean: Boolean => BooleanFunction,
        as_char: Char => CharFunction,
        as_byte: Byte => ByteFunction,
        as_short: Short => ShortFunction,
        as_int: Int => IntFunction,
        as_long: Long => LongFunction,
        as_float: Float => FloatFunction,
        as_double: Double => DoubleFunction,
    }

    pub fn as_object(&self) -> Result<&ObjectFunction<T>, FunctionError> {
        match self {
            TypedFunction::Object(f) => Ok(f),
            other => Err(FunctionError::TypeMismatch {
                expected: "generic".to_string(),
                got: other.kind().to_string(),
            }),
        }
    }

    /// Views a generic function as producing `kind`.
    pub fn as_object_of(&self, kind: &GenericKind) -> Result<ObjectFunction<T>, FunctionError> {
        self.as_object()?.as_kind(kind)
    }
}

impl<T> Clone for TypedFunction<T> {
    fn clone(&self) -> Self {
        each_variant!(self, f => f.clone())
    }
}

impl<T> PartialEq for TypedFunction<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedFunction::Boolean(a), TypedFunction::Boolean(b)) => a == b,
            (TypedFunction::Char(a), TypedFunction::Char(b)) => a == b,
            (TypedFunction::Byte(a), TypedFunction::Byte(b)) => a == b,
            (TypedFunction::Short(a), TypedFunction::Short(b)) => a == b,
            (TypedFunction::Int(a), TypedFunction::Int(b)) => a == b,
            (TypedFunction::Long(a), TypedFunction::Long(b)) => a == b,
            (TypedFunction::Float(a), TypedFunction::Float(b)) => a == b,
            (TypedFunction::Double(a), TypedFunction::Double(b)) => a == b,
            (TypedFunction::Object(a), TypedFunction::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> Eq for TypedFunction<T> {}

impl<T> Hash for TypedFunction<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            TypedFunction::Boolean(f) => f.hash(state),
            TypedFunction::Char(f) => f.hash(state),
            TypedFunction::Byte(f) => f.hash(state),
            TypedFunction::Short(f) => f.hash(state),
            TypedFunction::Int(f) => f.hash(state),
            TypedFunction::Long(f) => f.hash(state),
            TypedFunction::Float(f) => f.hash(state),
            TypedFunction::Double(f) => f.hash(state),
            TypedFunction::Object(f) => f.hash(state),
        }
    }
}

impl<T> fmt::Debug for TypedFunction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedFunction::Boolean(g) => f.debug_tuple("Boolean").field(g).finish(),
            TypedFunction::Char(g) => f.debug_tuple("Char").field(g).finish(),
            TypedFunction::Byte(g) => f.debug_tuple("Byte").field(g).finish(),
            TypedFunction::Short(g) => f.debug_tuple("Short").field(g).finish(),
            TypedFunction::Int(g) => f.debug_tuple("Int").field(g).finish(),
            TypedFunction::Long(g) => f.debug_tuple("Long").field(g).finish(),
            TypedFunction::Float(g) => f.debug_tuple("Float").field(g).finish(),
            TypedFunction::Double(g) => f.debug_tuple("Double").field(g).finish(),
            TypedFunction::Object(g) => f.debug_tuple("Object").field(g).finish(),
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident => $alias:ident),* $(,)?) => {
        $(
            impl<T> From<$alias<T>> for TypedFunction<T> {
                fn from(f: $alias<T>) -> Self {
                    TypedFunction::$variant(f)
                }
            }
        )*
    };
}

impl_from! {
    Boolean => BooleanFunction,
    Char => CharFunction,
    Byte => ByteFunction,
    Short => ShortFunction,
    Int => IntFunction,
    Long => LongFunction,
    Float => FloatFunction,
    Double => DoubleFunction,
    Object => ObjectFunction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Object, PrimitiveKind};

    #[test]
    fn test_kind_and_views() {
        let f = TypedFunction::Int(Func::new(|v: &i64| *v as i32));
        assert_eq!(f.kind(), ValueKind::Int);
        assert_eq!(f.as_int().unwrap().apply(&5), 5);
        assert_eq!(
            f.as_long().unwrap_err(),
            FunctionError::TypeMismatch {
                expected: "long".into(),
                got: "int".into()
            }
        );
        assert!(f.as_object().is_err());

        let o = TypedFunction::from(ObjectFunction::new(
            GenericKind::Boxed(PrimitiveKind::Long),
            |v: &i64| Some(Object::Long(*v)),
        ));
        assert_eq!(o.kind(), ValueKind::boxed(PrimitiveKind::Long));
        assert!(o.as_object_of(&GenericKind::Boxed(PrimitiveKind::Long)).is_ok());
        assert!(o.as_object_of(&GenericKind::String).is_err());
    }

    #[test]
    fn test_map_input_keeps_kind() {
        let len = Func::builtin("len", |s: &String| s.len() as i32);
        let f = TypedFunction::from(Func::new(|v: &i32| f64::from(*v)));
        let mapped = f.map_input(&len);
        assert_eq!(mapped.kind(), ValueKind::Double);
        assert_eq!(mapped.as_double().unwrap().apply(&"abc".to_string()), 3.0);
        assert_eq!(f.map_input(&len), f.map_input(&len));
    }

    #[test]
    fn test_equality_across_variants() {
        let f = Func::builtin("zero", |_: &u8| 0i32);
        let a = TypedFunction::Int(f.clone());
        assert_eq!(a, TypedFunction::Int(f));
        let b = TypedFunction::Long(Func::builtin("zero", |_: &u8| 0i64));
        assert_ne!(a, b);
    }

    fn render<T>(f: &TypedFunction<T>) -> String {
        format!("{f:?}")
    }

    #[test]
    fn test_debug_shows_identity() {
        let f = TypedFunction::Int(Func::builtin("zero", |_: &u8| 0i32));
        assert_eq!(render(&f), "Int(Func(Builtin(\"zero\")))");

        let o = TypedFunction::from(ObjectFunction::from_func(
            Func::builtin("none", |_: &u8| None),
            GenericKind::String,
        ));
        let text = render(&o);
        assert!(text.starts_with("Object(ObjectFunction"), "{text}");
        assert!(text.contains("Builtin(\"none\")"), "{text}");
    }
}
