use std::fmt;
use std::hash::{Hash, Hasher};

use super::{
    BooleanFunction, ByteFunction, CharFunction, DoubleFunction, FloatFunction, Func,
    FunctionError, IntFunction, LongFunction, ShortFunction, TypedFunction,
};
use crate::kind::{GenericKind, Object};

/// A function of the generic kind: produces `Option<Object>` values of one
/// [`GenericKind`], with `None` as null.
pub struct ObjectFunction<T> {
    func: Func<T, Option<Object>>,
    kind: GenericKind,
}

macro_rules! map_primitive {
    ($($(#[$doc:meta])* $name:ident -> $alias:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self, g: &$alias<Option<Object>>) -> $alias<T> {
                self.func.map(g)
            }
        )*
    };
}

impl<T: 'static> ObjectFunction<T> {
    pub fn new(
        kind: GenericKind,
        f: impl Fn(&T) -> Option<Object> + Send + Sync + 'static,
    ) -> Self {
        Self {
            func: Func::new(f),
            kind,
        }
    }

    pub fn from_func(func: Func<T, Option<Object>>, kind: GenericKind) -> Self {
        Self { func, kind }
    }

    pub fn kind(&self) -> &GenericKind {
        &self.kind
    }

    pub fn func(&self) -> &Func<T, Option<Object>> {
        &self.func
    }

    pub fn apply(&self, input: &T) -> Option<Object> {
        self.func.apply(input)
    }

    map_primitive! {
        map_boolean -> BooleanFunction,
        /// Post-composes a function producing UTF-16 code units.
        map_char -> CharFunction,
        map_byte -> ByteFunction,
        map_short -> ShortFunction,
        map_int -> IntFunction,
        map_long -> LongFunction,
        map_float -> FloatFunction,
        map_double -> DoubleFunction,
    }

    /// Post-composes a generic-valued function producing `kind`.
    pub fn map_obj(&self, g: &Func<Option<Object>, Option<Object>>, kind: GenericKind) -> Self {
        Self::from_func(self.func.map(g), kind)
    }

    /// Post-composes a function of any kind, dispatching on the target's
    /// variant.
    pub fn map(&self, target: &TypedFunction<Option<Object>>) -> TypedFunction<T> {
        self.func.map_typed(target)
    }

    pub fn map_input<U: 'static>(&self, g: &Func<U, T>) -> ObjectFunction<U> {
        ObjectFunction::from_func(self.func.map_input(g), self.kind.clone())
    }

    /// Returns null for a `None` input without calling `self`.
    pub fn on_null_input(&self) -> ObjectFunction<Option<T>> {
        ObjectFunction::from_func(self.func.on_null_input(None), self.kind.clone())
    }

    /// Views this function as producing `kind`, failing if it produces a
    /// different generic kind.
    pub fn as_kind(&self, kind: &GenericKind) -> Result<Self, FunctionError> {
        if self.kind == *kind {
            Ok(self.clone())
        } else {
            Err(FunctionError::TypeMismatch {
                expected: kind.to_string(),
                got: self.kind.to_string(),
            })
        }
    }
}

impl<T> Clone for ObjectFunction<T> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl<T> PartialEq for ObjectFunction<T> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.func == other.func
    }
}

impl<T> Eq for ObjectFunction<T> {}

impl<T> Hash for ObjectFunction<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.func.hash(state);
    }
}

impl<T> fmt::Debug for ObjectFunction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectFunction")
            .field("kind", &self.kind)
            .field("identity", self.func.identity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::PrimitiveKind;

    fn name() -> ObjectFunction<(String, i32)> {
        ObjectFunction::new(GenericKind::String, |(name, _): &(String, i32)| {
            Some(Object::string(name.as_str()))
        })
    }

    #[test]
    fn test_map_primitive() {
        let len = Func::builtin("len", |o: &Option<Object>| {
            o.as_ref().and_then(Object::as_str).map_or(-1, |s| s.len() as i32)
        });
        let f = name().map_int(&len);
        assert_eq!(f.apply(&("abcd".to_string(), 0)), 4);
    }

    #[test]
    fn test_map_dispatches_on_target_kind() {
        let f = name();
        let is_empty = TypedFunction::Boolean(Func::builtin("is_empty", |o: &Option<Object>| {
            o.as_ref().and_then(Object::as_str).map_or(true, str::is_empty)
        }));
        let upper = TypedFunction::Object(ObjectFunction::from_func(
            Func::builtin("upper", |o: &Option<Object>| {
                o.as_ref()
                    .and_then(Object::as_str)
                    .map(|s| Object::string(s.to_uppercase()))
            }),
            GenericKind::String,
        ));

        let mapped = f.map(&is_empty);
        assert_eq!(mapped.kind().to_string(), "boolean");
        assert!(!mapped.as_boolean().unwrap().apply(&("x".into(), 0)));

        let mapped = f.map(&upper);
        let mapped = mapped.as_object().unwrap();
        assert_eq!(mapped.kind(), &GenericKind::String);
        assert_eq!(
            mapped.apply(&("ab".into(), 0)),
            Some(Object::string("AB"))
        );
    }

    #[test]
    fn test_on_null_input() {
        let f = name().on_null_input();
        assert_eq!(f.apply(&None), None);
        assert_eq!(
            f.apply(&Some(("n".into(), 1))),
            Some(Object::string("n"))
        );
    }

    #[test]
    fn test_as_kind() {
        let f = name();
        assert_eq!(f.as_kind(&GenericKind::String).unwrap(), f);
        let err = f
            .as_kind(&GenericKind::Boxed(PrimitiveKind::Int))
            .unwrap_err();
        assert_eq!(
            err,
            FunctionError::TypeMismatch {
                expected: "boxed<int>".into(),
                got: "string".into()
            }
        );
    }

    #[test]
    fn test_equality() {
        let f = name();
        let g = Func::builtin("id", |o: &Option<Object>| o.clone());
        assert_eq!(
            f.map_obj(&g, GenericKind::String),
            f.map_obj(&g, GenericKind::String)
        );
        assert_ne!(
            f.map_obj(&g, GenericKind::String),
            f.map_obj(&g, GenericKind::Timestamp)
        );
    }
}
