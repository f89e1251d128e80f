use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::{Identity, ObjectFunction, TypedFunction};
use crate::kind::{GenericKind, Object};

/// A shared pure function from `&T` to `R` with a structural identity.
///
/// Cloning is cheap. Equality and hashing compare identities and never call
/// the function.
pub struct Func<T, R> {
    f: Arc<dyn Fn(&T) -> R + Send + Sync>,
    identity: Identity,
}

pub type BooleanFunction<T> = Func<T, bool>;
/// Produces UTF-16 code units.
pub type CharFunction<T> = Func<T, u16>;
pub type ByteFunction<T> = Func<T, i8>;
pub type ShortFunction<T> = Func<T, i16>;
pub type IntFunction<T> = Func<T, i32>;
pub type LongFunction<T> = Func<T, i64>;
pub type FloatFunction<T> = Func<T, f32>;
pub type DoubleFunction<T> = Func<T, f64>;

impl<T: 'static, R: 'static> Func<T, R> {
    /// Wraps a closure. Every call yields a distinct identity.
    pub fn new(f: impl Fn(&T) -> R + Send + Sync + 'static) -> Self {
        Self {
            f: Arc::new(f),
            identity: Identity::unique(),
        }
    }

    /// Wraps a named, context-free function. Builtins with the same name
    /// compare equal.
    pub fn builtin(name: &'static str, f: impl Fn(&T) -> R + Send + Sync + 'static) -> Self {
        Self {
            f: Arc::new(f),
            identity: Identity::builtin(name),
        }
    }

    /// Wraps a closure whose behavior is fully described by `identity`.
    pub fn with_identity(
        identity: Identity,
        f: impl Fn(&T) -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            f: Arc::new(f),
            identity,
        }
    }

    pub fn constant(value: R) -> Self
    where
        R: Clone + fmt::Debug + Send + Sync,
    {
        let identity =
            Identity::composed("constant", std::iter::empty()).with_detail(format!("{:?}", value));
        Self {
            f: Arc::new(move |_: &T| value.clone()),
            identity,
        }
    }

    pub fn apply(&self, input: &T) -> R {
        (self.f)(input)
    }

    /// `g` after `self`.
    pub fn map<R2: 'static>(&self, g: &Func<R, R2>) -> Func<T, R2> {
        let identity = Identity::composed("map", [&self.identity, &g.identity]);
        let f = self.f.clone();
        let g = g.f.clone();
        Func {
            f: Arc::new(move |t: &T| g(&f(t))),
            identity,
        }
    }

    /// `self` after `g`.
    pub fn map_input<U: 'static>(&self, g: &Func<U, T>) -> Func<U, R> {
        let identity = Identity::composed("map_input", [&self.identity, &g.identity]);
        let f = self.f.clone();
        let g = g.f.clone();
        Func {
            f: Arc::new(move |u: &U| f(&g(u))),
            identity,
        }
    }

    /// Returns `default` for a `None` input without calling `self`.
    pub fn on_null_input(&self, default: R) -> Func<Option<T>, R>
    where
        R: Clone + fmt::Debug + Send + Sync,
    {
        let identity = Identity::composed("on_null_input", [&self.identity])
            .with_detail(format!("{:?}", default));
        let f = self.f.clone();
        Func {
            f: Arc::new(move |input: &Option<T>| match input {
                Some(t) => f(t),
                None => default.clone(),
            }),
            identity,
        }
    }

    /// Post-composes a generic-valued function, producing a function of the
    /// generic kind `kind`.
    pub fn map_obj(&self, g: &Func<R, Option<Object>>, kind: GenericKind) -> ObjectFunction<T> {
        ObjectFunction::from_func(self.map(g), kind)
    }

    /// Post-composes a function of any kind. The result has the kind of
    /// `target`.
    pub fn map_typed(&self, target: &TypedFunction<R>) -> TypedFunction<T> {
        match target {
            TypedFunction::Boolean(g) => TypedFunction::Boolean(self.map(g)),
            TypedFunction::Char(g) => TypedFunction::Char(self.map(g)),
            TypedFunction::Byte(g) => TypedFunction::Byte(self.map(g)),
            TypedFunction::Short(g) => TypedFunction::Short(self.map(g)),
            TypedFunction::Int(g) => TypedFunction::Int(self.map(g)),
            TypedFunction::Long(g) => TypedFunction::Long(self.map(g)),
            TypedFunction::Float(g) => TypedFunction::Float(self.map(g)),
            TypedFunction::Double(g) => TypedFunction::Double(self.map(g)),
            TypedFunction::Object(g) => TypedFunction::Object(ObjectFunction::from_func(
                self.map(g.func()),
                g.kind().clone(),
            )),
        }
    }
}

impl<T, R> Func<T, R> {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl<T, R> Clone for Func<T, R> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<T, R> PartialEq for Func<T, R> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl<T, R> Eq for Func<T, R> {}

impl<T, R> Hash for Func<T, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl<T, R> fmt::Debug for Func<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Func").field(&self.identity).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition() {
        let len = Func::new(|s: &String| s.len() as i32);
        let double = Func::new(|v: &i32| f64::from(*v) * 2.0);
        let parse = Func::new(|v: &u8| v.to_string());

        assert_eq!(len.map(&double).apply(&"abc".to_string()), 6.0);
        assert_eq!(len.map_input(&parse).apply(&100), 3);
        assert_eq!(Func::<i32, i64>::constant(7).apply(&0), 7);
    }

    #[test]
    fn test_on_null_input() {
        let f = Func::new(|v: &i32| v + 1);
        let guarded = f.on_null_input(-1);
        assert_eq!(guarded.apply(&Some(1)), 2);
        assert_eq!(guarded.apply(&None), -1);
    }

    #[test]
    fn test_equality_is_structural() {
        let f = Func::new(|v: &i32| *v);
        let g = Func::new(|v: &i32| *v);
        let h = Func::builtin("negate", |v: &i32| -v);

        assert_ne!(f, g);
        assert_eq!(f, f.clone());
        assert_eq!(f.map(&h), f.map(&h));
        assert_ne!(f.map(&h), g.map(&h));
        assert_eq!(h, Func::builtin("negate", |v: &i32| -v));
        assert_eq!(f.on_null_input(0), f.on_null_input(0));
        assert_ne!(f.on_null_input(0), f.on_null_input(1));
        assert_eq!(
            Func::<u8, i32>::constant(3),
            Func::<u8, i32>::constant(3)
        );

        use std::collections::HashSet;
        let set: HashSet<_> = [f.map(&h), f.map(&h), g.map(&h)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
