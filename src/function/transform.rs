//! Kind-changing transforms over [`TypedFunction`].
//!
//! Every transform is a total match over the nine variants. The helper
//! functions they compose with are builtins, so transforming equal functions
//! yields equal results.

use super::{Func, FunctionError, ObjectFunction, TypedFunction};
use crate::kind::nulls::{
    NULL_BOOLEAN, NULL_BOOLEAN_AS_BYTE, NULL_BYTE, NULL_CHAR, NULL_DOUBLE, NULL_FLOAT, NULL_INT,
    NULL_LONG, NULL_SHORT,
};
use crate::kind::{GenericKind, NullSentinel, Object, PrimitiveKind};

macro_rules! boxing {
    ($($box_fn:ident / $unbox_fn:ident: $native:ty, $variant:ident, $as:ident, $null:expr);* $(;)?) => {
        $(
            fn $box_fn() -> Func<$native, Option<Object>> {
                Func::builtin(stringify!($box_fn), |v: &$native| {
                    (!v.is_null()).then(|| Object::$variant(*v))
                })
            }

            fn $unbox_fn() -> Func<Option<Object>, $native> {
                Func::builtin(stringify!($unbox_fn), |o: &Option<Object>| {
                    o.as_ref().and_then(Object::$as).unwrap_or($null)
                })
            }
        )*
    };
}

boxing! {
    box_char / unbox_char: u16, Char, as_char, NULL_CHAR;
    box_byte / unbox_byte: i8, Byte, as_byte, NULL_BYTE;
    box_short / unbox_short: i16, Short, as_short, NULL_SHORT;
    box_int / unbox_int: i32, Int, as_int, NULL_INT;
    box_long / unbox_long: i64, Long, as_long, NULL_LONG;
    box_float / unbox_float: f32, Float, as_float, NULL_FLOAT;
    box_double / unbox_double: f64, Double, as_double, NULL_DOUBLE;
}

// Booleans have no sentinel: every value boxes.
fn box_boolean() -> Func<bool, Option<Object>> {
    Func::builtin("box_boolean", |v: &bool| Some(Object::Boolean(*v)))
}

fn boolean_as_byte() -> Func<Option<Object>, i8> {
    Func::builtin("boolean_as_byte", |o: &Option<Object>| {
        match o.as_ref().and_then(Object::as_bool) {
            Some(true) => 1,
            Some(false) => 0,
            None => NULL_BOOLEAN_AS_BYTE,
        }
    })
}

fn epoch_nanos() -> Func<Option<Object>, i64> {
    Func::builtin("epoch_nanos", |o: &Option<Object>| {
        o.as_ref()
            .and_then(Object::as_timestamp)
            .and_then(|ts| ts.timestamp_nanos_opt())
            .unwrap_or(NULL_LONG)
    })
}

/// Converts a primitive function into a generic function producing the
/// boxed equivalent. Null sentinels box to `None`. Generic functions are
/// returned unchanged.
pub fn boxed<T: 'static>(f: &TypedFunction<T>) -> ObjectFunction<T> {
    let boxed = GenericKind::Boxed;
    match f {
        TypedFunction::Boolean(g) => g.map_obj(&box_boolean(), boxed(PrimitiveKind::Boolean)),
        TypedFunction::Char(g) => g.map_obj(&box_char(), boxed(PrimitiveKind::Char)),
        TypedFunction::Byte(g) => g.map_obj(&box_byte(), boxed(PrimitiveKind::Byte)),
        TypedFunction::Short(g) => g.map_obj(&box_short(), boxed(PrimitiveKind::Short)),
        TypedFunction::Int(g) => g.map_obj(&box_int(), boxed(PrimitiveKind::Int)),
        TypedFunction::Long(g) => g.map_obj(&box_long(), boxed(PrimitiveKind::Long)),
        TypedFunction::Float(g) => g.map_obj(&box_float(), boxed(PrimitiveKind::Float)),
        TypedFunction::Double(g) => g.map_obj(&box_double(), boxed(PrimitiveKind::Double)),
        TypedFunction::Object(g) => g.clone(),
    }
}

/// Converts a generic function producing a boxed primitive into the matching
/// primitive function, with `None` mapped to the kind's null sentinel.
///
/// Boxed booleans become byte functions producing 1, 0 or
/// [`NULL_BOOLEAN_AS_BYTE`]. Every other function is returned unchanged.
pub fn unbox<T: 'static>(f: &TypedFunction<T>) -> TypedFunction<T> {
    let TypedFunction::Object(g) = f else {
        return f.clone();
    };
    let GenericKind::Boxed(p) = g.kind() else {
        return f.clone();
    };
    match p {
        PrimitiveKind::Boolean => TypedFunction::Byte(g.map_byte(&boolean_as_byte())),
        PrimitiveKind::Char => TypedFunction::Char(g.map_char(&unbox_char())),
        PrimitiveKind::Byte => TypedFunction::Byte(g.map_byte(&unbox_byte())),
        PrimitiveKind::Short => TypedFunction::Short(g.map_short(&unbox_short())),
        PrimitiveKind::Int => TypedFunction::Int(g.map_int(&unbox_int())),
        PrimitiveKind::Long => TypedFunction::Long(g.map_long(&unbox_long())),
        PrimitiveKind::Float => TypedFunction::Float(g.map_float(&unbox_float())),
        PrimitiveKind::Double => TypedFunction::Double(g.map_double(&unbox_double())),
    }
}

/// Reduces a function to the smallest set of target kinds: timestamps become
/// epoch-nanosecond longs ([`NULL_LONG`] for null) and boxed primitives are
/// unboxed.
pub fn common<T: 'static>(f: &TypedFunction<T>) -> TypedFunction<T> {
    match f {
        TypedFunction::Object(g) if *g.kind() == GenericKind::Timestamp => {
            TypedFunction::Long(g.map_long(&epoch_nanos()))
        }
        other => unbox(other),
    }
}

/// Lifts a function over `Option<T>`: a `None` input produces the kind's null
/// sentinel (or `None` for generic functions) without calling `f`.
pub fn null_guard<T: 'static>(f: &TypedFunction<T>) -> TypedFunction<Option<T>> {
    match f {
        TypedFunction::Boolean(g) => TypedFunction::Boolean(g.on_null_input(NULL_BOOLEAN)),
        TypedFunction::Char(g) => TypedFunction::Char(g.on_null_input(NULL_CHAR)),
        TypedFunction::Byte(g) => TypedFunction::Byte(g.on_null_input(NULL_BYTE)),
        TypedFunction::Short(g) => TypedFunction::Short(g.on_null_input(NULL_SHORT)),
        TypedFunction::Int(g) => TypedFunction::Int(g.on_null_input(NULL_INT)),
        TypedFunction::Long(g) => TypedFunction::Long(g.on_null_input(NULL_LONG)),
        TypedFunction::Float(g) => TypedFunction::Float(g.on_null_input(NULL_FLOAT)),
        TypedFunction::Double(g) => TypedFunction::Double(g.on_null_input(NULL_DOUBLE)),
        TypedFunction::Object(g) => TypedFunction::Object(g.on_null_input()),
    }
}

/// Epoch nanoseconds of a timestamp-producing function.
pub fn to_epoch_nanos<T: 'static>(
    f: &ObjectFunction<T>,
) -> Result<Func<T, i64>, FunctionError> {
    Ok(f.as_kind(&GenericKind::Timestamp)?.map_long(&epoch_nanos()))
}

/// Byte view of a boxed-boolean function.
pub fn unbox_boolean_as_byte<T: 'static>(
    f: &ObjectFunction<T>,
) -> Result<Func<T, i8>, FunctionError> {
    Ok(f
        .as_kind(&GenericKind::Boxed(PrimitiveKind::Boolean))?
        .map_byte(&boolean_as_byte()))
}
