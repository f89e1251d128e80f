//! Null sentinels: reserved primitive values that stand in for "no value".
//!
//! Sentinels are only used where a fixed-width representation is required.
//! Generic values use `Option::None` instead.

pub const NULL_BOOLEAN: bool = false;
pub const NULL_BOOLEAN_AS_BYTE: i8 = i8::MIN;
pub const NULL_CHAR: u16 = u16::MAX;
pub const NULL_BYTE: i8 = i8::MIN;
pub const NULL_SHORT: i16 = i16::MIN;
pub const NULL_INT: i32 = i32::MIN;
pub const NULL_LONG: i64 = i64::MIN;
pub const NULL_FLOAT: f32 = -f32::MAX;
pub const NULL_DOUBLE: f64 = -f64::MAX;

/// A native type with a reserved null value.
pub trait NullSentinel: Copy + PartialEq {
    const NULL: Self;

    fn is_null(self) -> bool {
        self == Self::NULL
    }
}

macro_rules! impl_sentinel {
    ($($ty:ty => $null:expr),* $(,)?) => {
        $(
            impl NullSentinel for $ty {
                const NULL: Self = $null;
            }
        )*
    };
}

impl_sentinel! {
    u16 => NULL_CHAR,
    i8 => NULL_BYTE,
    i16 => NULL_SHORT,
    i32 => NULL_INT,
    i64 => NULL_LONG,
    f32 => NULL_FLOAT,
    f64 => NULL_DOUBLE,
}
