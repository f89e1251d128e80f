//! Kind-specialized functions used by producers to extract column values.
//!
//! A [`TypedFunction`] is one of nine variants: eight primitive functions that
//! return native values directly, and an [`ObjectFunction`] for the generic
//! kind. Functions compose with [`Func::map`] and [`Func::map_input`], lift
//! over nullable input with `on_null_input`, and change kind through the
//! transforms in this module ([`boxed`], [`unbox`], [`common`],
//! [`null_guard`]).
//!
//! Functions carry a structural [`Identity`], so equal compositions of equal
//! parts compare equal and hash alike.

mod func;
mod identity;
mod object;
mod transform;
mod typed;

pub use func::{
    BooleanFunction, ByteFunction, CharFunction, DoubleFunction, FloatFunction, Func,
    IntFunction, LongFunction, ShortFunction,
};
pub use identity::Identity;
pub use object::ObjectFunction;
pub use transform::{boxed, common, null_guard, to_epoch_nanos, unbox, unbox_boolean_as_byte};
pub use typed::TypedFunction;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
}
