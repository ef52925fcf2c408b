//! Conversions across the managed/native string boundary.
//!
//! Narrowing (`narrow`) maps each 16-bit code unit to one byte, replacing
//! anything outside 7-bit ASCII with `'?'`. Widening (`widen`) maps each byte to
//! one code unit by zero-extension.

pub mod narrow;
pub mod widen;

pub use narrow::{ASCII_LIMIT, SUBSTITUTE, narrow_into, narrow_lossy, narrow_unit};
pub use widen::{c_strlen, widen, widen_with_length};
