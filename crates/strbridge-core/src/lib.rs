//! # strbridge-core
//!
//! Safe Rust kernels for moving strings between a managed runtime and native code.
//!
//! A managed string is an explicitly length-tagged run of 16-bit code units with
//! no terminator. Native code sees NUL-terminated bytes. The conversions here
//! are deliberately not Unicode transcoding: narrowing is a lossy per-unit
//! downcast and widening is a per-byte zero-extension. No `unsafe` code is
//! permitted at the crate level; raw pointers are the ABI crate's business.

#![deny(unsafe_code)]

pub mod convert;
pub mod managed;

pub use convert::{
    ASCII_LIMIT, SUBSTITUTE, c_strlen, narrow_into, narrow_lossy, narrow_unit, widen,
    widen_with_length,
};
pub use managed::ManagedString;
