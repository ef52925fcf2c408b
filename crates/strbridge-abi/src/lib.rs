// All extern "C" exports accept raw pointers from C callers; the contract for
// each lives in the module docs, so per-function safety docs would be noise.
#![allow(clippy::missing_safety_doc)]
//! # strbridge-abi
//!
//! extern "C" boundary layer for strbridge.
//!
//! This crate produces a `cdylib` exposing the managed-string conversions to
//! native code. Each entrypoint reads the runtime mode from the membrane,
//! applies hardened-mode healing where it can prove an input is bad, and
//! delegates the conversion itself to the safe kernels in `strbridge-core`.
//!
//! # Architecture
//!
//! ```text
//! C caller -> ABI entry (this crate) -> membrane (mode, registry, heal) -> core kernel -> return
//! ```
//!
//! In **strict** mode the entrypoints implement the bare contract: explicit
//! lengths are trusted and terminator scans are unbounded.
//!
//! In **hardened** mode NULL inputs produce empty results, lengths and scans
//! over sealed buffers we produced are bounded by their extent, and foreign
//! or repeated frees are ignored. Strict mode keeps no allocation registry.
//!
//! All exported symbols carry the `strbridge_` prefix, so unlike a libc
//! replacement nothing here shadows the host C library in test binaries.

#[macro_use]
mod macros;

mod runtime_policy;

pub mod convert_abi;
pub mod string_abi;
pub mod util;

pub use convert_abi::{
    strbridge_c_str_free, strbridge_from_c_str, strbridge_from_c_str_with_length,
    strbridge_to_c_str,
};
pub use string_abi::{
    StrbridgeString, strbridge_make_string, strbridge_string_data, strbridge_string_free,
    strbridge_string_length,
};
