//! NUL-terminated bytes -> managed string.

use crate::managed::ManagedString;

/// Length of a NUL-terminated byte string (not counting the NUL).
///
/// Equivalent to C `strlen` over a slice. If no NUL is found, returns the
/// full slice length.
#[must_use]
pub fn c_strlen(s: &[u8]) -> usize {
    s.iter().position(|&b| b == 0).unwrap_or(s.len())
}

/// Widen a NUL-terminated byte string.
///
/// The length is found by scanning for the first NUL (or the end of the
/// slice). Every byte is zero-extended: `0xFF` becomes `0x00FF`.
#[must_use]
pub fn widen(bytes: &[u8]) -> ManagedString {
    widen_with_length(bytes, c_strlen(bytes))
}

/// Widen exactly `len` bytes, NULs included.
///
/// # Panics
///
/// Panics if `len` exceeds `bytes.len()`.
#[must_use]
pub fn widen_with_length(bytes: &[u8], len: usize) -> ManagedString {
    assert!(
        len <= bytes.len(),
        "widen_with_length: length {len} exceeds buffer of {} bytes",
        bytes.len()
    );
    ManagedString::from_units(bytes[..len].iter().map(|&b| u16::from(b)).collect())
}
