//! Managed string -> NUL-terminated bytes.

/// Code units below this value are copied verbatim.
pub const ASCII_LIMIT: u16 = 0x80;

/// Byte written for every code unit at or above [`ASCII_LIMIT`].
pub const SUBSTITUTE: u8 = b'?';

/// Narrow one code unit.
#[inline]
#[must_use]
pub const fn narrow_unit(unit: u16) -> u8 {
    if unit < ASCII_LIMIT {
        unit as u8
    } else {
        SUBSTITUTE
    }
}

/// Narrow `units` into a fresh buffer of `units.len() + 1` bytes.
///
/// Byte `i` is `units[i]` when that unit is 7-bit ASCII and `'?'` otherwise;
/// the final byte is the NUL terminator. An interior `0` unit is copied as an
/// interior NUL, so C readers of the result will see a shorter string.
#[must_use]
pub fn narrow_lossy(units: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len() + 1);
    out.extend(units.iter().map(|&u| narrow_unit(u)));
    out.push(0);
    out
}

/// Narrow `units` into `dest`, NUL-terminating it.
///
/// Returns the number of bytes written, including the terminator.
///
/// # Panics
///
/// Panics if `dest` has fewer than `units.len() + 1` bytes.
pub fn narrow_into(dest: &mut [u8], units: &[u16]) -> usize {
    let needed = units.len() + 1;
    assert!(
        dest.len() >= needed,
        "narrow_into: destination buffer too small ({} bytes for {} units + NUL)",
        dest.len(),
        units.len()
    );
    for (d, &u) in dest.iter_mut().zip(units) {
        *d = narrow_unit(u);
    }
    dest[units.len()] = 0;
    needed
}
