//! ABI layer for the managed string <-> C string conversions.
//!
//! Buffers returned by `strbridge_to_c_str` come from the C allocator, so
//! either `free` or `strbridge_c_str_free` may release them. Input buffers are
//! only ever read: the widening entrypoints never take ownership of, or free,
//! the `char*` they are given.
//!
//! Strict mode is the bare conversion contract. Hardened mode additionally
//! heals NULL inputs, clamps explicit lengths and bounds terminator scans
//! against sealed buffers this library produced, and ignores bad frees.
//! Pointers into memory we did not produce are trusted as in strict mode.

use std::ffi::{c_char, c_uint, c_void};
use std::ptr;

use strbridge_core::{ManagedString, narrow_into, widen_with_length};
use strbridge_membrane::{HealingAction, SafetyLevel, global_healing_policy};

use crate::runtime_policy;
use crate::string_abi::StrbridgeString;
use crate::util::{alloc_failure, scan_c_string};

/// Narrow `ms` into a fresh `malloc`ed buffer of `len + 1` bytes.
///
/// Hardened mode also reserves and writes a seal after the terminator.
///
/// # Safety
///
/// `ms` must be NULL or a live string from this library.
pub unsafe fn to_c_str_in(mode: SafetyLevel, ms: *const StrbridgeString) -> *mut c_char {
    let units: &[u16] = match unsafe { ms.as_ref() } {
        Some(header) => header.units(),
        None if mode.heals_enabled() => {
            runtime_policy::record(HealingAction::ReturnSafeDefault);
            &[]
        }
        None => return ptr::null_mut(),
    };

    let size = units.len() + 1;
    let alloc_size = size + runtime_policy::seal_reserve(mode);
    // SAFETY: plain C allocation; checked for NULL below.
    let buf = unsafe { libc::malloc(alloc_size) }.cast::<u8>();
    if buf.is_null() {
        alloc_failure(alloc_size);
    }
    // SAFETY: `buf` is a fresh allocation of `alloc_size` bytes owned by us until returned.
    let dest = unsafe { std::slice::from_raw_parts_mut(buf, size) };
    narrow_into(dest, units);

    // SAFETY: `alloc_size` covers the extent plus the seal reserve.
    unsafe { runtime_policy::track(mode, buf, size) };
    buf.cast::<c_char>()
}

/// Widen a NUL-terminated buffer into a new managed string.
///
/// # Safety
///
/// In strict mode `ptr` must be NULL or point at a NUL-terminated buffer.
pub unsafe fn from_c_str_in(mode: SafetyLevel, ptr: *const c_char) -> *mut StrbridgeString {
    if ptr.is_null() {
        return null_input(mode);
    }

    let bound = if mode.heals_enabled() {
        runtime_policy::registered_remaining(ptr as usize)
    } else {
        None
    };
    // SAFETY: caller contract, or a registered extent in hardened mode.
    let (mut len, terminated) = unsafe { scan_c_string(ptr, bound) };
    if !terminated {
        // SAFETY: no NUL inside the extent, so the caller's string runs past it.
        let sealed = unsafe {
            runtime_policy::sealed_remaining(ptr as usize, runtime_policy::Claim::Unterminated)
        };
        if sealed.is_some() {
            runtime_policy::record(global_healing_policy().heal_unterminated_scan(len));
        } else {
            // Stale extent: finish the scan on the caller's terms.
            // SAFETY: caller contract; the first `len` bytes were non-NUL.
            len += unsafe { scan_c_string(ptr.add(len), None) }.0;
        }
    }

    // SAFETY: the scan above read `len` bytes from `ptr`.
    let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) };
    StrbridgeString::into_raw(widen_with_length(bytes, len))
}

/// Widen exactly `len` bytes into a new managed string.
///
/// # Safety
///
/// In strict mode `ptr` must be valid for `len` bytes (or `len` must be 0).
pub unsafe fn from_c_str_with_length_in(
    mode: SafetyLevel,
    ptr: *const c_char,
    len: c_uint,
) -> *mut StrbridgeString {
    let mut len = len as usize;
    if len == 0 {
        return StrbridgeString::into_raw(ManagedString::default());
    }
    if ptr.is_null() {
        return null_input(mode);
    }

    if mode.heals_enabled() {
        // SAFETY: the caller vouches for `len` bytes at `ptr`.
        let known = unsafe {
            runtime_policy::sealed_remaining(ptr as usize, runtime_policy::Claim::Length(len))
        };
        let action = global_healing_policy().heal_explicit_length(len, known);
        if let HealingAction::ClampSize { clamped, .. } = action {
            len = clamped;
        }
        runtime_policy::record(action);
    }

    // SAFETY: caller contract (strict) or clamped extent (hardened).
    let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) };
    StrbridgeString::into_raw(widen_with_length(bytes, len))
}

/// Release a buffer returned by [`to_c_str_in`].
///
/// # Safety
///
/// In strict mode `ptr` must be NULL or a live `malloc`ed pointer.
pub unsafe fn c_str_free_in(mode: SafetyLevel, ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    if runtime_policy::admit_free(mode, ptr as usize) {
        // SAFETY: admitted pointers are live C allocations.
        unsafe { libc::free(ptr.cast::<c_void>()) };
    }
}

fn null_input(mode: SafetyLevel) -> *mut StrbridgeString {
    if mode.heals_enabled() {
        runtime_policy::record(HealingAction::ReturnSafeDefault);
        StrbridgeString::into_raw(ManagedString::default())
    } else {
        ptr::null_mut()
    }
}

abi_fn! {
    /// Lossy managed string -> NUL-terminated byte string.
    ///
    /// Every code unit >= 0x80 becomes `'?'`. The result has `len + 1` bytes
    /// and belongs to the caller.
    fn strbridge_to_c_str(ms: *const StrbridgeString) -> *mut c_char => to_c_str_in;
}

abi_fn! {
    /// NUL-terminated byte string -> managed string, zero-extending each byte.
    fn strbridge_from_c_str(ptr: *const c_char) -> *mut StrbridgeString => from_c_str_in;
}

abi_fn! {
    /// `len` bytes -> managed string of `len` code units. Embedded NULs are kept.
    fn strbridge_from_c_str_with_length(
        ptr: *const c_char,
        len: c_uint,
    ) -> *mut StrbridgeString => from_c_str_with_length_in;
}

abi_fn! {
    /// Release a buffer returned by `strbridge_to_c_str`. NULL is a no-op.
    fn strbridge_c_str_free(ptr: *mut c_char) => c_str_free_in;
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use strbridge_membrane::global_registry;

    use super::*;

    // Serializes tests that hand buffers to the shared registry, so a freed
    // address cannot be reissued to a parallel test mid-assertion.
    static REGISTRY_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        REGISTRY_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn make(units: &[u16]) -> *mut StrbridgeString {
        StrbridgeString::into_raw(ManagedString::from(units))
    }

    unsafe fn take(raw: *mut StrbridgeString) -> ManagedString {
        assert!(!raw.is_null());
        unsafe { StrbridgeString::from_raw(raw) }
    }

    #[test]
    fn narrow_allocates_len_plus_one() {
        let _guard = lock();
        let ms = make(&[0x61, 0x62, 0x263A, 0x63]);
        unsafe {
            let out = to_c_str_in(SafetyLevel::Hardened, ms);
            assert_eq!(runtime_policy::registered_remaining(out as usize), Some(5));
            assert_eq!(CStr::from_ptr(out).to_bytes_with_nul(), b"ab?c\0");
            c_str_free_in(SafetyLevel::Hardened, out);
            drop(take(ms));
        }
    }

    #[test]
    fn strict_leaves_registry_untouched() {
        let _guard = lock();
        let ms = make(&[0x61, 0x62]);
        let before = global_registry().live_count();
        unsafe {
            let out = to_c_str_in(SafetyLevel::Strict, ms);
            assert!(!global_registry().is_live(out as usize));
            assert_eq!(global_registry().live_count(), before);
            c_str_free_in(SafetyLevel::Strict, out);
            drop(take(ms));
        }
    }

    #[test]
    fn plain_free_then_reuse_keeps_callers_length() {
        let _guard = lock();
        let ms = make(&[0x68, 0x69]);
        unsafe {
            let out = to_c_str_in(SafetyLevel::Hardened, ms);
            let stale = out as usize;
            libc::free(out.cast::<c_void>());

            // Same size class as the released buffer, so glibc usually hands
            // the address straight back.
            let mine = libc::malloc(16).cast::<u8>();
            assert!(!mine.is_null());
            ptr::write_bytes(mine, b'z', 16);

            let s = take(from_c_str_with_length_in(SafetyLevel::Hardened, mine.cast(), 16));
            assert_eq!(s.len(), 16);
            assert!(s.as_units().iter().all(|&u| u == u16::from(b'z')));

            if mine as usize == stale {
                assert!(!global_registry().is_live(stale));
            }
            libc::free(mine.cast::<c_void>());
            drop(take(ms));
        }
    }

    #[test]
    fn hardened_trusts_length_for_foreign_buffer() {
        // Only sealed buffers from this library are clamped; a foreign
        // pointer gets the caller's length, exactly as in strict mode.
        let _guard = lock();
        let bytes = [7u8; 16];
        let before = global_healing_policy().snapshot();
        unsafe {
            let s = take(from_c_str_with_length_in(
                SafetyLevel::Hardened,
                bytes.as_ptr().cast(),
                16,
            ));
            assert_eq!(s.len(), 16);
        }
        let after = global_healing_policy().snapshot();
        assert_eq!(after.size_clamps, before.size_clamps);
    }

    #[test]
    fn narrow_empty_is_single_nul() {
        let _guard = lock();
        let ms = make(&[]);
        unsafe {
            let out = to_c_str_in(SafetyLevel::Strict, ms);
            assert_eq!(*out, 0);
            c_str_free_in(SafetyLevel::Strict, out);
            drop(take(ms));
        }
    }

    #[test]
    fn narrow_null_strict_returns_null_hardened_returns_empty() {
        let _guard = lock();
        unsafe {
            assert!(to_c_str_in(SafetyLevel::Strict, ptr::null()).is_null());
            let out = to_c_str_in(SafetyLevel::Hardened, ptr::null());
            assert!(!out.is_null());
            assert_eq!(*out, 0);
            c_str_free_in(SafetyLevel::Hardened, out);
        }
    }

    #[test]
    fn widen_implicit_length() {
        unsafe {
            let s = take(from_c_str_in(SafetyLevel::Strict, c"abc".as_ptr()));
            assert_eq!(s.as_units(), &[0x61, 0x62, 0x63]);
        }
    }

    #[test]
    fn widen_zero_extends_high_bytes() {
        let bytes = [0xFFu8, 0x80, 0x41, 0];
        unsafe {
            let s = take(from_c_str_in(SafetyLevel::Strict, bytes.as_ptr().cast()));
            assert_eq!(s.as_units(), &[0x00FF, 0x0080, 0x0041]);
        }
    }

    #[test]
    fn widen_explicit_length_keeps_nuls() {
        let bytes = b"a\0b";
        unsafe {
            let s = take(from_c_str_with_length_in(
                SafetyLevel::Strict,
                bytes.as_ptr().cast(),
                3,
            ));
            assert_eq!(s.as_units(), &[0x61, 0, 0x62]);
        }
    }

    #[test]
    fn widen_explicit_zero_length_accepts_null() {
        unsafe {
            let s = take(from_c_str_with_length_in(SafetyLevel::Strict, ptr::null(), 0));
            assert!(s.is_empty());
        }
    }

    #[test]
    fn widen_null_strict_vs_hardened() {
        unsafe {
            assert!(from_c_str_in(SafetyLevel::Strict, ptr::null()).is_null());
            assert!(from_c_str_with_length_in(SafetyLevel::Strict, ptr::null(), 4).is_null());
            assert!(take(from_c_str_in(SafetyLevel::Hardened, ptr::null())).is_empty());
            let healed = from_c_str_with_length_in(SafetyLevel::Hardened, ptr::null(), 4);
            assert!(take(healed).is_empty());
        }
    }

    #[test]
    fn hardened_clamps_length_to_own_buffer() {
        let _guard = lock();
        let ms = make(&[0x68, 0x69]);
        unsafe {
            let out = to_c_str_in(SafetyLevel::Hardened, ms);
            let s = take(from_c_str_with_length_in(SafetyLevel::Hardened, out, 64));
            // Extent is the two data bytes plus the terminator.
            assert_eq!(s.as_units(), &[0x68, 0x69, 0]);
            c_str_free_in(SafetyLevel::Hardened, out);
            drop(take(ms));
        }
    }

    #[test]
    fn hardened_bounds_scan_of_overwritten_terminator() {
        let _guard = lock();
        let ms = make(&[0x41, 0x42, 0x43]);
        unsafe {
            let out = to_c_str_in(SafetyLevel::Hardened, ms);
            *out.add(3) = b'D' as c_char;
            let s = take(from_c_str_in(SafetyLevel::Hardened, out));
            assert_eq!(s.as_units(), &[0x41, 0x42, 0x43, 0x44]);
            c_str_free_in(SafetyLevel::Hardened, out);
            drop(take(ms));
        }
    }

    #[test]
    fn hardened_scan_past_stale_extent_follows_callers_nul() {
        let _guard = lock();
        let ms = make(&[0x41, 0x42]);
        unsafe {
            let out = to_c_str_in(SafetyLevel::Hardened, ms);
            // Rewritten as if by a new owner of the address: longer string,
            // terminator inside what used to be the seal.
            ptr::copy_nonoverlapping(c"ABCDE".as_ptr(), out, 6);
            let s = take(from_c_str_in(SafetyLevel::Hardened, out));
            assert_eq!(s.as_units(), &[0x41, 0x42, 0x43, 0x44, 0x45]);
            assert!(!global_registry().is_live(out as usize));
            libc::free(out.cast::<c_void>());
            drop(take(ms));
        }
    }

    #[test]
    fn hardened_ignores_double_and_foreign_free() {
        let _guard = lock();
        let ms = make(&[0x41]);
        let before = global_healing_policy().snapshot();
        unsafe {
            let out = to_c_str_in(SafetyLevel::Hardened, ms);
            c_str_free_in(SafetyLevel::Hardened, out);
            c_str_free_in(SafetyLevel::Hardened, out);

            let mut local = [0 as c_char; 4];
            c_str_free_in(SafetyLevel::Hardened, local.as_mut_ptr());
            drop(take(ms));
        }
        let after = global_healing_policy().snapshot();
        assert!(after.double_frees > before.double_frees);
        assert!(after.foreign_frees > before.foreign_frees);
    }

    #[test]
    fn input_buffer_is_not_freed() {
        let owned = std::ffi::CString::new("keep").unwrap();
        unsafe {
            let s = take(from_c_str_in(SafetyLevel::Strict, owned.as_ptr()));
            assert_eq!(s.len(), 4);
        }
        assert_eq!(owned.as_bytes(), b"keep");
    }
}
