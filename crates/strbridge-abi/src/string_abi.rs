//! Managed string objects as seen from C.
//!
//! A `strbridge_string_t` is an opaque, heap-allocated header holding the
//! logical length and a pointer to the code units. There is no terminator;
//! C code must use `strbridge_string_length` and `strbridge_string_data`.
//! Every string returned by this library is owned by the caller until it is
//! passed to `strbridge_string_free`.

use std::ffi::c_uint;
use std::ptr;

use strbridge_core::ManagedString;

/// C layout of a managed string.
#[repr(C)]
#[derive(Debug)]
pub struct StrbridgeString {
    len: usize,
    data: *mut u16,
}

impl StrbridgeString {
    /// Move a managed string onto the heap and hand out the raw header.
    #[must_use]
    pub fn into_raw(s: ManagedString) -> *mut StrbridgeString {
        let units = s.into_boxed_units();
        let len = units.len();
        let data = Box::into_raw(units).cast::<u16>();
        Box::into_raw(Box::new(StrbridgeString { len, data }))
    }

    /// Reclaim a header produced by [`StrbridgeString::into_raw`].
    ///
    /// # Safety
    ///
    /// `raw` must come from `into_raw` and must not be used afterwards.
    #[must_use]
    pub unsafe fn from_raw(raw: *mut StrbridgeString) -> ManagedString {
        // SAFETY: caller guarantees `raw` came from `into_raw`.
        let header = unsafe { Box::from_raw(raw) };
        let slice = ptr::slice_from_raw_parts_mut(header.data, header.len);
        // SAFETY: `data`/`len` describe the boxed slice leaked by `into_raw`.
        let units = unsafe { Box::from_raw(slice) };
        ManagedString::from_units(units.into_vec())
    }

    /// Logical length in code units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length as reported across the C ABI, saturating at `c_uint::MAX`.
    #[must_use]
    pub fn c_len(&self) -> c_uint {
        saturating_c_uint(self.len)
    }

    /// Borrow the code units.
    #[must_use]
    pub fn units(&self) -> &[u16] {
        // SAFETY: `data` points at `len` initialized units for the header's lifetime.
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }
}

fn saturating_c_uint(len: usize) -> c_uint {
    c_uint::try_from(len).unwrap_or(c_uint::MAX)
}

abi_fn! {
    /// Allocate a managed string of `len` code units, each set to `fill`.
    ///
    /// Never returns NULL; allocation failure aborts.
    fn strbridge_make_string(len: c_uint, fill: u16) -> *mut StrbridgeString {
        StrbridgeString::into_raw(ManagedString::new(len as usize, fill))
    }
}

abi_fn! {
    /// Logical length of `s` in code units; 0 for NULL.
    ///
    /// Strings longer than `UINT_MAX` units (only reachable through
    /// `strbridge_from_c_str` on 64-bit targets) report `UINT_MAX`.
    fn strbridge_string_length(s: *const StrbridgeString) -> c_uint {
        match s.as_ref() {
            Some(header) => header.c_len(),
            None => 0,
        }
    }
}

abi_fn! {
    /// Pointer to the first code unit of `s`; NULL for NULL.
    ///
    /// The pointer stays valid until `s` is freed. It is never NULL for a
    /// non-NULL `s`, even when the length is 0.
    fn strbridge_string_data(s: *const StrbridgeString) -> *const u16 {
        match s.as_ref() {
            Some(header) => header.data.cast_const(),
            None => ptr::null(),
        }
    }
}

abi_fn! {
    /// Release a managed string returned by this library. NULL is a no-op.
    fn strbridge_string_free(s: *mut StrbridgeString) {
        if !s.is_null() {
            drop(StrbridgeString::from_raw(s));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip_preserves_units() {
        let raw = StrbridgeString::into_raw(ManagedString::from_units(vec![1, 0, 0xFFFF]));
        let header = unsafe { &*raw };
        assert_eq!(header.len(), 3);
        assert_eq!(header.units(), &[1, 0, 0xFFFF]);
        let back = unsafe { StrbridgeString::from_raw(raw) };
        assert_eq!(back.as_units(), &[1, 0, 0xFFFF]);
    }

    #[test]
    fn c_length_saturates() {
        assert_eq!(saturating_c_uint(0), 0);
        assert_eq!(saturating_c_uint(7), 7);
        assert_eq!(saturating_c_uint(c_uint::MAX as usize), c_uint::MAX);
        #[cfg(target_pointer_width = "64")]
        {
            assert_eq!(saturating_c_uint(c_uint::MAX as usize + 1), c_uint::MAX);
            assert_eq!(saturating_c_uint(usize::MAX), c_uint::MAX);
        }
    }

    #[test]
    fn make_string_and_accessors() {
        unsafe {
            let s = strbridge_make_string(4, 0x263A);
            assert_eq!(strbridge_string_length(s), 4);
            let data = strbridge_string_data(s);
            assert!(!data.is_null());
            assert_eq!(std::slice::from_raw_parts(data, 4), &[0x263A; 4]);
            strbridge_string_free(s);
        }
    }

    #[test]
    fn empty_string_has_non_null_data() {
        unsafe {
            let s = strbridge_make_string(0, 0);
            assert_eq!(strbridge_string_length(s), 0);
            assert!(!strbridge_string_data(s).is_null());
            strbridge_string_free(s);
        }
    }

    #[test]
    fn null_accessors_are_benign() {
        unsafe {
            assert_eq!(strbridge_string_length(ptr::null()), 0);
            assert!(strbridge_string_data(ptr::null()).is_null());
            strbridge_string_free(ptr::null_mut());
        }
    }
}
