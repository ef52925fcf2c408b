#![no_main]
use std::ffi::c_char;

use libfuzzer_sys::fuzz_target;
use strbridge_abi::convert_abi::{
    c_str_free_in, from_c_str_in, from_c_str_with_length_in, to_c_str_in,
};
use strbridge_abi::{StrbridgeString, strbridge_string_free};
use strbridge_core::{ManagedString, c_strlen, narrow_lossy, widen, widen_with_length};
use strbridge_membrane::SafetyLevel;

fuzz_target!(|data: &[u8]| {
    // Kernels: arbitrary bytes as both a C buffer and a code unit run.
    let wide = widen(data);
    assert_eq!(wide.len(), c_strlen(data));
    let explicit = widen_with_length(data, data.len());
    assert!(explicit.as_units().iter().zip(data).all(|(&u, &b)| u == u16::from(b)));

    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let narrow = narrow_lossy(&units);
    assert_eq!(narrow.len(), units.len() + 1);
    assert_eq!(narrow.last(), Some(&0));
    assert!(narrow[..units.len()].iter().all(|&b| b < 0x80));

    // ABI: a terminated copy keeps the scan in bounds under strict mode.
    let mut terminated = data.to_vec();
    terminated.push(0);
    for mode in [SafetyLevel::Strict, SafetyLevel::Hardened] {
        unsafe {
            let ms = from_c_str_in(mode, terminated.as_ptr().cast::<c_char>());
            assert_eq!((*ms).units(), wide.as_units());

            let out = to_c_str_in(mode, ms);
            let back = from_c_str_with_length_in(mode, out, (*ms).len() as u32);
            assert_eq!((*back).len(), (*ms).len());

            c_str_free_in(mode, out);
            strbridge_string_free(back);
            strbridge_string_free(ms);
        }
    }

    let ms = StrbridgeString::into_raw(ManagedString::from(units.as_slice()));
    unsafe {
        let out = to_c_str_in(SafetyLevel::Hardened, ms);
        assert_eq!(*out.add(units.len()), 0);
        c_str_free_in(SafetyLevel::Hardened, out);
        strbridge_string_free(ms);
    }
});
