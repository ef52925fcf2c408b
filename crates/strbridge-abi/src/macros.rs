//! `abi_fn!`: generator for the exported `strbridge_*` symbols.
//!
//! Two shapes are accepted:
//!
//! ```ignore
//! abi_fn! {
//!     /// Resolves the runtime mode, then calls `to_c_str_in(mode, ms)`.
//!     fn strbridge_to_c_str(ms: *const StrbridgeString) -> *mut c_char => to_c_str_in;
//! }
//!
//! abi_fn! {
//!     /// Mode-independent entrypoint with an inline body.
//!     fn strbridge_string_length(s: *const StrbridgeString) -> c_uint { ... }
//! }
//! ```
//!
//! Either way the result is a `#[unsafe(no_mangle)] pub unsafe extern "C" fn`.
//! Bodies run inside `unsafe`; the C caller's contract covers the raw pointers.

macro_rules! abi_fn {
    // Mode-dispatched, with return value.
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty => $inner:path;
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            unsafe { $inner(crate::runtime_policy::mode(), $($arg),*) }
        }
    };

    // Mode-dispatched, returns ().
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) => $inner:path;
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) {
            unsafe { $inner(crate::runtime_policy::mode(), $($arg),*) }
        }
    };

    // Inline body, with return value.
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        #[allow(unused_unsafe)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            unsafe { $body }
        }
    };

    // Inline body, returns ().
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        #[allow(unused_unsafe)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) {
            unsafe { $body }
        }
    };
}
