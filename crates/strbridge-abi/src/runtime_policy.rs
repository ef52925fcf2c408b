//! Runtime policy bridge for ABI entrypoints.
//!
//! Centralizes access to the membrane (mode, healing counters, allocation
//! registry) so conversion entrypoints stay focused on the conversion itself.
//!
//! Hardened-mode buffers carry a seal: [`SEAL_LEN`] nonzero bytes derived from
//! the base address and a per-process secret, written right after the
//! terminator. A registry extent is only trusted while the seal is intact. A
//! buffer the caller released with plain `free()` and the allocator handed out
//! again is overwritten by its new owner, so the stale entry fails the check
//! and is dropped instead of clamping someone else's data.
//!
//! The seal of a stale entry lives in memory we no longer own. It is only read
//! where the caller's own claim about its pointer already makes it readable,
//! or on the same page as such a byte.

use std::hash::BuildHasher;
use std::ptr;
use std::sync::LazyLock;

use strbridge_membrane::{
    FreeOutcome, HealingAction, LiveBuffer, SafetyLevel, global_healing_policy, global_registry,
    safety_level,
};

/// Bytes reserved after the terminator of every tracked buffer.
pub(crate) const SEAL_LEN: usize = 8;

/// Smallest page size on supported targets. Memory is never mapped in finer units.
const PAGE_FLOOR: usize = 4096;

static SEAL_SECRET: LazyLock<u64> =
    LazyLock::new(|| std::hash::RandomState::new().hash_one(0x5EA1_u64));

fn seal_for(base: usize) -> [u8; SEAL_LEN] {
    let mixed = *SEAL_SECRET ^ (base as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    mixed.to_ne_bytes().map(|b| b.max(1))
}

fn same_page(a: usize, b: usize) -> bool {
    a / PAGE_FLOOR == b / PAGE_FLOOR
}

/// What the caller has promised about the memory behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// `len` bytes are readable from the pointer.
    Length(usize),
    /// The pointer starts a NUL-terminated string with no NUL before the end
    /// of the registered extent.
    Unterminated,
}

/// Mode for the current call.
#[inline]
pub(crate) fn mode() -> SafetyLevel {
    safety_level()
}

/// Count a healing action if it is one.
pub(crate) fn record(action: HealingAction) {
    if action.is_heal() {
        global_healing_policy().record(&action);
    }
}

/// Extra bytes to allocate past the terminator in `mode`.
pub(crate) fn seal_reserve(mode: SafetyLevel) -> usize {
    if mode.tracking_enabled() { SEAL_LEN } else { 0 }
}

/// Seal and remember a buffer handed to the caller.
///
/// # Safety
///
/// `base` must be valid for writes of `extent + seal_reserve(mode)` bytes.
pub(crate) unsafe fn track(mode: SafetyLevel, base: *mut u8, extent: usize) {
    if !mode.tracking_enabled() {
        return;
    }
    let seal = seal_for(base as usize);
    // SAFETY: caller reserved SEAL_LEN bytes after the extent.
    unsafe { ptr::copy_nonoverlapping(seal.as_ptr(), base.add(extent), SEAL_LEN) };
    global_registry().register(base as usize, extent);
}

/// Registered bytes from `addr` to the end of its buffer, unverified.
///
/// Only usable as a provisional bound; confirm it with [`sealed_remaining`]
/// before it changes a result.
pub(crate) fn registered_remaining(addr: usize) -> Option<usize> {
    global_registry().remaining_from(addr)
}

/// Bytes known to be readable from `addr`, if `addr` lies in a buffer we
/// sealed and the seal is still intact.
///
/// # Safety
///
/// `claim` must hold for `addr` as the caller of the entrypoint stated it.
pub(crate) unsafe fn sealed_remaining(addr: usize, claim: Claim) -> Option<usize> {
    let live = global_registry().lookup(addr)?;
    let remaining = live.remaining_from(addr);
    let vouched_end = match claim {
        // Nothing past the extent is needed, so nothing can be healed.
        Claim::Length(len) if len <= remaining => return Some(remaining),
        Claim::Length(len) => addr + len,
        Claim::Unterminated => live.base + live.extent + 1,
    };
    // SAFETY: forwarded caller claim.
    if unsafe { seal_intact(&live, vouched_end, claim == Claim::Unterminated) } {
        Some(remaining)
    } else {
        global_registry().forget_stale(&live);
        None
    }
}

/// Compare the seal byte by byte, stopping at the first mismatch.
///
/// Bytes below `vouched_end` are readable; a byte on the same page as
/// `vouched_end - 1` is too. With `string_continues`, every matched (nonzero)
/// seal byte extends the caller's string and so vouches for the next one.
unsafe fn seal_intact(live: &LiveBuffer, mut vouched_end: usize, string_continues: bool) -> bool {
    let seal_at = live.base + live.extent;
    for (i, expected) in seal_for(live.base).into_iter().enumerate() {
        let at = seal_at + i;
        if at >= vouched_end && !same_page(at, vouched_end - 1) {
            return false;
        }
        // SAFETY: `at` is vouched for, or shares a mapped page with a vouched byte.
        if unsafe { ptr::read(at as *const u8) } != expected {
            return false;
        }
        if string_continues {
            vouched_end = vouched_end.max(at + 2);
        }
    }
    true
}

/// Decide whether a buffer handed back to us should really be released.
pub(crate) fn admit_free(mode: SafetyLevel, base: usize) -> bool {
    if !mode.tracking_enabled() {
        // Strict forwards everything to the C allocator, as a plain free() would.
        return true;
    }
    match global_registry().release(base) {
        FreeOutcome::Released { .. } | FreeOutcome::Evicted => true,
        FreeOutcome::DoubleFree => {
            record(HealingAction::IgnoreDoubleFree);
            false
        }
        FreeOutcome::Unknown => {
            record(HealingAction::IgnoreForeignFree);
            false
        }
    }
}
