//! Runtime mode configuration.
//!
//! The runtime mode is set via the `STRBRIDGE_MODE` environment variable:
//! - `strict` (default): the exact conversion contract. Explicit lengths are
//!   trusted, inputs are never validated and outputs are bit-for-bit what
//!   existing callers expect.
//! - `hardened`: the ABI layer validates inputs it can reason about and applies
//!   deterministic healing (safe-default on NULL, clamp lengths to known
//!   allocation extents, ignore foreign/double frees). Well-formed inputs
//!   convert identically in both modes.
//! - `off`: No bookkeeping at all. Benchmark baseline only, never parsed from the env.

use std::sync::atomic::{AtomicU8, Ordering};

/// Name of the environment variable holding the runtime mode.
pub const MODE_ENV_VAR: &str = "STRBRIDGE_MODE";

/// Runtime operating mode for the ABI boundary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Exact conversion contract; no validation, no repairs.
    #[default]
    Strict,
    /// Opt-in healing for NULL inputs, oversized lengths and bad frees.
    Hardened,
    /// No validation and no registry bookkeeping.
    Off,
}

impl SafetyLevel {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "strict" | "default" | "abi" => Self::Strict,
            "hardened" | "repair" | "tsm" | "full" => Self::Hardened,
            "off" | "none" | "disabled" => Self::Off,
            _ => Self::Strict,
        }
    }

    /// Returns true if the ABI layer should apply healing actions.
    #[must_use]
    pub const fn heals_enabled(self) -> bool {
        matches!(self, Self::Hardened)
    }

    /// Returns true if allocations should be tracked in the registry.
    ///
    /// Only hardened mode reads the registry, so only hardened mode writes it.
    #[must_use]
    pub const fn tracking_enabled(self) -> bool {
        self.heals_enabled()
    }

    /// Lowercase name as accepted by `STRBRIDGE_MODE`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Hardened => "hardened",
            Self::Off => "off",
        }
    }
}

// Atomic cache: 0=unresolved, 1=Strict, 2=Hardened, 3=Off, 255=resolving.
// A reentrant caller that observes RESOLVING gets Strict instead of blocking.
static CACHED_LEVEL: AtomicU8 = AtomicU8::new(0);

const LEVEL_UNRESOLVED: u8 = 0;
const LEVEL_STRICT: u8 = 1;
const LEVEL_HARDENED: u8 = 2;
const LEVEL_OFF: u8 = 3;
const LEVEL_RESOLVING: u8 = 255;

fn parse_runtime_mode_env(raw: &str) -> SafetyLevel {
    match raw.to_ascii_lowercase().as_str() {
        "strict" | "default" | "abi" => SafetyLevel::Strict,
        "hardened" | "repair" | "tsm" | "full" => SafetyLevel::Hardened,
        // `Off` stays reachable for benches through the API only.
        _ => SafetyLevel::Strict,
    }
}

fn level_to_u8(level: SafetyLevel) -> u8 {
    match level {
        SafetyLevel::Strict => LEVEL_STRICT,
        SafetyLevel::Hardened => LEVEL_HARDENED,
        SafetyLevel::Off => LEVEL_OFF,
    }
}

fn u8_to_level(v: u8) -> SafetyLevel {
    match v {
        LEVEL_HARDENED => SafetyLevel::Hardened,
        LEVEL_OFF => SafetyLevel::Off,
        _ => SafetyLevel::Strict,
    }
}

/// Get the configured safety level (reads env var on first call, caches thereafter).
#[must_use]
pub fn safety_level() -> SafetyLevel {
    let cached = CACHED_LEVEL.load(Ordering::Relaxed);

    if cached != LEVEL_UNRESOLVED && cached != LEVEL_RESOLVING {
        return u8_to_level(cached);
    }

    if cached == LEVEL_RESOLVING {
        return SafetyLevel::Strict;
    }

    if CACHED_LEVEL
        .compare_exchange(
            LEVEL_UNRESOLVED,
            LEVEL_RESOLVING,
            Ordering::SeqCst,
            Ordering::Relaxed,
        )
        .is_err()
    {
        let v = CACHED_LEVEL.load(Ordering::Relaxed);
        return if v != LEVEL_UNRESOLVED && v != LEVEL_RESOLVING {
            u8_to_level(v)
        } else {
            SafetyLevel::Strict
        };
    }

    let level = std::env::var(MODE_ENV_VAR)
        .map(|v| parse_runtime_mode_env(&v))
        .unwrap_or_default();
    CACHED_LEVEL.store(level_to_u8(level), Ordering::Release);
    level
}
