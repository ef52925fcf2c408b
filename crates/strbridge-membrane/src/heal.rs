//! Self-healing policy engine.
//!
//! In hardened mode the ABI layer does not trust caller-supplied pointers and
//! lengths blindly. When it can prove an input is bad it applies one of the
//! deterministic actions below instead of reading out of bounds or freeing
//! memory it does not own. Every action is counted.

use std::sync::atomic::{AtomicU64, Ordering};

/// Actions the ABI layer can take to heal an unsafe conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealingAction {
    /// Clamp an explicit length to the known extent of the source buffer.
    ClampSize { requested: usize, clamped: usize },
    /// Stop a terminator scan at the known extent of the source buffer.
    TruncateWithNull { requested: usize, truncated: usize },
    /// Ignore a second release of a buffer we already released.
    IgnoreDoubleFree,
    /// Ignore a release of a buffer we never handed out.
    IgnoreForeignFree,
    /// Return an empty result instead of dereferencing NULL.
    ReturnSafeDefault,
    /// No healing needed.
    None,
}

impl HealingAction {
    /// Returns true if this action represents an actual healing (not None).
    #[must_use]
    pub const fn is_heal(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Stable lowercase label used in structured logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ClampSize { .. } => "clamp_size",
            Self::TruncateWithNull { .. } => "truncate_with_null",
            Self::IgnoreDoubleFree => "ignore_double_free",
            Self::IgnoreForeignFree => "ignore_foreign_free",
            Self::ReturnSafeDefault => "return_safe_default",
            Self::None => "none",
        }
    }
}

/// Point-in-time copy of the healing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealingSnapshot {
    pub total_heals: u64,
    pub size_clamps: u64,
    pub null_truncations: u64,
    pub double_frees: u64,
    pub foreign_frees: u64,
    pub safe_defaults: u64,
}

/// Policy engine that decides and counts healing actions.
pub struct HealingPolicy {
    /// Total heals applied.
    pub total_heals: AtomicU64,
    /// Length clamps applied.
    pub size_clamps: AtomicU64,
    /// Bounded terminator scans.
    pub null_truncations: AtomicU64,
    /// Double frees ignored.
    pub double_frees: AtomicU64,
    /// Foreign frees ignored.
    pub foreign_frees: AtomicU64,
    /// Safe defaults returned.
    pub safe_defaults: AtomicU64,
}

impl HealingPolicy {
    /// Create a new policy with zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_heals: AtomicU64::new(0),
            size_clamps: AtomicU64::new(0),
            null_truncations: AtomicU64::new(0),
            double_frees: AtomicU64::new(0),
            foreign_frees: AtomicU64::new(0),
            safe_defaults: AtomicU64::new(0),
        }
    }

    /// Record a healing action.
    pub fn record(&self, action: &HealingAction) {
        if action.is_heal() {
            self.total_heals.fetch_add(1, Ordering::Relaxed);
        }

        let counter = match action {
            HealingAction::ClampSize { .. } => &self.size_clamps,
            HealingAction::TruncateWithNull { .. } => &self.null_truncations,
            HealingAction::IgnoreDoubleFree => &self.double_frees,
            HealingAction::IgnoreForeignFree => &self.foreign_frees,
            HealingAction::ReturnSafeDefault => &self.safe_defaults,
            HealingAction::None => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Decide healing for an explicit-length read from a buffer of known extent.
    #[must_use]
    pub fn heal_explicit_length(&self, requested: usize, extent: Option<usize>) -> HealingAction {
        match extent {
            Some(available) if requested > available => HealingAction::ClampSize {
                requested,
                clamped: available,
            },
            _ => HealingAction::None,
        }
    }

    /// Decide healing for a terminator scan that found no NUL within `extent`.
    #[must_use]
    pub fn heal_unterminated_scan(&self, extent: usize) -> HealingAction {
        HealingAction::TruncateWithNull {
            requested: extent.saturating_add(1),
            truncated: extent,
        }
    }

    /// Copy all counters.
    #[must_use]
    pub fn snapshot(&self) -> HealingSnapshot {
        HealingSnapshot {
            total_heals: self.total_heals.load(Ordering::Relaxed),
            size_clamps: self.size_clamps.load(Ordering::Relaxed),
            null_truncations: self.null_truncations.load(Ordering::Relaxed),
            double_frees: self.double_frees.load(Ordering::Relaxed),
            foreign_frees: self.foreign_frees.load(Ordering::Relaxed),
            safe_defaults: self.safe_defaults.load(Ordering::Relaxed),
        }
    }
}

impl Default for HealingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Global healing policy instance.
static GLOBAL_POLICY: HealingPolicy = HealingPolicy::new();

/// Access the global healing policy.
#[must_use]
pub fn global_healing_policy() -> &'static HealingPolicy {
    &GLOBAL_POLICY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_when_length_exceeds_extent() {
        let policy = HealingPolicy::new();
        assert_eq!(
            policy.heal_explicit_length(12, Some(8)),
            HealingAction::ClampSize {
                requested: 12,
                clamped: 8
            }
        );
    }

    #[test]
    fn no_heal_within_extent_or_unknown() {
        let policy = HealingPolicy::new();
        assert_eq!(policy.heal_explicit_length(8, Some(8)), HealingAction::None);
        assert_eq!(policy.heal_explicit_length(1000, None), HealingAction::None);
    }

    #[test]
    fn unterminated_scan_truncates_at_extent() {
        let policy = HealingPolicy::new();
        assert_eq!(
            policy.heal_unterminated_scan(5),
            HealingAction::TruncateWithNull {
                requested: 6,
                truncated: 5
            }
        );
    }

    #[test]
    fn record_increments_counters() {
        let policy = HealingPolicy::new();
        policy.record(&HealingAction::IgnoreDoubleFree);
        policy.record(&HealingAction::IgnoreDoubleFree);
        policy.record(&HealingAction::ReturnSafeDefault);
        policy.record(&HealingAction::None);

        let snap = policy.snapshot();
        assert_eq!(snap.total_heals, 3);
        assert_eq!(snap.double_frees, 2);
        assert_eq!(snap.safe_defaults, 1);
        assert_eq!(snap.size_clamps, 0);
    }

    #[test]
    fn none_is_not_a_heal() {
        assert!(!HealingAction::None.is_heal());
        assert!(HealingAction::IgnoreForeignFree.is_heal());
        assert_eq!(HealingAction::IgnoreForeignFree.label(), "ignore_foreign_free");
    }
}
