//! Registry of byte buffers handed out across the C boundary.
//!
//! Every buffer produced by the narrowing converter in hardened mode is
//! recorded with its base address and full extent (data bytes plus
//! terminator). Released buffers stay in a bounded quarantine queue so a second
//! release can be recognised.
//!
//! Callers may also release buffers with plain `free()`, which never reaches
//! us. Entries can therefore go stale; the ABI layer verifies an entry before
//! trusting its extent and calls [`AllocationRegistry::forget_stale`] when the
//! check fails. Each shard also caps its live set, evicting the oldest entry.
//!
//! Thread-safe via sharded `parking_lot::Mutex`. Addresses are plain `usize`
//! values; the registry never dereferences them.

use std::collections::{BTreeMap, VecDeque};

use parking_lot::Mutex;

/// Number of shards for registry locks (power of 2).
const NUM_SHARDS: usize = 16;

/// Maximum released entries remembered per shard.
const QUARANTINE_MAX_ENTRIES: usize = 4096;

/// Maximum live entries per shard before the oldest is evicted.
pub const LIVE_MAX_ENTRIES: usize = 8192;

/// Maximum evicted bases remembered per shard.
const EVICTED_MAX_ENTRIES: usize = 4096;

/// A live entry as seen by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveBuffer {
    pub base: usize,
    pub extent: usize,
    /// Registration stamp; distinguishes reuse of the same base address.
    pub generation: u64,
}

impl LiveBuffer {
    /// Bytes from `addr` to the end of the buffer. `addr` must lie inside it.
    #[must_use]
    pub fn remaining_from(&self, addr: usize) -> usize {
        self.base + self.extent - addr
    }
}

/// Result of asking the registry to release a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeOutcome {
    /// Buffer was live; it is now quarantined and may be deallocated.
    Released { extent: usize },
    /// Buffer was already released.
    DoubleFree,
    /// Buffer was ours but aged out of the live set; it may be deallocated.
    Evicted,
    /// Address never came from this registry (or aged out of quarantine).
    Unknown,
}

#[derive(Default)]
struct RegistryShard {
    live: BTreeMap<usize, (usize, u64)>,
    order: VecDeque<(usize, u64)>,
    quarantine: VecDeque<usize>,
    evicted: VecDeque<usize>,
    next_generation: u64,
}

impl RegistryShard {
    fn containing(&self, addr: usize) -> Option<LiveBuffer> {
        let (&base, &(extent, generation)) = self.live.range(..=addr).next_back()?;
        (addr < base.saturating_add(extent)).then_some(LiveBuffer {
            base,
            extent,
            generation,
        })
    }

    fn evict_oldest(&mut self) {
        while let Some((base, generation)) = self.order.pop_front() {
            if self.live.get(&base).is_some_and(|&(_, g)| g == generation) {
                self.live.remove(&base);
                bounded_push(&mut self.evicted, EVICTED_MAX_ENTRIES, base);
                return;
            }
        }
    }

    // Drop order records whose entry was released or replaced.
    fn compact_order(&mut self) {
        let live = &self.live;
        self.order.retain(|(base, generation)| {
            live.get(base).is_some_and(|&(_, g)| g == *generation)
        });
    }
}

fn bounded_push(queue: &mut VecDeque<usize>, max: usize, base: usize) {
    if queue.len() >= max {
        queue.pop_front();
    }
    queue.push_back(base);
}

/// Thread-safe map from buffer base address to extent.
pub struct AllocationRegistry {
    shards: Box<[Mutex<RegistryShard>]>,
}

impl AllocationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let shards: Vec<Mutex<RegistryShard>> = (0..NUM_SHARDS)
            .map(|_| Mutex::new(RegistryShard::default()))
            .collect();
        Self {
            shards: shards.into_boxed_slice(),
        }
    }

    /// Record a freshly allocated buffer of `extent` bytes at `base`.
    pub fn register(&self, base: usize, extent: usize) -> LiveBuffer {
        let mut shard = self.shards[shard_for(base)].lock();
        shard.quarantine.retain(|&q| q != base);
        shard.evicted.retain(|&q| q != base);

        shard.next_generation += 1;
        let generation = shard.next_generation;
        shard.live.insert(base, (extent, generation));
        shard.order.push_back((base, generation));

        if shard.live.len() > LIVE_MAX_ENTRIES {
            shard.evict_oldest();
        }
        if shard.order.len() > 2 * LIVE_MAX_ENTRIES {
            shard.compact_order();
        }
        LiveBuffer {
            base,
            extent,
            generation,
        }
    }

    /// The live buffer containing `addr`, if any.
    ///
    /// Only the shard owning `addr`'s page is searched, so interior pointers
    /// that cross a page boundary from their base are reported as unknown.
    #[must_use]
    pub fn lookup(&self, addr: usize) -> Option<LiveBuffer> {
        self.shards[shard_for(addr)].lock().containing(addr)
    }

    /// Bytes remaining from `addr` to the end of the live buffer containing it.
    #[must_use]
    pub fn remaining_from(&self, addr: usize) -> Option<usize> {
        self.lookup(addr).map(|live| live.remaining_from(addr))
    }

    /// Drop `stale` if it is still the current entry for its base.
    ///
    /// Returns true if an entry was removed.
    pub fn forget_stale(&self, stale: &LiveBuffer) -> bool {
        let mut shard = self.shards[shard_for(stale.base)].lock();
        if shard
            .live
            .get(&stale.base)
            .is_some_and(|&(_, g)| g == stale.generation)
        {
            shard.live.remove(&stale.base);
            true
        } else {
            false
        }
    }

    /// Returns true if `base` is the start of a live buffer.
    #[must_use]
    pub fn is_live(&self, base: usize) -> bool {
        self.shards[shard_for(base)].lock().live.contains_key(&base)
    }

    /// Mark the buffer at `base` released.
    pub fn release(&self, base: usize) -> FreeOutcome {
        let mut shard = self.shards[shard_for(base)].lock();
        if let Some((extent, _)) = shard.live.remove(&base) {
            bounded_push(&mut shard.quarantine, QUARANTINE_MAX_ENTRIES, base);
            return FreeOutcome::Released { extent };
        }
        if let Some(pos) = shard.evicted.iter().position(|&q| q == base) {
            shard.evicted.remove(pos);
            bounded_push(&mut shard.quarantine, QUARANTINE_MAX_ENTRIES, base);
            return FreeOutcome::Evicted;
        }
        if shard.quarantine.contains(&base) {
            FreeOutcome::DoubleFree
        } else {
            FreeOutcome::Unknown
        }
    }

    /// Number of live buffers across all shards.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.shards.iter().map(|s| s.lock().live.len()).sum()
    }
}

impl Default for AllocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn shard_for(addr: usize) -> usize {
    (addr >> 12) % NUM_SHARDS
}

static GLOBAL_REGISTRY: std::sync::LazyLock<AllocationRegistry> =
    std::sync::LazyLock::new(AllocationRegistry::new);

/// Access the process-wide registry used by the ABI layer.
#[must_use]
pub fn global_registry() -> &'static AllocationRegistry {
    &GLOBAL_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_interior_pointer() {
        let registry = AllocationRegistry::new();
        registry.register(0x1000, 16);

        assert_eq!(registry.remaining_from(0x1000), Some(16));
        assert_eq!(registry.remaining_from(0x1004), Some(12));
        assert_eq!(registry.remaining_from(0x1010), None);
        assert_eq!(registry.remaining_from(0x0fff), None);
        assert!(registry.is_live(0x1000));
        assert!(!registry.is_live(0x1004));
    }

    #[test]
    fn lookup_picks_nearest_lower_base() {
        let registry = AllocationRegistry::new();
        registry.register(0x1000, 4);
        registry.register(0x1008, 4);

        assert_eq!(registry.lookup(0x1009).map(|b| b.base), Some(0x1008));
        assert_eq!(registry.lookup(0x1005), None);
    }

    #[test]
    fn release_detects_double_and_foreign_free() {
        let registry = AllocationRegistry::new();
        registry.register(0x2000, 4);

        assert_eq!(
            registry.release(0x2000),
            FreeOutcome::Released { extent: 4 }
        );
        assert_eq!(registry.release(0x2000), FreeOutcome::DoubleFree);
        assert_eq!(registry.release(0x9000), FreeOutcome::Unknown);
        assert_eq!(registry.remaining_from(0x2000), None);
    }

    #[test]
    fn reused_address_becomes_live_again() {
        let registry = AllocationRegistry::new();
        let first = registry.register(0x3000, 8);
        let _ = registry.release(0x3000);
        let second = registry.register(0x3000, 2);

        assert_ne!(first.generation, second.generation);
        assert_eq!(registry.remaining_from(0x3000), Some(2));
        assert_eq!(
            registry.release(0x3000),
            FreeOutcome::Released { extent: 2 }
        );
    }

    #[test]
    fn forget_stale_only_drops_matching_generation() {
        let registry = AllocationRegistry::new();
        let old = registry.register(0x4000, 8);
        let fresh = registry.register(0x4000, 8);

        assert!(!registry.forget_stale(&old));
        assert!(registry.is_live(0x4000));
        assert!(registry.forget_stale(&fresh));
        assert!(!registry.is_live(0x4000));
        assert_eq!(registry.release(0x4000), FreeOutcome::Unknown);
    }

    #[test]
    fn live_set_is_bounded_per_shard() {
        let registry = AllocationRegistry::new();
        // All bases map to shard 0.
        let base = |i: usize| (i * NUM_SHARDS) << 12;
        for i in 0..LIVE_MAX_ENTRIES + 10 {
            registry.register(base(i), 1);
        }

        assert_eq!(registry.live_count(), LIVE_MAX_ENTRIES);
        assert!(!registry.is_live(base(0)));
        assert!(registry.is_live(base(LIVE_MAX_ENTRIES + 9)));
        assert_eq!(registry.release(base(0)), FreeOutcome::Evicted);
        assert_eq!(registry.release(base(0)), FreeOutcome::DoubleFree);
    }

    #[test]
    fn live_count_spans_shards() {
        let registry = AllocationRegistry::new();
        for i in 0..32usize {
            registry.register(i << 12, 1);
        }
        assert_eq!(registry.live_count(), 32);
    }
}
