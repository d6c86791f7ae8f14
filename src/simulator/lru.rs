//! Page-access simulation under bounded-capacity eviction
//!
//! Models a fixed-capacity cache of page identifiers with recency-based
//! eviction and exact per-access hit/miss classification. The model is pure
//! and non-blocking; no I/O or yielding occurs inside the eviction logic.
//!
//! ```text
//!   access(B) on [A, B, C]      (MRU last)
//!   ═══════════════════════════════════════
//!   resident: [A, B, C]  ──►  [A, C, B]     Hit, B promoted to MRU
//!
//!   access(D) on full [A, C, B], capacity 3
//!   ═══════════════════════════════════════
//!   resident: [A, C, B]  ──►  [C, B, D]     Miss, LRU entry A evicted
//! ```

use serde::{Deserialize, Serialize};

use crate::optimizer::types::OptimizerError;

/// Simulated page identifier
pub type PageId = u64;

/// Classification of one `access` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessResult {
    /// Page was resident; promoted to the MRU position
    Hit,
    /// Page was not resident; inserted, evicting the LRU entry when full
    Miss,
}

/// Fixed-capacity cache of page ids with LRU eviction
///
/// The resident sequence is ordered least- to most-recently-used; ids are
/// unique and the length never exceeds capacity. Recency order is totally
/// determined by access history, so eviction is deterministic.
#[derive(Debug, Clone)]
pub struct LruCache {
    capacity: usize,
    resident: Vec<PageId>,
}

impl LruCache {
    /// Create an empty cache, rejecting zero capacity
    pub fn new(capacity: usize) -> Result<Self, OptimizerError> {
        if capacity == 0 {
            return Err(OptimizerError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            resident: Vec::with_capacity(capacity),
        })
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident pages, least-recently-used first
    pub fn resident(&self) -> &[PageId] {
        &self.resident
    }

    /// Whether `page` is currently resident
    pub fn contains(&self, page: PageId) -> bool {
        self.resident.contains(&page)
    }

    /// Access one page, classifying the result and updating recency order
    ///
    /// A repeat access immediately after a hit is again a hit: the id stays
    /// resident and the promotion to MRU is a no-op move.
    pub fn access(&mut self, page: PageId) -> AccessResult {
        if let Some(position) = self.resident.iter().position(|&p| p == page) {
            let id = self.resident.remove(position);
            self.resident.push(id);
            AccessResult::Hit
        } else {
            if self.resident.len() == self.capacity {
                self.resident.remove(0);
            }
            self.resident.push(page);
            AccessResult::Miss
        }
    }
}

/// Aggregate counts from folding a sequence of accesses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Cache capacity the sequence was replayed against
    pub capacity: usize,
    /// Accesses classified as hits
    pub hits: u64,
    /// Accesses classified as misses
    pub misses: u64,
}

impl SimulationReport {
    /// Total accesses; always equals the input sequence length
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit fraction, 0.0..=100.0
    pub fn hit_ratio(&self) -> f64 {
        let total = self.accesses();
        if total > 0 {
            self.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Replay `pages` through an empty LRU cache of `capacity`
pub fn simulate(capacity: usize, pages: &[PageId]) -> Result<SimulationReport, OptimizerError> {
    let mut cache = LruCache::new(capacity)?;
    let mut hits = 0u64;
    let mut misses = 0u64;

    for &page in pages {
        match cache.access(page) {
            AccessResult::Hit => hits += 1,
            AccessResult::Miss => misses += 1,
        }
    }

    Ok(SimulationReport {
        capacity,
        hits,
        misses,
    })
}

/// Replay `pages` through a FIFO cache of `capacity`
///
/// The un-optimized baseline: hits never promote, eviction is strict
/// insertion order. Used for before/after policy comparison against
/// `simulate`.
pub fn simulate_fifo(capacity: usize, pages: &[PageId]) -> Result<SimulationReport, OptimizerError> {
    if capacity == 0 {
        return Err(OptimizerError::InvalidCapacity(capacity));
    }

    let mut resident: Vec<PageId> = Vec::with_capacity(capacity);
    let mut hits = 0u64;
    let mut misses = 0u64;

    for &page in pages {
        if resident.contains(&page) {
            hits += 1;
        } else {
            if resident.len() == capacity {
                resident.remove(0);
            }
            resident.push(page);
            misses += 1;
        }
    }

    Ok(SimulationReport {
        capacity,
        hits,
        misses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            LruCache::new(0),
            Err(OptimizerError::InvalidCapacity(0))
        ));
        assert!(simulate(0, &[1, 2]).is_err());
        assert!(simulate_fifo(0, &[1, 2]).is_err());
    }

    #[test]
    fn hit_promotes_to_mru_without_membership_change() {
        let mut cache = LruCache::new(3).unwrap();
        cache.access(1);
        cache.access(2);
        cache.access(3);

        assert_eq!(cache.access(1), AccessResult::Hit);
        assert_eq!(cache.resident(), &[2, 3, 1]);
    }

    #[test]
    fn immediate_repeat_is_again_a_hit() {
        let mut cache = LruCache::new(2).unwrap();
        cache.access(7);
        assert_eq!(cache.access(7), AccessResult::Hit);
        assert_eq!(cache.access(7), AccessResult::Hit);
        assert_eq!(cache.resident(), &[7]);
    }

    #[test]
    fn eviction_removes_least_recently_used() {
        // Capacity 2, [A, B, C]: C evicts A, cache holds {B, C}.
        let mut cache = LruCache::new(2).unwrap();
        assert_eq!(cache.access(b'A' as PageId), AccessResult::Miss);
        assert_eq!(cache.access(b'B' as PageId), AccessResult::Miss);
        assert_eq!(cache.access(b'C' as PageId), AccessResult::Miss);

        assert!(!cache.contains(b'A' as PageId));
        assert_eq!(cache.resident(), &[b'B' as PageId, b'C' as PageId]);
    }

    #[test]
    fn counts_partition_the_sequence() {
        let sequences: [&[PageId]; 4] = [
            &[],
            &[1, 1, 1, 1],
            &[1, 2, 3, 4, 5],
            &[5, 4, 3, 2, 1, 2, 3, 4, 5],
        ];
        for capacity in 1..=6 {
            for seq in sequences {
                let report = simulate(capacity, seq).unwrap();
                assert_eq!(report.accesses(), seq.len() as u64);
            }
        }
    }

    #[test]
    fn resident_count_never_exceeds_capacity() {
        let mut cache = LruCache::new(3).unwrap();
        for page in [1u64, 2, 3, 4, 5, 1, 2, 9, 9, 8, 7, 1] {
            cache.access(page);
            assert!(cache.resident().len() <= cache.capacity());
        }
    }

    #[test]
    fn reference_sequence_hit_miss_split() {
        // Hand simulation, capacity 3, MRU last:
        //   1 M [1]        2 M [1,2]      3 M [1,2,3]
        //   4 M [2,3,4]    1 M [3,4,1]    2 M [4,1,2]
        //   5 M [1,2,5]    1 H [2,5,1]    2 H [5,1,2]
        //   3 M [1,2,3]
        let report = simulate(3, &[1, 2, 3, 4, 1, 2, 5, 1, 2, 3]).unwrap();
        assert_eq!(report.hits, 2);
        assert_eq!(report.misses, 8);
    }

    #[test]
    fn fifo_never_promotes_on_hit() {
        // Capacity 2, [1, 2, 1, 3]: under FIFO the hit on 1 does not refresh
        // it, so 3 evicts 1. Under LRU the hit refreshes 1 and 3 evicts 2.
        let fifo = simulate_fifo(2, &[1, 2, 1, 3]).unwrap();
        assert_eq!((fifo.hits, fifo.misses), (1, 3));

        let mut lru = LruCache::new(2).unwrap();
        for page in [1u64, 2, 1, 3] {
            lru.access(page);
        }
        assert!(lru.contains(1));
        assert!(!lru.contains(2));
    }

    #[test]
    fn hit_ratio_is_percentage() {
        let report = SimulationReport {
            capacity: 3,
            hits: 1,
            misses: 3,
        };
        assert!((report.hit_ratio() - 25.0).abs() < f64::EPSILON);

        let empty = SimulationReport {
            capacity: 3,
            hits: 0,
            misses: 0,
        };
        assert_eq!(empty.hit_ratio(), 0.0);
    }
}
