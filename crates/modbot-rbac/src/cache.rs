//! Bounded permission-check cache
//!
//! Permission checks are read-mostly and latency-sensitive, so hits are
//! memoized per `(principal, permission)`. Entries are bounded by an LRU
//! capacity, expire after a TTL, and carry the generation stamp current at
//! insertion time; every mutating engine call bumps the generation, turning
//! all prior entries into misses.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use modbot_store::AccountId;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
struct CachedDecision {
    allowed: bool,
    generation: u64,
    inserted_at: Instant,
}

/// Generation-stamped LRU cache of permission decisions.
pub struct PermissionCache {
    entries: Mutex<LruCache<(AccountId, String), CachedDecision>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl PermissionCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    /// Look up a cached decision. Expired or stale-generation entries are
    /// evicted and reported as misses.
    pub fn get(&self, principal: AccountId, permission: &str) -> Option<bool> {
        let key = (principal, permission.to_string());
        let current = self.generation.load(Ordering::Acquire);
        let mut entries = self.entries.lock();

        match entries.get(&key).copied() {
            Some(cached)
                if cached.generation == current && cached.inserted_at.elapsed() < self.ttl =>
            {
                Some(cached.allowed)
            }
            Some(_) => {
                entries.pop(&key);
                None
            }
            None => None,
        }
    }

    /// Store a decision under the current generation.
    pub fn put(&self, principal: AccountId, permission: &str, allowed: bool) {
        let cached = CachedDecision {
            allowed,
            generation: self.generation.load(Ordering::Acquire),
            inserted_at: Instant::now(),
        };
        self.entries
            .lock()
            .put((principal, permission.to_string()), cached);
    }

    /// Invalidate everything by bumping the generation.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of resident entries (including ones a later `get` would
    /// reject as stale).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new(
            NonZeroUsize::new(DEFAULT_CAPACITY).expect("capacity is non-zero"),
            DEFAULT_TTL,
        )
    }
}
