use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use super::Stats;

type Hash = [u8; 32];

struct Entry {
    id: u64,
    names: Vec<String>,
    hash: Hash,
    last_access: u64,
}

/// Caches the server-assigned id for a distinct attribute-name list, keyed
/// by the SHA-256 content hash of the list (so two identical lists built
/// independently still share a cache entry), evicted least-recently-used by
/// a monotonic access counter once `capacity` is exceeded.
///
/// The content hash is computed over the *sorted* name list joined by `|`,
/// matching §3's `hash: sha-256 over sorted names joined by '|'` — two lists
/// containing the same names in different orders are the same attribute
/// list and must share an id.
pub struct AttributeListCache {
    capacity: usize,
    by_id: Mutex<HashMap<u64, Hash>>,
    entries: Mutex<HashMap<Hash, Entry>>,
    access_counter: AtomicU64,
    next_id: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl AttributeListCache {
    pub fn new(capacity: usize) -> Self {
        AttributeListCache {
            capacity,
            by_id: Mutex::new(HashMap::new()),
            entries: Mutex::new(HashMap::new()),
            access_counter: AtomicU64::new(0),
            next_id: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn content_hash(names: &[String]) -> Hash {
        let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let joined = sorted.join("|");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.finalize().into()
    }

    /// Returns the id for `names`, assigning and caching a new one the
    /// first time this exact set of names is seen (regardless of order).
    pub fn put_by_names(&self, names: &[String]) -> u64 {
        let key = Self::content_hash(names);
        let counter = self.access_counter.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap();

        if let Some(entry) = entries.get_mut(&key) {
            entry.last_access = counter;
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.id;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        if entries.len() >= self.capacity {
            if let Some(lru_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| *k)
            {
                if let Some(evicted) = entries.remove(&lru_key) {
                    self.by_id.lock().unwrap().remove(&evicted.id);
                }
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            key,
            Entry {
                id,
                names: names.to_vec(),
                hash: key,
                last_access: counter,
            },
        );
        self.by_id.lock().unwrap().insert(id, key);
        id
    }

    /// Looks up the name list previously assigned `id`, bumping its
    /// recency on a hit.
    pub fn get(&self, id: u64) -> Option<Vec<String>> {
        let hash = *self.by_id.lock().unwrap().get(&id)?;
        let counter = self.access_counter.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(&hash)?;
        entry.last_access = counter;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.names.clone())
    }

    /// Looks up the id previously assigned to the attribute list whose
    /// content hash is `hash`, without affecting recency (a pure existence
    /// check the server-dialect elision path uses before deciding whether it
    /// can omit the name list on the wire).
    pub fn id_by_name_hash(&self, hash: &Hash) -> Option<u64> {
        self.entries.lock().unwrap().get(hash).map(|e| e.id)
    }

    pub fn stats(&self) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
