use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dax_protocol::{KeyElement, KeySchema};

use super::Stats;

/// Characters a cache key may not contain, inherited from the PSR-16 cache
/// contract this caching layer's lineage follows (see DESIGN.md). A key must
/// also be non-empty.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['{', '}', '(', ')', '/', ':'];

/// Rejects an empty table name or one containing a PSR-16-reserved
/// character. A table name failing this check can never be cached or
/// looked up; callers treat that the same as a cache miss.
pub fn is_valid_cache_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(|c| FORBIDDEN_KEY_CHARS.contains(&c) || c == '@')
}

struct Entry {
    schema: KeySchema,
    inserted_at: Instant,
}

/// Caches a table's key schema (learned from a `DefineKeySchema` reply) for
/// `ttl`, evicting the oldest entry by insertion timestamp once `capacity`
/// is exceeded.
pub struct KeySchemaCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl KeySchemaCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        KeySchemaCache {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, table: &str) -> Option<KeySchema> {
        if !is_valid_cache_key(table) {
            return None;
        }

        let mut entries = self.entries.lock().unwrap();

        if let Some(entry) = entries.get(table) {
            if entry.inserted_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.schema.clone());
            }

            entries.remove(table);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, table: String, schema: KeySchema) {
        if !is_valid_cache_key(&table) {
            return;
        }

        let mut entries = self.entries.lock().unwrap();

        if entries.len() >= self.capacity && !entries.contains_key(&table) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        entries.insert(
            table,
            Entry {
                schema,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes `table`'s cached schema, if any. A no-op if absent.
    pub fn delete(&self, table: &str) {
        self.entries.lock().unwrap().remove(table);
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Names of every table currently cached (expired-but-not-yet-accessed
    /// entries are still listed, matching `get`'s lazy expiry).
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> KeySchema {
        KeySchema::new(KeyElement::new("id", "S"), None)
    }

    #[test]
    fn a_fresh_entry_is_a_hit() {
        let cache = KeySchemaCache::new(Duration::from_secs(60), 10);
        cache.insert("t".into(), schema());
        assert_eq!(cache.get("t"), Some(schema()));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn an_absent_entry_is_a_miss() {
        let cache = KeySchemaCache::new(Duration::from_secs(60), 10);
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn an_expired_entry_is_evicted_on_access_and_counts_as_a_miss() {
        let cache = KeySchemaCache::new(Duration::from_millis(0), 10);
        cache.insert("t".into(), schema());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("t"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn exceeding_capacity_evicts_the_oldest_entry() {
        let cache = KeySchemaCache::new(Duration::from_secs(60), 2);
        cache.insert("a".into(), schema());
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b".into(), schema());
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("c".into(), schema());

        assert_eq!(cache.get("a"), None);
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn delete_removes_a_cached_entry() {
        let cache = KeySchemaCache::new(Duration::from_secs(60), 10);
        cache.insert("t".into(), schema());
        cache.delete("t");
        assert_eq!(cache.get("t"), None);
    }

    #[test]
    fn clear_drops_every_entry() {
        let cache = KeySchemaCache::new(Duration::from_secs(60), 10);
        cache.insert("a".into(), schema());
        cache.insert("b".into(), schema());
        cache.clear();
        assert!(cache.names().is_empty());
    }

    #[test]
    fn names_lists_every_cached_table() {
        let cache = KeySchemaCache::new(Duration::from_secs(60), 10);
        cache.insert("a".into(), schema());
        cache.insert("b".into(), schema());
        let mut names = cache.names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn rejects_keys_with_forbidden_characters_or_empty_keys() {
        let cache = KeySchemaCache::new(Duration::from_secs(60), 10);
        for bad in ["", "a/b", "a:b", "a{b}", "a(b)", "a@b"] {
            cache.insert(bad.into(), schema());
            assert_eq!(cache.get(bad), None, "expected {bad:?} to be rejected");
        }
    }
}
