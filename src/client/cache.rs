//! Result Cache - memoizes pure tool calls.
//!
//! Keys are the canonical JSON text of `[provider, tool, arguments]` with
//! object keys sorted at every depth, so argument order never splits an
//! entry. The map is bounded; moka evicts by recency and frequency once
//! `capacity` entries are held.

use moka::sync::Cache;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Bounded cache of tool results.
pub struct ResultCache {
    entries: Cache<String, Value>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` results.
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Deterministic key for a call.
    pub fn key(provider: &str, tool: &str, arguments: &Map<String, Value>) -> String {
        let arguments = canonicalize(&Value::Object(arguments.clone()));
        Value::Array(vec![
            Value::String(provider.to_string()),
            Value::String(tool.to_string()),
            arguments,
        ])
        .to_string()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit");
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.entry_count(),
        }
    }
}

/// Rebuild `value` with object keys inserted in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_key_ignores_argument_order() {
        let mut first = Map::new();
        first.insert("a".to_string(), json!(1));
        first.insert("b".to_string(), json!({ "y": 2, "x": 1 }));

        let mut second = Map::new();
        second.insert("b".to_string(), json!({ "x": 1, "y": 2 }));
        second.insert("a".to_string(), json!(1));

        assert_eq!(
            ResultCache::key("math", "add", &first),
            ResultCache::key("math", "add", &second)
        );
    }

    #[test]
    fn test_key_distinguishes_tool_provider_and_arguments() {
        let a = args(json!({ "a": 1, "b": 2 }));
        let b = args(json!({ "a": 2, "b": 1 }));

        assert_ne!(ResultCache::key("math", "add", &a), ResultCache::key("math", "add", &b));
        assert_ne!(
            ResultCache::key("math", "add", &a),
            ResultCache::key("math", "multiply", &a)
        );
        assert_ne!(
            ResultCache::key("math", "add", &a),
            ResultCache::key("other", "add", &a)
        );
    }

    #[test]
    fn test_get_put_and_stats() {
        let cache = ResultCache::new(16);
        let key = ResultCache::key("math", "add", &args(json!({ "a": 1, "b": 2 })));

        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), json!(3));
        assert_eq!(cache.get(&key), Some(json!(3)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_bounded() {
        let cache = ResultCache::new(8);
        for i in 0..200 {
            cache.put(format!("k{}", i), json!(i));
        }
        assert!(cache.stats().entry_count <= 8);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = std::sync::Arc::new(ResultCache::new(1_000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{}:{}", t, i);
                        cache.put(key.clone(), json!(i));
                        assert_eq!(cache.get(&key), Some(json!(i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
