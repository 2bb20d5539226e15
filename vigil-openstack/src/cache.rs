//! Request memoization for the API clients.
//!
//! Within one client lifetime (one check run) identical GET requests must
//! yield identical bodies, so the first decoded body is kept and served for
//! every later request with the same signature. Entries never expire; a new
//! client starts with an empty cache.

use crate::{Headers, QueryParams};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Deterministic signature of a request: URL, headers, params and timeout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        url: &str,
        headers: &Headers,
        params: Option<&QueryParams>,
        timeout: Duration,
    ) -> Self {
        let params = params.map_or_else(|| Value::Null.to_string(), render);
        Self(format!(
            "{}|{}|{}|{}",
            url,
            render(headers),
            params,
            timeout.as_millis()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn render(map: &Headers) -> String {
    Value::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
    .to_string()
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hit/miss counters of an [`ApiRequestCache`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Value>,
    stats: CacheStats,
}

/// Memoization cache of decoded response bodies.
///
/// Guarded by a mutex so a client shared between tasks stays consistent;
/// the check itself only ever drives it from one call path at a time.
#[derive(Debug, Default)]
pub struct ApiRequestCache {
    state: Mutex<CacheState>,
}

impl ApiRequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached body for `key`, counting the lookup as a hit or a miss
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut state = self.state.lock();
        let found = state.entries.get(key).cloned();
        match found {
            Some(_) => state.stats.hits += 1,
            None => state.stats.misses += 1,
        }
        found
    }

    /// Store `body` under `key` unless a body is already stored, and return
    /// the body that is now cached
    pub fn insert(&self, key: CacheKey, body: Value) -> Value {
        self.state.lock().entries.entry(key).or_insert(body).clone()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(token: &str) -> Headers {
        let mut headers = Headers::new();
        headers.insert("X-Auth-Token".into(), token.into());
        headers
    }

    #[test]
    fn test_key_is_deterministic() {
        let mut params = QueryParams::new();
        params.insert("limit".into(), "2".into());
        params.insert("all_tenants".into(), "True".into());

        let mut reordered = QueryParams::new();
        reordered.insert("all_tenants".into(), "True".into());
        reordered.insert("limit".into(), "2".into());

        let timeout = Duration::from_secs(10);
        let a = CacheKey::new("http://nova/servers", &headers("t"), Some(&params), timeout);
        let b = CacheKey::new("http://nova/servers", &headers("t"), Some(&reordered), timeout);
        assert_eq!(a, b);
        assert_eq!(
            a.as_str(),
            r#"http://nova/servers|{"X-Auth-Token":"t"}|{"all_tenants":"True","limit":"2"}|10000"#
        );
    }

    #[test]
    fn test_key_covers_every_component() {
        let timeout = Duration::from_secs(10);
        let base = CacheKey::new("http://nova/a", &headers("t"), None, timeout);

        assert_ne!(base, CacheKey::new("http://nova/b", &headers("t"), None, timeout));
        assert_ne!(base, CacheKey::new("http://nova/a", &headers("u"), None, timeout));
        assert_ne!(
            base,
            CacheKey::new("http://nova/a", &headers("t"), Some(&QueryParams::new()), timeout)
        );
        assert_ne!(
            base,
            CacheKey::new("http://nova/a", &headers("t"), None, Duration::from_secs(5))
        );
    }

    #[test]
    fn test_cache_hits_and_misses() {
        let cache = ApiRequestCache::new();
        let key = CacheKey::new("http://nova", &Headers::new(), None, Duration::from_secs(1));

        assert!(cache.get(&key).is_none());
        assert_eq!(cache.insert(key.clone(), json!({"version": 1})), json!({"version": 1}));
        assert_eq!(cache.insert(key.clone(), json!({"version": 2})), json!({"version": 1}));

        assert_eq!(cache.get(&key), Some(json!({"version": 1})));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }
}
