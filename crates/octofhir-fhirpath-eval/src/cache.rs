//! Bounded LRU caches shared across evaluators
//!
//! Three independent caches: compiled expressions, identifier tokens and
//! literal values. Each is safe for concurrent lookup and insert; values
//! are computed outside the lock and failed computations are not stored.

use crate::config::CacheConfig;
use lru::LruCache;
use octofhir_fhirpath_ast::Expression;
use octofhir_fhirpath_diagnostics::ParseError;
use octofhir_fhirpath_model::Collection;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hit/miss counters of one cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Thread-safe LRU memo
pub struct LruMemo<K: Hash + Eq, V> {
    name: &'static str,
    entries: Mutex<LruCache<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Hash + Eq, V: Clone> LruMemo<K, V> {
    /// A zero capacity is raised to one
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up and mark as most recently used
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.entries.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert, evicting the least recently used entry when full
    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().put(key, value);
    }

    /// Cached value for `key`, computing and storing it on a miss
    pub fn get_or_try_insert_with<Q, E>(
        &self,
        key: &Q,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(value) = self.get(key) {
            log::debug!("{} cache hit", self.name);
            return Ok(value);
        }
        log::debug!("{} cache miss", self.name);
        let value = compute()?;
        self.insert(key.to_owned(), value.clone());
        Ok(value)
    }

    /// Infallible form of [`get_or_try_insert_with`](Self::get_or_try_insert_with)
    pub fn get_or_insert_with<Q>(&self, key: &Q, compute: impl FnOnce() -> V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = compute();
        self.insert(key.to_owned(), value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

/// Source text to compiled expression
pub struct ExpressionCache {
    memo: LruMemo<String, Arc<Expression>>,
}

impl ExpressionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            memo: LruMemo::new("expression", capacity),
        }
    }

    /// Compiled tree for `source`, parsing on a miss
    ///
    /// The same `Arc` is returned for repeated lookups until evicted.
    pub fn compile(&self, source: &str) -> Result<Arc<Expression>, ParseError> {
        self.memo.get_or_try_insert_with(source, || {
            octofhir_fhirpath_parser::parse_expression(source).map(Arc::new)
        })
    }

    pub fn memo(&self) -> &LruMemo<String, Arc<Expression>> {
        &self.memo
    }
}

/// The three caches an evaluator consults
pub struct EvaluatorCaches {
    pub expressions: ExpressionCache,
    /// Raw identifier token to unquoted name
    pub identifiers: LruMemo<String, Arc<str>>,
    /// Literal text to its value
    pub literals: LruMemo<String, Collection>,
}

static SHARED: Lazy<Arc<EvaluatorCaches>> =
    Lazy::new(|| Arc::new(EvaluatorCaches::new(&CacheConfig::default())));

impl EvaluatorCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            expressions: ExpressionCache::new(config.expressions),
            identifiers: LruMemo::new("identifier", config.identifiers),
            literals: LruMemo::new("literal", config.literals),
        }
    }

    /// Process-wide instance with default capacities
    pub fn shared() -> Arc<EvaluatorCaches> {
        Arc::clone(&SHARED)
    }

    pub fn clear(&self) {
        self.expressions.memo().clear();
        self.identifiers.clear();
        self.literals.clear();
    }
}

impl Default for EvaluatorCaches {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lru_eviction() {
        let memo: LruMemo<String, i32> = LruMemo::new("test", 2);
        memo.insert("a".to_string(), 1);
        memo.insert("b".to_string(), 2);
        assert_eq!(memo.get("a"), Some(1));
        memo.insert("c".to_string(), 3);
        assert_eq!(memo.get("b"), None);
        assert_eq!(memo.get("a"), Some(1));
        assert_eq!(memo.get("c"), Some(3));
    }

    #[test]
    fn test_stats() {
        let memo: LruMemo<String, i32> = LruMemo::new("test", 4);
        memo.insert("a".to_string(), 1);
        memo.get("a");
        memo.get("z");
        let stats = memo.stats();
        assert_eq!((stats.hits, stats.misses, stats.len, stats.capacity), (1, 1, 1, 4));
    }

    #[test]
    fn test_failed_computation_not_cached() {
        let memo: LruMemo<String, i32> = LruMemo::new("test", 4);
        let result: Result<i32, &str> = memo.get_or_try_insert_with("x", || Err("nope"));
        assert!(result.is_err());
        assert!(memo.is_empty());
    }

    #[test]
    fn test_compiled_expression_identity() {
        let cache = ExpressionCache::new(8);
        let first = cache.compile("Patient.name.given").unwrap();
        let second = cache.compile("Patient.name.given").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_parse_failure_not_cached() {
        let cache = ExpressionCache::new(8);
        assert!(cache.compile("Patient.name.").is_err());
        assert_eq!(cache.memo().len(), 0);
    }

    #[test]
    fn test_zero_capacity_raised() {
        let memo: LruMemo<String, i32> = LruMemo::new("test", 0);
        assert_eq!(memo.capacity(), 1);
    }
}
