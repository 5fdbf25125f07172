//! Remote JSON-LD context resolution.
//!
//! Resolution is the only I/O the loader performs. The pipeline hands a
//! [`ContextResolver`] to the loader; offline deployments use
//! [`StaticContextResolver`], and [`CachingContextResolver`] puts an LRU cache
//! in front of any resolver.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::RwLock;
use serde_json::Value;

use super::bundled;
use crate::config::CacheConfig;

/// Context resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// No context document is known for the URL.
    #[error("Context not available: {0}")]
    NotFound(String),

    /// The context document has no `@context` member.
    #[error("Context document for {url} has no @context")]
    Malformed {
        /// Context URL.
        url: String,
    },

    /// Remote contexts nest deeper than the configured limit.
    #[error("Context nesting exceeds {0} levels")]
    TooDeep(usize),

    /// The resolver itself failed.
    #[error("Context resolver failed for {url}: {reason}")]
    Resolver {
        /// Context URL.
        url: String,
        /// Failure description.
        reason: String,
    },
}

/// Resolves a context URL to its context document (an object with `@context`).
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// Fetch the context document for `url`.
    async fn resolve(&self, url: &str) -> Result<Value, ContextError>;
}

#[async_trait]
impl<R: ContextResolver + ?Sized> ContextResolver for Arc<R> {
    async fn resolve(&self, url: &str) -> Result<Value, ContextError> {
        (**self).resolve(url).await
    }
}

/// Resolver over a fixed set of context documents.
#[derive(Debug, Clone, Default)]
pub struct StaticContextResolver {
    documents: BTreeMap<String, Value>,
}

impl StaticContextResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver preloaded with the bundled contexts.
    pub fn bundled() -> Self {
        let mut resolver = Self::new();
        for (url, document) in bundled::documents() {
            resolver.documents.insert(url.to_string(), document);
        }
        resolver
    }

    /// Add or replace a context document.
    pub fn with_context(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    /// Add or replace a context document.
    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }

    /// Number of known contexts.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if no contexts are known.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl ContextResolver for StaticContextResolver {
    async fn resolve(&self, url: &str) -> Result<Value, ContextError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ContextError::NotFound(url.to_string()))
    }
}

/// LRU cache in front of another resolver.
///
/// Only successful resolutions are cached.
pub struct CachingContextResolver<R> {
    inner: R,
    cache: Option<Arc<RwLock<LruCache<String, Value>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<R: ContextResolver> CachingContextResolver<R> {
    /// Wrap `inner` with the default cache configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, CacheConfig::default())
    }

    /// Wrap `inner` with a custom cache configuration.
    pub fn with_config(inner: R, config: CacheConfig) -> Self {
        let cache = if config.enabled {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
            Some(Arc::new(RwLock::new(LruCache::new(size))))
        } else {
            None
        };

        Self {
            inner,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
            }
        })
    }

    /// Clear the cache.
    ///
    /// Does nothing if caching is disabled.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}

#[async_trait]
impl<R: ContextResolver> ContextResolver for CachingContextResolver<R> {
    async fn resolve(&self, url: &str) -> Result<Value, ContextError> {
        if let Some(cache) = &self.cache {
            if let Some(document) = cache.read().peek(url) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(document.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let document = self.inner.resolve(url).await?;
        tracing::debug!(url, "Resolved JSON-LD context");

        if let Some(cache) = &self.cache {
            cache.write().put(url.to_string(), document.clone());
        }
        Ok(document)
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups forwarded to the inner resolver.
    pub misses: u64,
}
