//! Shaping cache.
//!
//! Shaping is the expensive half of layout. Its output does not depend on
//! the wrap width, so a paragraph is shaped once and every later layout or
//! re-wrap of the same markup reuses the cached runs.

use std::num::NonZeroUsize;
use std::sync::Arc;

use fxhash::FxBuildHasher;
use lru::LruCache;

use crate::error::TextResult;
use crate::shaping::ShapedParagraph;

/// Paragraphs kept by [`TextShapeCache::new`].
pub const DEFAULT_SHAPE_CACHE_CAPACITY: usize = 1024;

struct CachedShape {
    shaped: Arc<ShapedParagraph>,
    uses: u64,
}

/// Cache of shaped paragraphs keyed by markup.
///
/// Holds at most [`capacity`](TextShapeCache::capacity) paragraphs; past
/// that the least recently used one is dropped.
pub struct TextShapeCache {
    cache: LruCache<String, CachedShape, FxBuildHasher>,
    /// Statistics for monitoring cache performance
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl TextShapeCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SHAPE_CACHE_CAPACITY)
    }

    /// Cache holding at most `capacity` paragraphs (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: LruCache::with_hasher(clamp_capacity(capacity), FxBuildHasher::default()),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Get the cached shaping of `markup` or compute it.
    pub fn get_or_shape<F>(&mut self, markup: &str, shape_fn: F) -> TextResult<Arc<ShapedParagraph>>
    where
        F: FnOnce(&str) -> TextResult<ShapedParagraph>,
    {
        if let Some(cached) = self.cache.get_mut(markup) {
            self.hits += 1;
            cached.uses += 1;
            return Ok(cached.shaped.clone());
        }

        self.misses += 1;
        let shaped = Arc::new(shape_fn(markup)?);
        let entry = CachedShape {
            shaped: shaped.clone(),
            uses: 1,
        };
        if let Some((dropped, _)) = self.cache.push(markup.to_string(), entry) {
            tracing::trace!("Shape cache dropped {:?}", dropped);
            self.evictions += 1;
        }
        Ok(shaped)
    }

    /// Cached shaping of `markup`, if any. Touches neither recency nor statistics.
    pub fn get(&self, markup: &str) -> Option<Arc<ShapedParagraph>> {
        self.cache.peek(markup).map(|cached| cached.shaped.clone())
    }

    /// Clear the cache (useful when fonts are reloaded).
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Change the capacity, dropping the oldest entries if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = clamp_capacity(capacity);
        let dropped = self.cache.len().saturating_sub(capacity.get());
        self.cache.resize(capacity);
        self.evictions += dropped as u64;
    }

    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Get cache statistics as a formatted string.
    pub fn stats_string(&self) -> String {
        let total_uses: u64 = self.cache.iter().map(|(_, cached)| cached.uses).sum();
        format!(
            "ShapeCache: {}/{} entries, {:.1}% hit rate ({} hits, {} misses, {} evictions), {} total uses",
            self.len(),
            self.capacity(),
            self.hit_rate() * 100.0,
            self.hits,
            self.misses,
            self.evictions,
            total_uses
        )
    }
}

fn clamp_capacity(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

impl Default for TextShapeCache {
    fn default() -> Self {
        Self::new()
    }
}
