//! Glyph atlas cache.
//!
//! Maps each [`GlyphKey`] to a rectangle in one of the atlas textures. A
//! glyph is rasterized and uploaded at most once while it stays cached; hits
//! only refresh its recency. Textures are added through the backend when the
//! existing ones are full, up to `max_textures`. With LRU eviction enabled,
//! the least recently used glyphs give their rectangles back to the packer,
//! but only from a texture that will then have room for the new glyph.
//!
//! Slots live in a [`SlotArena`] and are referenced by handle, so eviction
//! never moves or aliases another glyph's slot.

mod packer;

use glint_core::alloc::{SlotArena, SlotHandle};
use glint_core::profiling::profile_function;
use lru::LruCache;

use crate::backend::TextureBackend;
use crate::error::{TextError, TextResult};
use crate::font::GlyphKey;
use crate::quad::Quad;
use crate::raster::{GlyphRasterizer, PixelFormat};

use packer::{Allocation, ShelfPacker};

/// When cached glyphs are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// The cache only grows; new textures are allocated as needed.
    #[default]
    Never,
    /// Drop least-recently-used glyphs when no texture has room and no new
    /// texture may be allocated, or when `max_glyphs` is reached.
    Lru { max_glyphs: Option<usize> },
}

/// Configuration for the glyph atlas.
///
/// | Preset | Texture | Alpha8 memory per texture |
/// |--------|---------|---------------------------|
/// | small() | 512x512 | 256 KB |
/// | medium() | 1024x1024 | 1 MB |
/// | large() | 2048x2048 | 4 MB |
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasConfig {
    /// Width and height of every atlas texture.
    pub texture_size: u32,
    /// Empty pixels kept right of and below each glyph.
    pub padding: u32,
    /// Pixel format of textures and upload buffers.
    pub format: PixelFormat,
    /// Ceiling on the number of textures; `None` is unbounded.
    pub max_textures: Option<usize>,
    pub eviction: EvictionPolicy,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            texture_size: 1024,
            padding: 1,
            format: PixelFormat::Alpha8,
            max_textures: None,
            eviction: EvictionPolicy::Never,
        }
    }
}

impl AtlasConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn small() -> Self {
        Self {
            texture_size: 512,
            ..Default::default()
        }
    }

    pub fn medium() -> Self {
        Self {
            texture_size: 1024,
            ..Default::default()
        }
    }

    pub fn large() -> Self {
        Self {
            texture_size: 2048,
            ..Default::default()
        }
    }

    pub fn with_texture_size(mut self, size: u32) -> Self {
        self.texture_size = size;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_max_textures(mut self, max: usize) -> Self {
        self.max_textures = Some(max);
        self
    }

    /// Enable LRU eviction, optionally capping the number of cached glyphs.
    pub fn with_lru_eviction(mut self, max_glyphs: Option<usize>) -> Self {
        self.eviction = EvictionPolicy::Lru { max_glyphs };
        self
    }

    fn validate(&self) -> TextResult<()> {
        if self.texture_size == 0 {
            return Err(TextError::InvalidArgument(
                "atlas texture size must be positive".to_string(),
            ));
        }
        if self.max_textures == Some(0) {
            return Err(TextError::InvalidArgument(
                "max_textures must be at least 1".to_string(),
            ));
        }
        if self.eviction == (EvictionPolicy::Lru { max_glyphs: Some(0) }) {
            return Err(TextError::InvalidArgument(
                "max_glyphs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Index of an atlas texture, in allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub usize);

/// Where a glyph lives in the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasSlot {
    /// `None` for glyphs without an image
    pub texture: Option<TextureId>,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Bearing from the pen position to the image's left edge
    pub left: i32,
    /// Bearing from the baseline up to the image's top edge
    pub top: i32,
}

impl AtlasSlot {
    /// Slot of a glyph that has no image: whitespace or a rasterization failure.
    pub const EMPTY: AtlasSlot = AtlasSlot {
        texture: None,
        x: 0,
        y: 0,
        width: 0,
        height: 0,
        left: 0,
        top: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.texture.is_none() || self.width == 0 || self.height == 0
    }
}

/// Rectangle in texture pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    fn union(self, other: Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        Rect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// Counters for monitoring the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtlasStats {
    pub hits: u64,
    pub misses: u64,
    /// Calls into the rasterizer
    pub rasterizations: u64,
    /// Rasterizer errors recovered as empty slots
    pub failures: u64,
    /// Texture sub-rectangle uploads
    pub uploads: u64,
    pub evictions: u64,
    /// Glyphs currently cached
    pub glyphs: usize,
    pub textures: usize,
}

struct AtlasTexture<T> {
    handle: T,
    packer: ShelfPacker,
    dirty: Option<Rect>,
}

struct SlotEntry {
    slot: AtlasSlot,
    allocation: Option<Allocation>,
    last_frame: u64,
}

/// The glyph atlas cache.
pub struct GlyphAtlas<B: TextureBackend> {
    backend: B,
    rasterizer: Box<dyn GlyphRasterizer>,
    config: AtlasConfig,
    textures: Vec<AtlasTexture<B::Texture>>,
    slots: SlotArena<SlotEntry>,
    index: LruCache<GlyphKey, SlotHandle>,
    frame: u64,
    in_frame: bool,
    stats: AtlasStats,
}

impl<B: TextureBackend> GlyphAtlas<B> {
    pub fn new(
        backend: B,
        rasterizer: Box<dyn GlyphRasterizer>,
        config: AtlasConfig,
    ) -> TextResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            rasterizer,
            config,
            textures: Vec::new(),
            slots: SlotArena::with_capacity(256),
            index: LruCache::unbounded(),
            frame: 0,
            in_frame: false,
            stats: AtlasStats::default(),
        })
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Return the slot for `key`, rasterizing and uploading it on a miss.
    ///
    /// Fails only with [`TextError::ResourceExhausted`]; rasterizer errors
    /// are recorded as [`AtlasSlot::EMPTY`]. A failing call evicts nothing.
    pub fn ensure(&mut self, key: GlyphKey) -> TextResult<AtlasSlot> {
        profile_function!();
        if let Some(&handle) = self.index.get(&key) {
            if let Some(entry) = self.slots.get_mut(handle) {
                entry.last_frame = self.frame;
                self.stats.hits += 1;
                return Ok(entry.slot);
            }
        }
        self.stats.misses += 1;

        self.stats.rasterizations += 1;
        let bitmap = match self.rasterizer.rasterize(key) {
            Ok(bitmap) if !bitmap.is_empty() => Some(bitmap),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("Glyph {:?} failed to rasterize: {}", key, err);
                self.stats.failures += 1;
                None
            }
        };

        if let Some(bitmap) = &bitmap {
            if !self.fits_texture(bitmap.width, bitmap.height) {
                tracing::warn!(
                    "Glyph of {}x{} exceeds the {}px atlas texture",
                    bitmap.width,
                    bitmap.height,
                    self.config.texture_size
                );
                return Err(self.exhausted(bitmap.width, bitmap.height));
            }
        }
        self.enforce_glyph_ceiling()?;

        let Some(bitmap) = bitmap else {
            return Ok(self.insert(key, AtlasSlot::EMPTY, None));
        };

        let (texture_idx, allocation) = self.allocate(bitmap.width, bitmap.height)?;
        let pixels = bitmap.to_format(self.config.format);
        let rect = Rect {
            x: allocation.x,
            y: allocation.y,
            width: bitmap.width,
            height: bitmap.height,
        };

        let texture = &mut self.textures[texture_idx];
        self.backend.update(
            &mut texture.handle,
            &pixels,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
        );
        texture.dirty = Some(texture.dirty.map_or(rect, |dirty| dirty.union(rect)));
        self.stats.uploads += 1;

        let slot = AtlasSlot {
            texture: Some(TextureId(texture_idx)),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            left: bitmap.left,
            top: bitmap.top,
        };
        Ok(self.insert(key, slot, Some(allocation)))
    }

    fn insert(&mut self, key: GlyphKey, slot: AtlasSlot, allocation: Option<Allocation>) -> AtlasSlot {
        let handle = self.slots.push(SlotEntry {
            slot,
            allocation,
            last_frame: self.frame,
        });
        self.index.put(key, handle);
        slot
    }

    fn fits_texture(&self, width: u32, height: u32) -> bool {
        let size = self.config.texture_size;
        ShelfPacker::new(size, size, self.config.padding).fits(width, height)
    }

    /// Make room for one more glyph under `max_glyphs`.
    fn enforce_glyph_ceiling(&mut self) -> TextResult<()> {
        let EvictionPolicy::Lru {
            max_glyphs: Some(max),
        } = self.config.eviction
        else {
            return Ok(());
        };
        while self.slots.len() >= max {
            let Some((key, handle)) = self.lru_victim(|_| true) else {
                tracing::warn!("Glyph ceiling of {} reached with every glyph in use", max);
                return Err(TextError::ResourceExhausted {
                    requested_width: 0,
                    requested_height: 0,
                    textures: self.textures.len(),
                    max_textures: self.config.max_textures,
                    max_glyphs: Some(max),
                });
            };
            self.evict(key, handle);
        }
        Ok(())
    }

    fn allocate(&mut self, width: u32, height: u32) -> TextResult<(usize, Allocation)> {
        profile_function!();
        for (idx, texture) in self.textures.iter_mut().enumerate() {
            if let Some(allocation) = texture.packer.pack(width, height) {
                return Ok((idx, allocation));
            }
        }

        let may_grow = self
            .config
            .max_textures
            .is_none_or(|max| self.textures.len() < max);
        if may_grow {
            self.add_texture()?;
            let idx = self.textures.len() - 1;
            if let Some(allocation) = self.textures[idx].packer.pack(width, height) {
                return Ok((idx, allocation));
            }
        }

        if matches!(self.config.eviction, EvictionPolicy::Lru { .. }) {
            let target = (0..self.textures.len())
                .find(|&idx| self.fits_after_eviction(idx, width, height));
            if let Some(idx) = target {
                return self.evict_until_fits(idx, width, height);
            }
        }

        tracing::warn!(
            "Glyph atlas exhausted: {} texture(s), {} glyph(s)",
            self.textures.len(),
            self.slots.len()
        );
        Err(self.exhausted(width, height))
    }

    fn add_texture(&mut self) -> TextResult<()> {
        let size = self.config.texture_size;
        let handle = self.backend.allocate(size, size)?;
        self.textures.push(AtlasTexture {
            handle,
            packer: ShelfPacker::new(size, size, self.config.padding),
            dirty: None,
        });
        tracing::debug!(
            "Allocated atlas texture #{} ({}x{})",
            self.textures.len() - 1,
            size,
            size
        );
        Ok(())
    }

    /// Glyphs resolved in the current frame.
    fn is_pinned(&self, entry: &SlotEntry) -> bool {
        self.in_frame && entry.last_frame == self.frame
    }

    fn on_texture(entry: &SlotEntry, idx: usize) -> Option<Allocation> {
        match (entry.slot.texture, entry.allocation) {
            (Some(texture), Some(allocation)) if texture.0 == idx => Some(allocation),
            _ => None,
        }
    }

    /// Whether texture `idx` could hold the glyph once every unpinned glyph
    /// on it is gone. Works on a copy of the packer.
    fn fits_after_eviction(&self, idx: usize, width: u32, height: u32) -> bool {
        let mut packer = self.textures[idx].packer.clone();
        for (_, entry) in self.slots.iter() {
            if let Some(allocation) = Self::on_texture(entry, idx) {
                if !self.is_pinned(entry) {
                    packer.free(&allocation);
                }
            }
        }
        packer.pack(width, height).is_some()
    }

    /// Evict glyphs of texture `idx` oldest first until the glyph packs.
    fn evict_until_fits(&mut self, idx: usize, width: u32, height: u32) -> TextResult<(usize, Allocation)> {
        loop {
            if let Some(allocation) = self.textures[idx].packer.pack(width, height) {
                return Ok((idx, allocation));
            }
            let Some((key, handle)) = self.lru_victim(|entry| Self::on_texture(entry, idx).is_some())
            else {
                return Err(self.exhausted(width, height));
            };
            self.evict(key, handle);
        }
    }

    /// Least recently used unpinned glyph accepted by `filter`.
    fn lru_victim(&self, filter: impl Fn(&SlotEntry) -> bool) -> Option<(GlyphKey, SlotHandle)> {
        self.index
            .iter()
            .rev()
            .find(|(_, handle)| {
                self.slots
                    .get(**handle)
                    .is_some_and(|entry| !self.is_pinned(entry) && filter(entry))
            })
            .map(|(key, handle)| (*key, *handle))
    }

    fn evict(&mut self, key: GlyphKey, handle: SlotHandle) {
        self.index.pop(&key);
        if let Some(entry) = self.slots.remove(handle) {
            if let (Some(texture), Some(allocation)) = (entry.slot.texture, entry.allocation) {
                if let Some(texture) = self.textures.get_mut(texture.0) {
                    texture.packer.free(&allocation);
                }
                tracing::trace!(
                    "Evicted glyph {:?} ({}x{} at {},{})",
                    key,
                    allocation.width,
                    allocation.height,
                    allocation.x,
                    allocation.y
                );
            }
        }
        self.stats.evictions += 1;
    }

    fn exhausted(&self, width: u32, height: u32) -> TextError {
        TextError::ResourceExhausted {
            requested_width: width,
            requested_height: height,
            textures: self.textures.len(),
            max_textures: self.config.max_textures,
            max_glyphs: None,
        }
    }

    /// Start an emit: glyphs resolved until [`GlyphAtlas::end_frame`] are not evicted.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        self.in_frame = true;
    }

    /// Finish an emit and reset the textures' dirty regions.
    pub fn end_frame(&mut self) {
        self.in_frame = false;
        for texture in &mut self.textures {
            texture.dirty = None;
        }
    }

    /// Forward a batch to the backend.
    pub fn draw(&mut self, texture: TextureId, quads: &[Quad]) {
        if quads.is_empty() {
            return;
        }
        if let Some(texture) = self.textures.get(texture.0) {
            self.backend.draw(quads, &texture.handle);
        }
    }

    /// Drop every cached glyph. Textures are kept and repacked from scratch.
    pub fn clear(&mut self) {
        let dropped = self.slots.len();
        self.slots.clear();
        self.index.clear();
        for texture in &mut self.textures {
            texture.packer.reset();
            texture.dirty = None;
        }
        tracing::debug!("Cleared glyph atlas ({} glyph(s))", dropped);
    }

    /// Cached slot for `key` without touching recency or rasterizing.
    pub fn get(&self, key: &GlyphKey) -> Option<AtlasSlot> {
        let handle = self.index.peek(key)?;
        self.slots.get(*handle).map(|entry| entry.slot)
    }

    pub fn contains(&self, key: &GlyphKey) -> bool {
        self.index.contains(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn texture(&self, id: TextureId) -> Option<&B::Texture> {
        self.textures.get(id.0).map(|texture| &texture.handle)
    }

    /// Union of the rectangles uploaded to `id` since the last emit.
    pub fn dirty_region(&self, id: TextureId) -> Option<Rect> {
        self.textures.get(id.0).and_then(|texture| texture.dirty)
    }

    pub fn stats(&self) -> AtlasStats {
        AtlasStats {
            glyphs: self.slots.len(),
            textures: self.textures.len(),
            ..self.stats
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontId;
    use crate::raster::{GlyphBitmap, GlyphContent};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend whose textures are just their index.
    #[derive(Default)]
    struct CountingBackend {
        allocations: usize,
        updates: Vec<(usize, u32, u32, u32, u32)>,
        draws: Vec<(usize, usize)>,
    }

    impl TextureBackend for CountingBackend {
        type Texture = usize;

        fn allocate(&mut self, _width: u32, _height: u32) -> TextResult<usize> {
            self.allocations += 1;
            Ok(self.allocations - 1)
        }

        fn update(&mut self, texture: &mut usize, buffer: &[u8], x: u32, y: u32, w: u32, h: u32) {
            assert_eq!(buffer.len(), (w * h) as usize);
            self.updates.push((*texture, x, y, w, h));
        }

        fn draw(&mut self, quads: &[Quad], texture: &usize) {
            self.draws.push((*texture, quads.len()));
        }
    }

    /// Square glyphs whose side is the glyph id; id 0 fails. Glyphs of
    /// [`STRIPS`] are 20px wide with the glyph id as height.
    struct SquareRasterizer {
        calls: Arc<AtomicUsize>,
    }

    impl GlyphRasterizer for SquareRasterizer {
        fn rasterize(&mut self, key: GlyphKey) -> TextResult<GlyphBitmap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if key.glyph_id == 0 {
                return Err(TextError::RasterizationFailure("notdef".to_string()));
            }
            let side = key.glyph_id as u32;
            let width = if key.font == STRIPS { 20 } else { side };
            Ok(GlyphBitmap {
                width,
                height: side,
                left: 1,
                top: side as i32,
                content: GlyphContent::Mask,
                data: vec![255; (width * side) as usize],
            })
        }
    }

    fn atlas(config: AtlasConfig) -> (GlyphAtlas<CountingBackend>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let rasterizer = SquareRasterizer {
            calls: calls.clone(),
        };
        let atlas = GlyphAtlas::new(CountingBackend::default(), Box::new(rasterizer), config).unwrap();
        (atlas, calls)
    }

    const STRIPS: FontId = FontId(7);

    fn key(glyph: u16) -> GlyphKey {
        GlyphKey::new(FontId(0), 16.0, glyph)
    }

    /// Distinct 20x5 glyphs.
    fn strip(n: u16) -> GlyphKey {
        GlyphKey::new(STRIPS, 10.0 + n as f32, 5)
    }

    /// One 20x20 texture, LRU, no padding.
    fn single_lru_texture() -> AtlasConfig {
        AtlasConfig::small()
            .with_texture_size(20)
            .with_padding(0)
            .with_max_textures(1)
            .with_lru_eviction(None)
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let (mut atlas, calls) = atlas(AtlasConfig::small());
        let first = atlas.ensure(key(8)).unwrap();
        let second = atlas.ensure(key(8)).unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(atlas.backend().updates.len(), 1);
        assert_eq!(atlas.stats().hits, 1);
        assert_eq!(atlas.stats().misses, 1);
    }

    #[test]
    fn test_slot_carries_bearing() {
        let (mut atlas, _) = atlas(AtlasConfig::small());
        let slot = atlas.ensure(key(6)).unwrap();
        assert_eq!(slot.texture, Some(TextureId(0)));
        assert_eq!((slot.width, slot.height), (6, 6));
        assert_eq!((slot.left, slot.top), (1, 6));
    }

    #[test]
    fn test_failure_yields_cached_empty_slot() {
        let (mut atlas, calls) = atlas(AtlasConfig::small());
        assert_eq!(atlas.ensure(key(0)).unwrap(), AtlasSlot::EMPTY);
        assert_eq!(atlas.ensure(key(0)).unwrap(), AtlasSlot::EMPTY);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(atlas.stats().failures, 1);
        assert_eq!(atlas.texture_count(), 0);
    }

    #[test]
    fn test_new_texture_when_full() {
        // 20x20 textures hold exactly one 10x10 glyph per quadrant
        let config = AtlasConfig::small().with_texture_size(20).with_padding(0);
        let (mut atlas, _) = atlas(config);
        for glyph in 0..4u16 {
            let k = GlyphKey::new(FontId(glyph as u32), 16.0, 10);
            assert_eq!(atlas.ensure(k).unwrap().texture, Some(TextureId(0)));
        }
        let fifth = atlas.ensure(GlyphKey::new(FontId(9), 16.0, 10)).unwrap();
        assert_eq!(fifth.texture, Some(TextureId(1)));
        assert_eq!(atlas.backend().allocations, 2);
    }

    #[test]
    fn test_exhausted_under_texture_ceiling() {
        let config = AtlasConfig::small()
            .with_texture_size(10)
            .with_padding(0)
            .with_max_textures(1);
        let (mut atlas, _) = atlas(config);
        atlas.ensure(key(10)).unwrap();
        let err = atlas.ensure(GlyphKey::new(FontId(1), 16.0, 10)).unwrap_err();
        assert!(matches!(err, TextError::ResourceExhausted { textures: 1, .. }));
    }

    #[test]
    fn test_oversized_glyph_is_exhausted() {
        let config = AtlasConfig::small().with_texture_size(8);
        let (mut atlas, _) = atlas(config);
        assert!(matches!(
            atlas.ensure(key(9)),
            Err(TextError::ResourceExhausted { .. })
        ));
    }

    #[test]
    fn test_lru_reuses_freed_rectangle() {
        let config = AtlasConfig::small()
            .with_texture_size(10)
            .with_padding(0)
            .with_max_textures(1)
            .with_lru_eviction(None);
        let (mut atlas, _) = atlas(config);

        let a = atlas.ensure(GlyphKey::new(FontId(0), 16.0, 10)).unwrap();
        let b = atlas.ensure(GlyphKey::new(FontId(1), 16.0, 10)).unwrap();
        assert_eq!((a.x, a.y), (b.x, b.y));
        assert!(!atlas.contains(&GlyphKey::new(FontId(0), 16.0, 10)));
        assert_eq!(atlas.stats().evictions, 1);
    }

    #[test]
    fn test_lru_glyph_ceiling_evicts_oldest() {
        let config = AtlasConfig::small().with_lru_eviction(Some(2));
        let (mut atlas, _) = atlas(config);
        atlas.ensure(key(1)).unwrap();
        atlas.ensure(key(2)).unwrap();
        // Touch 1 so 2 becomes the oldest
        atlas.ensure(key(1)).unwrap();
        atlas.ensure(key(3)).unwrap();

        assert!(atlas.contains(&key(1)));
        assert!(!atlas.contains(&key(2)));
        assert!(atlas.contains(&key(3)));
        assert_eq!(atlas.len(), 2);
    }

    #[test]
    fn test_glyphs_in_current_frame_are_pinned() {
        let config = AtlasConfig::small().with_lru_eviction(Some(2));
        let (mut atlas, _) = atlas(config);
        atlas.begin_frame();
        atlas.ensure(key(1)).unwrap();
        atlas.ensure(key(2)).unwrap();
        assert!(matches!(
            atlas.ensure(key(3)),
            Err(TextError::ResourceExhausted {
                max_glyphs: Some(2),
                ..
            })
        ));
        atlas.end_frame();

        // Next frame the old glyphs are fair game again
        atlas.begin_frame();
        assert!(atlas.ensure(key(3)).is_ok());
        atlas.end_frame();
    }

    #[test]
    fn test_dirty_region_tracks_uploads() {
        let config = AtlasConfig::small().with_padding(0);
        let (mut atlas, _) = atlas(config);
        atlas.ensure(key(4)).unwrap();
        atlas.ensure(key(2)).unwrap();
        assert_eq!(
            atlas.dirty_region(TextureId(0)),
            Some(Rect {
                x: 0,
                y: 0,
                width: 6,
                height: 4
            })
        );
        atlas.begin_frame();
        atlas.end_frame();
        assert_eq!(atlas.dirty_region(TextureId(0)), None);
    }

    #[test]
    fn test_clear_forces_rasterization() {
        let (mut atlas, calls) = atlas(AtlasConfig::small());
        atlas.ensure(key(5)).unwrap();
        atlas.clear();
        assert!(atlas.is_empty());
        atlas.ensure(key(5)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // The texture is reused, not reallocated
        assert_eq!(atlas.backend().allocations, 1);
    }

    #[test]
    fn test_invalid_config() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = GlyphAtlas::new(
            CountingBackend::default(),
            Box::new(SquareRasterizer { calls }),
            AtlasConfig::small().with_max_textures(0),
        );
        assert!(matches!(result, Err(TextError::InvalidArgument(_))));
    }

    #[test]
    fn test_draw_skips_empty_batches() {
        let (mut atlas, _) = atlas(AtlasConfig::small());
        atlas.ensure(key(3)).unwrap();
        atlas.draw(TextureId(0), &[]);
        assert!(atlas.backend().draws.is_empty());
    }

    #[test]
    fn test_evicted_strips_make_room_for_a_tall_glyph() {
        let (mut atlas, _) = atlas(single_lru_texture());
        for n in 0..4 {
            assert_eq!(atlas.ensure(strip(n)).unwrap().texture, Some(TextureId(0)));
        }

        let full = atlas.ensure(key(20)).unwrap();
        assert_eq!((full.x, full.y), (0, 0));
        assert_eq!(atlas.stats().evictions, 4);
        assert_eq!(atlas.len(), 1);

        // And back: a strip pushes the full-size glyph out again
        let again = atlas.ensure(strip(0)).unwrap();
        assert_eq!((again.x, again.y), (0, 0));
        assert!(!atlas.contains(&key(20)));
        assert_eq!(atlas.stats().evictions, 5);
    }

    #[test]
    fn test_eviction_that_cannot_help_keeps_the_cache() {
        let (mut atlas, _) = atlas(single_lru_texture());
        for n in 1..4 {
            atlas.ensure(strip(n)).unwrap();
        }
        atlas.begin_frame();
        // Bottom shelf, pinned for this frame
        assert_eq!(atlas.ensure(strip(0)).unwrap().y, 15);

        assert!(matches!(
            atlas.ensure(key(20)),
            Err(TextError::ResourceExhausted {
                requested_width: 20,
                requested_height: 20,
                ..
            })
        ));
        assert_eq!(atlas.len(), 4);
        assert_eq!(atlas.stats().evictions, 0);

        // The three drained strips above it merge into a 15px shelf
        let slot = atlas.ensure(key(15)).unwrap();
        assert_eq!((slot.x, slot.y), (0, 0));
        assert_eq!(atlas.stats().evictions, 3);
        assert!(atlas.contains(&strip(0)));
        atlas.end_frame();
    }

    #[test]
    fn test_oversized_miss_evicts_nothing() {
        let config = AtlasConfig::small()
            .with_texture_size(8)
            .with_lru_eviction(Some(2));
        let (mut atlas, _) = atlas(config);
        atlas.ensure(key(3)).unwrap();
        atlas.ensure(key(4)).unwrap();

        assert!(matches!(
            atlas.ensure(key(9)),
            Err(TextError::ResourceExhausted {
                requested_width: 9,
                max_glyphs: None,
                ..
            })
        ));
        assert_eq!(atlas.len(), 2);
        assert_eq!(atlas.stats().evictions, 0);
    }
}
