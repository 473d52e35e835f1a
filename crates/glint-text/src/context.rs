//! Render context: the engine's entry point.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::atlas::{AtlasConfig, AtlasStats, GlyphAtlas};
use crate::backend::TextureBackend;
use crate::emitter::{self, EmitStats};
use crate::error::{TextError, TextResult};
use crate::font::FontStore;
use crate::layout::{LayoutEngine, TextAlign};
use crate::raster::{CosmicRasterizer, GlyphRasterizer};
use crate::shaping::{CosmicShaper, ShapeStyle, TextShaper};
use crate::text::BuiltText;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Binds a texture backend, a shaper and a rasterizer around one glyph atlas.
///
/// One context backs any number of [`BuiltText`]s. Its methods take `&self`;
/// the layout engine and the atlas each sit behind a mutex, so concurrent
/// atlas misses for the same glyph collapse into one rasterization.
///
/// Dropping or [`destroy`](RenderContext::destroy)ing the context invalidates
/// every text it built: later calls on them fail with
/// [`TextError::UseAfterDestroy`].
pub struct RenderContext<B: TextureBackend> {
    id: u64,
    alive: Arc<()>,
    layout: Mutex<LayoutEngine>,
    atlas: Mutex<GlyphAtlas<B>>,
}

impl<B: TextureBackend> RenderContext<B> {
    pub fn new(
        backend: B,
        shaper: Box<dyn TextShaper>,
        rasterizer: Box<dyn GlyphRasterizer>,
        config: AtlasConfig,
    ) -> TextResult<Self> {
        let atlas = GlyphAtlas::new(backend, rasterizer, config)?;
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Created render context #{} ({}px atlas textures)",
            id,
            atlas.config().texture_size
        );
        Ok(Self {
            id,
            alive: Arc::new(()),
            layout: Mutex::new(LayoutEngine::new(shaper)),
            atlas: Mutex::new(atlas),
        })
    }

    /// Context that shapes and rasterizes with cosmic-text over `fonts`.
    pub fn with_fonts(
        backend: B,
        fonts: Arc<FontStore>,
        style: ShapeStyle,
        config: AtlasConfig,
    ) -> TextResult<Self> {
        if fonts.is_empty() {
            return Err(TextError::FontLoadError(
                "font store has no faces".to_string(),
            ));
        }
        let font_system = Arc::new(Mutex::new(fonts.font_system()));
        let shaper = CosmicShaper::new(font_system.clone(), fonts.clone(), style);
        let rasterizer = CosmicRasterizer::new(font_system, fonts);
        Self::new(backend, Box::new(shaper), Box::new(rasterizer), config)
    }

    /// Lay out `markups` with one alignment per paragraph.
    pub fn build_text<S: AsRef<str>>(
        &self,
        markups: &[S],
        alignments: &[TextAlign],
        width: u32,
    ) -> TextResult<BuiltText> {
        if markups.is_empty() {
            return Err(TextError::InvalidArgument(
                "at least one paragraph is required".to_string(),
            ));
        }
        if markups.len() != alignments.len() {
            return Err(TextError::InvalidArgument(format!(
                "{} markups but {} alignments",
                markups.len(),
                alignments.len()
            )));
        }
        if width == 0 {
            return Err(TextError::InvalidArgument(
                "width must be positive".to_string(),
            ));
        }

        let paragraphs: Vec<(&str, TextAlign)> = markups
            .iter()
            .map(AsRef::as_ref)
            .zip(alignments.iter().copied())
            .collect();
        let laid_out = self.layout.lock().layout(&paragraphs, width as f32)?;
        Ok(BuiltText::new(
            laid_out,
            width,
            self.id,
            Arc::downgrade(&self.alive),
        ))
    }

    /// Emit `text`: one backend draw call per atlas texture it touches.
    pub fn draw_text(&self, text: &BuiltText) -> TextResult<EmitStats> {
        if text.context_id() != self.id {
            return Err(TextError::UseAfterDestroy(
                "text was built by a different render context".to_string(),
            ));
        }
        text.check_alive()?;
        let mut atlas = self.atlas.lock();
        emitter::emit(&mut *atlas, text)
    }

    /// Drop every cached glyph, e.g. to recover from
    /// [`TextError::ResourceExhausted`]. Built texts stay valid.
    pub fn clear_glyph_cache(&self) {
        self.atlas.lock().clear();
    }

    /// Forget cached shaping results.
    pub fn clear_shape_cache(&self) {
        self.layout.lock().clear_shape_cache();
    }

    /// Bound the number of shaped paragraphs kept for re-use (at least one).
    pub fn set_shape_cache_capacity(&self, capacity: usize) {
        self.layout.lock().set_shape_cache_capacity(capacity);
    }

    /// Hits, misses and size of the shape cache.
    pub fn shape_cache_stats(&self) -> String {
        self.layout.lock().shape_cache().stats_string()
    }

    pub fn atlas_stats(&self) -> AtlasStats {
        self.atlas.lock().stats()
    }

    /// Run `f` with the atlas locked, e.g. to inspect the backend.
    pub fn with_atlas<R>(&self, f: impl FnOnce(&mut GlyphAtlas<B>) -> R) -> R {
        let mut atlas = self.atlas.lock();
        f(&mut *atlas)
    }

    /// Tear the context down. Texts built by it can no longer be drawn or
    /// re-wrapped.
    pub fn destroy(self) {
        tracing::debug!("Destroyed render context #{}", self.id);
    }
}
