//! Shaping adapter.
//!
//! Turns a paragraph's markup into glyph runs with natural advances. Runs are
//! split at hard line breaks; soft breaking happens later in the layout
//! engine, so shaping output is independent of the wrap width and can be
//! cached across re-wraps.

use std::sync::Arc;

use cosmic_text::{Attrs, Buffer, Family, Metrics, Shaping, Wrap};
use glint_core::profiling::profile_function;
use parking_lot::Mutex;

use crate::error::{TextError, TextResult};
use crate::font::{FontStore, GlyphKey};

/// A glyph after shaping, before line breaking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    /// Identity used for rasterization and atlas lookup
    pub key: GlyphKey,
    /// Horizontal advance in pixels
    pub advance: f32,
    /// The glyph's cluster is whitespace, i.e. a legal break point
    pub whitespace: bool,
}

/// Glyphs between two hard line breaks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedRun {
    pub glyphs: Vec<ShapedGlyph>,
}

impl ShapedRun {
    pub fn new(glyphs: Vec<ShapedGlyph>) -> Self {
        Self { glyphs }
    }

    /// Sum of all advances.
    pub fn advance(&self) -> f32 {
        self.glyphs.iter().map(|g| g.advance).sum()
    }
}

/// Width-independent shaping result of one paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedParagraph {
    pub runs: Vec<ShapedRun>,
    /// Height of one line in pixels
    pub line_height: f32,
    /// Distance from the top of a line to its baseline
    pub ascent: f32,
}

impl ShapedParagraph {
    pub fn new(runs: Vec<ShapedRun>, line_height: f32, ascent: f32) -> Self {
        Self {
            runs,
            line_height,
            ascent,
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.runs.iter().map(|run| run.glyphs.len()).sum()
    }
}

/// Produces glyph runs for a markup string.
///
/// Implementations must be deterministic: the layout engine caches results
/// and re-wraps from them without shaping again.
pub trait TextShaper: Send {
    fn shape(&mut self, markup: &str) -> TextResult<ShapedParagraph>;
}

/// Font selection used by [`CosmicShaper`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    family: Option<String>,
    size: f32,
    line_height: f32,
}

impl ShapeStyle {
    /// 16px text with a 1.2 line-height multiplier in the store's default family.
    pub fn new() -> Self {
        Self {
            family: None,
            size: 16.0,
            line_height: 1.2,
        }
    }

    /// Set the font size in pixels.
    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Set the line height multiplier.
    pub fn line_height(mut self, multiplier: f32) -> Self {
        self.line_height = multiplier;
        self
    }

    /// Set the font family.
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn get_size(&self) -> f32 {
        self.size
    }

    pub fn get_family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    /// Line height in pixels.
    pub fn line_height_px(&self) -> f32 {
        self.size * self.line_height
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self::new()
    }
}

/// [`TextShaper`] backed by cosmic-text.
///
/// The markup string is shaped as plain text with the configured style;
/// `\n` starts a new run.
pub struct CosmicShaper {
    font_system: Arc<Mutex<cosmic_text::FontSystem>>,
    store: Arc<FontStore>,
    style: ShapeStyle,
    family: Option<String>,
}

impl CosmicShaper {
    pub fn new(
        font_system: Arc<Mutex<cosmic_text::FontSystem>>,
        store: Arc<FontStore>,
        style: ShapeStyle,
    ) -> Self {
        let family = style
            .get_family()
            .map(str::to_string)
            .or_else(|| store.default_family());
        Self {
            font_system,
            store,
            style,
            family,
        }
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }
}

impl TextShaper for CosmicShaper {
    fn shape(&mut self, markup: &str) -> TextResult<ShapedParagraph> {
        profile_function!();
        let mut font_system = self.font_system.lock();
        let line_height = self.style.line_height_px();

        let mut buffer = Buffer::new(&mut font_system, Metrics::new(self.style.size, line_height));
        buffer.set_wrap(&mut font_system, Wrap::None);
        buffer.set_size(&mut font_system, None, None);

        let attrs = match &self.family {
            Some(name) => Attrs::new().family(Family::Name(name)),
            None => Attrs::new(),
        };
        buffer.set_text(&mut font_system, markup, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut font_system, false);

        let mut runs: Vec<ShapedRun> = Vec::new();
        let mut current_line = None;
        let mut ascent = self.style.size;

        for run in buffer.layout_runs() {
            ascent = run.line_y - run.line_top;
            if current_line != Some(run.line_i) {
                runs.push(ShapedRun::default());
                current_line = Some(run.line_i);
            }
            let Some(target) = runs.last_mut() else {
                continue;
            };

            for glyph in run.glyphs.iter() {
                let font = self.store.font_id(glyph.font_id).ok_or_else(|| {
                    TextError::ShapingError(format!(
                        "face {:?} is not part of the font store",
                        glyph.font_id
                    ))
                })?;
                let whitespace = run
                    .text
                    .get(glyph.start..glyph.end)
                    .is_some_and(|s| !s.is_empty() && s.chars().all(char::is_whitespace));

                target.glyphs.push(ShapedGlyph {
                    key: GlyphKey::new(font, glyph.font_size, glyph.glyph_id),
                    advance: glyph.w,
                    whitespace,
                });
            }
        }

        if runs.is_empty() {
            runs.push(ShapedRun::default());
        }

        Ok(ShapedParagraph::new(runs, line_height, ascent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontStoreBuilder;

    #[test]
    fn test_shape_style_builder() {
        let style = ShapeStyle::new().size(20.0).line_height(1.5).family("Noto Sans");
        assert_eq!(style.get_size(), 20.0);
        assert_eq!(style.line_height_px(), 30.0);
        assert_eq!(style.get_family(), Some("Noto Sans"));
    }

    #[test]
    fn test_shaped_run_advance() {
        let key = GlyphKey::new(crate::font::FontId(0), 16.0, 1);
        let run = ShapedRun::new(vec![
            ShapedGlyph { key, advance: 10.0, whitespace: false },
            ShapedGlyph { key, advance: 4.0, whitespace: true },
        ]);
        assert_eq!(run.advance(), 14.0);
    }

    #[test]
    fn test_cosmic_shaper_splits_hard_breaks() {
        let store = Arc::new(FontStoreBuilder::new().with_system_fonts().build());
        if store.is_empty() {
            // No fonts on this machine; nothing to shape with.
            return;
        }
        let font_system = Arc::new(Mutex::new(store.font_system()));
        let mut shaper = CosmicShaper::new(font_system, store, ShapeStyle::new());

        let shaped = shaper.shape("Hello world\nsecond").unwrap();
        assert_eq!(shaped.runs.len(), 2);
        assert!(shaped.runs[0].glyphs.iter().any(|g| g.whitespace));
        assert!(shaped.runs[0].advance() > 0.0);
        assert!(shaped.ascent > 0.0);
    }
}
