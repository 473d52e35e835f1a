//! Quad emission.
//!
//! Resolves every placed glyph of a [`BuiltText`] through the atlas and
//! hands the resulting quads to the backend, one draw call per texture.

use glint_core::profiling::profile_function;

use crate::atlas::{AtlasSlot, GlyphAtlas, TextureId};
use crate::backend::TextureBackend;
use crate::error::TextResult;
use crate::layout::PlacedGlyph;
use crate::quad::Quad;
use crate::text::BuiltText;

/// What one emit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    /// Placed glyphs resolved
    pub glyphs: usize,
    /// Quads handed to the backend
    pub quads: usize,
    /// Zero-area quads among them
    pub empty_quads: usize,
    pub draw_calls: usize,
}

/// Quads for one texture, in source order.
struct Batch {
    texture: TextureId,
    quads: Vec<Quad>,
}

/// Draw `text` through `atlas`.
///
/// Glyphs that must be rasterized are uploaded first; draw calls are only
/// issued once every glyph is resident, so an error leaves nothing half
/// drawn. Batches are issued in the order their textures were first touched.
pub fn emit<B: TextureBackend>(atlas: &mut GlyphAtlas<B>, text: &BuiltText) -> TextResult<EmitStats> {
    profile_function!();
    atlas.begin_frame();
    let batches = match collect_batches(atlas, text) {
        Ok(batches) => batches,
        Err(err) => {
            atlas.end_frame();
            return Err(err);
        }
    };

    let mut stats = EmitStats {
        glyphs: text.glyphs().count(),
        ..Default::default()
    };
    for batch in &batches {
        stats.quads += batch.quads.len();
        stats.empty_quads += batch.quads.iter().filter(|q| q.is_empty()).count();
        stats.draw_calls += 1;
        atlas.draw(batch.texture, &batch.quads);
    }
    atlas.end_frame();

    tracing::trace!(
        "Emitted {} quad(s) in {} draw call(s)",
        stats.quads,
        stats.draw_calls
    );
    Ok(stats)
}

fn collect_batches<B: TextureBackend>(
    atlas: &mut GlyphAtlas<B>,
    text: &BuiltText,
) -> TextResult<Vec<Batch>> {
    let mut batches: Vec<Batch> = Vec::new();
    // Zero-area quads seen before the first textured glyph
    let mut leading: Vec<Quad> = Vec::new();
    let mut current: Option<usize> = None;

    for glyph in text.glyphs() {
        let slot = atlas.ensure(glyph.key)?;
        let quad = glyph_quad(text, glyph, &slot);

        let Some(texture) = slot.texture else {
            match current {
                Some(idx) => batches[idx].quads.push(quad),
                None => leading.push(quad),
            }
            continue;
        };

        let idx = match batches.iter().position(|batch| batch.texture == texture) {
            Some(idx) => idx,
            None => {
                batches.push(Batch {
                    texture,
                    quads: std::mem::take(&mut leading),
                });
                batches.len() - 1
            }
        };
        batches[idx].quads.push(quad);
        current = Some(idx);
    }

    Ok(batches)
}

fn glyph_quad(text: &BuiltText, glyph: &PlacedGlyph, slot: &AtlasSlot) -> Quad {
    let (origin_x, origin_y) = text.origin();
    let color = text.color();
    let pen_x = origin_x + glyph.x.round() as i32;
    let baseline = origin_y + glyph.y.round() as i32;

    Quad {
        src_x: slot.x as i32,
        src_y: slot.y as i32,
        src_w: slot.width as i32,
        src_h: slot.height as i32,
        dst_x: pen_x + slot.left,
        dst_y: baseline - slot.top,
        dst_w: slot.width as i32,
        dst_h: slot.height as i32,
        r: color.r,
        g: color.g,
        b: color.b,
        a: color.a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::atlas::AtlasConfig;
    use crate::error::TextError;
    use crate::font::{FontId, GlyphKey};
    use crate::layout::{LayoutEngine, TextAlign};
    use crate::quad::Color;
    use crate::raster::{GlyphBitmap, GlyphContent, GlyphRasterizer};
    use crate::shaping::{ShapedGlyph, ShapedParagraph, ShapedRun, TextShaper};

    /// Textures are numbered; draws record (texture, quads).
    #[derive(Default)]
    struct LogBackend {
        textures: u32,
        draws: Vec<(u32, Vec<Quad>)>,
    }

    impl TextureBackend for LogBackend {
        type Texture = u32;

        fn allocate(&mut self, _width: u32, _height: u32) -> TextResult<u32> {
            self.textures += 1;
            Ok(self.textures - 1)
        }

        fn update(&mut self, _: &mut u32, _: &[u8], _: u32, _: u32, _: u32, _: u32) {}

        fn draw(&mut self, quads: &[Quad], texture: &u32) {
            self.draws.push((*texture, quads.to_vec()));
        }
    }

    /// One 10px glyph per char, 20px lines, ascent 16.
    struct CharShaper;

    impl TextShaper for CharShaper {
        fn shape(&mut self, markup: &str) -> TextResult<ShapedParagraph> {
            let glyphs = markup
                .chars()
                .map(|c| ShapedGlyph {
                    key: GlyphKey::new(FontId(0), 16.0, c as u16),
                    advance: 10.0,
                    whitespace: c == ' ',
                })
                .collect();
            Ok(ShapedParagraph::new(vec![ShapedRun::new(glyphs)], 20.0, 16.0))
        }
    }

    /// 6x10 boxes with a (1, 10) bearing; '?' fails.
    struct BoxRasterizer;

    impl GlyphRasterizer for BoxRasterizer {
        fn rasterize(&mut self, key: GlyphKey) -> TextResult<GlyphBitmap> {
            if key.glyph_id == '?' as u16 {
                return Err(TextError::RasterizationFailure("no glyph".to_string()));
            }
            Ok(GlyphBitmap {
                width: 6,
                height: 10,
                left: 1,
                top: 10,
                content: GlyphContent::Mask,
                data: vec![255; 60],
            })
        }
    }

    fn setup(markup: &str, config: AtlasConfig) -> (GlyphAtlas<LogBackend>, BuiltText, Arc<()>) {
        let alive = Arc::new(());
        let mut engine = LayoutEngine::new(Box::new(CharShaper));
        let paragraphs = engine.layout(&[(markup, TextAlign::Left)], 200.0).unwrap();
        let text = BuiltText::new(paragraphs, 200, 1, Arc::downgrade(&alive));
        let atlas = GlyphAtlas::new(LogBackend::default(), Box::new(BoxRasterizer), config).unwrap();
        (atlas, text, alive)
    }

    #[test]
    fn test_quads_apply_origin_bearing_and_tint() {
        let (mut atlas, mut text, _alive) = setup("ab", AtlasConfig::small());
        text.set_origin(5, 7);
        text.set_color(Color::BLACK);
        let stats = emit(&mut atlas, &text).unwrap();

        assert_eq!(stats.draw_calls, 1);
        let quads = &atlas.backend().draws[0].1;
        assert_eq!((quads[0].dst_x, quads[0].dst_y), (6, 13));
        assert_eq!((quads[1].dst_x, quads[1].dst_y), (16, 13));
        assert!(quads.iter().all(|q| q.color() == Color::BLACK));
    }

    #[test]
    fn test_empty_quads_follow_previous_glyph() {
        let (mut atlas, text, _alive) = setup("?a?b", AtlasConfig::small());
        let stats = emit(&mut atlas, &text).unwrap();

        let quads = &atlas.backend().draws[0].1;
        let empty: Vec<bool> = quads.iter().map(Quad::is_empty).collect();
        assert_eq!(empty, vec![true, false, true, false]);
        assert_eq!(stats.empty_quads, 2);
        assert_eq!(stats.glyphs, 4);
    }

    #[test]
    fn test_batches_follow_first_touched_texture() {
        // 10x10 textures without padding hold a single 6x10 glyph
        let config = AtlasConfig::small().with_texture_size(10).with_padding(0);
        let (mut atlas, text, _alive) = setup("abab", config);
        emit(&mut atlas, &text).unwrap();

        let draws = &atlas.backend().draws;
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].0, draws[0].1.len()), (0, 2));
        assert_eq!((draws[1].0, draws[1].1.len()), (1, 2));
        assert_eq!(draws[0].1[1].dst_x, 21);
    }

    #[test]
    fn test_error_draws_nothing() {
        let config = AtlasConfig::small()
            .with_texture_size(10)
            .with_padding(0)
            .with_max_textures(1);
        let (mut atlas, text, _alive) = setup("ab", config);
        assert!(matches!(
            emit(&mut atlas, &text),
            Err(TextError::ResourceExhausted { .. })
        ));
        assert!(atlas.backend().draws.is_empty());
    }
}
