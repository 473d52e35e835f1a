//! Line breaking and alignment.
//!
//! Paragraphs are shaped once (through [`TextShapeCache`]) and then flowed
//! into lines for a given width. Flowing is cheap and fully deterministic, so
//! a re-wrap simply flows the cached shaping again at the new width.

use std::ops::Range;
use std::sync::Arc;

use glint_core::profiling::{profile_function, profile_scope};

use crate::cache::TextShapeCache;
use crate::error::TextResult;
use crate::font::GlyphKey;
use crate::shaping::{ShapedGlyph, ShapedParagraph, TextShaper};

/// Slack for float accumulation when comparing against the width.
const WIDTH_EPSILON: f32 = 1e-3;

/// Horizontal alignment of a paragraph's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
}

impl TextAlign {
    /// Pen origin of a line of `advance` pixels in a box `width` wide.
    ///
    /// Lines wider than the box start at 0.
    pub fn origin(self, advance: f32, width: f32) -> f32 {
        let free = width - advance;
        let origin = match self {
            TextAlign::Left => 0.0,
            TextAlign::Right => free,
            TextAlign::Center => free / 2.0,
        };
        origin.max(0.0)
    }
}

/// A glyph with its final pen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub key: GlyphKey,
    /// Pen x relative to the text's origin
    pub x: f32,
    /// Baseline y relative to the text's origin
    pub y: f32,
    pub advance: f32,
    /// Index of the paragraph the glyph belongs to
    pub paragraph: usize,
}

/// One laid out line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBox {
    /// Range into the paragraph's placed glyphs
    pub range: Range<usize>,
    /// Advance without trailing whitespace
    pub advance: f32,
    pub origin_x: f32,
    pub top: f32,
    pub height: f32,
}

/// A shaped and flowed paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    markup: String,
    align: TextAlign,
    shaped: Arc<ShapedParagraph>,
    lines: Vec<LineBox>,
    glyphs: Vec<PlacedGlyph>,
    top: f32,
    height: f32,
}

impl Paragraph {
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn align(&self) -> TextAlign {
        self.align
    }

    pub fn shaped(&self) -> &Arc<ShapedParagraph> {
        &self.shaped
    }

    pub fn lines(&self) -> &[LineBox] {
        &self.lines
    }

    /// Placed glyphs in line-then-glyph order.
    pub fn glyphs(&self) -> &[PlacedGlyph] {
        &self.glyphs
    }

    /// Offset of the paragraph's first line from the text's top.
    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Glyphs of one line.
    pub fn line_glyphs(&self, line: &LineBox) -> &[PlacedGlyph] {
        self.glyphs.get(line.range.clone()).unwrap_or(&[])
    }
}

/// Sum of paragraph heights.
pub fn total_height(paragraphs: &[Paragraph]) -> f32 {
    paragraphs.iter().map(Paragraph::height).sum()
}

/// Shapes paragraphs and flows them into lines.
pub struct LayoutEngine {
    shaper: Box<dyn TextShaper>,
    cache: TextShapeCache,
}

impl LayoutEngine {
    pub fn new(shaper: Box<dyn TextShaper>) -> Self {
        Self {
            shaper,
            cache: TextShapeCache::new(),
        }
    }

    /// Shape and flow `paragraphs` into lines at most `width` pixels wide.
    ///
    /// A width of zero or less yields paragraphs without lines.
    pub fn layout<S: AsRef<str>>(
        &mut self,
        paragraphs: &[(S, TextAlign)],
        width: f32,
    ) -> TextResult<Vec<Paragraph>> {
        profile_function!();
        let mut out = Vec::with_capacity(paragraphs.len());
        let mut top = 0.0;
        for (index, (markup, align)) in paragraphs.iter().enumerate() {
            let markup = markup.as_ref();
            let shaper = &mut self.shaper;
            let shaped = self.cache.get_or_shape(markup, |m| shaper.shape(m))?;
            let paragraph = flow(index, markup.to_string(), *align, shaped, top, width);
            top += paragraph.height;
            out.push(paragraph);
        }

        tracing::trace!(
            "Laid out {} paragraph(s) at width {} (shape cache: {} hits, {} misses)",
            out.len(),
            width,
            self.cache.hits,
            self.cache.misses
        );
        Ok(out)
    }

    /// Flow already shaped paragraphs at a new width.
    ///
    /// Equivalent to [`LayoutEngine::layout`] with the same markups at `width`.
    pub fn rewrap(paragraphs: &[Paragraph], width: f32) -> Vec<Paragraph> {
        profile_function!();
        let mut out = Vec::with_capacity(paragraphs.len());
        let mut top = 0.0;
        for (index, paragraph) in paragraphs.iter().enumerate() {
            let flowed = flow(
                index,
                paragraph.markup.clone(),
                paragraph.align,
                paragraph.shaped.clone(),
                top,
                width,
            );
            top += flowed.height;
            out.push(flowed);
        }
        out
    }

    pub fn shape_cache(&self) -> &TextShapeCache {
        &self.cache
    }

    /// Bound the number of shaped paragraphs kept between layouts.
    pub fn set_shape_cache_capacity(&mut self, capacity: usize) {
        self.cache.set_capacity(capacity);
    }

    pub fn clear_shape_cache(&mut self) {
        self.cache.clear();
    }
}

fn flow(
    index: usize,
    markup: String,
    align: TextAlign,
    shaped: Arc<ShapedParagraph>,
    top: f32,
    width: f32,
) -> Paragraph {
    let mut lines = Vec::new();
    let mut glyphs = Vec::with_capacity(shaped.glyph_count());

    if width > 0.0 {
        profile_scope!("flow_paragraph");
        let line_height = shaped.line_height;
        let mut line_top = top;
        for run in &shaped.runs {
            for range in break_run(&run.glyphs, width) {
                let line = &run.glyphs[range];
                let advance = line_advance(line);
                let origin_x = align.origin(advance, width);
                let baseline = line_top + shaped.ascent;

                let first = glyphs.len();
                let mut pen = origin_x;
                for glyph in line {
                    glyphs.push(PlacedGlyph {
                        key: glyph.key,
                        x: pen,
                        y: baseline,
                        advance: glyph.advance,
                        paragraph: index,
                    });
                    pen += glyph.advance;
                }

                lines.push(LineBox {
                    range: first..glyphs.len(),
                    advance,
                    origin_x,
                    top: line_top,
                    height: line_height,
                });
                line_top += line_height;
            }
        }
    }

    let height = lines.iter().map(|line| line.height).sum();
    Paragraph {
        markup,
        align,
        shaped,
        lines,
        glyphs,
        top,
        height,
    }
}

/// Split one run into line ranges no wider than `width`.
///
/// Breaks after the last whitespace before the overflowing glyph. A word
/// with no such break is split at the overflowing glyph, and every line
/// takes at least one glyph. Whitespace never causes overflow. An empty run
/// yields one empty line.
fn break_run(glyphs: &[ShapedGlyph], width: f32) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pen = 0.0;
    let mut last_break: Option<usize> = None;
    let mut i = 0;

    while i < glyphs.len() {
        let glyph = &glyphs[i];
        if glyph.whitespace {
            pen += glyph.advance;
            i += 1;
            last_break = Some(i);
            continue;
        }

        if pen + glyph.advance > width + WIDTH_EPSILON && i > start {
            let end = match last_break {
                Some(at) if at > start => at,
                _ => i,
            };
            lines.push(start..end);
            start = end;
            last_break = None;
            pen = glyphs[start..i].iter().map(|g| g.advance).sum();
            continue;
        }

        pen += glyph.advance;
        i += 1;
    }

    lines.push(start..glyphs.len());
    lines
}

/// Advance of a line with its trailing whitespace hanging.
fn line_advance(line: &[ShapedGlyph]) -> f32 {
    let visible = line
        .iter()
        .rposition(|glyph| !glyph.whitespace)
        .map_or(0, |last| last + 1);
    line[..visible].iter().map(|glyph| glyph.advance).sum()
}
