//! Deterministic shaper and rasterizer for testing.
//!
//! Both map one char to one glyph whose id is the char's code point, so a
//! test can read text back out of placed glyphs with [`glyph_char`].

use glint_core::alloc::{HashMap, HashSet};
use glint_text::{
    FontId, GlyphBitmap, GlyphContent, GlyphKey, GlyphRasterizer, ShapedGlyph, ShapedParagraph,
    ShapedRun, TextError, TextResult, TextShaper,
};

use crate::CallCounter;

/// Glyph id a mock shaper assigns to `c`.
pub fn glyph_id(c: char) -> u16 {
    u16::try_from(c as u32).unwrap_or(u16::MAX)
}

/// Char a mock shaper shaped into `key`.
pub fn glyph_char(key: &GlyphKey) -> char {
    char::from_u32(key.glyph_id as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Text of placed or shaped glyph keys.
pub fn keys_to_string<'a>(keys: impl IntoIterator<Item = &'a GlyphKey>) -> String {
    keys.into_iter().map(glyph_char).collect()
}

/// [`TextShaper`] with fixed per-char advances.
///
/// Every char is one glyph; `\n` splits runs; `' '` and `'\t'` are
/// whitespace.
#[derive(Clone)]
pub struct FixedAdvanceShaper {
    font: FontId,
    size: f32,
    advance: f32,
    overrides: HashMap<char, f32>,
    line_height: f32,
    ascent: f32,
    calls: CallCounter,
}

impl FixedAdvanceShaper {
    /// Every char advances by `advance`; 20px lines with a 15px ascent.
    pub fn new(advance: f32) -> Self {
        Self {
            font: FontId(0),
            size: 16.0,
            advance,
            overrides: HashMap::default(),
            line_height: 20.0,
            ascent: 15.0,
            calls: CallCounter::new(),
        }
    }

    pub fn with_advance(mut self, c: char, advance: f32) -> Self {
        self.overrides.insert(c, advance);
        self
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_ascent(mut self, ascent: f32) -> Self {
        self.ascent = ascent;
        self
    }

    pub fn with_font(mut self, font: FontId, size: f32) -> Self {
        self.font = font;
        self.size = size;
        self
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Counts `shape` calls, shared with clones.
    pub fn counter(&self) -> CallCounter {
        self.calls.clone()
    }

    /// Key of `c` as this shaper produces it.
    pub fn key(&self, c: char) -> GlyphKey {
        GlyphKey::new(self.font, self.size, glyph_id(c))
    }

    fn advance_of(&self, c: char) -> f32 {
        self.overrides.get(&c).copied().unwrap_or(self.advance)
    }
}

impl TextShaper for FixedAdvanceShaper {
    fn shape(&mut self, markup: &str) -> TextResult<ShapedParagraph> {
        self.calls.increment();
        let runs = markup
            .split('\n')
            .map(|line| {
                ShapedRun::new(
                    line.chars()
                        .map(|c| ShapedGlyph {
                            key: self.key(c),
                            advance: self.advance_of(c),
                            whitespace: c == ' ' || c == '\t',
                        })
                        .collect(),
                )
            })
            .collect();
        Ok(ShapedParagraph::new(runs, self.line_height, self.ascent))
    }
}

/// [`GlyphRasterizer`] producing solid bitmaps of a fixed size.
///
/// Whitespace rasterizes to an empty bitmap. Chars marked with
/// [`MockRasterizer::failing`] return [`TextError::RasterizationFailure`].
#[derive(Clone)]
pub struct MockRasterizer {
    width: u32,
    height: u32,
    top: i32,
    sizes: HashMap<char, (u32, u32)>,
    failing: HashSet<char>,
    calls: CallCounter,
}

impl MockRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            top: height as i32,
            sizes: HashMap::default(),
            failing: HashSet::default(),
            calls: CallCounter::new(),
        }
    }

    /// Bitmap size for one char.
    pub fn with_size(mut self, c: char, width: u32, height: u32) -> Self {
        self.sizes.insert(c, (width, height));
        self
    }

    /// Bearing from the baseline to the bitmap's top.
    pub fn with_top(mut self, top: i32) -> Self {
        self.top = top;
        self
    }

    /// Make rasterizing `c` fail.
    pub fn failing(mut self, c: char) -> Self {
        self.failing.insert(c);
        self
    }

    /// Counts `rasterize` calls, shared with clones.
    pub fn counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl GlyphRasterizer for MockRasterizer {
    fn rasterize(&mut self, key: GlyphKey) -> TextResult<GlyphBitmap> {
        self.calls.increment();
        let c = glyph_char(&key);
        if self.failing.contains(&c) {
            return Err(TextError::RasterizationFailure(format!(
                "mock failure for {:?}",
                c
            )));
        }

        let (width, height) = if c.is_whitespace() {
            (0, 0)
        } else {
            self.sizes.get(&c).copied().unwrap_or((self.width, self.height))
        };
        Ok(GlyphBitmap {
            width,
            height,
            left: 0,
            top: self.top,
            content: GlyphContent::Mask,
            data: vec![255; (width * height) as usize],
        })
    }
}
