//! Glyph rasterization.

use std::sync::Arc;

use cosmic_text::{CacheKey, CacheKeyFlags, SwashCache, SwashContent};
use glint_core::profiling::profile_function;
use parking_lot::Mutex;

use crate::error::{TextError, TextResult};
use crate::font::{FontStore, GlyphKey};

/// Pixel layout of atlas textures and of the buffers passed to `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// One coverage byte per pixel.
    #[default]
    Alpha8,
    /// Four bytes per pixel, straight alpha.
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Alpha8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Kind of data a rasterizer produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphContent {
    /// One coverage byte per pixel
    Mask,
    /// RGBA color glyph (emoji)
    Color,
    /// RGB subpixel coverage
    SubpixelMask,
}

impl GlyphContent {
    fn channels(self) -> usize {
        match self {
            GlyphContent::Mask => 1,
            GlyphContent::Color => 4,
            GlyphContent::SubpixelMask => 3,
        }
    }
}

/// A rasterized glyph image.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    /// Horizontal offset from the pen position to the left edge of the image
    pub left: i32,
    /// Vertical offset from the baseline up to the top edge of the image
    pub top: i32,
    pub content: GlyphContent,
    pub data: Vec<u8>,
}

impl GlyphBitmap {
    /// An image of zero size, e.g. for whitespace.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Convert to tightly packed pixels of `format`.
    ///
    /// Missing source bytes read as zero so a short buffer never panics.
    pub fn to_format(&self, format: PixelFormat) -> Vec<u8> {
        let pixels = self.width as usize * self.height as usize;
        let channels = self.content.channels();
        let byte = |idx: usize| self.data.get(idx).copied().unwrap_or(0);

        let mut out = Vec::with_capacity(pixels * format.bytes_per_pixel());
        for px in 0..pixels {
            let base = px * channels;
            match (self.content, format) {
                (GlyphContent::Mask, PixelFormat::Alpha8) => out.push(byte(base)),
                (GlyphContent::Mask, PixelFormat::Rgba8) => {
                    out.extend_from_slice(&[255, 255, 255, byte(base)])
                }
                (GlyphContent::Color, PixelFormat::Alpha8) => out.push(byte(base + 3)),
                (GlyphContent::Color, PixelFormat::Rgba8) => out.extend_from_slice(&[
                    byte(base),
                    byte(base + 1),
                    byte(base + 2),
                    byte(base + 3),
                ]),
                (GlyphContent::SubpixelMask, format) => {
                    let sum = byte(base) as u32 + byte(base + 1) as u32 + byte(base + 2) as u32;
                    let coverage = (sum / 3) as u8;
                    match format {
                        PixelFormat::Alpha8 => out.push(coverage),
                        PixelFormat::Rgba8 => out.extend_from_slice(&[255, 255, 255, coverage]),
                    }
                }
            }
        }
        out
    }
}

/// Produces glyph bitmaps on atlas misses.
///
/// An `Err` is not fatal: the atlas records an empty slot for the key and
/// the glyph renders as a zero-area quad.
pub trait GlyphRasterizer: Send {
    fn rasterize(&mut self, key: GlyphKey) -> TextResult<GlyphBitmap>;
}

/// [`GlyphRasterizer`] backed by cosmic-text's swash integration.
pub struct CosmicRasterizer {
    font_system: Arc<Mutex<cosmic_text::FontSystem>>,
    store: Arc<FontStore>,
    swash_cache: SwashCache,
}

impl CosmicRasterizer {
    pub fn new(font_system: Arc<Mutex<cosmic_text::FontSystem>>, store: Arc<FontStore>) -> Self {
        Self {
            font_system,
            store,
            swash_cache: SwashCache::new(),
        }
    }
}

impl GlyphRasterizer for CosmicRasterizer {
    fn rasterize(&mut self, key: GlyphKey) -> TextResult<GlyphBitmap> {
        profile_function!();
        let face = self.store.face_id(key.font).ok_or_else(|| {
            TextError::RasterizationFailure(format!("unknown font {:?}", key.font))
        })?;
        let (cache_key, _, _) = CacheKey::new(
            face,
            key.glyph_id,
            key.size(),
            (0.0, 0.0),
            CacheKeyFlags::empty(),
        );

        // The atlas caches results itself, so swash's own cache is bypassed.
        let mut font_system = self.font_system.lock();
        let image = self
            .swash_cache
            .get_image_uncached(&mut font_system, cache_key)
            .ok_or_else(|| {
                TextError::RasterizationFailure(format!(
                    "no image for glyph {} of {:?}",
                    key.glyph_id, key.font
                ))
            })?;

        let content = match image.content {
            SwashContent::Mask => GlyphContent::Mask,
            SwashContent::Color => GlyphContent::Color,
            SwashContent::SubpixelMask => GlyphContent::SubpixelMask,
        };

        Ok(GlyphBitmap {
            width: image.placement.width,
            height: image.placement.height,
            left: image.placement.left,
            top: image.placement.top,
            content,
            data: image.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(content: GlyphContent, data: Vec<u8>) -> GlyphBitmap {
        GlyphBitmap {
            width: 1,
            height: 1,
            left: 0,
            top: 0,
            content,
            data,
        }
    }

    #[test]
    fn test_mask_to_rgba() {
        let bmp = bitmap(GlyphContent::Mask, vec![128]);
        assert_eq!(bmp.to_format(PixelFormat::Rgba8), vec![255, 255, 255, 128]);
        assert_eq!(bmp.to_format(PixelFormat::Alpha8), vec![128]);
    }

    #[test]
    fn test_color_to_alpha_uses_alpha_channel() {
        let bmp = bitmap(GlyphContent::Color, vec![10, 20, 30, 40]);
        assert_eq!(bmp.to_format(PixelFormat::Alpha8), vec![40]);
    }

    #[test]
    fn test_subpixel_averages_channels() {
        let bmp = bitmap(GlyphContent::SubpixelMask, vec![30, 60, 90]);
        assert_eq!(bmp.to_format(PixelFormat::Alpha8), vec![60]);
    }

    #[test]
    fn test_short_buffer_pads_with_zero() {
        let mut bmp = bitmap(GlyphContent::Mask, vec![]);
        bmp.width = 2;
        assert_eq!(bmp.to_format(PixelFormat::Alpha8), vec![0, 0]);
    }
}
