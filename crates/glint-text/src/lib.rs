//! Glint Text - text layout and glyph atlas engine
//!
//! Turns multi-paragraph text into batches of textured, tinted quads that a
//! host renderer draws. The host owns GPU storage and supplies three
//! primitives through [`TextureBackend`]: allocate a texture, upload a glyph
//! sub-rectangle, and draw quads against a texture.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use glint_text::{
//!     AtlasConfig, CallbackBackend, Color, FontStore, RenderContext, ShapeStyle, TextAlign,
//! };
//!
//! # fn main() -> glint_text::TextResult<()> {
//! let mut builder = FontStore::builder();
//! builder.add_font("assets/fonts/NotoSans-Regular.ttf")?;
//! let fonts = Arc::new(builder.build());
//!
//! let backend = CallbackBackend::<u32>::builder()
//!     .allocate(|_w, _h| 0)
//!     .update(|_tex, _pixels, _x, _y, _w, _h| {})
//!     .draw(|quads, _tex| println!("{} quads", quads.len()))
//!     .build()?;
//!
//! let context = RenderContext::with_fonts(backend, fonts, ShapeStyle::new(), AtlasConfig::medium())?;
//! let mut text = context.build_text(&["Hello world"], &[TextAlign::Left], 320)?;
//! text.set_color(Color::rgb(1.0, 0.8, 0.2));
//! context.draw_text(&text)?;
//!
//! text.update_width(120)?;
//! println!("height: {}px", text.height());
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! - [`FontStore`]: fonts registered once, read-only afterwards
//! - [`TextShaper`]: markup to glyph runs ([`CosmicShaper`] by default)
//! - [`LayoutEngine`]: line breaking and alignment, shaping cached per markup
//! - [`BuiltText`]: a persisted layout that re-wraps on width changes
//! - [`GlyphAtlas`]: glyph bitmaps shelf-packed into atlas textures
//! - [`emit`]: quads grouped into one draw call per texture

pub mod atlas;
pub mod backend;
pub mod cache;
pub mod context;
pub mod emitter;
pub mod error;
pub mod font;
pub mod layout;
pub mod quad;
pub mod raster;
pub mod shaping;
pub mod text;

pub use atlas::{
    AtlasConfig, AtlasSlot, AtlasStats, EvictionPolicy, GlyphAtlas, Rect, TextureId,
};
pub use backend::{CallbackBackend, CallbackBackendBuilder, TextureBackend};
pub use cache::{DEFAULT_SHAPE_CACHE_CAPACITY, TextShapeCache};
pub use context::RenderContext;
pub use emitter::{EmitStats, emit};
pub use error::{TextError, TextResult};
pub use font::{FontId, FontStore, FontStoreBuilder, GlyphKey};
pub use layout::{LayoutEngine, LineBox, Paragraph, PlacedGlyph, TextAlign};
pub use quad::{Color, Quad};
pub use raster::{CosmicRasterizer, GlyphBitmap, GlyphContent, GlyphRasterizer, PixelFormat};
pub use shaping::{CosmicShaper, ShapeStyle, ShapedGlyph, ShapedParagraph, ShapedRun, TextShaper};
pub use text::{BuiltText, TextState};

// Re-export the font database types hosts need to map faces
pub use cosmic_text::fontdb;
