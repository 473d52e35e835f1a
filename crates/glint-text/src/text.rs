//! Built text: a persisted, re-wrappable layout.

use std::sync::Weak;

use crate::error::{TextError, TextResult};
use crate::layout::{LayoutEngine, Paragraph, PlacedGlyph, total_height};
use crate::quad::Color;

/// Lifecycle of a [`BuiltText`].
///
/// `Resizing` only exists inside [`BuiltText::update_width`]; callers always
/// observe `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextState {
    Built,
    Resizing,
}

/// Layout of a multi-paragraph document, ready to draw.
///
/// Created by [`RenderContext::build_text`](crate::RenderContext::build_text)
/// and tied to that context. Dropping or [`destroy`](BuiltText::destroy)ing
/// it never touches the glyph cache.
#[derive(Debug)]
pub struct BuiltText {
    paragraphs: Vec<Paragraph>,
    width: u32,
    height: f32,
    color: Color,
    origin: (i32, i32),
    context: u64,
    alive: Weak<()>,
    state: TextState,
}

impl BuiltText {
    pub(crate) fn new(paragraphs: Vec<Paragraph>, width: u32, context: u64, alive: Weak<()>) -> Self {
        let height = total_height(&paragraphs);
        Self {
            paragraphs,
            width,
            height,
            color: Color::WHITE,
            origin: (0, 0),
            context,
            alive,
            state: TextState::Built,
        }
    }

    /// Re-wrap at `width`.
    ///
    /// Same width is a no-op. Shaping and rasterization are reused; only line
    /// breaking and positions are recomputed. The previous layout is replaced
    /// once the new one is complete.
    pub fn update_width(&mut self, width: u32) -> TextResult<()> {
        if width == 0 {
            return Err(TextError::InvalidArgument(
                "width must be positive".to_string(),
            ));
        }
        self.check_alive()?;
        if width == self.width {
            return Ok(());
        }

        self.state = TextState::Resizing;
        let paragraphs = LayoutEngine::rewrap(&self.paragraphs, width as f32);
        let height = total_height(&paragraphs);

        tracing::trace!(
            "Re-wrapped text from {}px to {}px ({} -> {} lines)",
            self.width,
            width,
            self.line_count(),
            paragraphs.iter().map(|p| p.lines().len()).sum::<usize>()
        );

        self.paragraphs = paragraphs;
        self.height = height;
        self.width = width;
        self.state = TextState::Built;
        Ok(())
    }

    /// Total height in whole pixels.
    pub fn height(&self) -> u32 {
        self.height.ceil() as u32
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn state(&self) -> TextState {
        self.state
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Screen position of the text's top-left corner.
    pub fn set_origin(&mut self, x: i32, y: i32) {
        self.origin = (x, y);
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// All placed glyphs in paragraph, line, glyph order.
    pub fn glyphs(&self) -> impl Iterator<Item = &PlacedGlyph> {
        self.paragraphs.iter().flat_map(|p| p.glyphs().iter())
    }

    pub fn line_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.lines().len()).sum()
    }

    /// Release the layout. The glyph cache keeps its entries.
    pub fn destroy(self) {
        tracing::trace!("Destroyed text with {} paragraph(s)", self.paragraphs.len());
    }

    pub(crate) fn context_id(&self) -> u64 {
        self.context
    }

    pub(crate) fn check_alive(&self) -> TextResult<()> {
        if self.alive.strong_count() == 0 {
            return Err(TextError::UseAfterDestroy(
                "text used after its render context was destroyed".to_string(),
            ));
        }
        Ok(())
    }
}
