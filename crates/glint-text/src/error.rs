/// Errors that can occur in the text engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TextError {
    /// Malformed call parameters (empty paragraph list, mismatched lengths, zero width).
    InvalidArgument(String),

    /// The atlas cannot provide space under its configured ceiling.
    ///
    /// `max_glyphs` is set when the glyph-count ceiling was hit with every
    /// cached glyph in use; the requested size is then zero.
    ResourceExhausted {
        requested_width: u32,
        requested_height: u32,
        textures: usize,
        max_textures: Option<usize>,
        max_glyphs: Option<usize>,
    },

    /// A glyph could not be rasterized.
    ///
    /// The atlas recovers from this locally with an empty slot; it only
    /// surfaces from [`GlyphRasterizer`](crate::GlyphRasterizer) implementations.
    RasterizationFailure(String),

    /// A text was used after its render context was destroyed, or with a
    /// context other than the one that built it.
    UseAfterDestroy(String),

    /// Font loading failed.
    FontLoadError(String),

    /// Font file not found.
    FontFileNotFound(std::path::PathBuf),

    /// Invalid font data.
    InvalidFontData(String),

    /// Text shaping failed.
    ShapingError(String),

    /// Generic IO error.
    IoError(String),
}

impl std::fmt::Display for TextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            TextError::ResourceExhausted {
                requested_width,
                requested_height,
                textures,
                max_textures,
                max_glyphs,
            } => match (max_glyphs, max_textures) {
                (Some(max), _) => write!(
                    f,
                    "Glyph atlas exhausted: all {} cached glyphs are in use this frame",
                    max
                ),
                (None, Some(max)) => write!(
                    f,
                    "Glyph atlas exhausted: no room for {}x{} in {} of {} textures",
                    requested_width, requested_height, textures, max
                ),
                (None, None) => write!(
                    f,
                    "Glyph atlas exhausted: {}x{} does not fit an atlas texture",
                    requested_width, requested_height
                ),
            },
            TextError::RasterizationFailure(msg) => write!(f, "Rasterization failed: {}", msg),
            TextError::UseAfterDestroy(msg) => write!(f, "Use after destroy: {}", msg),
            TextError::FontLoadError(msg) => write!(f, "Failed to load font: {}", msg),
            TextError::FontFileNotFound(path) => {
                write!(f, "Font file not found: {}", path.display())
            }
            TextError::InvalidFontData(msg) => write!(f, "Invalid font data: {}", msg),
            TextError::ShapingError(msg) => write!(f, "Text shaping failed: {}", msg),
            TextError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for TextError {}

impl From<std::io::Error> for TextError {
    fn from(err: std::io::Error) -> Self {
        TextError::IoError(err.to_string())
    }
}

/// Result type for text operations.
pub type TextResult<T> = Result<T, TextError>;
