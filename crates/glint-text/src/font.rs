//! Font registry and glyph identity.
//!
//! Fonts are registered on a [`FontStoreBuilder`] and frozen into a
//! [`FontStore`], which is read-only afterwards and shared behind an `Arc`.
//! Every face gets a dense [`FontId`] so glyph keys stay small and do not
//! depend on the font database's internal handles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cosmic_text::fontdb;
use glint_core::alloc::HashMap;

use crate::error::{TextError, TextResult};

/// Dense identifier of a font face inside a [`FontStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontId(pub u32);

/// Identity of one rasterized glyph: font face, pixel size and glyph index.
///
/// The size is stored as raw `f32` bits so the key hashes structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub font: FontId,
    pub size_bits: u32,
    pub glyph_id: u16,
}

impl GlyphKey {
    pub fn new(font: FontId, size_px: f32, glyph_id: u16) -> Self {
        Self {
            font,
            size_bits: size_px.to_bits(),
            glyph_id,
        }
    }

    /// Pixel size the glyph is rasterized at.
    pub fn size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

/// Collects font sources before freezing them into a [`FontStore`].
pub struct FontStoreBuilder {
    db: fontdb::Database,
    paths: Vec<PathBuf>,
}

impl FontStoreBuilder {
    /// Create a builder with an empty font database.
    pub fn new() -> Self {
        Self {
            db: fontdb::Database::new(),
            paths: Vec::new(),
        }
    }

    /// Also load all system fonts.
    pub fn with_system_fonts(mut self) -> Self {
        self.db.load_system_fonts();
        self
    }

    /// Register a .ttf/.otf/.ttc file.
    ///
    /// Registering the same path twice is a no-op.
    pub fn add_font(&mut self, path: impl AsRef<Path>) -> TextResult<()> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => TextError::FontFileNotFound(path.to_path_buf()),
            _ => TextError::from(err),
        })?;

        if self.paths.contains(&canonical) {
            tracing::trace!("Font {} already registered", canonical.display());
            return Ok(());
        }

        let ids = self
            .db
            .load_font_source(fontdb::Source::File(canonical.clone()));
        if ids.is_empty() {
            return Err(TextError::InvalidFontData(format!(
                "no usable font face in {}",
                canonical.display()
            )));
        }

        tracing::debug!(
            "Registered font {} ({} face(s))",
            canonical.display(),
            ids.len()
        );
        self.paths.push(canonical);
        Ok(())
    }

    /// Register font data already in memory.
    pub fn add_font_data(&mut self, data: Vec<u8>) -> TextResult<()> {
        let ids = self
            .db
            .load_font_source(fontdb::Source::Binary(Arc::new(data)));
        if ids.is_empty() {
            return Err(TextError::InvalidFontData(
                "no usable font face in font data".to_string(),
            ));
        }
        Ok(())
    }

    /// Freeze the registry. Face ids are assigned in database order.
    pub fn build(self) -> FontStore {
        let faces: Vec<fontdb::ID> = self.db.faces().map(|face| face.id).collect();
        let ids = faces
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, FontId(idx as u32)))
            .collect();

        tracing::debug!(
            "Font store frozen with {} face(s) from {} file(s)",
            faces.len(),
            self.paths.len()
        );

        FontStore {
            db: self.db,
            paths: self.paths,
            faces,
            ids,
        }
    }
}

impl Default for FontStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only registry of loaded font faces.
pub struct FontStore {
    db: fontdb::Database,
    paths: Vec<PathBuf>,
    faces: Vec<fontdb::ID>,
    ids: HashMap<fontdb::ID, FontId>,
}

impl FontStore {
    pub fn builder() -> FontStoreBuilder {
        FontStoreBuilder::new()
    }

    /// Store holding only the system fonts.
    pub fn with_system_fonts() -> Self {
        FontStoreBuilder::new().with_system_fonts().build()
    }

    /// Map a font database face to its [`FontId`].
    pub fn font_id(&self, face: fontdb::ID) -> Option<FontId> {
        self.ids.get(&face).copied()
    }

    /// Map a [`FontId`] back to its font database face.
    pub fn face_id(&self, font: FontId) -> Option<fontdb::ID> {
        self.faces.get(font.0 as usize).copied()
    }

    /// Canonical paths of the registered font files, in registration order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Returns true if any face belongs to `family`.
    pub fn has_family(&self, family: &str) -> bool {
        self.db
            .faces()
            .any(|face| face.families.iter().any(|(f, _)| f == family))
    }

    /// Family name of the first registered face, if any.
    pub fn default_family(&self) -> Option<String> {
        let first = self.faces.first()?;
        self.db
            .face(*first)
            .and_then(|face| face.families.first())
            .map(|(family, _)| family.clone())
    }

    /// Create a cosmic-text font system over a copy of the frozen database.
    ///
    /// Face handles are preserved by the copy, so [`FontStore::font_id`]
    /// resolves the faces the returned system shapes with.
    pub fn font_system(&self) -> cosmic_text::FontSystem {
        cosmic_text::FontSystem::new_with_locale_and_db(
            sys_locale::get_locale().unwrap_or_else(|| String::from("en-US")),
            self.db.clone(),
        )
    }
}

impl std::fmt::Debug for FontStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontStore")
            .field("faces", &self.faces.len())
            .field("paths", &self.paths)
            .finish()
    }
}
