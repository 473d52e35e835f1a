//! Font registration and the cosmic-text collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use glint_test_utils::RecordingBackend;
use glint_text::{AtlasConfig, FontStore, RenderContext, ShapeStyle, TextAlign, TextError, fontdb};

/// Path of some installed font file, if the machine has any.
fn system_font_file() -> Option<PathBuf> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    db.faces().find_map(|face| match &face.source {
        fontdb::Source::File(path) => Some(path.clone()),
        _ => None,
    })
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = FontStore::builder();
    let err = builder.add_font(dir.path().join("missing.ttf")).unwrap_err();
    assert!(matches!(err, TextError::FontFileNotFound(path) if path.ends_with("missing.ttf")));
}

#[test]
fn test_garbage_file_is_invalid_font_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ttf");
    std::fs::write(&path, b"definitely not a font").unwrap();

    let mut builder = FontStore::builder();
    assert!(matches!(
        builder.add_font(&path),
        Err(TextError::InvalidFontData(_))
    ));
    assert!(builder.build().is_empty());
}

#[test]
fn test_add_font_is_idempotent_per_path() {
    let Some(source) = system_font_file() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let file_name = source.file_name().map(PathBuf::from).unwrap_or_else(|| "font.ttf".into());
    let path = dir.path().join(file_name);
    std::fs::copy(&source, &path).unwrap();

    let mut builder = FontStore::builder();
    builder.add_font(&path).unwrap();
    // Same file through a different spelling of the path
    builder.add_font(dir.path().join(".").join(path.file_name().unwrap())).unwrap();
    let store = builder.build();

    assert_eq!(store.paths().len(), 1);
    assert!(!store.is_empty());
    assert!(store.default_family().is_some());
}

#[test]
fn test_cosmic_context_end_to_end() {
    let store = FontStore::with_system_fonts();
    if store.is_empty() {
        return;
    }
    let backend = RecordingBackend::new();
    let context = RenderContext::with_fonts(
        backend.clone(),
        Arc::new(store),
        ShapeStyle::new().size(18.0),
        AtlasConfig::medium(),
    )
    .unwrap();

    let mut text = context
        .build_text(&["Hello world", "Second paragraph"], &[TextAlign::Left, TextAlign::Center], 2000)
        .unwrap();
    assert_eq!(text.line_count(), 2);
    assert!(text.height() > 0);

    context.draw_text(&text).unwrap();
    let updates = backend.count_updates();
    assert!(updates > 0);
    assert!(backend.count_draws() >= 1);

    // Narrow enough to wrap every word
    text.update_width(60).unwrap();
    assert!(text.line_count() > 2);
    context.draw_text(&text).unwrap();
    assert_eq!(backend.count_updates(), updates);
}
