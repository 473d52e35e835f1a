//! Print Quads Example
//!
//! Lays out two paragraphs with the system fonts and prints the draw calls a
//! renderer would receive, before and after a re-wrap:
//! - Building a `FontStore` and a cosmic-text backed `RenderContext`
//! - A `CallbackBackend` that logs texture allocations and draws
//! - `update_width` re-flowing without new rasterization
//!
//! ## Usage
//! ```bash
//! RUST_LOG=debug cargo run -p glint-text --example print_quads
//! ```

use std::sync::Arc;

use glint_core::logging;
use glint_core::profiling::{ProfilingBackend, init_profiling, new_frame};
use glint_text::{
    AtlasConfig, CallbackBackend, Color, FontStore, RenderContext, ShapeStyle, TextAlign,
};

fn main() {
    logging::init();
    init_profiling(ProfilingBackend::InProcess);

    let fonts = FontStore::with_system_fonts();
    if fonts.is_empty() {
        tracing::error!("No system fonts found; nothing to lay out");
        return;
    }
    tracing::info!("Loaded {} font face(s)", fonts.len());

    let mut next_texture = 0u32;
    let backend = CallbackBackend::builder()
        .allocate(move |width, height| {
            next_texture += 1;
            println!("allocate texture #{} ({}x{})", next_texture, width, height);
            next_texture
        })
        .update(|texture, _pixels, x, y, width, height| {
            println!("  upload {}x{} at ({}, {}) into #{}", width, height, x, y, texture);
        })
        .draw(|quads, texture| {
            println!("draw {} quad(s) from texture #{}", quads.len(), texture);
            for quad in quads.iter().take(3) {
                println!(
                    "  src ({}, {}, {}x{}) -> dst ({}, {})",
                    quad.src_x, quad.src_y, quad.src_w, quad.src_h, quad.dst_x, quad.dst_y
                );
            }
        })
        .build()
        .expect("Failed to create backend");

    let context = RenderContext::with_fonts(
        backend,
        Arc::new(fonts),
        ShapeStyle::new().size(20.0),
        AtlasConfig::small(),
    )
    .expect("Failed to create render context");

    let mut text = context
        .build_text(
            &[
                "Glint turns paragraphs into textured quads.",
                "Centered second paragraph",
            ],
            &[TextAlign::Left, TextAlign::Center],
            480,
        )
        .expect("Failed to build text");
    text.set_origin(16, 16);
    text.set_color(Color::rgb(0.9, 0.9, 0.2));

    println!("--- width 480: {} line(s), {}px tall", text.line_count(), text.height());
    context.draw_text(&text).expect("Failed to draw text");
    new_frame();

    text.update_width(160).expect("Failed to re-wrap");
    println!("--- width 160: {} line(s), {}px tall", text.line_count(), text.height());
    context.draw_text(&text).expect("Failed to draw text");
    new_frame();

    let stats = context.atlas_stats();
    println!(
        "atlas: {} glyph(s) in {} texture(s), {} hit(s), {} miss(es)",
        stats.glyphs, stats.textures, stats.hits, stats.misses
    );
}
