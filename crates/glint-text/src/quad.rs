//! Draw primitives handed to the host.

/// RGBA tint in linear 0..1 floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// A textured, tinted rectangle.
///
/// `src_*` address the atlas texture in pixels, `dst_*` the screen. A quad
/// with zero `src_w`/`src_h` stands for a glyph that could not be rasterized
/// and should be skipped by the renderer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Quad {
    pub src_x: i32,
    pub src_y: i32,
    pub src_w: i32,
    pub src_h: i32,
    pub dst_x: i32,
    pub dst_y: i32,
    pub dst_w: i32,
    pub dst_h: i32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Quad {
    pub fn is_empty(&self) -> bool {
        self.src_w == 0 || self.src_h == 0
    }

    /// Tint of this quad.
    pub fn color(&self) -> Color {
        Color::rgba(self.r, self.g, self.b, self.a)
    }

    /// Reinterpret a quad slice as bytes, e.g. for an instance buffer upload.
    pub fn as_bytes(quads: &[Quad]) -> &[u8] {
        bytemuck::cast_slice(quads)
    }
}
