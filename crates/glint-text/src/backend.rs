//! Host texture backend.
//!
//! The host owns GPU storage and draw calls. The engine drives it through
//! three operations: allocate a texture, upload a glyph sub-rectangle, and
//! draw a batch of quads against one texture.

use crate::error::{TextError, TextResult};
use crate::quad::Quad;

/// Capability interface the host implements.
pub trait TextureBackend {
    /// Host handle of one atlas texture, owned by the atlas.
    type Texture;

    /// Create a GPU-uploadable texture. Called once per atlas texture.
    fn allocate(&mut self, width: u32, height: u32) -> TextResult<Self::Texture>;

    /// Upload `buffer` (tightly packed pixels in the atlas format) into the
    /// given sub-rectangle. Called once per rasterized glyph.
    fn update(
        &mut self,
        texture: &mut Self::Texture,
        buffer: &[u8],
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    );

    /// Render `quads` against `texture`. Called once per texture per emit,
    /// never with an empty slice.
    fn draw(&mut self, quads: &[Quad], texture: &Self::Texture);
}

type AllocateFn<T> = Box<dyn FnMut(u32, u32) -> T + Send>;
type UpdateFn<T> = Box<dyn FnMut(&mut T, &[u8], u32, u32, u32, u32) + Send>;
type DrawFn<T> = Box<dyn FnMut(&[Quad], &T) + Send>;

/// [`TextureBackend`] assembled from three closures.
///
/// ```
/// use glint_text::CallbackBackend;
///
/// let backend = CallbackBackend::<u32>::builder()
///     .allocate(|_w, _h| 7)
///     .update(|_tex, _buf, _x, _y, _w, _h| {})
///     .draw(|quads, tex| println!("{} quads on texture {}", quads.len(), tex))
///     .build()
///     .unwrap();
/// # drop(backend);
/// ```
pub struct CallbackBackend<T> {
    allocate: AllocateFn<T>,
    update: UpdateFn<T>,
    draw: DrawFn<T>,
}

impl<T> CallbackBackend<T> {
    pub fn builder() -> CallbackBackendBuilder<T> {
        CallbackBackendBuilder {
            allocate: None,
            update: None,
            draw: None,
        }
    }
}

impl<T> TextureBackend for CallbackBackend<T> {
    type Texture = T;

    fn allocate(&mut self, width: u32, height: u32) -> TextResult<T> {
        Ok((self.allocate)(width, height))
    }

    fn update(&mut self, texture: &mut T, buffer: &[u8], x: u32, y: u32, width: u32, height: u32) {
        (self.update)(texture, buffer, x, y, width, height);
    }

    fn draw(&mut self, quads: &[Quad], texture: &T) {
        (self.draw)(quads, texture);
    }
}

/// Builder for [`CallbackBackend`]; all three callbacks are required.
pub struct CallbackBackendBuilder<T> {
    allocate: Option<AllocateFn<T>>,
    update: Option<UpdateFn<T>>,
    draw: Option<DrawFn<T>>,
}

impl<T> CallbackBackendBuilder<T> {
    pub fn allocate(mut self, f: impl FnMut(u32, u32) -> T + Send + 'static) -> Self {
        self.allocate = Some(Box::new(f));
        self
    }

    pub fn update(
        mut self,
        f: impl FnMut(&mut T, &[u8], u32, u32, u32, u32) + Send + 'static,
    ) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn draw(mut self, f: impl FnMut(&[Quad], &T) + Send + 'static) -> Self {
        self.draw = Some(Box::new(f));
        self
    }

    /// Fails with [`TextError::InvalidArgument`] naming the first missing callback.
    pub fn build(self) -> TextResult<CallbackBackend<T>> {
        let missing = |name: &str| TextError::InvalidArgument(format!("missing {} callback", name));
        Ok(CallbackBackend {
            allocate: self.allocate.ok_or_else(|| missing("allocate"))?,
            update: self.update.ok_or_else(|| missing("update"))?,
            draw: self.draw.ok_or_else(|| missing("draw"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_all_callbacks() {
        let result = CallbackBackend::<()>::builder()
            .allocate(|_, _| ())
            .draw(|_, _| {})
            .build();
        assert_eq!(
            result.err(),
            Some(TextError::InvalidArgument("missing update callback".to_string()))
        );
    }

    #[test]
    fn test_callbacks_are_forwarded() {
        let mut backend = CallbackBackend::<Vec<u8>>::builder()
            .allocate(|w, h| vec![0; (w * h) as usize])
            .update(|tex, buf, x, _y, w, _h| {
                tex[x as usize..(x + w) as usize].copy_from_slice(buf);
            })
            .draw(|_, _| {})
            .build()
            .unwrap();

        let mut tex = backend.allocate(4, 1).unwrap();
        backend.update(&mut tex, &[9, 9], 1, 0, 2, 1);
        assert_eq!(tex, vec![0, 9, 9, 0]);
    }
}
