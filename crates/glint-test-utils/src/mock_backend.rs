//! Recording texture backend for testing.

use std::sync::Arc;

use glint_text::{Quad, TextResult, TextureBackend};
use parking_lot::Mutex;

/// Texture handle handed out by [`RecordingBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockTexture {
    pub id: usize,
    pub width: u32,
    pub height: u32,
}

/// Records a backend call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Allocate {
        texture: usize,
        width: u32,
        height: u32,
    },
    Update {
        texture: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bytes: usize,
    },
    Draw {
        texture: usize,
        quads: Vec<Quad>,
    },
}

#[derive(Default)]
struct Recorder {
    calls: Vec<BackendCall>,
    textures: usize,
    fail_allocations: bool,
}

/// [`TextureBackend`] that records every call.
///
/// Clones share the same log, so keep one clone in the test and move the
/// other into the engine.
///
/// ```rust
/// use glint_test_utils::RecordingBackend;
/// use glint_text::TextureBackend;
///
/// let backend = RecordingBackend::new();
/// let mut engine_side = backend.clone();
/// let mut texture = engine_side.allocate(64, 64).unwrap();
/// engine_side.update(&mut texture, &[0; 4], 0, 0, 2, 2);
///
/// assert_eq!(backend.count_allocates(), 1);
/// assert_eq!(backend.count_updates(), 1);
/// ```
#[derive(Clone, Default)]
pub struct RecordingBackend {
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `allocate` fail.
    pub fn fail_allocations(&self, fail: bool) {
        self.recorder.lock().fail_allocations = fail;
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<BackendCall> {
        self.recorder.lock().calls.clone()
    }

    pub fn count_allocates(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Allocate { .. }))
    }

    pub fn count_updates(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Update { .. }))
    }

    pub fn count_draws(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Draw { .. }))
    }

    /// Draw calls as (texture id, quads), in call order.
    pub fn draws(&self) -> Vec<(usize, Vec<Quad>)> {
        self.recorder
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw { texture, quads } => Some((*texture, quads.clone())),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded calls (useful between test steps).
    pub fn clear_calls(&self) {
        self.recorder.lock().calls.clear();
    }

    pub fn call_count(&self) -> usize {
        self.recorder.lock().calls.len()
    }

    fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.recorder
            .lock()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }
}

impl TextureBackend for RecordingBackend {
    type Texture = MockTexture;

    fn allocate(&mut self, width: u32, height: u32) -> TextResult<MockTexture> {
        let mut recorder = self.recorder.lock();
        if recorder.fail_allocations {
            return Err(glint_text::TextError::ResourceExhausted {
                requested_width: width,
                requested_height: height,
                textures: recorder.textures,
                max_textures: Some(recorder.textures),
                max_glyphs: None,
            });
        }
        let id = recorder.textures;
        recorder.textures += 1;
        recorder.calls.push(BackendCall::Allocate {
            texture: id,
            width,
            height,
        });
        Ok(MockTexture { id, width, height })
    }

    fn update(
        &mut self,
        texture: &mut MockTexture,
        buffer: &[u8],
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) {
        assert!(
            x + width <= texture.width && y + height <= texture.height,
            "update {}x{} at {},{} outside {}x{} texture",
            width,
            height,
            x,
            y,
            texture.width,
            texture.height
        );
        self.recorder.lock().calls.push(BackendCall::Update {
            texture: texture.id,
            x,
            y,
            width,
            height,
            bytes: buffer.len(),
        });
    }

    fn draw(&mut self, quads: &[Quad], texture: &MockTexture) {
        self.recorder.lock().calls.push(BackendCall::Draw {
            texture: texture.id,
            quads: quads.to_vec(),
        });
    }
}
