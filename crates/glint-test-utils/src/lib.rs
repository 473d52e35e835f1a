//! Test utilities for Glint crates.
//!
//! Deterministic stand-ins for the engine's collaborators so layout, atlas
//! and emission can be tested without fonts or a GPU.
//!
//! # Overview
//!
//! - [`CallCounter`] - Shared counter for calls made through a boxed trait object
//! - `RecordingBackend` - [`TextureBackend`](glint_text::TextureBackend) that records every call (requires `mock` feature)
//! - `FixedAdvanceShaper` - one glyph per char with configurable advances (requires `mock` feature)
//! - `MockRasterizer` - fixed-size bitmaps with configurable failures (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use glint_test_utils::{FixedAdvanceShaper, MockRasterizer, RecordingBackend};
//! use glint_text::{AtlasConfig, RenderContext, TextAlign};
//!
//! let backend = RecordingBackend::new();
//! let context = RenderContext::new(
//!     backend.clone(),
//!     Box::new(FixedAdvanceShaper::new(9.0)),
//!     Box::new(MockRasterizer::new(8, 12)),
//!     AtlasConfig::small(),
//! )
//! .unwrap();
//!
//! let text = context.build_text(&["Hi"], &[TextAlign::Left], 100).unwrap();
//! context.draw_text(&text).unwrap();
//!
//! assert_eq!(backend.count_allocates(), 1);
//! assert_eq!(backend.count_draws(), 1);
//! # }
//! ```
//!
//! # Design
//!
//! Mocks are moved into the engine as boxed trait objects, so everything a
//! test wants to observe afterwards lives behind an `Arc` and is shared with
//! a cheap clone or a [`CallCounter`].

#[cfg(feature = "mock")]
pub mod mock_backend;
#[cfg(feature = "mock")]
pub mod mock_text;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "mock")]
pub use mock_backend::*;
#[cfg(feature = "mock")]
pub use mock_text::*;

/// Counts calls across clones.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_shared() {
        let counter = CallCounter::new();
        let clone = counter.clone();
        clone.increment();
        clone.increment();
        assert_eq!(counter.get(), 2);
        counter.reset();
        assert_eq!(clone.get(), 0);
    }
}
