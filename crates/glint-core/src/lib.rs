//! Glint Core
//!
//! Shared utilities for the Glint text engine: hash collections and the
//! slot arena, logging setup, and profiling scopes.

pub mod alloc;
pub mod logging;
pub mod profiling;
