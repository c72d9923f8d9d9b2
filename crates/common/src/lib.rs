//! Shared types for the debug overlays.
//!
//! # Invariants
//! - Overlays read camera and target matrices; they never mutate them.
//! - Colors are always in `[0, 1]` once constructed.

mod color;
mod error;
mod types;

pub use color::Color;
pub use error::{ConfigError, ensure_finite, ensure_positive, ensure_segments};
pub use types::{Camera, CameraMatrices, NormalSource, Transform};

pub fn crate_info() -> &'static str {
    "debugviz-common v0.1.0"
}
