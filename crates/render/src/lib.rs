//! Debug overlays drawn through a renderer-agnostic context.
//!
//! Overlays create their programs and buffers in a [`RenderContext`] once,
//! at construction. Each frame the host wraps the context in a [`Frame`]
//! and hands it to every overlay in turn; an overlay only refreshes its
//! transform uniforms and issues draws.
//!
//! # Invariants
//! - Overlays never own the context or the objects they annotate.
//! - A hidden overlay issues no context calls at all.
//! - Every draw goes through a program the overlay bound itself in the same
//!   frame; nothing relies on state left behind by another overlay.

mod config;
mod context;
mod error;
mod frame;
mod grid;
mod normal;
mod overlay;
mod primitive;
pub mod recording;
pub mod shaders;

pub use config::{FilledGridConfig, NormalConfig, SceneConfig, WireGridConfig};
pub use context::{
    AttributeBinding, BlendMode, BufferId, Capability, DrawState, ProgramId, RenderContext,
    Topology, UniformValue, VertexArrayId,
};
pub use error::{RenderError, RenderResult};
pub use frame::{BindState, Frame};
pub use grid::{FilledGridOverlay, WireGridOverlay};
pub use normal::{NormalOverlay, TargetedNormals};
pub use overlay::{Overlay, POSITION_RANGE, render_all};
pub use primitive::{OverlayPrimitive, PrimitiveDesc, VertexAttribute};
pub use recording::RecordingContext;
pub use shaders::Shader;

pub fn crate_info() -> &'static str {
    "debugviz-render v0.1.0"
}
