//! wgpu backend for the debug overlays.
//!
//! [`WgpuContext`] implements [`debugviz_render::RenderContext`] by recording
//! draws and replaying them into a render pass on `flush`. [`OrbitCamera`]
//! supplies view and projection matrices for the desktop viewer.
//!
//! # Invariants
//! - One uniform slot per draw; overlays never observe each other's uniforms.
//! - Pipelines are keyed on shader, topology and draw state, so a state
//!   change between draws always selects a matching pipeline.

mod camera;
mod context;
mod pipeline;

pub use camera::OrbitCamera;
pub use context::{WgpuContext, WgpuContextError};
pub use pipeline::{DEPTH_FORMAT, PipelineKey, UniformBlock, UniformError};
