//! Procedural geometry for the debug overlays.
//!
//! Every builder is a pure function of its arguments: it allocates fresh
//! flat buffers (`f32` stride 3 positions, `u16` indices) and never keeps
//! state between calls.
//!
//! # Invariants
//! - Every index is below the vertex count of its buffer.
//! - Inputs that would overflow 16-bit indices are rejected up front.

mod axis;
mod grid;
mod normals;
mod plane;
mod shapes;

pub use axis::{AXIS_DIRECTIONS, build_axis_unit, corner_anchors};
pub use grid::{
    GRID_LINE_Z, MAJOR_LINE_EVERY, MAJOR_LINE_SCALE, ThickLineGrid, build_thick_line_grid,
    line_scale,
};
pub use normals::{NormalSegments, build_normal_segments};
pub use plane::{PlaneMesh, build_plane, wireframe_indices};
pub use shapes::Mesh;

use debugviz_common::ConfigError;

/// Largest vertex count addressable by a `u16` index buffer.
pub const MAX_INDEXED_VERTICES: usize = u16::MAX as usize + 1;

pub(crate) fn check_index_range(vertices: usize) -> Result<(), ConfigError> {
    if vertices > MAX_INDEXED_VERTICES {
        Err(ConfigError::IndexOverflow { vertices })
    } else {
        Ok(())
    }
}

pub(crate) fn flat_len(vertices: usize) -> usize {
    vertices * 3
}

pub fn crate_info() -> &'static str {
    "debugviz-geometry v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("geometry"));
    }

    #[test]
    fn index_range_boundary() {
        assert!(check_index_range(MAX_INDEXED_VERTICES).is_ok());
        assert!(check_index_range(MAX_INDEXED_VERTICES + 1).is_err());
    }
}
