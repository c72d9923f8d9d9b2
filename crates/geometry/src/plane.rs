use crate::{check_index_range, flat_len};
use debugviz_common::{ConfigError, ensure_positive, ensure_segments};

/// Segmented plane in the XY plane (z = 0), centered on the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneMesh {
    /// Stride-3 positions, row-major from `(-w/2, -h/2)`.
    pub vertices: Vec<f32>,
    /// Triangle list, two triangles per cell.
    pub indices: Vec<u16>,
    /// Line list covering the three edges of every triangle.
    pub wire_indices: Vec<u16>,
}

impl PlaneMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Build a `width × height` plane split into `width_segments × height_segments` cells.
pub fn build_plane(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> Result<PlaneMesh, ConfigError> {
    ensure_positive("width", width)?;
    ensure_positive("height", height)?;
    ensure_segments("width_segments", width_segments)?;
    ensure_segments("height_segments", height_segments)?;

    let columns = width_segments as usize + 1;
    let rows = height_segments as usize + 1;
    check_index_range(columns * rows)?;

    let mut vertices = Vec::with_capacity(flat_len(columns * rows));
    for yy in 0..rows {
        let y = height * yy as f32 / height_segments as f32 - height / 2.0;
        for xx in 0..columns {
            let x = width * xx as f32 / width_segments as f32 - width / 2.0;
            vertices.extend_from_slice(&[x, y, 0.0]);
        }
    }

    let cells = width_segments as usize * height_segments as usize;
    let mut indices = Vec::with_capacity(cells * 6);
    for yy in 0..height_segments as usize {
        for xx in 0..width_segments as usize {
            let a = (yy * columns + xx) as u16;
            let b = a + 1;
            let c = a + columns as u16;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, c, c, b, d]);
        }
    }

    let wire_indices = wireframe_indices(&indices);

    Ok(PlaneMesh {
        vertices,
        indices,
        wire_indices,
    })
}

/// Expand a triangle list into a line list of its edges.
pub fn wireframe_indices(triangles: &[u16]) -> Vec<u16> {
    let mut lines = Vec::with_capacity(triangles.len() * 2);
    for tri in triangles.chunks_exact(3) {
        lines.extend_from_slice(&[tri[0], tri[1], tri[1], tri[2], tri[2], tri[0]]);
    }
    lines
}
