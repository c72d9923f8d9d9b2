use crate::{check_index_range, flat_len};
use debugviz_common::{ConfigError, ensure_positive, ensure_segments};

/// Every n-th line (counted from the lower edge) is a major line.
pub const MAJOR_LINE_EVERY: u32 = 5;
/// Stroke multiplier applied to major lines.
pub const MAJOR_LINE_SCALE: f32 = 5.0;
/// Depth offset of the line quads; keeps them in front of a coincident fill plane.
pub const GRID_LINE_Z: f32 = -0.1;

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Thickened line mesh for a grid, as flat buffers.
///
/// `vertices` has stride 3. Quads are laid out vertical lines first
/// (`width_segments + 1` of them, left to right), then horizontal lines
/// (`height_segments + 1`, bottom to top). Each quad's vertices are ordered
/// start-left, start-right, end-left, end-right relative to the line
/// direction so the fixed `(0,1,2),(2,1,3)` winding covers the whole quad.
#[derive(Debug, Clone, PartialEq)]
pub struct ThickLineGrid {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl ThickLineGrid {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn quad_count(&self) -> usize {
        self.vertex_count() / 4
    }

    /// Half the stroke width of quad `quad`, measured across the line.
    /// `None` past the last quad.
    pub fn quad_half_width(&self, quad: usize) -> Option<f32> {
        let v = self.vertices.get(quad * 12..quad * 12 + 12)?;
        let dx = (v[3] - v[0]).abs();
        let dy = (v[4] - v[1]).abs();
        Some(dx.max(dy) / 2.0)
    }
}

/// Stroke multiplier for the line at `index` within its direction.
pub fn line_scale(index: u32) -> f32 {
    if index % MAJOR_LINE_EVERY == 0 {
        MAJOR_LINE_SCALE
    } else {
        1.0
    }
}

/// Build the thickened-line grid for a `width × height` plane in the XY
/// plane, centered on the origin.
///
/// Produces `4 * (ws + 1 + hs + 1)` vertices and `6 * (ws + hs + 2)`
/// indices. Minor lines are `stroke_width` wide, major lines
/// `MAJOR_LINE_SCALE` times that.
pub fn build_thick_line_grid(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
    stroke_width: f32,
) -> Result<ThickLineGrid, ConfigError> {
    ensure_positive("width", width)?;
    ensure_positive("height", height)?;
    ensure_positive("stroke_width", stroke_width)?;
    ensure_segments("width_segments", width_segments)?;
    ensure_segments("height_segments", height_segments)?;

    let line_count = width_segments as usize + 1 + height_segments as usize + 1;
    check_index_range(line_count * 4)?;

    let half_width = width / 2.0;
    let half_height = height / 2.0;
    let width_unit = width / width_segments as f32;
    let height_unit = height / height_segments as f32;

    let mut vertices = Vec::with_capacity(flat_len(line_count * 4));

    for ii in 0..=width_segments {
        let x = width_unit * ii as f32 - half_width;
        let offset = stroke_width / 2.0 * line_scale(ii);
        #[rustfmt::skip]
        vertices.extend_from_slice(&[
            x - offset, -half_height, GRID_LINE_Z,
            x + offset, -half_height, GRID_LINE_Z,
            x - offset,  half_height, GRID_LINE_Z,
            x + offset,  half_height, GRID_LINE_Z,
        ]);
    }

    for ii in 0..=height_segments {
        let y = height_unit * ii as f32 - half_height;
        let offset = stroke_width / 2.0 * line_scale(ii);
        #[rustfmt::skip]
        vertices.extend_from_slice(&[
            -half_width, y + offset, GRID_LINE_Z,
            -half_width, y - offset, GRID_LINE_Z,
             half_width, y + offset, GRID_LINE_Z,
             half_width, y - offset, GRID_LINE_Z,
        ]);
    }

    let mut indices = Vec::with_capacity(line_count * 6);
    for quad in 0..line_count {
        let base = (quad * 4) as u16;
        indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }

    tracing::trace!(
        width_segments,
        height_segments,
        vertices = vertices.len() / 3,
        indices = indices.len(),
        "built thick line grid"
    );

    Ok(ThickLineGrid { vertices, indices })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_segment_formula() {
        for (w, h) in [(1, 1), (2, 3), (7, 1), (50, 50)] {
            let grid = build_thick_line_grid(10.0, 20.0, w, h, 0.4).unwrap();
            assert_eq!(grid.vertex_count(), 4 * (w as usize + 1 + h as usize + 1));
            assert_eq!(grid.index_count(), 6 * (w as usize + h as usize + 2));
        }
    }

    #[test]
    fn indices_stay_in_range() {
        let grid = build_thick_line_grid(100.0, 100.0, 13, 4, 1.0).unwrap();
        let rows = grid.vertex_count() as u16;
        assert!(grid.indices.iter().all(|&i| i < rows));
        // last quad is indexed too
        assert_eq!(*grid.indices.iter().max().unwrap(), rows - 1);
    }

    #[test]
    fn thousand_unit_grid_at_fifty_segments() {
        let grid = build_thick_line_grid(1000.0, 1000.0, 50, 50, 0.4).unwrap();
        assert_eq!(grid.vertices.len() / 3, 408);
        assert_eq!(grid.indices.len(), 612);
    }

    #[test]
    fn major_lines_are_five_times_wider() {
        let grid = build_thick_line_grid(100.0, 100.0, 10, 10, 0.4).unwrap();
        let minor = grid.quad_half_width(1).unwrap();
        assert!((minor - 0.2).abs() < 1e-6);
        for quad in 0..11 {
            let expected = if quad % 5 == 0 { minor * 5.0 } else { minor };
            assert!((grid.quad_half_width(quad).unwrap() - expected).abs() < 1e-5);
        }
        // horizontal lines restart their count
        let first_horizontal = 11;
        assert!((grid.quad_half_width(first_horizontal).unwrap() - minor * 5.0).abs() < 1e-5);
        assert!((grid.quad_half_width(first_horizontal + 1).unwrap() - minor).abs() < 1e-5);
        assert_eq!(grid.quad_half_width(grid.quad_count()), None);
    }

    #[test]
    fn quads_center_on_grid_lines() {
        let grid = build_thick_line_grid(10.0, 4.0, 2, 2, 0.2).unwrap();
        // vertical line 1 sits at x = 0
        let v = &grid.vertices[12..24];
        assert!(((v[0] + v[3]) / 2.0).abs() < 1e-6);
        assert_eq!(v[1], -2.0);
        assert_eq!(v[7], 2.0);
        // horizontal line 2 sits at y = 2
        let h = &grid.vertices[(3 + 2) * 12..(3 + 2) * 12 + 12];
        assert!(((h[1] + h[4]) / 2.0 - 2.0).abs() < 1e-6);
        assert_eq!(h[0], -5.0);
        assert_eq!(h[6], 5.0);
    }

    #[test]
    fn all_vertices_share_the_depth_offset() {
        let grid = build_thick_line_grid(10.0, 10.0, 3, 3, 0.4).unwrap();
        assert!(grid.vertices.chunks(3).all(|v| v[2] == GRID_LINE_Z));
    }

    #[test]
    fn winding_is_fixed_per_quad() {
        let grid = build_thick_line_grid(10.0, 10.0, 1, 1, 0.4).unwrap();
        assert_eq!(&grid.indices[0..6], &[0, 1, 2, 2, 1, 3]);
        assert_eq!(&grid.indices[6..12], &[4, 5, 6, 6, 5, 7]);
    }

    #[test]
    fn builder_is_pure() {
        let a = build_thick_line_grid(1000.0, 800.0, 25, 40, 0.4).unwrap();
        let b = build_thick_line_grid(1000.0, 800.0, 25, 40, 0.4).unwrap();
        let bits = |g: &ThickLineGrid| g.vertices.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(build_thick_line_grid(0.0, 10.0, 1, 1, 0.4).is_err());
        assert!(build_thick_line_grid(10.0, -1.0, 1, 1, 0.4).is_err());
        assert!(build_thick_line_grid(10.0, 10.0, 0, 1, 0.4).is_err());
        assert!(build_thick_line_grid(10.0, 10.0, 1, 0, 0.4).is_err());
        assert!(build_thick_line_grid(10.0, 10.0, 1, 1, 0.0).is_err());
    }

    #[test]
    fn rejects_grids_past_the_index_range() {
        let err = build_thick_line_grid(10.0, 10.0, 10_000, 10_000, 0.4).unwrap_err();
        assert!(matches!(err, ConfigError::IndexOverflow { .. }));
    }
}
