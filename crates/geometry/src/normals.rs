use crate::check_index_range;
use debugviz_common::{ConfigError, ensure_finite};

/// Line and point buffers for visualizing per-vertex normals.
///
/// Source vertex `i` becomes line vertices `2i` (side 0, the base point)
/// and `2i + 1` (side 1, the tip). Both copies carry the same position and
/// normal; the vertex stage places the tip at
/// `position + normal * line_length * side`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalSegments {
    pub line_vertices: Vec<f32>,
    pub line_normals: Vec<f32>,
    pub sides: Vec<f32>,
    pub line_indices: Vec<u16>,
    /// Number of source vertices, i.e. the dot-pass point count.
    pub point_count: usize,
    pub line_length: f32,
}

impl NormalSegments {
    pub fn line_vertex_count(&self) -> usize {
        self.line_vertices.len() / 3
    }

    /// World-free endpoint of segment `i`, as the line shader computes it.
    /// `None` past the last segment.
    pub fn tip(&self, i: usize) -> Option<[f32; 3]> {
        let p = self.line_vertices.get(6 * i + 3..6 * i + 6)?;
        let n = self.line_normals.get(6 * i + 3..6 * i + 6)?;
        let side = *self.sides.get(2 * i + 1)?;
        Some([
            p[0] + n[0] * self.line_length * side,
            p[1] + n[1] * self.line_length * side,
            p[2] + n[2] * self.line_length * side,
        ])
    }
}

/// Duplicate each vertex into a base/tip pair for the normal line pass.
///
/// `vertices` and `normals` are flat stride-3 arrays of equal length.
pub fn build_normal_segments(
    vertices: &[f32],
    normals: &[f32],
    line_length: f32,
) -> Result<NormalSegments, ConfigError> {
    if vertices.len() % 3 != 0 {
        return Err(ConfigError::NotStride3 {
            name: "vertices",
            len: vertices.len(),
        });
    }
    if normals.len() % 3 != 0 {
        return Err(ConfigError::NotStride3 {
            name: "normals",
            len: normals.len(),
        });
    }
    if vertices.len() != normals.len() {
        return Err(ConfigError::LengthMismatch {
            vertices: vertices.len(),
            normals: normals.len(),
        });
    }
    ensure_finite("line_length", line_length)?;

    let point_count = vertices.len() / 3;
    check_index_range(point_count * 2)?;

    let mut line_vertices = Vec::with_capacity(vertices.len() * 2);
    let mut line_normals = Vec::with_capacity(normals.len() * 2);
    let mut sides = Vec::with_capacity(point_count * 2);
    let mut line_indices = Vec::with_capacity(point_count * 2);

    for (ii, (position, normal)) in vertices.chunks_exact(3).zip(normals.chunks_exact(3)).enumerate() {
        line_vertices.extend_from_slice(position);
        line_vertices.extend_from_slice(position);
        line_normals.extend_from_slice(normal);
        line_normals.extend_from_slice(normal);
        sides.extend_from_slice(&[0.0, 1.0]);

        let base = (ii * 2) as u16;
        line_indices.extend_from_slice(&[base, base + 1]);
    }

    Ok(NormalSegments {
        line_vertices,
        line_normals,
        sides,
        line_indices,
        point_count,
        line_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Vec<f32>, Vec<f32>) {
        let vertices = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        (vertices, normals)
    }

    #[test]
    fn doubles_every_vertex() {
        let (v, n) = triangle();
        let seg = build_normal_segments(&v, &n, 20.0).unwrap();
        assert_eq!(seg.point_count, 3);
        assert_eq!(seg.line_vertex_count(), 6);
        assert_eq!(seg.line_normals.len(), 18);
        assert_eq!(seg.sides, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(seg.line_indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn preserves_input_order() {
        let (v, n) = triangle();
        let seg = build_normal_segments(&v, &n, 1.0).unwrap();
        for i in 0..3 {
            assert_eq!(&seg.line_vertices[6 * i..6 * i + 3], &v[3 * i..3 * i + 3]);
            assert_eq!(&seg.line_vertices[6 * i + 3..6 * i + 6], &v[3 * i..3 * i + 3]);
        }
    }

    #[test]
    fn tip_extends_along_normal() {
        let (v, n) = triangle();
        let seg = build_normal_segments(&v, &n, 20.0).unwrap();
        assert_eq!(seg.tip(1), Some([1.0, 0.0, 20.0]));
        assert_eq!(seg.tip(seg.point_count), None);
    }

    #[test]
    fn empty_mesh_is_valid() {
        let seg = build_normal_segments(&[], &[], 20.0).unwrap();
        assert_eq!(seg.point_count, 0);
        assert!(seg.line_indices.is_empty());
    }

    #[test]
    fn index_pairs_for_many_points() {
        let n = 1000;
        let v = vec![0.5; n * 3];
        let seg = build_normal_segments(&v, &v, 2.0).unwrap();
        assert_eq!(seg.line_indices.len(), 2 * n);
        for (i, pair) in seg.line_indices.chunks(2).enumerate() {
            assert_eq!(pair, &[2 * i as u16, 2 * i as u16 + 1]);
        }
    }

    #[test]
    fn rejects_mismatched_arrays() {
        let (v, _) = triangle();
        let err = build_normal_segments(&v, &[0.0, 0.0, 1.0], 1.0).unwrap_err();
        assert_eq!(err, ConfigError::LengthMismatch { vertices: 9, normals: 3 });
        assert!(matches!(
            build_normal_segments(&[0.0, 1.0], &[0.0, 1.0], 1.0),
            Err(ConfigError::NotStride3 { name: "vertices", .. })
        ));
    }

    #[test]
    fn builder_is_pure() {
        let (v, n) = triangle();
        assert_eq!(
            build_normal_segments(&v, &n, 3.5).unwrap(),
            build_normal_segments(&v, &n, 3.5).unwrap()
        );
    }
}
