use crate::check_index_range;
use debugviz_common::{ConfigError, NormalSource, Transform, ensure_positive, ensure_segments};
use glam::{Mat4, Vec3};

/// A flat-shaded triangle mesh with its own transform.
///
/// Serves as a target for the normal overlay in the demo scene and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u16>,
    pub transform: Transform,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Cube with one quad per face: 24 vertices, 36 indices.
    pub fn cube(size: f32) -> Result<Self, ConfigError> {
        Self::box_mesh(size, size, size, [1, 1, 1])
    }

    /// Axis-aligned box centered on the origin with per-axis segment counts.
    ///
    /// Every face has its own vertices so normals stay flat.
    pub fn box_mesh(
        width: f32,
        height: f32,
        depth: f32,
        segments: [u32; 3],
    ) -> Result<Self, ConfigError> {
        ensure_positive("width", width)?;
        ensure_positive("height", height)?;
        ensure_positive("depth", depth)?;
        let [ws, hs, ds] = segments;
        ensure_segments("width_segments", ws)?;
        ensure_segments("height_segments", hs)?;
        ensure_segments("depth_segments", ds)?;

        let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
        // (normal, u axis, v axis, u segments, v segments)
        #[rustfmt::skip]
        let faces = [
            (Vec3::X,     Vec3::NEG_Z * hd, Vec3::Y * hh,     ds, hs),
            (Vec3::NEG_X, Vec3::Z * hd,     Vec3::Y * hh,     ds, hs),
            (Vec3::Y,     Vec3::X * hw,     Vec3::NEG_Z * hd, ws, ds),
            (Vec3::NEG_Y, Vec3::X * hw,     Vec3::Z * hd,     ws, ds),
            (Vec3::Z,     Vec3::X * hw,     Vec3::Y * hh,     ws, hs),
            (Vec3::NEG_Z, Vec3::NEG_X * hw, Vec3::Y * hh,     ws, hs),
        ];

        let vertex_total: usize = faces
            .iter()
            .map(|(_, _, _, su, sv)| (*su as usize + 1) * (*sv as usize + 1))
            .sum();
        check_index_range(vertex_total)?;

        let mut mesh = Mesh {
            name: "box".into(),
            positions: Vec::with_capacity(vertex_total * 3),
            normals: Vec::with_capacity(vertex_total * 3),
            indices: Vec::new(),
            transform: Transform::default(),
        };
        let extent = Vec3::new(hw, hh, hd);
        for (normal, u, v, su, sv) in faces {
            mesh.push_face(normal * extent, normal, u, v, su, sv);
        }
        Ok(mesh)
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    fn push_face(&mut self, center: Vec3, normal: Vec3, u: Vec3, v: Vec3, su: u32, sv: u32) {
        let base = self.vertex_count() as u16;
        let columns = su as u16 + 1;
        for j in 0..=sv {
            let fv = j as f32 / sv as f32 * 2.0 - 1.0;
            for i in 0..=su {
                let fu = i as f32 / su as f32 * 2.0 - 1.0;
                let p = center + u * fu + v * fv;
                self.positions.extend_from_slice(&p.to_array());
                self.normals.extend_from_slice(&normal.to_array());
            }
        }
        for j in 0..sv as u16 {
            for i in 0..su as u16 {
                let a = base + j * columns + i;
                let b = a + 1;
                let c = a + columns;
                let d = c + 1;
                self.indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }
    }
}

impl NormalSource for Mesh {
    fn model_matrix(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    fn vertices(&self) -> &[f32] {
        &self.positions
    }

    fn normals(&self) -> &[f32] {
        &self.normals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_flat_vertices() {
        let cube = Mesh::cube(200.0).unwrap();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.normals.len(), 72);
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn face_vertices_lie_on_their_face() {
        let cube = Mesh::cube(2.0).unwrap();
        for (p, n) in cube.positions.chunks(3).zip(cube.normals.chunks(3)) {
            let p = Vec3::from_slice(p);
            let n = Vec3::from_slice(n);
            assert!((p.dot(n) - 1.0).abs() < 1e-6);
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn triangles_face_outward() {
        let cube = Mesh::cube(2.0).unwrap();
        for tri in cube.indices.chunks(3) {
            let p = |i: u16| Vec3::from_slice(&cube.positions[i as usize * 3..i as usize * 3 + 3]);
            let n = Vec3::from_slice(&cube.normals[tri[0] as usize * 3..tri[0] as usize * 3 + 3]);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(face.dot(n) > 0.0);
        }
    }

    #[test]
    fn segmented_box_counts() {
        let mesh = Mesh::box_mesh(200.0, 200.0, 200.0, [4, 5, 6]).unwrap();
        // ±X: (6+1)(5+1), ±Y: (4+1)(6+1), ±Z: (4+1)(5+1)
        assert_eq!(mesh.vertex_count(), 2 * (42 + 35 + 30));
        assert_eq!(mesh.triangle_count(), 2 * 2 * (30 + 24 + 20));
    }

    #[test]
    fn model_matrix_follows_transform() {
        let cube = Mesh::cube(1.0)
            .unwrap()
            .with_transform(Transform::default().with_position(Vec3::new(0.0, 5.0, 0.0)));
        assert_eq!(cube.model_matrix(), Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
    }
}
