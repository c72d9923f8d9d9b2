use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform that lays an XY-plane object flat on the XZ ground plane.
    pub fn flat() -> Self {
        Self {
            rotation: Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
            ..Self::default()
        }
    }

    /// Same transform moved to `position`.
    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }

    /// Model matrix: translate, then rotate, then scale.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Anything that can hand view and projection matrices to an overlay.
pub trait Camera {
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;
}

/// Plain view/projection pair, handy for tests and offline traces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            view: Mat4::look_at_rh(Vec3::new(0.0, 800.0, 800.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(60.0_f32.to_radians(), 16.0 / 9.0, 1.0, 2000.0),
        }
    }
}

impl Camera for CameraMatrices {
    fn view_matrix(&self) -> Mat4 {
        self.view
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

/// A shape whose per-vertex normals can be visualized.
///
/// Positions and normals are flat arrays with stride 3. The normal overlay
/// snapshots them once and reads only `model_matrix` afterwards.
pub trait NormalSource {
    fn model_matrix(&self) -> Mat4;
    fn vertices(&self) -> &[f32];
    fn normals(&self) -> &[f32];
}
