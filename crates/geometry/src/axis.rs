use glam::{Vec2, Vec3};

/// Axis directions in draw order. Each axis is also drawn in the color of
/// its direction (x red, y green, z blue).
pub const AXIS_DIRECTIONS: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

/// The `rate` attribute for one axis segment: start and end of a unit line.
///
/// The axis shader places each vertex at `start + dir * rate * length`, so
/// this buffer never changes between axes or frames.
pub fn build_axis_unit() -> [f32; 2] {
    [0.0, 1.0]
}

/// Opposite corners of a `width × height` grid, used as axis anchors.
///
/// Anchors are `(x, z)` pairs on the ground plane.
pub fn corner_anchors(width: f32, height: f32) -> [Vec2; 2] {
    [
        Vec2::new(-width / 2.0, -height / 2.0),
        Vec2::new(width / 2.0, height / 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_segment_is_constant() {
        assert_eq!(build_axis_unit(), [0.0, 1.0]);
        assert_eq!(build_axis_unit(), build_axis_unit());
    }

    #[test]
    fn anchors_sit_on_opposite_corners() {
        let [a, b] = corner_anchors(100.0, 60.0);
        assert_eq!(a, Vec2::new(-50.0, -30.0));
        assert_eq!(b, Vec2::new(50.0, 30.0));
    }

    #[test]
    fn directions_are_orthonormal() {
        for (i, a) in AXIS_DIRECTIONS.iter().enumerate() {
            assert_eq!(a.length(), 1.0);
            for b in &AXIS_DIRECTIONS[i + 1..] {
                assert_eq!(a.dot(*b), 0.0);
            }
        }
    }
}
