//! Camera orientation and projection.

use glam::Mat4;

/// Perspective parameters for the composite pass.
const FIELD_OF_VIEW_DEG: f32 = 85.0;
const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 100.0;

/// Accumulated camera angles, in radians, driven by pan input.
///
/// Accumulation is unbounded: no wraparound, clamping, or decay. One raw
/// pixel of pan delta maps to one degree of rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraOrientation {
    /// Pitch-like rotation around the X axis.
    pub x_angle: f32,
    /// Yaw-like rotation around the Y axis.
    pub y_angle: f32,
}

impl CameraOrientation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a 2D pan delta in view-local units. Vertical motion pitches,
    /// horizontal motion yaws.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.x_angle += dy.to_radians();
        self.y_angle += dx.to_radians();
    }

    /// World model matrix for the current orientation.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.x_angle) * Mat4::from_rotation_y(self.y_angle)
    }
}

/// Perspective projection for a drawable with the given aspect ratio.
pub fn projection_matrix(aspect: f32) -> Mat4 {
    Mat4::perspective_rh(FIELD_OF_VIEW_DEG.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_accumulates_in_radians() {
        let mut camera = CameraOrientation::new();
        camera.pan(90.0, 45.0);

        assert!((camera.y_angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((camera.x_angle - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn test_split_pans_equal_one_combined_pan() {
        let mut split = CameraOrientation::new();
        split.pan(10.0, -3.0);
        split.pan(20.0, 8.0);

        let mut combined = CameraOrientation::new();
        combined.pan(30.0, 5.0);

        assert!((split.x_angle - combined.x_angle).abs() < 1e-6);
        assert!((split.y_angle - combined.y_angle).abs() < 1e-6);
    }

    #[test]
    fn test_accumulation_is_unbounded() {
        let mut camera = CameraOrientation::new();
        for _ in 0..100 {
            camera.pan(360.0, 360.0);
        }

        // 100 full turns, never wrapped back into [0, 2pi)
        let expected = 100.0 * std::f32::consts::TAU;
        assert!((camera.x_angle - expected).abs() / expected < 1e-4);
        assert!((camera.y_angle - expected).abs() / expected < 1e-4);
    }

    #[test]
    fn test_identity_world_matrix_at_rest() {
        let camera = CameraOrientation::new();
        assert_eq!(camera.world_matrix(), Mat4::IDENTITY);
    }
}
