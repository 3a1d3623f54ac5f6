use glam::{Mat4, Quat, Vec3};

/// Point the camera frames: roughly the avatar's chest
pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 0.35, 0.0);

const FOV_Y: f32 = 35.0 * std::f32::consts::PI / 180.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// The camera orbits around a fixed target point. Its position is determined
/// by rotating a "back" vector (0, 0, distance) by the orientation quaternion.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub orientation: Quat,
    pub distance: f32,
    /// Viewport width / height
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        // Slightly above the face, looking straight at it
        Self {
            orientation: Quat::from_rotation_x(-0.08),
            distance: 3.2,
            aspect: 1.0,
        }
    }
}

impl Camera {
    /// Recompute the aspect ratio for a new viewport. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn eye_position(&self) -> Vec3 {
        let offset = self.orientation * Vec3::new(0.0, 0.0, self.distance);
        CAMERA_TARGET + offset
    }

    /// Uses world up so the orbit never rolls.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), CAMERA_TARGET, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(FOV_Y, self.aspect, Z_NEAR, Z_FAR)
    }
}
