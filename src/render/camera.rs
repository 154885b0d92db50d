use super::pick::Ray;
use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraMovement {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
}

impl CameraMovement {
    pub fn any(&self) -> bool {
        self.move_forward || self.move_backward || self.move_left || self.move_right
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_deg: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// First-person camera. Yaw turns about world +Y, pitch about the camera's
/// local X; with both at zero the camera looks down -Z.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub projection: Projection,
}

/// Pitch stays this far short of straight up/down.
const PITCH_MARGIN: f32 = 0.05;

impl CameraController {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: clamp_pitch(pitch),
            projection: Projection::default(),
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        Vec3::new(
            -self.yaw.sin() * cos_pitch,
            self.pitch.sin(),
            -self.yaw.cos() * cos_pitch,
        )
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    /// Applies a pointer drag of (`dx`, `dy`) pixels.
    pub fn look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw -= dx * sensitivity;
        self.pitch = clamp_pitch(self.pitch - dy * sensitivity);
    }

    /// Translates along the active directions at `speed` units per second and
    /// keeps the eye at least `min_height` above the ground. Returns true when
    /// the position changed.
    pub fn update_movement(
        &mut self,
        input: &CameraMovement,
        frame_dt: f32,
        speed: f32,
        min_height: f32,
    ) -> bool {
        let before = self.position;
        let forward = self.forward();
        let right = self.right();

        let mut direction = Vec3::ZERO;
        if input.move_forward {
            direction += forward;
        }
        if input.move_backward {
            direction -= forward;
        }
        if input.move_left {
            direction -= right;
        }
        if input.move_right {
            direction += right;
        }
        if direction.length_squared() > 1e-6 {
            self.position += direction.normalize() * speed * frame_dt;
        }
        if self.position.y < min_height {
            self.position.y = min_height;
        }

        self.position != before
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position).inverse()
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.projection.fov_y_deg.to_radians(),
            aspect.max(1e-3),
            self.projection.near,
            self.projection.far,
        )
    }

    /// World-space ray through pixel (`x`, `y`) of a `width`×`height` viewport
    /// with top-left origin.
    pub fn screen_ray(&self, x: f32, y: f32, width: f32, height: f32) -> Ray {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let ndc_x = (x / width) * 2.0 - 1.0;
        let ndc_y = 1.0 - (y / height) * 2.0;

        let inverse = (self.projection_matrix(width / height) * self.view_matrix()).inverse();
        let unproject = |z: f32| {
            let clip = inverse * Vec4::new(ndc_x, ndc_y, z, 1.0);
            clip.truncate() / clip.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(self.position, far - near)
    }
}

fn clamp_pitch(pitch: f32) -> f32 {
    let limit = std::f32::consts::FRAC_PI_2 - PITCH_MARGIN;
    if pitch.is_finite() {
        pitch.clamp(-limit, limit)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraController, CameraMovement};
    use glam::Vec3;

    #[test]
    fn default_view_looks_down_negative_z() {
        let camera = CameraController::new(Vec3::new(0.0, 5.0, 10.0), 0.0, 0.0);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.right() - Vec3::X).length() < 1e-6);
        let rotated = camera.rotation() * Vec3::NEG_Z;
        assert!((rotated - camera.forward()).length() < 1e-5);
    }

    #[test]
    fn look_clamps_pitch() {
        let mut camera = CameraController::new(Vec3::ZERO, 0.0, 0.0);
        camera.look(0.0, -100_000.0, 0.005);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(camera.pitch > 1.5);
        camera.look(200.0, 0.0, 0.005);
        assert!((camera.yaw + 1.0).abs() < 1e-6);
    }

    #[test]
    fn movement_is_normalized_and_scaled() {
        let mut camera = CameraController::new(Vec3::new(0.0, 5.0, 0.0), 0.0, 0.0);
        let movement = CameraMovement {
            move_forward: true,
            move_right: true,
            ..CameraMovement::default()
        };
        assert!(camera.update_movement(&movement, 0.5, 6.0, 0.5));
        let travelled = (camera.position - Vec3::new(0.0, 5.0, 0.0)).length();
        assert!((travelled - 3.0).abs() < 1e-4);

        let opposite = CameraMovement {
            move_forward: true,
            move_backward: true,
            ..CameraMovement::default()
        };
        assert!(!camera.update_movement(&opposite, 0.5, 6.0, 0.5));
    }

    #[test]
    fn movement_never_goes_below_eye_height() {
        let mut camera = CameraController::new(Vec3::new(0.0, 1.0, 0.0), 0.0, -1.2);
        let movement = CameraMovement {
            move_forward: true,
            ..CameraMovement::default()
        };
        for _ in 0..10 {
            camera.update_movement(&movement, 0.1, 6.0, 0.5);
        }
        assert!(camera.position.y >= 0.5);
        assert!(camera.position.z < 0.0);
    }

    #[test]
    fn centre_ray_matches_forward() {
        let camera = CameraController::new(Vec3::new(0.0, 5.0, 10.0), 0.4, -0.3);
        let ray = camera.screen_ray(400.0, 300.0, 800.0, 600.0);
        assert!((ray.direction - camera.forward()).length() < 1e-3);
        assert_eq!(ray.origin, camera.position);
    }

    #[test]
    fn lower_pixels_aim_lower() {
        let camera = CameraController::new(Vec3::new(0.0, 5.0, 10.0), 0.0, 0.0);
        let top = camera.screen_ray(400.0, 0.0, 800.0, 600.0);
        let bottom = camera.screen_ray(400.0, 600.0, 800.0, 600.0);
        assert!(top.direction.y > 0.0);
        assert!(bottom.direction.y < 0.0);
        let right = camera.screen_ray(800.0, 300.0, 800.0, 600.0);
        assert!(right.direction.x > 0.0);
    }
}
