use glam::{Mat4, Vec2, Vec3};

use crate::scene::CameraFrame;

/// Orbit camera: always looks at `target` from a yaw/pitch/distance
/// offset. Drag input feeds velocities that decay each frame, giving the
/// damped feel of the usual orbit controls.
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub mouse_sensitivity: f32,
    pub damping: f32,

    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 45.0_f32.to_radians(),
            pitch: 30.0_f32.to_radians(),
            distance: 10.0,

            fov: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 1000.0,

            mouse_sensitivity: 0.005,
            damping: 0.15,

            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }
}

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        self.target
            + self.distance
                * Vec3::new(
                    self.yaw.cos() * self.pitch.cos(),
                    self.pitch.sin(),
                    self.yaw.sin() * self.pitch.cos(),
                )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn process_mouse_movement(&mut self, delta: Vec2) {
        self.yaw_velocity += delta.x * self.mouse_sensitivity;
        self.pitch_velocity += delta.y * self.mouse_sensitivity;
    }

    pub fn process_scroll(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 - delta * 0.1)).clamp(0.05, 50_000.0);
    }

    pub fn update(&mut self) {
        self.yaw += self.yaw_velocity;
        self.pitch -= self.pitch_velocity;

        let max_pitch = 89.0_f32.to_radians();
        self.pitch = self.pitch.clamp(-max_pitch, max_pitch);

        self.yaw_velocity *= 1.0 - self.damping;
        self.pitch_velocity *= 1.0 - self.damping;
    }

    /// Adopts a fitted placement from the framer: the orbit target moves
    /// to the box center and yaw/pitch/distance are rederived from the
    /// fitted position.
    pub fn apply_frame(&mut self, frame: CameraFrame) {
        self.target = frame.target;
        let offset = frame.position - frame.target;
        self.distance = offset.length().max(1e-4);

        let dir = offset / self.distance;
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.asin();
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(1.0);
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &OrbitCamera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position().to_array(),
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_frame_reproduces_the_fitted_position() {
        let mut camera = OrbitCamera::default();
        let frame = CameraFrame {
            position: Vec3::new(10.0, 10.0, 17.32),
            target: Vec3::new(1.0, 2.0, 3.0),
        };
        camera.apply_frame(frame);
        assert!((camera.target - frame.target).length() < 1e-5);
        assert!((camera.position() - frame.position).length() < 1e-3);
    }

    #[test]
    fn pitch_stays_clamped_under_wild_input() {
        let mut camera = OrbitCamera::default();
        camera.process_mouse_movement(Vec2::new(0.0, -100_000.0));
        for _ in 0..120 {
            camera.update();
        }
        assert!(camera.pitch <= 89.0_f32.to_radians() + 1e-6);
        assert!(camera.position().is_finite());
    }
}
