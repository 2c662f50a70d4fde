use glam::Vec3;

use crate::scene::graph::Scene;

/// Margin multiplier applied to the fitted view distance.
pub const FIT_MARGIN: f32 = 4.0;

/// Elevation/azimuth convention for the fitted viewpoint: the camera sits
/// at `dist * (sin(pi/6), sin(pi/6), cos(pi/6))` from the box center.
const FIT_DIRECTION_ANGLE: f32 = std::f32::consts::FRAC_PI_6;

/// A computed camera placement. Derived from the live geometry, never
/// persisted; recomputed after every surface replacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub target: Vec3,
}

/// Fits the camera to the union bounding box of the live entities.
/// `fov` is the vertical field of view in radians. Returns `None` for an
/// empty scene (nothing to frame, camera left alone).
pub fn frame(scene: &Scene, fov: f32) -> Option<CameraFrame> {
    let aabb = scene.aabb()?;
    let center = aabb.center();

    let dist = (aabb.max_dim() / 2.0 / (fov / 2.0).tan()).abs() * FIT_MARGIN;
    let direction = Vec3::new(
        FIT_DIRECTION_ANGLE.sin(),
        FIT_DIRECTION_ANGLE.sin(),
        FIT_DIRECTION_ANGLE.cos(),
    );

    Some(CameraFrame {
        position: center + direction * dist,
        target: center,
    })
}
