pub mod camera;
pub mod gpu;

pub use camera::{CameraUniform, OrbitCamera};
pub use gpu::GpuState;
