pub mod framer;
pub mod graph;
pub mod material;
pub mod materials;
pub mod mesh;

pub use framer::CameraFrame;
pub use graph::{RenderMode, Scene, SceneEntity};
pub use material::{Material, MaterialConfig, MaterialKind, Side};
pub use materials::MaterialManager;
pub use mesh::{Aabb, SurfaceMesh};
