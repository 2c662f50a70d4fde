use glam::Vec3;
use std::sync::Arc;

use crate::scene::material::Material;
use crate::scene::mesh::{Aabb, SurfaceMesh};

/// Single- vs double-sided display strategy for the same geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Single,
    Double,
}

/// Fixed translation of the back-face entity along the view axis,
/// preventing z-fighting with the front entity in double mode.
pub const BACK_MESH_OFFSET: f32 = 0.001;

/// One renderable node: shared geometry, a material instance and a
/// translation applied at draw time.
#[derive(Clone, Debug)]
pub struct SceneEntity {
    pub geometry: Arc<SurfaceMesh>,
    pub material: Material,
    pub offset: Vec3,
}

impl SceneEntity {
    pub fn aabb(&self) -> Option<Aabb> {
        self.geometry.aabb().map(|aabb| Aabb {
            min: aabb.min + self.offset,
            max: aabb.max + self.offset,
        })
    }
}

/// The live entity set. Every mutation bumps `epoch` so the renderer
/// knows when to re-upload geometry.
#[derive(Default)]
pub struct Scene {
    entities: Vec<SceneEntity>,
    epoch: u64,
}

impl Scene {
    pub fn entities(&self) -> &[SceneEntity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [SceneEntity] {
        self.epoch += 1;
        &mut self.entities
    }

    pub fn replace(&mut self, entities: Vec<SceneEntity>) {
        self.entities = entities;
        self.epoch += 1;
    }

    pub fn clear(&mut self) {
        if !self.entities.is_empty() {
            self.entities.clear();
            self.epoch += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Union bounding box of all live geometry.
    pub fn aabb(&self) -> Option<Aabb> {
        self.entities
            .iter()
            .filter_map(SceneEntity::aabb)
            .reduce(|acc, b| acc.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::material::{Material, MaterialKind, Side};

    fn entity(z: f32, offset: Vec3) -> SceneEntity {
        let mesh = SurfaceMesh {
            positions: vec![0.0, 0.0, z, 1.0, 0.0, z, 0.0, 1.0, z],
            normals: vec![0.0; 9],
            indices: vec![0, 1, 2],
        };
        SceneEntity {
            geometry: Arc::new(mesh),
            material: Material {
                kind: MaterialKind::Standard,
                side: Side::Double,
                color: [1.0; 3],
                generation: 0,
            },
            offset,
        }
    }

    #[test]
    fn epoch_advances_on_mutation_only() {
        let mut scene = Scene::default();
        assert_eq!(scene.epoch(), 0);
        scene.clear();
        assert_eq!(scene.epoch(), 0, "clearing an empty scene is a no-op");

        scene.replace(vec![entity(0.0, Vec3::ZERO)]);
        assert_eq!(scene.epoch(), 1);
        scene.clear();
        assert_eq!(scene.epoch(), 2);
    }

    #[test]
    fn aabb_includes_entity_offsets() {
        let mut scene = Scene::default();
        scene.replace(vec![
            entity(0.0, Vec3::ZERO),
            entity(0.0, Vec3::new(0.0, 0.0, BACK_MESH_OFFSET)),
        ]);
        let aabb = scene.aabb().unwrap();
        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::new(1.0, 1.0, BACK_MESH_OFFSET));
    }

    #[test]
    fn empty_scene_has_no_aabb() {
        assert!(Scene::default().aabb().is_none());
    }
}
