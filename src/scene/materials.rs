use glam::Vec3;
use std::sync::Arc;

use crate::scene::graph::{BACK_MESH_OFFSET, RenderMode, Scene, SceneEntity};
use crate::scene::material::{Material, MaterialConfig, MaterialKind, Side};
use crate::scene::mesh::SurfaceMesh;

/// Retained (geometry, material) pair for an inactive render mode.
#[derive(Clone)]
struct BackupSlot {
    geometry: Arc<SurfaceMesh>,
    material: Material,
}

/// Owns material/mode state for the scene: realizes entities for the
/// current mode, performs single<->double transitions with
/// backup-and-restore, and applies kind/color edits to live materials.
///
/// Backups are retained until a newer backup of the same mode overwrites
/// them, so toggling modes restores prior appearance instead of
/// resetting to defaults.
pub struct MaterialManager {
    mode: RenderMode,
    config: MaterialConfig,
    single_backup: Option<BackupSlot>,
    double_backup: Option<[BackupSlot; 2]>,
    next_generation: u64,
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self {
            mode: RenderMode::Single,
            config: MaterialConfig::default(),
            single_backup: None,
            double_backup: None,
            next_generation: 1,
        }
    }
}

impl MaterialManager {
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn config(&self) -> &MaterialConfig {
        &self.config
    }

    fn fresh_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Replaces the scene contents with freshly realized entities for the
    /// current mode. Called after every successful surface replacement.
    pub fn realize(&mut self, scene: &mut Scene, geometry: Arc<SurfaceMesh>) {
        let entities = match self.mode {
            RenderMode::Single => vec![self.single_entity(geometry)],
            RenderMode::Double => self.double_entities(geometry),
        };
        scene.replace(entities);
    }

    /// Resets live material state to defaults and realizes the geometry
    /// single-sided. Snapshot import path: only geometry and parameters
    /// round-trip, not the exporting session's material choices.
    pub fn realize_default(&mut self, scene: &mut Scene, geometry: Arc<SurfaceMesh>) {
        self.mode = RenderMode::Single;
        self.config = MaterialConfig::default();
        self.realize(scene, geometry);
    }

    /// Mode transition. Captures the outgoing mode's live entities as its
    /// backup, then restores the incoming mode from its backup if one
    /// exists (re-applying current kind and colors) or synthesizes new
    /// entities from the captured geometry.
    pub fn set_mode(&mut self, scene: &mut Scene, mode: RenderMode) {
        if mode == self.mode {
            return;
        }

        let captured_geometry = self.capture(scene);
        scene.clear();
        self.mode = mode;

        match mode {
            RenderMode::Single => {
                if let Some(slot) = self.single_backup.clone() {
                    let entity = self.restore(slot, Vec3::ZERO, self.config.front_color);
                    scene.replace(vec![entity]);
                } else if let Some(geometry) = captured_geometry {
                    let entity = self.single_entity(geometry);
                    scene.replace(vec![entity]);
                }
            }
            RenderMode::Double => {
                if let Some([front, back]) = self.double_backup.clone() {
                    let front_color = self.config.front_color;
                    let back_color = self.config.back_color;
                    let entities = vec![
                        self.restore(front, Vec3::ZERO, front_color),
                        self.restore(back, Vec3::Z * BACK_MESH_OFFSET, back_color),
                    ];
                    scene.replace(entities);
                } else if let Some(geometry) = captured_geometry {
                    let entities = self.double_entities(geometry);
                    scene.replace(entities);
                }
            }
        }
    }

    /// Changing the material family rebuilds live materials; selecting
    /// the already-active family is a no-op.
    pub fn set_kind(&mut self, scene: &mut Scene, kind: MaterialKind) {
        if self.config.kind == kind {
            return;
        }
        self.config.kind = kind;

        let generation = self.fresh_generation();
        for entity in scene.entities_mut() {
            if entity.material.kind != kind {
                entity.material.kind = kind;
                entity.material.generation = generation;
            }
        }
    }

    /// Cheap high-frequency path: mutates the live material color in
    /// place, no rebuild.
    pub fn set_front_color(&mut self, scene: &mut Scene, color: [f32; 3]) {
        self.config.front_color = color;
        for entity in scene.entities_mut() {
            if matches!(entity.material.side, Side::Double | Side::Front) {
                entity.material.color = color;
            }
        }
    }

    pub fn set_back_color(&mut self, scene: &mut Scene, color: [f32; 3]) {
        self.config.back_color = color;
        for entity in scene.entities_mut() {
            if entity.material.side == Side::Back {
                entity.material.color = color;
            }
        }
    }

    /// Stores the live entities in the outgoing mode's backup slot and
    /// returns their geometry for synthesizing the incoming mode.
    fn capture(&mut self, scene: &Scene) -> Option<Arc<SurfaceMesh>> {
        let entities = scene.entities();
        match (self.mode, entities) {
            (RenderMode::Single, [live]) => {
                self.single_backup = Some(BackupSlot {
                    geometry: Arc::clone(&live.geometry),
                    material: live.material,
                });
                Some(Arc::clone(&live.geometry))
            }
            (RenderMode::Double, [front, back]) => {
                self.double_backup = Some([
                    BackupSlot {
                        geometry: Arc::clone(&front.geometry),
                        material: front.material,
                    },
                    BackupSlot {
                        geometry: Arc::clone(&back.geometry),
                        material: back.material,
                    },
                ]);
                Some(Arc::clone(&front.geometry))
            }
            _ => None,
        }
    }

    /// Re-inserts a backup, re-applying the current color and family.
    /// A family mismatch is a rebuild and mints a new generation; a pure
    /// color difference is an in-place edit.
    fn restore(&mut self, slot: BackupSlot, offset: Vec3, color: [f32; 3]) -> SceneEntity {
        let mut material = slot.material;
        material.color = color;
        if material.kind != self.config.kind {
            material.kind = self.config.kind;
            material.generation = self.fresh_generation();
        }
        SceneEntity {
            geometry: slot.geometry,
            material,
            offset,
        }
    }

    fn single_entity(&mut self, geometry: Arc<SurfaceMesh>) -> SceneEntity {
        SceneEntity {
            geometry,
            material: Material {
                kind: self.config.kind,
                side: Side::Double,
                color: self.config.front_color,
                generation: self.fresh_generation(),
            },
            offset: Vec3::ZERO,
        }
    }

    fn double_entities(&mut self, geometry: Arc<SurfaceMesh>) -> Vec<SceneEntity> {
        let front = SceneEntity {
            geometry: Arc::clone(&geometry),
            material: Material {
                kind: self.config.kind,
                side: Side::Front,
                color: self.config.front_color,
                generation: self.fresh_generation(),
            },
            offset: Vec3::ZERO,
        };
        let back = SceneEntity {
            geometry,
            material: Material {
                kind: self.config.kind,
                side: Side::Back,
                color: self.config.back_color,
                generation: self.fresh_generation(),
            },
            offset: Vec3::Z * BACK_MESH_OFFSET,
        };
        vec![front, back]
    }
}
