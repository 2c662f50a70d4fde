use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::params::PatternParameters;
use crate::scene::{Scene, SurfaceMesh};

/// Default filename for exported patterns.
pub const SNAPSHOT_FILENAME: &str = "chladni_pattern.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no pattern is currently rendered")]
    NoActiveGeometry,
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
    #[error("snapshot file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Portable document pairing the parameters that produced a pattern with
/// the realized geometry, so it can be reloaded without re-running the
/// generator. Material and lighting choices deliberately do not travel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub parameters: PatternParameters,
    #[serde(rename = "patternData")]
    pub pattern_data: SurfaceMesh,
}

impl Snapshot {
    /// Captures the current live geometry. Fails when nothing is
    /// rendered; the export is aborted, not defaulted.
    pub fn export(params: PatternParameters, scene: &Scene) -> Result<Self, SnapshotError> {
        let entity = scene
            .entities()
            .first()
            .ok_or(SnapshotError::NoActiveGeometry)?;
        if entity.geometry.is_empty() {
            return Err(SnapshotError::NoActiveGeometry);
        }
        Ok(Self {
            parameters: params,
            pattern_data: (*entity.geometry).clone(),
        })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::MalformedSnapshot(e.to_string()))
    }

    /// Parses and structurally validates a snapshot document. The scene
    /// is left untouched by the caller when this fails.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(text)
            .map_err(|e| SnapshotError::MalformedSnapshot(e.to_string()))?;
        snapshot.check()?;
        Ok(snapshot)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), SnapshotError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, SnapshotError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Geometry ready for re-insertion into the scene.
    pub fn geometry(&self) -> Arc<SurfaceMesh> {
        Arc::new(self.pattern_data.clone())
    }

    fn check(&self) -> Result<(), SnapshotError> {
        let mesh = &self.pattern_data;
        if mesh.positions.len() % 3 != 0 {
            return Err(SnapshotError::MalformedSnapshot(
                "position buffer length is not a multiple of 3".into(),
            ));
        }
        if mesh.normals.len() != mesh.positions.len() {
            return Err(SnapshotError::MalformedSnapshot(
                "normal buffer does not match position buffer".into(),
            ));
        }
        if mesh.indices.len() % 3 != 0 {
            return Err(SnapshotError::MalformedSnapshot(
                "index buffer length is not a multiple of 3".into(),
            ));
        }
        let n = mesh.vertex_count() as u32;
        if mesh.indices.iter().any(|&i| i >= n) {
            return Err(SnapshotError::MalformedSnapshot(
                "index out of vertex range".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::SurfacePayload;
    use crate::scene::MaterialManager;

    fn rendered_scene() -> (PatternParameters, Scene) {
        let payload = SurfacePayload {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.5, 0.0, 0.25],
                [0.0, 2.0, -0.5],
                [1.0, 1.0, 0.75],
            ],
            faces: vec![[0, 1, 2], [1, 3, 2]],
        };
        let mut scene = Scene::default();
        let mut manager = MaterialManager::default();
        manager.realize(&mut scene, Arc::new(SurfaceMesh::from_payload(&payload)));
        (PatternParameters::default(), scene)
    }

    #[test]
    fn round_trip_preserves_buffers_and_parameters() {
        let (mut params, scene) = rendered_scene();
        params.u = 3;
        params.a = 0.125;
        params.min_z = -2.5;

        let snapshot = Snapshot::export(params, &scene).unwrap();
        let reloaded = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(reloaded.parameters, params);
        assert_eq!(reloaded.pattern_data.positions, snapshot.pattern_data.positions);
        assert_eq!(reloaded.pattern_data.indices, snapshot.pattern_data.indices);
        assert_eq!(reloaded.pattern_data.normals, snapshot.pattern_data.normals);
    }

    #[test]
    fn export_without_geometry_is_refused() {
        let scene = Scene::default();
        assert!(matches!(
            Snapshot::export(PatternParameters::default(), &scene),
            Err(SnapshotError::NoActiveGeometry)
        ));
    }

    #[test]
    fn document_uses_the_wire_key_names() {
        let (params, scene) = rendered_scene();
        let json = Snapshot::export(params, &scene).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("parameters").is_some());
        assert!(value.get("patternData").is_some());
        assert!(value["parameters"].get("A").is_some());
    }

    #[test]
    fn garbage_and_structural_mismatches_are_malformed() {
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(SnapshotError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            Snapshot::from_json(r#"{"parameters": {}}"#),
            Err(SnapshotError::MalformedSnapshot(_))
        ));

        // Indices escaping the vertex range fail validation even when the
        // document parses.
        let (params, scene) = rendered_scene();
        let mut snapshot = Snapshot::export(params, &scene).unwrap();
        snapshot.pattern_data.indices[0] = 99;
        let json = snapshot.to_json().unwrap();
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(SnapshotError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let (params, scene) = rendered_scene();
        let snapshot = Snapshot::export(params, &scene).unwrap();
        let path = std::env::temp_dir().join(SNAPSHOT_FILENAME);
        snapshot.write_to(&path).unwrap();
        let reloaded = Snapshot::read_from(&path).unwrap();
        assert_eq!(reloaded, snapshot);
        let _ = std::fs::remove_file(&path);
    }
}
