use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::PatternParameters;

/// Flat query encoding of one surface-generation request, matching the
/// generator's read-only interface: six coefficients, three mode numbers,
/// six box bounds and the boundary condition.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceQuery {
    pub params: PatternParameters,
}

impl SurfaceQuery {
    pub fn new(params: PatternParameters) -> Self {
        Self { params }
    }

    /// Wire form of the request, one `key=value` pair per field.
    pub fn encode(&self) -> String {
        let p = &self.params;
        format!(
            "A={}&B={}&C={}&D={}&E={}&F={}&u={}&v={}&w={}&min_x={}&min_y={}&min_z={}&max_x={}&max_y={}&max_z={}&boundary={}",
            p.a,
            p.b,
            p.c,
            p.d,
            p.e,
            p.f,
            p.u,
            p.v,
            p.w,
            p.min_x,
            p.min_y,
            p.min_z,
            p.max_x,
            p.max_y,
            p.max_z,
            p.boundary.as_str(),
        )
    }
}

/// The generator's response: vertex positions plus triangles indexing
/// into them. Both arrays may be empty; that is a degenerate surface,
/// not an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfacePayload {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
}

impl SurfacePayload {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Structural check: every face index must point at an existing vertex.
    pub fn check_indices(&self) -> Result<(), ServiceError> {
        let n = self.vertices.len() as u32;
        for face in &self.faces {
            for &i in face {
                if i >= n {
                    return Err(ServiceError::MalformedPayload(format!(
                        "face index {i} out of range (vertex count {n})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Parses a raw response body and validates its shape. The built-in
    /// generator hands payloads over in memory, so this only backs the
    /// wire-format tests.
    #[cfg(test)]
    pub fn from_json(body: &str) -> Result<Self, ServiceError> {
        let payload: SurfacePayload = serde_json::from_str(body)
            .map_err(|e| ServiceError::MalformedPayload(e.to_string()))?;
        payload.check_indices()?;
        Ok(payload)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("surface generation failed: {0}")]
    FetchFailed(String),
    #[error("malformed surface payload: {0}")]
    MalformedPayload(String),
}

/// The external surface-generation collaborator. The viewer only depends
/// on this seam; the built-in generator and the test doubles both live
/// behind it.
pub trait SurfaceService: Send + 'static {
    fn generate(&self, query: &SurfaceQuery) -> Result<SurfacePayload, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_encodes_all_fourteen_fields_plus_boundary() {
        let query = SurfaceQuery::new(PatternParameters::default());
        let encoded = query.encode();
        assert_eq!(
            encoded,
            "A=1&B=1&C=1&D=1&E=1&F=1&u=1&v=1&w=1&min_x=-1&min_y=-1&min_z=-1&max_x=1&max_y=1&max_z=1&boundary=dirichlet"
        );
    }

    #[test]
    fn payload_parses_from_wire_body() {
        let body = r#"{"vertices": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], "faces": [[0, 1, 2]]}"#;
        let payload = SurfacePayload::from_json(body).unwrap();
        assert_eq!(payload.vertices.len(), 3);
        assert_eq!(payload.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn empty_payload_is_valid() {
        let payload = SurfacePayload::from_json(r#"{"vertices": [], "faces": []}"#).unwrap();
        assert!(payload.is_empty());
        assert!(payload.check_indices().is_ok());
    }

    #[test]
    fn missing_fields_are_malformed() {
        let err = SurfacePayload::from_json(r#"{"vertices": []}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedPayload(_)));
    }

    #[test]
    fn out_of_range_face_index_is_malformed() {
        let payload = SurfacePayload {
            vertices: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            faces: vec![[0, 1, 2]],
        };
        assert!(matches!(
            payload.check_indices(),
            Err(ServiceError::MalformedPayload(_))
        ));
    }
}
