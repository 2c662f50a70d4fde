use fast_surface_nets::ndshape::{ConstShape, ConstShape3u32};
use fast_surface_nets::{SurfaceNetsBuffer, surface_nets};

use crate::field::service::{ServiceError, SurfacePayload, SurfaceQuery, SurfaceService};
use crate::params::BoundaryCondition;

/// Grid resolution of the sampled scalar field, per axis.
pub const FIELD_RESOLUTION: u32 = 100;

type FieldShape = ConstShape3u32<FIELD_RESOLUTION, FIELD_RESOLUTION, FIELD_RESOLUTION>;

/// Built-in surface generator: samples the Chladni standing-wave field on
/// a regular grid over the bounding box and extracts the zero isosurface.
///
/// The field is a sum of six axis-permutation terms
/// `coef * f(u*pi*x) * f(v*pi*y) * f(w*pi*z)` where `f` is `sin` under
/// dirichlet conditions and `cos` under neumann.
pub struct ChladniService;

impl SurfaceService for ChladniService {
    fn generate(&self, query: &SurfaceQuery) -> Result<SurfacePayload, ServiceError> {
        let p = &query.params;

        if p.has_degenerate_box() {
            return Ok(SurfacePayload::default());
        }

        let res = FIELD_RESOLUTION as usize;
        let [ax, ay, az] = p.box_min();
        let [bx, by, bz] = p.box_max();

        // Per-axis factor tables: table[mode][i] = f(mode * pi * coord_i).
        let x_t = axis_tables(ax, bx, res, p.u, p.v, p.w, p.boundary);
        let y_t = axis_tables(ay, by, res, p.u, p.v, p.w, p.boundary);
        let z_t = axis_tables(az, bz, res, p.u, p.v, p.w, p.boundary);
        let [a, b, c, d, e, f] = p.coefficients();

        let mut sdf = vec![0.0f32; FieldShape::USIZE];
        for lin in 0..FieldShape::SIZE {
            let [i, j, k] = FieldShape::delinearize(lin);
            let (i, j, k) = (i as usize, j as usize, k as usize);
            let value = a * x_t[0][i] * y_t[1][j] * z_t[2][k]
                + b * x_t[0][i] * z_t[1][k] * y_t[2][j]
                + c * y_t[0][j] * x_t[1][i] * z_t[2][k]
                + d * y_t[0][j] * z_t[1][k] * x_t[2][i]
                + e * z_t[0][k] * x_t[1][i] * y_t[2][j]
                + f * z_t[0][k] * y_t[1][j] * x_t[2][i];
            sdf[lin as usize] = value as f32;
        }

        let mut buffer = SurfaceNetsBuffer::default();
        surface_nets(
            &sdf,
            &FieldShape {},
            [0; 3],
            [FIELD_RESOLUTION - 1; 3],
            &mut buffer,
        );

        // Extraction runs in grid coordinates; map back into the box.
        let step = [
            (bx - ax) / (res - 1) as f64,
            (by - ay) / (res - 1) as f64,
            (bz - az) / (res - 1) as f64,
        ];
        let vertices = buffer
            .positions
            .iter()
            .map(|pos| {
                [
                    (ax + pos[0] as f64 * step[0]) as f32,
                    (ay + pos[1] as f64 * step[1]) as f32,
                    (az + pos[2] as f64 * step[2]) as f32,
                ]
            })
            .collect();

        let faces = buffer
            .indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();

        let payload = SurfacePayload { vertices, faces };
        payload.check_indices()?;
        Ok(payload)
    }
}

fn axis_tables(
    min: f64,
    max: f64,
    res: usize,
    u: i32,
    v: i32,
    w: i32,
    boundary: BoundaryCondition,
) -> [Vec<f64>; 3] {
    let step = (max - min) / (res - 1) as f64;
    let factor = |mode: i32| -> Vec<f64> {
        (0..res)
            .map(|i| {
                let t = mode as f64 * std::f64::consts::PI * (min + i as f64 * step);
                match boundary {
                    BoundaryCondition::Dirichlet => t.sin(),
                    BoundaryCondition::Neumann => t.cos(),
                }
            })
            .collect()
    };
    [factor(u), factor(v), factor(w)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PatternParameters;

    #[test]
    fn default_parameters_yield_a_surface() {
        let payload = ChladniService
            .generate(&SurfaceQuery::new(PatternParameters::default()))
            .unwrap();
        assert!(!payload.is_empty());
        assert!(!payload.faces.is_empty());
        payload.check_indices().unwrap();
    }

    #[test]
    fn reference_pattern_is_deterministic_and_in_box() {
        let mut p = PatternParameters::default();
        p.c = 0.0;
        p.d = 0.0;
        p.e = 0.0;
        p.f = 0.0;
        p.min_x = -5.0;
        p.min_y = -5.0;
        p.min_z = -5.0;
        p.max_x = 5.0;
        p.max_y = 5.0;
        p.max_z = 5.0;

        let first = ChladniService.generate(&SurfaceQuery::new(p)).unwrap();
        let second = ChladniService.generate(&SurfaceQuery::new(p)).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);

        for v in &first.vertices {
            for (c, (lo, hi)) in v.iter().zip([(-5.0, 5.0); 3]) {
                assert!(*c >= lo - 1e-3 && *c <= hi + 1e-3, "vertex escapes box");
            }
        }
    }

    #[test]
    fn boundary_condition_changes_the_surface() {
        let mut p = PatternParameters::default();
        let dirichlet = ChladniService.generate(&SurfaceQuery::new(p)).unwrap();
        p.boundary = BoundaryCondition::Neumann;
        let neumann = ChladniService.generate(&SurfaceQuery::new(p)).unwrap();
        assert_ne!(dirichlet, neumann);
    }

    #[test]
    fn degenerate_box_returns_empty_payload() {
        let mut p = PatternParameters::default();
        p.min_x = 1.0;
        p.max_x = -1.0;
        let payload = ChladniService.generate(&SurfaceQuery::new(p)).unwrap();
        assert!(payload.is_empty());
    }
}
