use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Edge constraint applied by the surface generator when solving the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    Dirichlet,
    Neumann,
}

impl BoundaryCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryCondition::Dirichlet => "dirichlet",
            BoundaryCondition::Neumann => "neumann",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("mode number {axis} must be an integer >= 1, got {value}")]
    ModeNumber { axis: char, value: i32 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
}

/// Everything the surface generator needs to realize one pattern.
///
/// Owned by the UI; the pipeline reads a copy on each fetch and never
/// mutates it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternParameters {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "D")]
    pub d: f64,
    #[serde(rename = "E")]
    pub e: f64,
    #[serde(rename = "F")]
    pub f: f64,
    pub u: i32,
    pub v: i32,
    pub w: i32,
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
    pub boundary: BoundaryCondition,
}

impl Default for PatternParameters {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 1.0,
            c: 1.0,
            d: 1.0,
            e: 1.0,
            f: 1.0,
            u: 1,
            v: 1,
            w: 1,
            min_x: -1.0,
            min_y: -1.0,
            min_z: -1.0,
            max_x: 1.0,
            max_y: 1.0,
            max_z: 1.0,
            boundary: BoundaryCondition::Dirichlet,
        }
    }
}

impl PatternParameters {
    /// Hard validation, run before any request is issued. Mode numbers
    /// below 1 block the fetch outright; a degenerate bounding box does
    /// not (the generator legitimately returns an empty surface for it).
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (axis, value) in [('u', self.u), ('v', self.v), ('w', self.w)] {
            if value < 1 {
                return Err(ParameterError::ModeNumber { axis, value });
            }
        }

        for (field, value) in [
            ("A", self.a),
            ("B", self.b),
            ("C", self.c),
            ("D", self.d),
            ("E", self.e),
            ("F", self.f),
            ("min_x", self.min_x),
            ("min_y", self.min_y),
            ("min_z", self.min_z),
            ("max_x", self.max_x),
            ("max_y", self.max_y),
            ("max_z", self.max_z),
        ] {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite { field });
            }
        }

        Ok(())
    }

    /// Soft constraint: min < max componentwise. Violations are logged,
    /// not rejected.
    pub fn has_degenerate_box(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y || self.min_z >= self.max_z
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    pub fn box_min(&self) -> [f64; 3] {
        [self.min_x, self.min_y, self.min_z]
    }

    pub fn box_max(&self) -> [f64; 3] {
        [self.max_x, self.max_y, self.max_z]
    }
}
