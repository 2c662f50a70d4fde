/// Shading families the viewer can realize. `NormalViz` colors the
/// surface by its normals and ignores the configured colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    Physical,
    Standard,
    Toon,
    NormalViz,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 4] = [
        MaterialKind::Physical,
        MaterialKind::Standard,
        MaterialKind::Toon,
        MaterialKind::NormalViz,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MaterialKind::Physical => "Physical",
            MaterialKind::Standard => "Standard",
            MaterialKind::Toon => "Toon",
            MaterialKind::NormalViz => "Normals",
        }
    }
}

/// Which faces of the geometry a material renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Both orientations, one appearance. Single-mode material.
    Double,
    /// Front faces only (back faces culled).
    Front,
    /// Back faces only (front faces culled).
    Back,
}

pub const DEFAULT_FRONT_COLOR: [f32; 3] = [0.533, 0.8, 0.933];
pub const DEFAULT_BACK_COLOR: [f32; 3] = [0.933, 0.533, 0.8];

/// User-facing material settings, independent of what is currently
/// realized in the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialConfig {
    pub kind: MaterialKind,
    pub front_color: [f32; 3],
    pub back_color: [f32; 3],
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Standard,
            front_color: DEFAULT_FRONT_COLOR,
            back_color: DEFAULT_BACK_COLOR,
        }
    }
}

/// A realized material instance attached to a live or backed-up entity.
///
/// `generation` identifies the instance: a rebuild (kind or side change)
/// mints a new generation, an in-place color edit keeps it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub side: Side,
    pub color: [f32; 3],
    pub generation: u64,
}
