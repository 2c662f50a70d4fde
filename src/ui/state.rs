use crate::params::PatternParameters;
use crate::scene::{MaterialConfig, RenderMode};

pub struct UiState {
    pub params: PatternParameters,

    pub render_mode: RenderMode,
    pub material: MaterialConfig,
    pub background: [f32; 3],

    pub vsync_enabled: bool,
    pub show_help: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            params: PatternParameters::default(),

            render_mode: RenderMode::Single,
            material: MaterialConfig::default(),
            background: [1.0, 1.0, 1.0],

            vsync_enabled: true,
            show_help: true,
        }
    }
}
