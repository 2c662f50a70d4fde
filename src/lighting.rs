use glam::Vec3;

/// Light kinds as an explicit tagged union, each variant carrying its
/// own intensity; dispatch is on the tag, never on downcasting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient { intensity: f32 },
    Directional { direction: Vec3, intensity: f32 },
    Hemisphere { intensity: f32 },
    /// Point light that follows the camera position.
    CameraPoint { intensity: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Ambient,
    Directional,
    Hemisphere,
    CameraPoint,
}

impl Light {
    pub fn kind(&self) -> LightKind {
        match self {
            Light::Ambient { .. } => LightKind::Ambient,
            Light::Directional { .. } => LightKind::Directional,
            Light::Hemisphere { .. } => LightKind::Hemisphere,
            Light::CameraPoint { .. } => LightKind::CameraPoint,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient { intensity }
            | Light::Directional { intensity, .. }
            | Light::Hemisphere { intensity }
            | Light::CameraPoint { intensity } => *intensity,
        }
    }

    pub fn intensity_mut(&mut self) -> &mut f32 {
        match self {
            Light::Ambient { intensity }
            | Light::Directional { intensity, .. }
            | Light::Hemisphere { intensity }
            | Light::CameraPoint { intensity } => intensity,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind() {
            LightKind::Ambient => "Ambient",
            LightKind::Directional => "Directional",
            LightKind::Hemisphere => "Hemisphere",
            LightKind::CameraPoint => "Camera light",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightPreset {
    /// Ambient + directional + hemisphere fill.
    Studio,
    /// Directional key with ambient fill.
    Daylight,
    /// Single point light riding the camera.
    Headlamp,
}

impl LightPreset {
    pub const ALL: [LightPreset; 3] = [
        LightPreset::Studio,
        LightPreset::Daylight,
        LightPreset::Headlamp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LightPreset::Studio => "Studio",
            LightPreset::Daylight => "Daylight",
            LightPreset::Headlamp => "Headlamp",
        }
    }

    fn lights(&self) -> Vec<Light> {
        let key_direction = Vec3::new(1.0, 1.0, 1.0).normalize();
        match self {
            LightPreset::Studio => vec![
                Light::Ambient { intensity: 0.25 },
                Light::Directional {
                    direction: key_direction,
                    intensity: 2.0,
                },
                Light::Hemisphere { intensity: 0.6 },
            ],
            LightPreset::Daylight => vec![
                Light::Directional {
                    direction: key_direction,
                    intensity: 2.0,
                },
                Light::Ambient { intensity: 0.25 },
            ],
            LightPreset::Headlamp => vec![Light::CameraPoint { intensity: 2.5 }],
        }
    }
}

/// The active lighting setup: one preset and its realized lights.
/// Intensity edits apply only to lights the preset contains; switching
/// presets re-seeds the rig from the preset defaults.
pub struct LightingRig {
    preset: LightPreset,
    lights: Vec<Light>,
}

impl Default for LightingRig {
    fn default() -> Self {
        let preset = LightPreset::Studio;
        Self {
            preset,
            lights: preset.lights(),
        }
    }
}

impl LightingRig {
    pub fn preset(&self) -> LightPreset {
        self.preset
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    pub fn set_preset(&mut self, preset: LightPreset) {
        if preset == self.preset {
            return;
        }
        self.preset = preset;
        self.lights = preset.lights();
    }

    pub fn contains(&self, kind: LightKind) -> bool {
        self.lights.iter().any(|l| l.kind() == kind)
    }

    pub fn intensity_of(&self, kind: LightKind) -> Option<f32> {
        self.lights
            .iter()
            .find(|l| l.kind() == kind)
            .map(Light::intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_their_documented_lights() {
        let mut rig = LightingRig::default();
        assert_eq!(rig.preset(), LightPreset::Studio);
        assert!(rig.contains(LightKind::Ambient));
        assert!(rig.contains(LightKind::Directional));
        assert!(rig.contains(LightKind::Hemisphere));
        assert!(!rig.contains(LightKind::CameraPoint));

        rig.set_preset(LightPreset::Daylight);
        assert!(rig.contains(LightKind::Directional));
        assert!(rig.contains(LightKind::Ambient));
        assert!(!rig.contains(LightKind::Hemisphere));

        rig.set_preset(LightPreset::Headlamp);
        assert_eq!(rig.lights().len(), 1);
        assert!(rig.contains(LightKind::CameraPoint));
    }

    #[test]
    fn intensity_edits_survive_until_preset_changes() {
        let mut rig = LightingRig::default();
        for light in rig.lights_mut() {
            if light.kind() == LightKind::Directional {
                *light.intensity_mut() = 5.0;
            }
        }
        assert_eq!(rig.intensity_of(LightKind::Directional), Some(5.0));

        // Re-selecting the active preset keeps edits.
        rig.set_preset(LightPreset::Studio);
        assert_eq!(rig.intensity_of(LightKind::Directional), Some(5.0));

        // A real switch re-seeds from defaults.
        rig.set_preset(LightPreset::Daylight);
        assert_eq!(rig.intensity_of(LightKind::Directional), Some(2.0));
    }

    #[test]
    fn absent_lights_have_no_intensity() {
        let mut rig = LightingRig::default();
        rig.set_preset(LightPreset::Headlamp);
        assert_eq!(rig.intensity_of(LightKind::Hemisphere), None);
    }
}
