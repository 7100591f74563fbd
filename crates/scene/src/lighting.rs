use foundation::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::LightingConfig;

/// Named backdrop looks. Each maps to a clear color and an ambient tint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    #[default]
    Sunset,
    Dawn,
    Night,
    Space,
}

impl EnvironmentPreset {
    /// Linear RGB clear color behind the starfield.
    pub fn backdrop(self) -> [f32; 3] {
        match self {
            EnvironmentPreset::Sunset => [0.045, 0.020, 0.040],
            EnvironmentPreset::Dawn => [0.030, 0.035, 0.060],
            EnvironmentPreset::Night => [0.008, 0.010, 0.025],
            EnvironmentPreset::Space => [0.004, 0.008, 0.016],
        }
    }

    /// Tint applied to the ambient term.
    pub fn ambient_tint(self) -> [f32; 3] {
        match self {
            EnvironmentPreset::Sunset => [1.0, 0.82, 0.70],
            EnvironmentPreset::Dawn => [0.85, 0.88, 1.0],
            EnvironmentPreset::Night => [0.55, 0.60, 0.85],
            EnvironmentPreset::Space => [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PositionalLight {
    pub position: Vec3,
    pub intensity: f32,
}

/// Ambient + directional + point lighting, plus the backdrop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightRig {
    pub ambient: f32,
    pub directional: PositionalLight,
    pub point: PositionalLight,
    pub environment: EnvironmentPreset,
    pub star_count: u32,
}

impl LightRig {
    pub fn from_config(cfg: &LightingConfig) -> Self {
        Self {
            ambient: cfg.ambient_intensity.max(0.0),
            directional: PositionalLight {
                position: Vec3::from(cfg.directional_position),
                intensity: cfg.directional_intensity.max(0.0),
            },
            point: PositionalLight {
                position: Vec3::from(cfg.point_position),
                intensity: cfg.point_intensity.max(0.0),
            },
            environment: cfg.environment,
            star_count: cfg.star_count,
        }
    }

    /// Unit vector pointing from the origin toward the directional light.
    pub fn light_dir(&self) -> Vec3 {
        self.directional.position.normalize()
    }
}

impl Default for LightRig {
    fn default() -> Self {
        Self::from_config(&LightingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{EnvironmentPreset, LightRig};

    #[test]
    fn default_rig_matches_config() {
        let rig = LightRig::default();
        assert_eq!(rig.ambient, 0.4);
        assert_eq!(rig.directional.intensity, 1.0);
        assert_eq!(rig.environment, EnvironmentPreset::Sunset);
        assert!((rig.light_dir().length() - 1.0).abs() < 1e-12);
    }
}
