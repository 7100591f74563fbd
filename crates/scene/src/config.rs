//! Scene tunables. Defaults reproduce the shipped look of the globe.

use serde::{Deserialize, Serialize};

use crate::layer::{MissingMap, Side};
use crate::lighting::EnvironmentPreset;

/// Everything the render surface needs that is not runtime state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub globe: GlobeConfig,
    pub lighting: LightingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial eye position; the camera always looks at the origin.
    pub position: [f64; 3],
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            fov_deg: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrbitConfig {
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub min_distance: f64,
    pub max_distance: f64,
    pub auto_rotate: bool,
    /// 1.0 is one revolution per minute at 60 frames per second.
    pub auto_rotate_speed: f64,
    pub enable_damping: bool,
    pub damping_factor: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enable_pan: false,
            enable_zoom: true,
            min_distance: 3.0,
            max_distance: 10.0,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayerConfig {
    pub radius: f64,
    pub segments: u32,
    pub surface_uri: Option<String>,
    pub opacity: f32,
    pub side: Side,
    /// Radians per frame.
    pub rotation_speed: f64,
    pub tint: [f32; 3],
    pub missing_map: MissingMap,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            segments: 64,
            surface_uri: None,
            opacity: 1.0,
            side: Side::Front,
            rotation_speed: 0.0,
            tint: [1.0, 1.0, 1.0],
            missing_map: MissingMap::Unmapped,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobeConfig {
    pub core: LayerConfig,
    /// `None` composes the globe without a cloud shell.
    pub clouds: Option<LayerConfig>,
    pub inner_atmosphere: LayerConfig,
    pub outer_atmosphere: LayerConfig,
}

/// #4a90e2
const ATMOSPHERE_TINT: [f32; 3] = [0.290, 0.565, 0.886];

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            core: LayerConfig {
                radius: 2.0,
                surface_uri: Some("/textures/earth-day.jpg".to_string()),
                rotation_speed: 0.002,
                ..LayerConfig::default()
            },
            clouds: Some(LayerConfig {
                radius: 2.01,
                surface_uri: Some("/textures/earth-clouds.png".to_string()),
                opacity: 0.3,
                rotation_speed: 0.0015,
                missing_map: MissingMap::Hidden,
                ..LayerConfig::default()
            }),
            inner_atmosphere: LayerConfig {
                radius: 2.1,
                opacity: 0.1,
                side: Side::Back,
                tint: ATMOSPHERE_TINT,
                ..LayerConfig::default()
            },
            outer_atmosphere: LayerConfig {
                radius: 2.25,
                opacity: 0.05,
                side: Side::Back,
                tint: ATMOSPHERE_TINT,
                ..LayerConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_intensity: f32,
    pub directional_position: [f64; 3],
    pub directional_intensity: f32,
    pub point_position: [f64; 3],
    pub point_intensity: f32,
    pub environment: EnvironmentPreset,
    pub star_count: u32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.4,
            directional_position: [10.0, 10.0, 5.0],
            directional_intensity: 1.0,
            point_position: [-10.0, -10.0, -5.0],
            point_intensity: 0.3,
            environment: EnvironmentPreset::Sunset,
            star_count: 1200,
        }
    }
}
