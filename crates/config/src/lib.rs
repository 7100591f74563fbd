//! Viewer configuration: one JSON document holding the scene and overlay
//! settings, with defaults for anything left out.

mod error;

use std::path::Path;

use overlay::OverlayConfig;
use scene::{GlobeScene, SceneConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub scene: SceneConfig,
    pub overlay: OverlayConfig,
}

impl ViewerConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate. A missing file is an error, not a default.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_json_str(&text)?;
        info!(path = %path.display(), "loaded viewer config");
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let orbit = &self.scene.orbit;
        if orbit.enable_pan {
            return Err(ConfigError::Invalid(
                "orbit.enable_pan is not supported".to_string(),
            ));
        }
        if !(orbit.min_distance > 0.0 && orbit.min_distance < orbit.max_distance) {
            return Err(ConfigError::Invalid(format!(
                "orbit distance range [{}, {}] must satisfy 0 < min < max",
                orbit.min_distance, orbit.max_distance
            )));
        }
        if !(orbit.damping_factor > 0.0 && orbit.damping_factor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "orbit.damping_factor {} must be in (0, 1]",
                orbit.damping_factor
            )));
        }
        for (name, value) in [
            ("orbit.auto_rotate_speed", orbit.auto_rotate_speed),
            ("orbit.rotate_speed", orbit.rotate_speed),
            ("orbit.zoom_speed", orbit.zoom_speed),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }

        let camera = &self.scene.camera;
        if !(camera.fov_deg > 0.0 && camera.fov_deg < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_deg {} must be in (0, 180)",
                camera.fov_deg
            )));
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(ConfigError::Invalid(format!(
                "camera clip range [{}, {}] must satisfy 0 < near < far",
                camera.near, camera.far
            )));
        }

        GlobeScene::compose(&self.scene.globe)?;

        if self.overlay.content_endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "overlay.content_endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{ConfigError, ViewerConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        ViewerConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(ViewerConfig::from_json_str("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn overrides_merge_with_defaults() {
        let cfg = ViewerConfig::from_json_str(
            r#"{ "overlay": { "geocode_api_key": "abc" }, "scene": { "lighting": { "star_count": 10 } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.overlay.geocode_api_key, "abc");
        assert_eq!(cfg.overlay.success_delay_ms, 2000);
        assert_eq!(cfg.scene.lighting.star_count, 10);
        assert_eq!(cfg.scene.orbit.max_distance, 10.0);
    }

    #[test]
    fn rejects_bad_ranges() {
        for json in [
            r#"{ "scene": { "orbit": { "min_distance": 12.0 } } }"#,
            r#"{ "scene": { "orbit": { "min_distance": 0.0 } } }"#,
            r#"{ "scene": { "orbit": { "damping_factor": 0.0 } } }"#,
            r#"{ "scene": { "orbit": { "enable_pan": true } } }"#,
            r#"{ "scene": { "camera": { "near": 0.0 } } }"#,
        ] {
            let err = ViewerConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}: {err}");
        }
    }

    #[test]
    fn rejects_bad_globe() {
        let err = ViewerConfig::from_json_str(
            r#"{ "scene": { "globe": { "inner_atmosphere": { "radius": 1.0 } } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Scene(_)));

        let err = ViewerConfig::from_json_str(
            r#"{ "scene": { "globe": { "outer_atmosphere": { "opacity": 1.5 } } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Scene(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ViewerConfig::from_json_str("{ scene"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "overlay": {{ "success_delay_ms": 500 }} }}"#).unwrap();
        let cfg = ViewerConfig::load_from_path(file.path()).unwrap();
        assert_eq!(cfg.overlay.success_delay_ms, 500);

        let missing = ViewerConfig::load_from_path(std::path::Path::new("/nonexistent/globe.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn json_output_reparses() {
        let cfg = ViewerConfig::default();
        let text = cfg.to_json_pretty().unwrap();
        assert_eq!(ViewerConfig::from_json_str(&text).unwrap(), cfg);
    }
}
