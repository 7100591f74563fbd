use tracing::debug;

use crate::config::{GlobeConfig, LayerConfig};
use crate::layer::{LayerKind, SphereLayer};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("{outer} radius {outer_radius} must be larger than {inner} radius {inner_radius}")]
    RadiiNotIncreasing {
        inner: &'static str,
        inner_radius: f64,
        outer: &'static str,
        outer_radius: f64,
    },

    #[error("{layer} opacity {opacity} is outside [0, 1]")]
    OpacityOutOfRange { layer: &'static str, opacity: f32 },

    #[error("{layer} needs at least 3 segments, got {segments}")]
    TooFewSegments { layer: &'static str, segments: u32 },

    #[error("cloud speed {clouds} must be below core speed {core}")]
    CloudsNotSlower { clouds: f64, core: f64 },

    #[error("{layer} must not rotate")]
    AtmosphereRotates { layer: &'static str },

    #[error("{layer} rotation speed must be finite and non-negative")]
    InvalidSpeed { layer: &'static str },
}

/// Accumulated rotation per layer, in the same order as
/// [`GlobeScene::layers`]. Owned by whoever drives the frame loop and handed
/// to [`GlobeScene::tick`] by `&mut`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobeAnimation {
    rotations: Vec<f64>,
    frames: f64,
}

impl GlobeAnimation {
    pub fn rotation(&self, layer_index: usize) -> f64 {
        self.rotations.get(layer_index).copied().unwrap_or(0.0)
    }

    pub fn rotations(&self) -> &[f64] {
        &self.rotations
    }

    /// Total frames of motion accumulated so far.
    pub fn frames(&self) -> f64 {
        self.frames
    }
}

/// The layered globe: core, optional clouds, two atmosphere shells.
///
/// Layers are stored innermost first, which is also the draw order: later
/// shells blend over earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeScene {
    layers: Vec<SphereLayer>,
}

impl GlobeScene {
    pub fn compose(cfg: &GlobeConfig) -> Result<Self, SceneError> {
        let mut specs: Vec<(LayerKind, &LayerConfig)> = vec![(LayerKind::Core, &cfg.core)];
        if let Some(clouds) = &cfg.clouds {
            specs.push((LayerKind::Clouds, clouds));
        }
        specs.push((LayerKind::InnerAtmosphere, &cfg.inner_atmosphere));
        specs.push((LayerKind::OuterAtmosphere, &cfg.outer_atmosphere));

        for (kind, layer) in &specs {
            validate_layer(*kind, layer)?;
        }

        for pair in specs.windows(2) {
            let (inner, a) = pair[0];
            let (outer, b) = pair[1];
            if !(b.radius > a.radius) {
                return Err(SceneError::RadiiNotIncreasing {
                    inner: inner.name(),
                    inner_radius: a.radius,
                    outer: outer.name(),
                    outer_radius: b.radius,
                });
            }
        }

        if let Some(clouds) = &cfg.clouds
            && clouds.rotation_speed >= cfg.core.rotation_speed
        {
            return Err(SceneError::CloudsNotSlower {
                clouds: clouds.rotation_speed,
                core: cfg.core.rotation_speed,
            });
        }

        let layers: Vec<SphereLayer> = specs
            .into_iter()
            .map(|(kind, layer)| SphereLayer {
                kind,
                radius: layer.radius,
                segments: layer.segments,
                surface_uri: layer.surface_uri.clone(),
                opacity: layer.opacity,
                side: layer.side,
                rotation_speed: layer.rotation_speed,
                tint: layer.tint,
                missing_map: layer.missing_map,
            })
            .collect();

        debug!(layers = layers.len(), "globe composed");
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[SphereLayer] {
        &self.layers
    }

    pub fn layer(&self, kind: LayerKind) -> Option<(usize, &SphereLayer)> {
        self.layers.iter().enumerate().find(|(_, l)| l.kind == kind)
    }

    /// Surface map uris to request from the texture cache at mount.
    pub fn texture_uris(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter_map(|l| l.surface_uri.as_deref())
    }

    /// Fresh animation state, every layer at rotation zero.
    pub fn animation(&self) -> GlobeAnimation {
        GlobeAnimation {
            rotations: vec![0.0; self.layers.len()],
            frames: 0.0,
        }
    }

    /// Advance every layer by `frames` worth of its own speed.
    ///
    /// Non-positive or non-finite deltas are ignored, so rotation only ever
    /// moves forward.
    pub fn tick(&self, anim: &mut GlobeAnimation, frames: f64) {
        if !frames.is_finite() || frames <= 0.0 {
            return;
        }
        anim.rotations.resize(self.layers.len(), 0.0);
        for (rotation, layer) in anim.rotations.iter_mut().zip(&self.layers) {
            *rotation += layer.rotation_speed * frames;
        }
        anim.frames += frames;
    }
}

fn validate_layer(kind: LayerKind, layer: &LayerConfig) -> Result<(), SceneError> {
    let name = kind.name();
    if !(0.0..=1.0).contains(&layer.opacity) {
        return Err(SceneError::OpacityOutOfRange {
            layer: name,
            opacity: layer.opacity,
        });
    }
    if layer.segments < 3 {
        return Err(SceneError::TooFewSegments {
            layer: name,
            segments: layer.segments,
        });
    }
    if !layer.rotation_speed.is_finite() || layer.rotation_speed < 0.0 {
        return Err(SceneError::InvalidSpeed { layer: name });
    }
    if kind.is_atmosphere() && layer.rotation_speed != 0.0 {
        return Err(SceneError::AtmosphereRotates { layer: name });
    }
    Ok(())
}
