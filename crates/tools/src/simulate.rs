//! Headless runs of the globe view at a fixed 60 Hz timebase.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::Time;
use gpu::{FrameSink, GlobeView, RenderFrame, SurfaceBinding};
use runtime::RenderLoop;
use scene::{SceneConfig, SceneError};
use serde::Serialize;
use streaming::TextureCache;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulateError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("render loop stopped before the report was taken")]
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerReport {
    pub name: &'static str,
    pub radius: f64,
    pub rotation: f64,
    /// `mapped`, `unmapped` or `hidden` in the last frame.
    pub surface: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraReport {
    pub azimuth: f64,
    pub polar: f64,
    pub distance: f64,
    pub eye: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub frames: u64,
    pub presented: u64,
    pub loading_percent: u8,
    pub layers: Vec<LayerReport>,
    pub camera: CameraReport,
}

/// Keeps the last frame instead of drawing it.
#[derive(Debug, Default)]
struct LastFrame {
    frame: Option<RenderFrame>,
    presented: u64,
}

impl FrameSink for LastFrame {
    fn present(&mut self, frame: &RenderFrame) {
        self.frame = Some(frame.clone());
        self.presented += 1;
    }
}

pub const VIEWPORT: (f64, f64) = (1280.0, 720.0);

/// Apply `zoom` wheel deltas, then deliver `frames` refreshes 1/60 s apart.
pub fn simulate(
    cfg: &SceneConfig,
    textures: Rc<RefCell<TextureCache>>,
    frames: u32,
    zoom: &[f64],
) -> Result<SimulationReport, SimulateError> {
    let mut view = GlobeView::new(cfg, textures, LastFrame::default())?;
    view.set_viewport(VIEWPORT.0, VIEWPORT.1);
    for delta in zoom {
        view.wheel(*delta);
    }

    let mut render_loop = RenderLoop::new(view);
    render_loop.start();
    for i in 0..frames {
        render_loop.tick(Time(f64::from(i) / 60.0));
    }

    let view = render_loop.handler().ok_or(SimulateError::Stopped)?;
    let last = view.sink().frame.as_ref();
    let layers = view
        .scene()
        .layers()
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let draw = last.and_then(|f| f.layer_draws().find(|d| d.kind == layer.kind));
            LayerReport {
                name: layer.kind.name(),
                radius: layer.radius,
                rotation: view.animation().rotation(i),
                surface: match draw.map(|d| d.surface) {
                    Some(SurfaceBinding::Mapped(_)) => "mapped",
                    Some(SurfaceBinding::Unmapped) => "unmapped",
                    None => "hidden",
                },
            }
        })
        .collect();
    let orbit = view.orbit().state();

    Ok(SimulationReport {
        frames: render_loop.frames_delivered(),
        presented: view.sink().presented,
        loading_percent: view.loading().percent(),
        layers,
        camera: CameraReport {
            azimuth: orbit.azimuth,
            polar: orbit.polar,
            distance: orbit.distance,
            eye: view.orbit().eye().to_array(),
        },
    })
}
