//! The per-frame work of the globe view, independent of any backend.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::math::Vec3;
use runtime::{Frame, FrameHandler, LoadingProgress};
use scene::{
    CameraConfig, GlobeAnimation, GlobeScene, LightRig, OrbitControls, PointerButton, SceneConfig,
    SceneError,
};
use streaming::TextureCache;
use tracing::{debug, info, trace};

use crate::camera::{Camera3D, aspect_ratio};
use crate::renderer::{RenderFrame, Renderer};

/// Receives each collected frame. Implemented by the wgpu backend and by
/// headless recorders.
pub trait FrameSink {
    fn present(&mut self, frame: &RenderFrame);

    /// The loop stopped; drop per-frame resources.
    fn release(&mut self) {}
}

/// Scene, camera and animation state advanced once per frame.
///
/// Input handlers only touch the orbit controls. The texture cache is shared
/// with the loaders and only read here.
pub struct GlobeView<S: FrameSink> {
    scene: GlobeScene,
    animation: GlobeAnimation,
    orbit: OrbitControls,
    camera: CameraConfig,
    rig: LightRig,
    textures: Rc<RefCell<TextureCache>>,
    loading: LoadingProgress,
    viewport: (f64, f64),
    sink: S,
}

impl<S: FrameSink> GlobeView<S> {
    pub fn new(
        cfg: &SceneConfig,
        textures: Rc<RefCell<TextureCache>>,
        sink: S,
    ) -> Result<Self, SceneError> {
        let scene = GlobeScene::compose(&cfg.globe)?;
        let animation = scene.animation();
        let orbit = OrbitControls::new(cfg.orbit.clone(), Vec3::from(cfg.camera.position));
        info!(layers = scene.layers().len(), "globe view ready");
        Ok(Self {
            scene,
            animation,
            orbit,
            camera: cfg.camera.clone(),
            rig: LightRig::from_config(&cfg.lighting),
            textures,
            loading: LoadingProgress::new(),
            viewport: (1280.0, 720.0),
            sink,
        })
    }

    pub fn scene(&self) -> &GlobeScene {
        &self.scene
    }

    pub fn animation(&self) -> &GlobeAnimation {
        &self.animation
    }

    pub fn orbit(&self) -> &OrbitControls {
        &self.orbit
    }

    pub fn loading(&self) -> &LoadingProgress {
        &self.loading
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
        self.orbit.set_viewport(width, height);
    }

    pub fn pointer_down(&mut self, pos_px: [f64; 2], button: PointerButton) {
        self.orbit.on_pointer_down(pos_px, button);
    }

    pub fn pointer_move(&mut self, pos_px: [f64; 2]) {
        self.orbit.on_pointer_move(pos_px);
    }

    pub fn pointer_up(&mut self) {
        self.orbit.on_pointer_up();
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.orbit.on_wheel(delta_y);
    }

    pub fn camera(&self) -> Camera3D {
        Camera3D::from_orbit(&self.orbit, &self.camera)
    }

    /// Collect the current state without advancing it.
    pub fn collect(&self) -> Option<RenderFrame> {
        let Ok(textures) = self.textures.try_borrow() else {
            trace!("texture cache busy, skipping frame");
            return None;
        };
        Some(Renderer::collect(
            &self.scene,
            &self.animation,
            &textures,
            &self.rig,
            &self.camera(),
            aspect_ratio(self.viewport.0, self.viewport.1),
        ))
    }
}

impl<S: FrameSink> FrameHandler for GlobeView<S> {
    fn on_frame(&mut self, frame: Frame) {
        let frames = frame.nominal_frames();
        self.scene.tick(&mut self.animation, frames);
        self.orbit.update(frames);
        if self.loading.advance(frame.dt_s) && !self.loading.is_visible() {
            debug!(frame = frame.index, "loading finished");
        }
        if let Some(collected) = self.collect() {
            self.sink.present(&collected);
        }
    }

    fn on_stop(&mut self) {
        let released = self
            .textures
            .try_borrow_mut()
            .map(|mut cache| cache.teardown())
            .unwrap_or(0);
        self.sink.release();
        info!(released, "globe view stopped");
    }
}
