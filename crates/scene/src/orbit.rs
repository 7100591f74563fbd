//! Orbit camera controls: damped rotation around the origin, clamped dolly
//! zoom, and idle auto-rotation.

use std::f64::consts::{PI, TAU};

use foundation::math::Vec3;

use crate::config::OrbitConfig;

/// Keeps the camera off the poles, where the up vector degenerates.
const POLAR_EPS: f64 = 1e-6;

/// Dolly factor for one wheel notch at `zoom_speed == 1`.
const ZOOM_STEP: f64 = 0.95;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` code.
    pub fn from_dom(button: i16) -> Self {
        match button {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// Read-only view of the orbit, what the renderer consumes each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraOrbitState {
    /// Radians around +Y, 0 looking down -Z from +Z.
    pub azimuth: f64,
    /// Radians from +Y.
    pub polar: f64,
    pub distance: f64,
    pub auto_rotating: bool,
    pub damping_factor: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    azimuth: f64,
    polar: f64,
    distance: f64,
}

/// Orbit controller. Input handlers only move the *target* orbit; `update`
/// eases the current orbit toward it once per frame.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    config: OrbitConfig,
    current: Spherical,
    target: Spherical,
    drag_last_px: Option<[f64; 2]>,
    viewport_height: f64,
}

impl OrbitControls {
    pub fn new(config: OrbitConfig, eye: Vec3) -> Self {
        let len = eye.length();
        let (azimuth, polar) = if len > 0.0 {
            (eye.x.atan2(eye.z), (eye.y / len).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };
        let mut spherical = Spherical {
            azimuth,
            polar,
            distance: len,
        };
        clamp_spherical(&config, &mut spherical);

        Self {
            config,
            current: spherical,
            target: spherical,
            drag_last_px: None,
            viewport_height: 720.0,
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn set_viewport(&mut self, _width: f64, height: f64) {
        self.viewport_height = height.max(1.0);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_last_px.is_some()
    }

    pub fn state(&self) -> CameraOrbitState {
        CameraOrbitState {
            azimuth: self.current.azimuth,
            polar: self.current.polar,
            distance: self.current.distance,
            auto_rotating: self.config.auto_rotate && !self.is_dragging(),
            damping_factor: self.config.damping_factor,
        }
    }

    pub fn distance(&self) -> f64 {
        self.current.distance
    }

    /// Distance the camera is easing toward.
    pub fn target_distance(&self) -> f64 {
        self.target.distance
    }

    /// Eye position in world space; the camera looks at the origin.
    pub fn eye(&self) -> Vec3 {
        let s = self.current;
        let sin_polar = s.polar.sin();
        Vec3::new(
            s.distance * sin_polar * s.azimuth.sin(),
            s.distance * s.polar.cos(),
            s.distance * sin_polar * s.azimuth.cos(),
        )
    }

    /// Only the primary button orbits; panning is not offered.
    pub fn on_pointer_down(&mut self, pos_px: [f64; 2], button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        self.drag_last_px = Some(pos_px);
    }

    pub fn on_pointer_move(&mut self, pos_px: [f64; 2]) {
        let Some(last) = self.drag_last_px else {
            return;
        };
        let dx = pos_px[0] - last[0];
        let dy = pos_px[1] - last[1];
        self.drag_last_px = Some(pos_px);

        let per_px = TAU / self.viewport_height * self.config.rotate_speed;
        self.target.azimuth -= dx * per_px;
        self.target.polar -= dy * per_px;
        clamp_spherical(&self.config, &mut self.target);
    }

    pub fn on_pointer_up(&mut self) {
        self.drag_last_px = None;
    }

    /// Positive `delta_y` (scroll down) moves away, negative moves closer.
    pub fn on_wheel(&mut self, delta_y: f64) {
        if !self.config.enable_zoom || !delta_y.is_finite() || delta_y == 0.0 {
            return;
        }
        let scale = ZOOM_STEP.powf(self.config.zoom_speed);
        if delta_y < 0.0 {
            self.target.distance *= scale;
        } else {
            self.target.distance /= scale;
        }
        clamp_spherical(&self.config, &mut self.target);
    }

    /// Radians of auto-rotation per frame.
    pub fn auto_rotate_angle(&self) -> f64 {
        TAU / 60.0 / 60.0 * self.config.auto_rotate_speed
    }

    /// Advance by `frames` nominal (1/60 s) frames: apply auto-rotation while
    /// idle, then ease the current orbit toward the target. One nominal frame
    /// moves exactly `damping_factor` of the remaining distance.
    pub fn update(&mut self, frames: f64) {
        let frames = if frames.is_finite() { frames.max(0.0) } else { 0.0 };

        if self.config.auto_rotate && !self.is_dragging() {
            self.target.azimuth -= self.auto_rotate_angle() * frames;
        }

        if self.config.enable_damping {
            let k = 1.0 - (1.0 - self.config.damping_factor).powf(frames);
            self.current.azimuth += (self.target.azimuth - self.current.azimuth) * k;
            self.current.polar += (self.target.polar - self.current.polar) * k;
            self.current.distance += (self.target.distance - self.current.distance) * k;
        } else {
            self.current = self.target;
        }
        clamp_spherical(&self.config, &mut self.current);
    }
}

fn clamp_spherical(config: &OrbitConfig, s: &mut Spherical) {
    s.polar = s.polar.clamp(POLAR_EPS, PI - POLAR_EPS);
    if !s.distance.is_finite() {
        s.distance = config.max_distance;
    }
    s.distance = s.distance.clamp(config.min_distance, config.max_distance);
}
