use foundation::time::Time;
use tracing::{debug, info};

use crate::frame::{Frame, NOMINAL_DT_S};

/// Largest gap between two delivered frames that is reported as-is.
/// Longer gaps (background tab, debugger pause) are reported as this value.
pub const MAX_FRAME_DT_S: f64 = 0.25;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    NotStarted,
    Running,
    Stopped,
}

/// Work performed once per display refresh.
///
/// `on_frame` must not block; anything asynchronous is started elsewhere and
/// only its cached result is read here.
pub trait FrameHandler {
    fn on_frame(&mut self, frame: Frame);

    /// Called exactly once when the loop stops, before the handler is dropped.
    fn on_stop(&mut self) {}
}

/// Drives a [`FrameHandler`] from display refresh callbacks.
///
/// `NotStarted → Running → Stopped`. Once stopped the handler is released and
/// the loop cannot be restarted.
#[derive(Debug)]
pub struct RenderLoop<H: FrameHandler> {
    state: LoopState,
    handler: Option<H>,
    started_at: Option<Time>,
    last_at: Option<Time>,
    frames: u64,
}

impl<H: FrameHandler> RenderLoop<H> {
    pub fn new(handler: H) -> Self {
        Self {
            state: LoopState::NotStarted,
            handler: Some(handler),
            started_at: None,
            last_at: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.handler.as_mut()
    }

    /// Returns `true` if the loop transitioned to `Running`.
    pub fn start(&mut self) -> bool {
        if self.state != LoopState::NotStarted {
            return false;
        }
        self.state = LoopState::Running;
        info!("render loop started");
        true
    }

    /// Deliver one display refresh at timestamp `now`.
    ///
    /// Returns the frame handed to the handler, or `None` when the loop is
    /// not running.
    pub fn tick(&mut self, now: Time) -> Option<Frame> {
        if self.state != LoopState::Running {
            return None;
        }
        let handler = self.handler.as_mut()?;

        let started_at = *self.started_at.get_or_insert(now);
        let dt_s = match self.last_at {
            Some(last) => now.since(last).min(MAX_FRAME_DT_S),
            None => NOMINAL_DT_S,
        };
        self.last_at = Some(now);

        let frame = Frame {
            index: self.frames,
            dt_s,
            time: Time(now.since(started_at)),
        };
        self.frames += 1;
        handler.on_frame(frame);
        Some(frame)
    }

    /// Stop the loop and release the handler. Idempotent.
    pub fn stop(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::Stopped;
        if let Some(mut handler) = self.handler.take() {
            handler.on_stop();
        }
        debug!(frames = self.frames, "render loop stopped");
    }
}

impl<H: FrameHandler> Drop for RenderLoop<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameHandler, LoopState, MAX_FRAME_DT_S, RenderLoop};
    use crate::frame::{Frame, NOMINAL_DT_S};
    use foundation::time::Time;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Frame>,
        stopped: Rc<Cell<u32>>,
    }

    impl FrameHandler for Recorder {
        fn on_frame(&mut self, frame: Frame) {
            self.frames.push(frame);
        }

        fn on_stop(&mut self) {
            self.stopped.set(self.stopped.get() + 1);
        }
    }

    #[test]
    fn does_not_tick_before_start() {
        let mut lp = RenderLoop::new(Recorder::default());
        assert_eq!(lp.state(), LoopState::NotStarted);
        assert!(lp.tick(Time(0.0)).is_none());
        assert_eq!(lp.frames_delivered(), 0);
    }

    #[test]
    fn first_frame_uses_nominal_dt() {
        let mut lp = RenderLoop::new(Recorder::default());
        assert!(lp.start());
        let f0 = lp.tick(Time(12.0)).unwrap();
        assert_eq!(f0.index, 0);
        assert_eq!(f0.dt_s, NOMINAL_DT_S);
        assert_eq!(f0.time, Time(0.0));

        let f1 = lp.tick(Time(12.5)).unwrap();
        assert_eq!(f1.index, 1);
        assert_eq!(f1.dt_s, 0.25);
        assert_eq!(f1.time, Time(0.5));
    }

    #[test]
    fn long_gaps_are_clamped() {
        let mut lp = RenderLoop::new(Recorder::default());
        lp.start();
        lp.tick(Time(0.0));
        let f = lp.tick(Time(30.0)).unwrap();
        assert_eq!(f.dt_s, MAX_FRAME_DT_S);
    }

    #[test]
    fn stop_releases_handler_once_and_blocks_ticks() {
        let stopped = Rc::new(Cell::new(0));
        let mut lp = RenderLoop::new(Recorder {
            frames: Vec::new(),
            stopped: stopped.clone(),
        });
        lp.start();
        lp.tick(Time(0.0));
        lp.stop();
        lp.stop();
        assert_eq!(stopped.get(), 1);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert!(lp.handler().is_none());
        assert!(lp.tick(Time(1.0)).is_none());
        assert!(!lp.start());
    }

    #[test]
    fn drop_stops_running_loop() {
        let stopped = Rc::new(Cell::new(0));
        {
            let mut lp = RenderLoop::new(Recorder {
                frames: Vec::new(),
                stopped: stopped.clone(),
            });
            lp.start();
        }
        assert_eq!(stopped.get(), 1);
    }
}
