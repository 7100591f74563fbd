use foundation::time::Time;

/// Nominal display refresh interval used for the first frame and for
/// headless stepping.
pub const NOMINAL_DT_S: f64 = 1.0 / 60.0;

/// Frame metadata handed to the per-frame callback.
///
/// `index` counts frames actually delivered; frames the display skipped are
/// simply never observed, so nothing downstream derives state from `index`
/// alone.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous delivered frame.
    pub dt_s: f64,
    /// Loop time at the start of the frame (seconds since start).
    pub time: Time,
}

impl Frame {
    /// Fixed-timestep frame, used for deterministic replay and tests.
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }

    /// How many nominal refreshes this frame stands for. Per-frame speeds
    /// are scaled by this so motion does not depend on the display rate.
    pub fn nominal_frames(&self) -> f64 {
        self.dt_s / NOMINAL_DT_S
    }
}
