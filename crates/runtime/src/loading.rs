/// Percentage added per elapsed step.
pub const LOADING_STEP_PERCENT: u8 = 2;
/// Length of one step in seconds.
pub const LOADING_STEP_S: f64 = 0.05;

/// Progress shown by the loading indicator while the scene warms up.
///
/// Advances by a fixed amount per elapsed step and hides itself once it
/// reaches 100%.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadingProgress {
    percent: u8,
    carry_s: f64,
}

impl LoadingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_visible(&self) -> bool {
        self.percent < 100
    }

    /// Feed elapsed seconds. Returns `true` if the percentage changed.
    pub fn advance(&mut self, dt_s: f64) -> bool {
        if !self.is_visible() || !dt_s.is_finite() || dt_s <= 0.0 {
            return false;
        }
        self.carry_s += dt_s;
        let steps = (self.carry_s / LOADING_STEP_S).floor();
        if steps < 1.0 {
            return false;
        }
        self.carry_s -= steps * LOADING_STEP_S;

        let gained = (steps as u64).saturating_mul(LOADING_STEP_PERCENT as u64);
        let next = (self.percent as u64).saturating_add(gained).min(100);
        self.percent = next as u8;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::LoadingProgress;

    #[test]
    fn advances_two_percent_per_step() {
        let mut p = LoadingProgress::new();
        assert!(!p.advance(0.04));
        assert_eq!(p.percent(), 0);
        assert!(p.advance(0.02));
        assert_eq!(p.percent(), 2);
    }

    #[test]
    fn completes_after_about_two_and_a_half_seconds() {
        let mut p = LoadingProgress::new();
        for _ in 0..160 {
            p.advance(1.0 / 60.0);
        }
        assert_eq!(p.percent(), 100);
        assert!(!p.is_visible());
        assert!(!p.advance(1.0));
    }

    #[test]
    fn huge_gap_saturates() {
        let mut p = LoadingProgress::new();
        p.advance(3600.0);
        assert_eq!(p.percent(), 100);
    }
}
