use std::f64::consts::TAU;

/// Wrap an angle into `[0, TAU)`.
pub fn wrap_tau(rad: f64) -> f64 {
    let r = rad.rem_euclid(TAU);
    if r >= TAU { 0.0 } else { r }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::{round_to, wrap_tau};
    use std::f64::consts::{PI, TAU};

    #[test]
    fn wrap_tau_handles_negative() {
        assert!((wrap_tau(-PI) - PI).abs() < 1e-12);
        assert!((wrap_tau(TAU + 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn round_to_six_places() {
        assert_eq!(round_to(51.507_351_23, 6), 51.507_351);
        assert_eq!(round_to(-0.127_758_49, 6), -0.127_758);
    }
}
