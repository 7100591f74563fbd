use super::Vec3;

/// A point on the globe in decimal degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Coordinates {
    pub lat_deg: f64,
    pub lng_deg: f64,
}

impl Coordinates {
    pub fn new(lat_deg: f64, lng_deg: f64) -> Self {
        Self { lat_deg, lng_deg }
    }

    /// Both components finite and inside the usual lat/lng ranges.
    pub fn is_valid(self) -> bool {
        self.lat_deg.is_finite()
            && self.lng_deg.is_finite()
            && (-90.0..=90.0).contains(&self.lat_deg)
            && (-180.0..=180.0).contains(&self.lng_deg)
    }

    /// Position on a sphere of the given radius, +Y up, matching the layout
    /// of the generated sphere meshes.
    pub fn to_sphere(self, radius: f64) -> Vec3 {
        let lat = self.lat_deg.to_radians();
        let lng = self.lng_deg.to_radians();
        Vec3::new(
            lat.cos() * lng.cos() * radius,
            lat.sin() * radius,
            lat.cos() * lng.sin() * radius,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Coordinates;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn equator_prime_meridian_is_plus_x() {
        let p = Coordinates::new(0.0, 0.0).to_sphere(2.0);
        assert_close(p.x, 2.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn north_pole_is_plus_y() {
        let p = Coordinates::new(90.0, 45.0).to_sphere(1.0);
        assert_close(p.y, 1.0, 1e-12);
    }

    #[test]
    fn validity_ranges() {
        assert!(Coordinates::new(51.5, -0.12).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::NAN).is_valid());
    }
}
