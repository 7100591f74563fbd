use std::f64::consts::TAU;

use foundation::math::Vec3;

/// Inner radius of the star shell, far outside the zoom range.
pub const STAR_SHELL_RADIUS: f64 = 100.0;
pub const STAR_SHELL_DEPTH: f64 = 50.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Star {
    pub position: Vec3,
    /// Alpha in (0, 1); faint stars dominate.
    pub brightness: f32,
}

/// 32-bit integer mix with no visible correlation between neighbours.
pub fn hash_u32(x_in: u32) -> u32 {
    let mut x = x_in;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn hash01(x: u32) -> f64 {
    hash_u32(x) as f64 / u32::MAX as f64
}

/// Star `index`, the same on every call.
pub fn star(index: u32) -> Star {
    let u = hash01(index ^ 0x68bc_21eb);
    let v = hash01(index ^ 0x02e5_be93);
    let d = hash01(index ^ 0x1b87_3593);
    let b = hash01(index ^ 0x9e37_79b9) as f32;

    // Uniform on the sphere: z uniform in [-1, 1], angle uniform.
    let z = 1.0 - 2.0 * u;
    let ring = (1.0 - z * z).max(0.0).sqrt();
    let phi = v * TAU;
    let r = STAR_SHELL_RADIUS + STAR_SHELL_DEPTH * d;

    Star {
        position: Vec3::new(ring * phi.cos(), ring * phi.sin(), z).scale(r),
        brightness: 0.03 + 0.22 * b * b,
    }
}

pub fn starfield(count: u32) -> impl Iterator<Item = Star> {
    (0..count).map(star)
}

#[cfg(test)]
mod tests {
    use super::{STAR_SHELL_DEPTH, STAR_SHELL_RADIUS, star, starfield};

    #[test]
    fn stars_are_deterministic_and_on_the_shell() {
        assert_eq!(star(17), star(17));
        assert_ne!(star(17), star(18));
        for s in starfield(1200) {
            let r = s.position.length();
            assert!(r >= STAR_SHELL_RADIUS - 1e-9);
            assert!(r <= STAR_SHELL_RADIUS + STAR_SHELL_DEPTH + 1e-9);
            assert!(s.brightness > 0.0 && s.brightness < 1.0);
        }
    }

    #[test]
    fn stars_cover_both_hemispheres() {
        let above = starfield(1200).filter(|s| s.position.y > 0.0).count();
        assert!(above > 400 && above < 800, "{above}");
    }
}
