//! Column-major (WGSL) camera matrices.

use foundation::math::{Vec3, wrap_tau};
use scene::{CameraConfig, OrbitControls};

pub type Mat4 = [[f32; 4]; 4];

pub const MAT4_IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    // c = a * b
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

/// RH perspective with depth range [0, 1].
pub fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

pub fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize();
    let s = f.cross(up).normalize();
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}

/// Right-handed rotation about +Y.
pub fn mat4_rotation_y(rad: f64) -> Mat4 {
    let (s, c) = wrap_tau(rad).sin_cos();
    let (s, c) = (s as f32, c as f32);
    [
        [c, 0.0, -s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

pub fn mat4_uniform_scale(s: f32) -> Mat4 {
    [
        [s, 0.0, 0.0, 0.0],
        [0.0, s, 0.0, 0.0],
        [0.0, 0.0, s, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

pub fn mat4_transform_point(m: Mat4, p: Vec3) -> [f64; 4] {
    let v = [p.x as f32, p.y as f32, p.z as f32, 1.0];
    let mut out = [0.0f64; 4];
    for (row, slot) in out.iter_mut().enumerate() {
        *slot = (0..4).map(|col| m[col][row] * v[col]).sum::<f32>() as f64;
    }
    out
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_rad: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_rad: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            fov_y_rad,
            near,
            far,
        }
    }

    /// Camera at the orbit's eye, looking at the globe center.
    pub fn from_orbit(orbit: &OrbitControls, cfg: &CameraConfig) -> Self {
        Self::look_at(
            orbit.eye(),
            Vec3::ZERO,
            cfg.fov_deg.to_radians(),
            cfg.near,
            cfg.far,
        )
    }

    pub fn view(&self) -> Mat4 {
        mat4_look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f64) -> Mat4 {
        mat4_perspective_rh_z0(self.fov_y_rad, aspect.max(1e-6), self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f64) -> Mat4 {
        mat4_mul(self.projection(aspect), self.view())
    }
}

/// Width over height, falling back to square for a collapsed canvas.
pub fn aspect_ratio(width: f64, height: f64) -> f64 {
    if height <= 0.0 || width <= 0.0 {
        1.0
    } else {
        width / height
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Camera3D, MAT4_IDENTITY, aspect_ratio, mat4_mul, mat4_rotation_y, mat4_transform_point,
    };
    use foundation::math::Vec3;
    use scene::{CameraConfig, OrbitConfig, OrbitControls};

    #[test]
    fn origin_projects_to_screen_center_inside_depth_range() {
        let cfg = CameraConfig::default();
        let orbit = OrbitControls::new(OrbitConfig::default(), Vec3::from(cfg.position));
        let camera = Camera3D::from_orbit(&orbit, &cfg);
        let clip = mat4_transform_point(camera.view_proj(16.0 / 9.0), Vec3::ZERO);
        let ndc = [clip[0] / clip[3], clip[1] / clip[3], clip[2] / clip[3]];
        assert!(ndc[0].abs() < 1e-5 && ndc[1].abs() < 1e-5);
        assert!(ndc[2] > 0.0 && ndc[2] < 1.0);
    }

    #[test]
    fn point_behind_globe_is_further_than_front() {
        let camera = Camera3D::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 0.8, 0.1, 1000.0);
        let vp = camera.view_proj(1.0);
        let front = mat4_transform_point(vp, Vec3::new(0.0, 0.0, 2.0));
        let back = mat4_transform_point(vp, Vec3::new(0.0, 0.0, -2.0));
        assert!(front[2] / front[3] < back[2] / back[3]);
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_minus_z() {
        let p = mat4_transform_point(
            mat4_rotation_y(std::f64::consts::FRAC_PI_2),
            Vec3::new(1.0, 0.0, 0.0),
        );
        assert!(p[0].abs() < 1e-6);
        assert!((p[2] + 1.0).abs() < 1e-6);
        assert_eq!(mat4_mul(MAT4_IDENTITY, MAT4_IDENTITY), MAT4_IDENTITY);
    }

    #[test]
    fn collapsed_canvas_is_square() {
        assert_eq!(aspect_ratio(0.0, 0.0), 1.0);
        assert_eq!(aspect_ratio(200.0, 100.0), 2.0);
    }
}
