use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};

/// A ray with a unit direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    /// Point `t` units along the ray.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Primary ray for `pixel`, matching the kernel's `calculateRay`.
    ///
    /// `resolution_factor` is `1 / resolution_scale`, the same factor the
    /// kernel bakes in.
    pub fn from_screen(
        pixel: UVec2,
        dimensions: Vec2,
        resolution_factor: f32,
        camera: &Camera,
    ) -> Self {
        let uv = (pixel.as_vec2() * resolution_factor) / dimensions * 2.0 - 1.0;

        let origin = (camera.camera_to_world * Vec4::new(0.0, 0.0, 0.0, 1.0)).truncate();
        let mut direction = (camera.inverse_projection * Vec4::new(uv.x, uv.y, 0.0, 1.0)).truncate();

        direction /= direction.z.abs();

        let direction = (camera.camera_to_world * direction.extend(0.0)).truncate();
        Self { origin, direction: direction.normalize_or_zero() }
    }
}

/// The two matrices the kernel reads from its camera globals.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub camera_to_world: Mat4,
    pub inverse_projection: Mat4,
}

impl Camera {
    /// Right-handed perspective camera looking from `eye` at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, fov_y_radians: f32, aspect: f32) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let projection = Mat4::perspective_rh(fov_y_radians, aspect, 0.01, 1000.0);
        Self {
            camera_to_world: view.inverse(),
            inverse_projection: projection.inverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 60f32.to_radians(), 1.0)
    }

    #[test]
    fn center_pixel_looks_at_target() {
        let ray = Ray::from_screen(UVec2::new(50, 50), Vec2::new(100.0, 100.0), 1.0, &camera());
        assert!((ray.origin - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
        assert!((ray.direction - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn directions_are_unit_length() {
        let cam = camera();
        for (x, y) in [(0, 0), (99, 0), (0, 99), (37, 81)] {
            let ray = Ray::from_screen(UVec2::new(x, y), Vec2::new(100.0, 100.0), 1.0, &cam);
            assert!((ray.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn resolution_factor_scales_screen_position() {
        let cam = camera();
        let dims = Vec2::new(100.0, 100.0);
        let half = Ray::from_screen(UVec2::new(25, 25), dims, 2.0, &cam);
        let full = Ray::from_screen(UVec2::new(50, 50), dims, 1.0, &cam);
        assert!((half.direction - full.direction).length() < 1e-5);
    }

    #[test]
    fn at_walks_along_direction() {
        let r = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(r.at(3.0), Vec3::new(0.0, 0.0, -3.0));
    }
}
