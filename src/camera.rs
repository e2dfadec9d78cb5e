//! Pinhole camera: builds its local frame once at construction, then
//! generates a full frame of jittered primary rays per call to
//! [`Camera::get_frame`] — one call is one progressive iteration.

use crate::image::Image;
use crate::raytracer::RayTracer;
use crate::rng::UnitRng;
use crate::scene::Scene;
use crate::vec3::{Point3, Vec3};
use rand::RngCore;

const MIN_VIEW_ANGLE_DEGREES: f64 = 10.0;
const MAX_VIEW_ANGLE_DEGREES: f64 = 160.0;

/// An immutable camera: position, orthonormal view frame, and half-angle.
pub struct Camera {
    view_position: Point3,
    view_direction: Vec3,
    right: Vec3,
    up: Vec3,
    view_angle_radians: f64,
}

impl Camera {
    /// `view_direction` is normalized; a zero vector falls back to
    /// `(0, 0, 1)`. `view_angle_degrees` is clamped to `[10, 160]`.
    ///
    /// Frame construction: `right = unit(Y × viewDir)`. If `viewDir` is
    /// parallel to Y, `right` comes out zero, so fall back to
    /// `up = (0, 0, ±1)` with the sign opposite `viewDir.y`, and derive
    /// `right = unit(up × viewDir)` from that instead. Either way, the
    /// final `up = unit(viewDir × right)`.
    pub fn new(view_position: Point3, view_direction: Vec3, view_angle_degrees: f64) -> Self {
        let view_direction = {
            let d = view_direction.unit();
            if d == Vec3::zero() {
                Vec3::new(0.0, 0.0, 1.0)
            } else {
                d
            }
        };

        let mut right = Vec3::unit_y().cross(view_direction).unit();
        if right == Vec3::zero() {
            let fallback_up = Vec3::new(0.0, 0.0, if view_direction.y > 0.0 { -1.0 } else { 1.0 });
            right = fallback_up.cross(view_direction).unit();
        }
        let up = view_direction.cross(right).unit();

        let view_angle_radians = view_angle_degrees
            .clamp(MIN_VIEW_ANGLE_DEGREES, MAX_VIEW_ANGLE_DEGREES)
            .to_radians();

        Self {
            view_position,
            view_direction,
            right,
            up,
            view_angle_radians,
        }
    }

    /// Renders one full progressive iteration: a jittered sample per pixel,
    /// accumulated into `image`. Row-major pixel order, as in the spec.
    pub fn get_frame(&self, scene: &Scene, rng: &mut dyn RngCore, image: &mut Image) {
        let ray_tracer = RayTracer::new(scene);
        let (width, height) = image.dimensions();

        for y in 0..height {
            for x in 0..width {
                let xc = (x as f64 + rng.next_open01()) * 2.0 / width as f64 - 1.0;
                let yc = (y as f64 + rng.next_open01()) * 2.0 / height as f64 - 1.0;

                let offset = self.right * xc + self.up * (yc * (height as f64 / width as f64));
                let sample_direction =
                    (self.view_direction + offset * (self.view_angle_radians / 2.0).tan()).unit();

                let radiance =
                    ray_tracer.get_radiance(self.view_position, sample_direction, rng, None);
                image.add_to_pixel(x, y, radiance);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_orthonormal_for_generic_view_direction() {
        let cam = Camera::new(Point3::zero(), Vec3::new(0.3, -0.2, 1.0), 50.0);
        assert!((cam.right.length() - 1.0).abs() < 1e-9);
        assert!((cam.up.length() - 1.0).abs() < 1e-9);
        assert!(cam.right.dot(cam.up).abs() < 1e-9);
        assert!(cam.right.dot(cam.view_direction).abs() < 1e-9);
        assert!(cam.up.dot(cam.view_direction).abs() < 1e-9);
    }

    #[test]
    fn view_direction_parallel_to_y_falls_back() {
        let cam = Camera::new(Point3::zero(), Vec3::new(0.0, 1.0, 0.0), 50.0);
        assert!((cam.right.length() - 1.0).abs() < 1e-9);
        assert!((cam.up.length() - 1.0).abs() < 1e-9);
        assert!(cam.right.dot(cam.up).abs() < 1e-9);
    }

    #[test]
    fn view_angle_is_clamped() {
        let narrow = Camera::new(Point3::zero(), Vec3::new(0.0, 0.0, 1.0), 1.0);
        let wide = Camera::new(Point3::zero(), Vec3::new(0.0, 0.0, 1.0), 179.0);
        assert!((narrow.view_angle_radians - MIN_VIEW_ANGLE_DEGREES.to_radians()).abs() < 1e-9);
        assert!((wide.view_angle_radians - MAX_VIEW_ANGLE_DEGREES.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn zero_view_direction_falls_back_to_plus_z() {
        let cam = Camera::new(Point3::zero(), Vec3::zero(), 50.0);
        assert_eq!(cam.view_direction, Vec3::new(0.0, 0.0, 1.0));
    }
}
