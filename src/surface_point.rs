//! The local BRDF/emission contract evaluated at a ray hit: front-face
//! emission toward a query point, Lambertian reflection, and cosine-
//! weighted next-direction sampling with Russian-roulette termination.

use crate::rng::UnitRng;
use crate::spatial_index::TriangleRef;
use crate::triangle::Triangle;
use crate::vec3::{Color, Point3, Vec3};
use rand::RngCore;
use std::f64::consts::PI;

/// A value type representing a ray/triangle hit: which triangle, and
/// where on it. All direction parameters accepted by its methods are unit
/// vectors pointing *away* from the surface. `index` is the triangle's
/// identity within the owning scene's arena — used for `lastHit`
/// comparisons and emitter-vs-occluder disambiguation (spec §5:
/// "Triangle identity — not value equality").
pub struct SurfacePoint<'a> {
    pub index: TriangleRef,
    pub triangle: &'a Triangle,
    pub position: Point3,
}

impl<'a> SurfacePoint<'a> {
    pub fn new(index: TriangleRef, triangle: &'a Triangle, position: Point3) -> Self {
        Self {
            index,
            triangle,
            position,
        }
    }

    /// Emission from this surface point toward `to_position`, as seen
    /// along `out_dir` (unit, away from the surface). When
    /// `is_solid_angle` is set, the result is projected-solid-angle
    /// weighted (used for next-event estimation); otherwise it is the
    /// raw emissivity (used for first-bounce emission seen directly by
    /// the camera).
    pub fn emission(&self, to_position: Point3, out_dir: Vec3, is_solid_angle: bool) -> Color {
        let ray = to_position - self.position;
        let distance_sq = ray.length_squared();
        let cos_area = out_dir.dot(self.triangle.normal) * self.triangle.area;

        if cos_area <= 0.0 {
            return Color::zero();
        }

        if is_solid_angle {
            let solid_angle = cos_area / distance_sq.max(1e-6);
            self.triangle.emissivity * solid_angle
        } else {
            self.triangle.emissivity
        }
    }

    /// Lambertian BRDF evaluation: `L_in * reflectivity * (|cos θ_i| / π)`,
    /// zero if `in_dir` and `out_dir` are on opposite sides of the surface.
    pub fn reflection(&self, in_dir: Vec3, in_radiance: Color, out_dir: Vec3) -> Color {
        let normal = self.triangle.normal;
        let cos_in = in_dir.dot(normal);
        let cos_out = out_dir.dot(normal);

        if -cos_in * cos_out > 0.0 {
            return Color::zero();
        }

        in_radiance.hadamard(self.triangle.reflectivity) * (cos_in.abs() / PI)
    }

    /// Samples a next path direction with Russian-roulette termination on
    /// mean reflectivity. Returns `(direction, color)`; `direction` is the
    /// zero vector when the path terminates (in which case `color` is
    /// also zero and must not be used).
    pub fn next_direction(&self, rng: &mut dyn RngCore, in_dir: Vec3) -> (Vec3, Color) {
        let reflectivity = self.triangle.reflectivity;
        let mean_reflectivity = reflectivity.dot(Vec3::ones()) / 3.0;

        if rng.next_open01() >= mean_reflectivity {
            return (Vec3::zero(), Color::zero());
        }
        let color = reflectivity / mean_reflectivity;

        let r1 = rng.next_open01();
        let r2 = rng.next_open01();
        let phi = 2.0 * PI * r1;
        let s = r2.sqrt();
        let local = Vec3::new(phi.cos() * s, phi.sin() * s, (1.0 - r2).sqrt());

        let mut n = self.triangle.normal;
        if n.dot(in_dir) < 0.0 {
            n = -n;
        }
        let t = self.triangle.tangent;
        let bitangent = n.cross(t);

        let direction = t * local.x + bitangent * local.y + n * local.z;
        (direction, color)
    }
}
