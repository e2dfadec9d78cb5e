use crate::constants::TRIANGLE_EPSILON;
use crate::constants::TRIANGLE_TOLERANCE;
use crate::vec3::{Aabb, Color, Point3, Vec3};

/// An immutable triangle: geometry plus the two surface qualities
/// (reflectivity, emissivity) the shading model reads at a hit point.
///
/// Constructed once from the model file and never mutated afterward — see
/// spec design notes §9, "Immutable-by-construction types".
#[derive(Debug, Clone)]
pub struct Triangle {
    pub v0: Point3,
    pub v1: Point3,
    pub v2: Point3,
    pub reflectivity: Color,
    pub emissivity: Color,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub area: f64,
    bound: Aabb,
}

impl Triangle {
    /// `reflectivity` is clamped to `[0,1]^3`; `emissivity` is clamped to
    /// `[0, +inf)^3`. Both clamps happen here, once, at construction —
    /// nothing downstream needs to re-check these ranges.
    pub fn new(v0: Point3, v1: Point3, v2: Point3, reflectivity: Color, emissivity: Color) -> Self {
        let tangent = (v1 - v0).unit();
        let normal = tangent.cross(v2 - v1).unit();
        let area = 0.5 * (v1 - v0).cross(v2 - v1).length();

        let mut lo = v2;
        let mut hi = v2;
        for v in [v0, v1, v2] {
            lo = lo.min_component(v);
            hi = hi.max_component(v);
        }
        let bound = Aabb::new(lo, hi).expanded(TRIANGLE_TOLERANCE);

        Self {
            v0,
            v1,
            v2,
            reflectivity: reflectivity.clamped(0.0, 1.0),
            emissivity: Color::new(
                emissivity.x.max(0.0),
                emissivity.y.max(0.0),
                emissivity.z.max(0.0),
            ),
            tangent,
            normal,
            area,
            bound,
        }
    }

    pub fn bound(&self) -> Aabb {
        self.bound
    }

    /// A triangle is an emitter iff it has non-zero emissivity and
    /// positive area (zero-area triangles cannot be area-sampled).
    pub fn is_emitter(&self) -> bool {
        self.area > 0.0 && self.emissivity != Color::zero()
    }

    /// Möller–Trumbore ray/triangle intersection. Returns the hit distance
    /// `t >= 0` or `None`; both triangle faces are intersectable (no
    /// back-face culling — orientation is resolved at shading time by
    /// [`crate::surface_point::SurfacePoint`]).
    pub fn intersect(&self, origin: Point3, direction: Vec3) -> Option<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let p = direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < TRIANGLE_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = origin - self.v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(e1);
        let v = direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(q) * inv_det;
        if t >= 0.0 {
            Some(t)
        } else {
            None
        }
    }

    /// Uniform area sampling via the standard square-root barycentric
    /// transform: `s = sqrt(r1)`, `(a, b) = (1 - s, (1 - r2) * s)`.
    pub fn sample_point(&self, r1: f64, r2: f64) -> Point3 {
        let s = r1.sqrt();
        let a = 1.0 - s;
        let b = (1.0 - r2) * s;
        self.v0 + (self.v1 - self.v0) * a + (self.v2 - self.v0) * b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> Triangle {
        Triangle::new(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Color::new(0.5, 0.5, 0.5),
            Color::zero(),
        )
    }

    #[test]
    fn intersect_hits_center() {
        let t = tri();
        let hit = t.intersect(Point3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(hit.is_some());
        assert!((hit.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn intersect_parallel_ray_misses() {
        let t = tri();
        // direction lies in the triangle's plane (z=0): det ~ 0.
        let hit = t.intersect(Point3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(hit.is_none());
    }

    #[test]
    fn intersect_outside_edges_misses() {
        let t = tri();
        let hit = t.intersect(Point3::new(5.0, 5.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn intersect_behind_origin_misses() {
        let t = tri();
        let hit = t.intersect(Point3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn reflectivity_clamped_to_unit_cube() {
        let t = Triangle::new(
            Point3::zero(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Color::new(2.0, -1.0, 0.5),
            Color::new(-1.0, 3.0, 0.0),
        );
        assert_eq!(t.reflectivity, Color::new(1.0, 0.0, 0.5));
        assert_eq!(t.emissivity, Color::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn bound_encloses_vertices_with_tolerance() {
        let t = tri();
        let b = t.bound();
        for v in [t.v0, t.v1, t.v2] {
            for i in 0..3 {
                assert!(b.lo[i] <= v[i] + 1e-15);
                assert!(b.hi[i] >= v[i] - 1e-15);
            }
        }
    }

    #[test]
    fn zero_area_or_zero_emissivity_is_not_emitter() {
        let t = tri();
        assert!(!t.is_emitter());
        let degenerate = Triangle::new(
            Point3::zero(),
            Point3::zero(),
            Point3::new(1.0, 0.0, 0.0),
            Color::zero(),
            Color::ones(),
        );
        assert!(!degenerate.is_emitter());
    }

    #[test]
    fn nonzero_emissivity_and_area_is_emitter() {
        let t = Triangle::new(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Color::zero(),
            Color::new(1.0, 1.0, 1.0),
        );
        assert!(t.is_emitter());
    }
}
