//! Owns the triangle arena, the emitter index, the spatial index, and the
//! background (sky/ground) emission. Immutable once built — see spec
//! design notes §9.

use crate::rng::UnitRng;
use crate::spatial_index::{SpatialIndex, TriangleRef};
use crate::triangle::Triangle;
use crate::vec3::{Color, Point3, Vec3};
use rand::RngCore;

pub struct Scene {
    triangles: Vec<Triangle>,
    emitters: Vec<TriangleRef>,
    index: SpatialIndex,
    sky_emission: Color,
    ground_reflection: Color,
}

impl Scene {
    /// `sky` is clamped to `[0, +inf)`; `ground_reflection_factor` is
    /// clamped to `[0,1]` and multiplied by `sky` to derive
    /// `ground_reflection` (spec §4.4).
    pub fn new(
        eye: Point3,
        triangles: Vec<Triangle>,
        sky: Color,
        ground_reflection_factor: Color,
    ) -> Self {
        let sky_emission = Color::new(sky.x.max(0.0), sky.y.max(0.0), sky.z.max(0.0));
        let ground_reflection = sky_emission.hadamard(ground_reflection_factor.clamped(0.0, 1.0));

        let emitters: Vec<TriangleRef> = triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_emitter())
            .map(|(i, _)| i)
            .collect();

        let index = SpatialIndex::build(eye, &triangles);

        Self {
            triangles,
            emitters,
            index,
            sky_emission,
            ground_reflection,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, idx: TriangleRef) -> &Triangle {
        &self.triangles[idx]
    }

    pub fn intersect(
        &self,
        origin: Point3,
        direction: Vec3,
        last_hit: Option<TriangleRef>,
    ) -> Option<(TriangleRef, Point3)> {
        self.index.intersect(origin, direction, last_hit, &self.triangles)
    }

    pub fn emitters_count(&self) -> usize {
        self.emitters.len()
    }

    /// Selects an emitter uniformly (`i = min(N-1, floor(rng * N))`) and
    /// samples a point on it. Returns `(position, triangle index)`; when
    /// there are no emitters, returns `(zero, None)`.
    pub fn sample_emitter(&self, rng: &mut dyn RngCore) -> (Point3, Option<TriangleRef>) {
        let n = self.emitters.len();
        if n == 0 {
            return (Point3::zero(), None);
        }
        let i = ((rng.next_open01() * n as f64) as usize).min(n - 1);
        let idx = self.emitters[i];
        let triangle = &self.triangles[idx];
        let r1 = rng.next_open01();
        let r2 = rng.next_open01();
        (triangle.sample_point(r1, r2), Some(idx))
    }

    /// The emission seen by a ray that leaves the scene entirely, given
    /// the direction it is heading *back along* (`back_dir`, typically
    /// `-rayDirection`): sky if it exits downward, ground reflection
    /// otherwise. The `< 0` test is strict, so a horizontal ray
    /// (`back_dir.y == 0`) sees ground reflection (spec §4.4, design
    /// notes open question (a)).
    pub fn default_emission(&self, back_dir: Vec3) -> Color {
        if back_dir.y < 0.0 {
            self.sky_emission
        } else {
            self.ground_reflection
        }
    }
}
