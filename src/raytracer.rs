//! The recursive radiance estimator: path tracing with next-event
//! (emitter) sampling, Russian-roulette termination, and shadow testing.

use crate::rng::UnitRng;
use crate::scene::Scene;
use crate::spatial_index::TriangleRef;
use crate::surface_point::SurfacePoint;
use crate::vec3::{Color, Point3, Vec3};
use rand::RngCore;

pub struct RayTracer<'a> {
    pub scene: &'a Scene,
}

impl<'a> RayTracer<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Estimates the radiance arriving at `origin` from direction `direction`.
    /// `last_hit` is the triangle the ray originated from (to skip
    /// self-intersection); `None` marks a primary ray from the camera.
    pub fn get_radiance(
        &self,
        origin: Point3,
        direction: Vec3,
        rng: &mut dyn RngCore,
        last_hit: Option<TriangleRef>,
    ) -> Color {
        let Some((hit_idx, position)) = self.scene.intersect(origin, direction, last_hit) else {
            return self.scene.default_emission(-direction);
        };

        let triangle = self.scene.triangle(hit_idx);
        let surface = SurfacePoint::new(hit_idx, triangle, position);

        // Emission is counted directly only on the first bounce from the
        // camera; on later bounces it is accounted for via emitter
        // sampling (sampleEmitters) to avoid double-counting.
        let local_emission = if last_hit.is_none() {
            surface.emission(origin, -direction, false)
        } else {
            Color::zero()
        };

        let emitter_contribution = self.sample_emitters(&surface, direction, rng);

        let (next_dir, color) = surface.next_direction(rng, -direction);
        let indirect = if next_dir != Vec3::zero() {
            color.hadamard(self.get_radiance(surface.position, next_dir, rng, Some(hit_idx)))
        } else {
            Color::zero()
        };

        local_emission + emitter_contribution + indirect
    }

    /// Next-event estimation: samples one emitter, shadow-tests it, and
    /// returns the reflected contribution weighted by the emitter count
    /// (the correction for uniform selection among emitters).
    fn sample_emitters(
        &self,
        surface: &SurfacePoint,
        direction: Vec3,
        rng: &mut dyn RngCore,
    ) -> Color {
        let emitters_count = self.scene.emitters_count();
        if emitters_count == 0 {
            return Color::zero();
        }

        let (emitter_pos, emitter_idx) = self.scene.sample_emitter(rng);
        let Some(emitter_idx) = emitter_idx else {
            return Color::zero();
        };

        let emitter_dir = (emitter_pos - surface.position).unit();

        // Shadowed unless the shadow ray either hits nothing or hits the
        // chosen emitter itself — a shadow-ray hit on any *other* triangle,
        // including one nearer than the emitter, counts as shadowed. This
        // preserves the reference's disambiguation rule even when a
        // nearer occluder shares the emitter's plane (spec design notes
        // §9 open question (b): do not attempt a cleverer test).
        let shadow_hit = self
            .scene
            .intersect(surface.position, emitter_dir, Some(surface.index));

        let is_unshadowed = match shadow_hit {
            None => true,
            Some((hit_idx, _)) => hit_idx == emitter_idx,
        };

        let emission_in = if is_unshadowed {
            let emitter_triangle = self.scene.triangle(emitter_idx);
            SurfacePoint::new(emitter_idx, emitter_triangle, emitter_pos)
                .emission(surface.position, -emitter_dir, true)
        } else {
            Color::zero()
        };

        surface.reflection(
            emitter_dir,
            emission_in * emitters_count as f64,
            -direction,
        )
    }
}
