use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{
    bounds::Bounds,
    bvh::Bvh,
    camera::Camera,
    color::Color,
    constants::WORLD_RADIUS,
    geometry::point::Point,
    intersection::PrimitiveIntersection,
    light::{Light, LightSampler},
    primitive::Primitive,
    ray::Ray,
};

/// Integration limits that belong to the scene: changing them changes what
/// the image converges to.
#[derive(Debug, Clone, Copy)]
pub struct SamplingConfig {
    pub max_depth: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig { max_depth: 8 }
    }
}

/// Everything the integrators need, bundled and immutable: geometry behind
/// a BVH, the lights, the camera and the sampling configuration. Shared
/// read-only across workers for the duration of a render.
pub struct Scene {
    pub bvh: Bvh,
    pub lights: Vec<Arc<Light>>,
    pub light_sampler: LightSampler,
    pub camera: Camera,
    pub sampling_config: SamplingConfig,
    fingerprint: u64,
}

impl Scene {
    pub fn new(
        primitives: Vec<Arc<Primitive>>,
        lights: Vec<Arc<Light>>,
        camera: Camera,
        sampling_config: SamplingConfig,
    ) -> Scene {
        let bvh = Bvh::new(primitives);
        let light_sampler = LightSampler::new(&lights);

        let mut hasher = DefaultHasher::new();
        bvh.primitive_count().hash(&mut hasher);
        lights.len().hash(&mut hasher);
        sampling_config.max_depth.hash(&mut hasher);
        camera.hash_into(&mut hasher);
        let fingerprint = hasher.finish();

        Scene {
            bvh,
            lights,
            light_sampler,
            camera,
            sampling_config,
            fingerprint,
        }
    }

    pub fn film_bounds(&self) -> (usize, usize) {
        self.camera.film_bounds()
    }

    pub fn primitive_count(&self) -> usize {
        self.bvh.primitive_count()
    }

    /// A stable identifier for the scene contents, mixed into the per-tile
    /// RNG seeds.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn intersect(&self, ray: &mut Ray) -> Option<PrimitiveIntersection> {
        self.bvh.intersect(ray)
    }

    /// Whether the (bounded) ray is occluded by any primitive.
    pub fn intersects(&self, ray: &Ray) -> bool {
        self.bvh.intersects(ray)
    }

    /// Combined radiance of the infinite lights along an escaped ray.
    pub fn background(&self, ray: &Ray) -> Color {
        self.lights.iter().map(|light| light.Le(ray)).sum()
    }

    /// Centre and radius of a sphere conservatively containing the scene
    /// geometry, for placing infinite light emission origins.
    pub fn world_sphere(&self) -> (Point, f64) {
        let bounds = self.bvh.bounds();
        if bounds == Bounds::EMPTY {
            return (Point::O, WORLD_RADIUS);
        }
        let radius = (bounds.diagonal().magnitude() / 2.0).max(1.0);
        (bounds.centroid(), radius * 2.0)
    }
}
