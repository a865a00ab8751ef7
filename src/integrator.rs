use crate::{
    bdpt_integrator, color::Color, film::Splat, path_integrator,
    sampling::samplers::TileSampler, scene::Scene,
};

/// The two pixel-sample estimators the renderer can drive. Both are
/// unbiased; they differ in which light transport paths they find cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrator {
    PathTracing,
    Bdpt,
}

/// Per-path knobs owned by the render config rather than the scene.
#[derive(Debug, Clone, Copy)]
pub struct PathSettings {
    pub rr_min_bounces: usize,
    pub rr_min_samples: usize,
}

impl Integrator {
    /// Produces one radiance estimate for pixel (x, y). BDPT may append
    /// splats for other pixels; path tracing never does.
    #[allow(clippy::too_many_arguments)]
    #[allow(non_snake_case)]
    pub fn estimate_Li(
        &self,
        sampler: &mut TileSampler,
        scene: &Scene,
        x: usize,
        y: usize,
        sample_index: usize,
        sample_in_pass: u32,
        settings: &PathSettings,
        splats: &mut Vec<Splat>,
    ) -> Color {
        match self {
            Integrator::PathTracing => {
                let ray = scene
                    .camera
                    .generate_ray(x, y, sampler.sample_2d(), sampler.sample_2d());
                path_integrator::estimate_Li(
                    sampler,
                    ray,
                    scene,
                    sample_index,
                    settings.rr_min_bounces,
                    settings.rr_min_samples,
                )
            }
            Integrator::Bdpt => {
                bdpt_integrator::estimate_Li(sampler, x, y, scene, sample_in_pass, splats)
            }
        }
    }
}
