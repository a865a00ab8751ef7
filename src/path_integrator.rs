use crate::{
    color::Color,
    geometry::{point::Point, traits::DotProduct},
    light::LightSample,
    material::Scatter,
    pdf::Pdf,
    ray::Ray,
    sampling::{samplers::TileSampler, sampling_fns::power_heuristic},
    scene::Scene,
};

/// Estimates the radiance arriving along `ray` by unidirectional path
/// tracing with next-event estimation. Light sampling and BRDF sampling are
/// combined with the power-2 heuristic; perfectly specular bounces bypass
/// MIS since no light sample could have produced them.
#[allow(non_snake_case)]
pub fn estimate_Li(
    sampler: &mut TileSampler,
    mut ray: Ray,
    scene: &Scene,
    sample_index: usize,
    rr_min_bounces: usize,
    rr_min_samples: usize,
) -> Color {
    let mut L = Color::BLACK;
    let mut beta = Color::WHITE;
    let mut bounces = 0;
    // Initially true as a convenience: camera rays share the special cases
    // of specular bounces (no preceding light sample to pair with)
    let mut is_specular_bounce = true;
    let mut prev_bsdf_pdf = 0.0;
    let mut prev_location: Option<Point> = None;

    while bounces < scene.sampling_config.max_depth && !beta.is_black() {
        // Both `w_o` and `w_i` point away from the surface
        let w_o = -ray.direction;

        let intersection = match scene.intersect(&mut ray) {
            Some(intersection) => intersection,
            None => {
                // The path escaped: account for infinite lights, weighted
                // against the light sample that could have found them
                for light in &scene.lights {
                    let Le = light.Le(&ray);
                    if Le.is_black() {
                        continue;
                    }
                    if is_specular_bounce {
                        L += beta * Le;
                    } else {
                        let light_pdf = light
                            .pdf_Li(&prev_location.unwrap(), &ray.direction)
                            .value_or(0.0);
                        let weight = power_heuristic(1, prev_bsdf_pdf, 1, light_pdf);
                        L += beta * Le * weight;
                    }
                }
                break;
            }
        };

        // Emission when a BRDF sample lands on an emitter. After a specular
        // bounce the light could not have been sampled, so the full
        // contribution goes through this path
        let Le = intersection.Le(&w_o);
        if !Le.is_black() {
            if is_specular_bounce {
                L += beta * Le;
            } else {
                let light_pdf = intersection
                    .primitive
                    .get_area_light()
                    .map(|light| {
                        light
                            .pdf_Li(&prev_location.unwrap(), &ray.direction)
                            .value_or(0.0)
                    })
                    .unwrap_or(0.0);
                let weight = power_heuristic(1, prev_bsdf_pdf, 1, light_pdf);
                L += beta * Le * weight;
            }
        }

        let material = intersection.material();

        // Next-event estimation against every light with a finite density
        if material.has_non_specular() {
            for light in &scene.lights {
                let LightSample {
                    Li,
                    w_i,
                    pdf: light_pdf,
                    shadow_ray,
                    ..
                } = light.sample_Li(sampler.sample_2d(), &intersection.location);
                if Li.is_black() {
                    continue;
                }

                let f = material.f(&w_o, &w_i, &intersection.normal);
                if f.is_black() {
                    continue;
                }
                let cos_theta = w_i.dot(&intersection.normal).abs();

                match light_pdf {
                    Pdf::Delta => {
                        if !scene.intersects(&shadow_ray) {
                            L += beta * Li * f * cos_theta;
                        }
                    }
                    Pdf::NonDelta(light_pdf) => {
                        if light_pdf > 0.0 && !scene.intersects(&shadow_ray) {
                            let bsdf_pdf = material
                                .pdf(&w_o, &w_i, &intersection.normal)
                                .value_or(0.0);
                            let weight = power_heuristic(1, light_pdf, 1, bsdf_pdf);
                            L += beta * Li * f * cos_theta * weight / light_pdf;
                        }
                    }
                }
            }
        }

        // Sample the material for the next direction
        match material.scatter(&ray, &intersection, sampler) {
            Scatter::Absorbed => break,
            Scatter::Specular {
                ray: scattered,
                attenuation,
            } => {
                beta = beta * attenuation;
                ray = scattered;
                is_specular_bounce = true;
                prev_bsdf_pdf = 0.0;
            }
            Scatter::Diffuse {
                ray: scattered,
                attenuation,
                pdf,
            } => {
                if pdf <= 0.0 || attenuation.is_black() {
                    break;
                }
                beta = beta * attenuation / pdf;
                ray = scattered;
                is_specular_bounce = false;
                prev_bsdf_pdf = pdf;
            }
        }
        prev_location = Some(intersection.location);

        // Russian roulette, once the path is long enough and early samples
        // (which feed the adaptive estimate) are done
        if bounces >= rr_min_bounces && sample_index >= rr_min_samples {
            let q = beta.max_component().clamp(0.05, 0.95);
            if sampler.sample_1d().take() >= q {
                break;
            }
            beta = beta / q;
        }

        bounces += 1;
    }

    L
}
