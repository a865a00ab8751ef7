use std::f64::consts::PI;
use std::sync::Arc;

use crate::{
    color::Color,
    constants::{RAY_EPSILON, WORLD_RADIUS},
    geometry::{normal::Normal, point::Point, traits::DotProduct, vector::Vector},
    intersection::PrimitiveIntersection,
    pdf::Pdf,
    ray::Ray,
    sampling::samplers::{Sample1d, Sample2d},
    sampling::sampling_fns::{cosine_sample_hemisphere, sample_disk, sample_sphere},
    shape::Shape,
};

#[derive(Debug)]
pub enum Light {
    Point {
        origin: Point,
        intensity: Color, /* Radiant flux per solid angle (W/sr) */
    },
    /// An emitting shape (quad or sphere). Emission is one-sided, from the
    /// side the shape normal points into.
    Area {
        shape: Arc<Shape>,
        emittance: Color,
    },
    /// Environment with constant radiance in every direction.
    UniformInfinite {
        radiance: Color,
    },
    /// Environment blending from `horizon` at the bottom to `zenith` at the
    /// top of the sky sphere.
    GradientInfinite {
        horizon: Color,
        zenith: Color,
    },
    /// Environment backed by an equirectangular radiance map, rotated by
    /// `rotation` radians around the vertical axis.
    ImageInfinite {
        pixels: Vec<Color>,
        width: usize,
        height: usize,
        rotation: f64,
    },
}

#[allow(non_snake_case)]
pub struct LightSample {
    pub Li: Color,
    pub w_i: Vector,
    pub pdf: Pdf,
    pub shadow_ray: Ray,
    /// The sampled point on the light; a far virtual point for infinite
    /// lights.
    pub location: Point,
    /// Surface normal at the sampled point.
    pub normal: Normal,
}

/// A sampled emission ray for starting light subpaths.
#[allow(non_snake_case)]
pub struct LightLeSample {
    pub Le: Color,
    pub ray: Ray,
    pub normal: Normal,
    pub pdf_pos: f64,
    pub pdf_dir: f64,
}

impl Light {
    pub fn new_image_infinite(image: &image::Rgb32FImage, rotation: f64) -> Light {
        Light::ImageInfinite {
            pixels: image
                .pixels()
                .map(|p| Color {
                    r: p.0[0] as f64,
                    g: p.0[1] as f64,
                    b: p.0[2] as f64,
                })
                .collect(),
            width: image.width() as usize,
            height: image.height() as usize,
            rotation,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, Light::Point { .. })
    }

    pub fn is_infinite(&self) -> bool {
        matches!(
            self,
            Light::UniformInfinite { .. }
                | Light::GradientInfinite { .. }
                | Light::ImageInfinite { .. }
        )
    }

    /// Samples the light arriving at `reference` from this light source.
    ///
    /// Returns the radiance, the direction it arrives from (pointing at the
    /// light), the density of that direction and the shadow ray to test.
    #[allow(non_snake_case)]
    pub fn sample_Li(&self, sample: Sample2d, reference: &Point) -> LightSample {
        match self {
            Light::Point { origin, intensity } => {
                let op = *origin - *reference;
                let dist_squared = op.magnitude_squared();
                let dist = dist_squared.sqrt();
                let w_i = op / dist;
                let mut shadow_ray = Ray::new(*reference, w_i);
                shadow_ray.update_max_distance(dist - RAY_EPSILON);

                LightSample {
                    Li: *intensity / dist_squared,
                    w_i,
                    pdf: Pdf::Delta,
                    shadow_ray,
                    location: *origin,
                    normal: Normal::from(-w_i),
                }
            }
            Light::Area { shape, emittance } => {
                let shape_sample = shape.sample_from(sample, reference);
                let distance = (shape_sample.location - *reference).magnitude();
                let mut shadow_ray = Ray::new(*reference, shape_sample.w_i);
                shadow_ray.update_max_distance(distance - RAY_EPSILON);

                // One-sided: no radiance arrives from behind the emitter
                let Li = if shape_sample.normal.dot(&shape_sample.w_i) < 0.0 {
                    *emittance
                } else {
                    Color::BLACK
                };
                LightSample {
                    Li,
                    w_i: shape_sample.w_i,
                    pdf: shape_sample.pdf,
                    shadow_ray,
                    location: shape_sample.location,
                    normal: shape_sample.normal,
                }
            }
            // The infinite variants sample the direction uniformly over the
            // sphere; anything unoccluded escapes to the environment
            _ => {
                let w_i = sample_sphere(sample);
                let shadow_ray = Ray::new(*reference, w_i);
                LightSample {
                    Li: self.radiance_towards(&w_i),
                    w_i,
                    pdf: Pdf::NonDelta(1.0 / (4.0 * PI)),
                    shadow_ray,
                    location: *reference + w_i * WORLD_RADIUS,
                    normal: Normal::from(-w_i),
                }
            }
        }
    }

    /// The solid-angle density `sample_Li` has for `w_i`, used when a BRDF
    /// sample happens to hit (or escape to) this light.
    #[allow(non_snake_case)]
    pub fn pdf_Li(&self, reference: &Point, w_i: &Vector) -> Pdf {
        match self {
            Light::Point { .. } => Pdf::Delta,
            Light::Area { shape, .. } => shape.pdf_from(reference, w_i),
            _ => Pdf::NonDelta(1.0 / (4.0 * PI)),
        }
    }

    /// Radiance emitted by an area light at an intersection on its shape,
    /// towards `w_o`. Back faces are dark.
    #[allow(non_snake_case)]
    pub fn L(&self, intersection: &PrimitiveIntersection, _w_o: &Vector) -> Color {
        match self {
            Light::Area { emittance, .. } => {
                if intersection.front_face {
                    *emittance
                } else {
                    Color::BLACK
                }
            }
            _ => Color::BLACK,
        }
    }

    /// Radiance along a ray that escaped the scene.
    #[allow(non_snake_case)]
    pub fn Le(&self, ray: &Ray) -> Color {
        match self {
            Light::Point { .. } | Light::Area { .. } => Color::BLACK,
            _ => self.radiance_towards(&ray.direction),
        }
    }

    // Environment radiance seen looking along `direction` (unit, away from
    // the scene).
    fn radiance_towards(&self, direction: &Vector) -> Color {
        match self {
            Light::UniformInfinite { radiance } => *radiance,
            Light::GradientInfinite { horizon, zenith } => {
                let t = 0.5 * (direction.y().clamp(-1.0, 1.0) + 1.0);
                Color::lerp(*horizon, *zenith, t)
            }
            Light::ImageInfinite {
                pixels,
                width,
                height,
                rotation,
            } => {
                let theta = direction.y().clamp(-1.0, 1.0).acos();
                let phi = direction.z().atan2(direction.x()) + rotation;
                let u = (0.5 + phi / (2.0 * PI)).rem_euclid(1.0);
                let v = theta / PI;
                let x = ((u * *width as f64) as usize).min(width - 1);
                let y = ((v * *height as f64) as usize).min(height - 1);
                pixels[y * width + x]
            }
            _ => Color::BLACK,
        }
    }

    /// Samples an emitted ray with its positional and directional densities,
    /// for starting light subpaths.
    pub fn sample_Le(
        &self,
        position_sample: Sample2d,
        direction_sample: Sample2d,
        world_center: Point,
        world_radius: f64,
    ) -> LightLeSample {
        match self {
            Light::Point { origin, intensity } => {
                let direction = sample_sphere(direction_sample);
                LightLeSample {
                    Le: *intensity,
                    ray: Ray::new(*origin, direction),
                    normal: Normal::from(direction),
                    pdf_pos: 1.0,
                    pdf_dir: 1.0 / (4.0 * PI),
                }
            }
            Light::Area { shape, emittance } => {
                let (location, normal, pdf_pos) = shape.sample_point(position_sample);
                let direction = cosine_sample_hemisphere(direction_sample, &normal);
                let cos_theta = direction.dot(&normal).max(0.0);
                LightLeSample {
                    Le: *emittance,
                    ray: Ray::new(location, direction),
                    normal,
                    pdf_pos,
                    pdf_dir: cos_theta / PI,
                }
            }
            _ => {
                // Direction first, then an origin on the disk of the world
                // sphere behind it
                let direction = sample_sphere(direction_sample);
                let (tangent, bitangent) = direction.generate_tangents();
                let (dx, dy) = sample_disk(position_sample);
                let origin = world_center + (tangent * dx + bitangent * dy) * world_radius
                    - direction * world_radius;
                LightLeSample {
                    Le: self.radiance_towards(&-direction),
                    ray: Ray::new(origin, direction),
                    normal: Normal::from(direction),
                    pdf_pos: 1.0 / (PI * world_radius * world_radius),
                    pdf_dir: 1.0 / (4.0 * PI),
                }
            }
        }
    }

    pub fn power(&self) -> Color {
        match self {
            Light::Point { intensity, .. } => *intensity * (4.0 * PI),
            Light::Area { shape, emittance } => *emittance * PI * shape.area(),
            Light::UniformInfinite { radiance } => {
                *radiance * PI * WORLD_RADIUS * WORLD_RADIUS
            }
            Light::GradientInfinite { horizon, zenith } => {
                (*horizon + *zenith) * 0.5 * PI * WORLD_RADIUS * WORLD_RADIUS
            }
            Light::ImageInfinite { pixels, .. } => {
                let mean = pixels.iter().copied().sum::<Color>() / pixels.len() as f64;
                mean * PI * WORLD_RADIUS * WORLD_RADIUS
            }
        }
    }
}

/// Picks lights proportional to their power, so bright emitters start more
/// light subpaths.
pub struct LightSampler {
    lights: Vec<Arc<Light>>,
    cdf: Vec<f64>,
    probabilities: Vec<f64>,
}

impl LightSampler {
    pub fn new(lights: &[Arc<Light>]) -> LightSampler {
        let mut weights: Vec<f64> = lights
            .iter()
            .map(|light| light.power().luminance().max(0.0))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            // Nothing emits measurable power; fall back to uniform
            weights = vec![1.0; lights.len()];
        }
        let total: f64 = weights.iter().sum::<f64>().max(f64::MIN_POSITIVE);

        let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();
        let mut running = 0.0;
        let cdf = probabilities
            .iter()
            .map(|p| {
                running += p;
                running
            })
            .collect();

        LightSampler {
            lights: lights.to_vec(),
            cdf,
            probabilities,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn sample(&self, sample: Sample1d) -> Option<(usize, &Arc<Light>, f64)> {
        if self.lights.is_empty() {
            return None;
        }
        let u = sample.take();
        let index = self
            .cdf
            .partition_point(|&cumulative| cumulative <= u)
            .min(self.lights.len() - 1);
        Some((index, &self.lights[index], self.probabilities[index]))
    }

    pub fn pdf(&self, index: usize) -> f64 {
        self.probabilities[index]
    }

    /// The selection probability for a light identified by pointer.
    pub fn pdf_of(&self, light: &Arc<Light>) -> f64 {
        self.lights
            .iter()
            .position(|l| Arc::ptr_eq(l, light))
            .map(|i| self.probabilities[i])
            .unwrap_or(0.0)
    }
}
