use std::f64::consts::FRAC_1_PI;
use std::sync::Arc;

use crate::{
    color::Color,
    geometry::{normal::Normal, traits::DotProduct, vector::Vector},
    intersection::PrimitiveIntersection,
    pdf::Pdf,
    ray::Ray,
    sampling::samplers::TileSampler,
    sampling::sampling_fns::{cosine_sample_hemisphere, sample_sphere},
};

/// The result of scattering a ray at a surface.
#[derive(Debug)]
pub enum Scatter {
    /// No outgoing ray; the interaction only contributes emission.
    Absorbed,
    /// A single deterministic outgoing ray. The density is a Dirac delta,
    /// which MIS must treat specially.
    Specular { ray: Ray, attenuation: Color },
    /// A sampled outgoing ray with attenuation = BRDF * cos(theta) and the
    /// finite density of having sampled it.
    Diffuse {
        ray: Ray,
        attenuation: Color,
        pdf: f64,
    },
}

#[derive(Debug)]
pub enum Material {
    Lambertian {
        albedo: Color,
    },
    Metal {
        albedo: Color,
        fuzz: f64,
    },
    Dielectric {
        eta: f64,
        transmittance: Color,
    },
    Emissive {
        emittance: Color,
    },
    /// Delegates to one of two materials with a probability split.
    Mix {
        a: Arc<Material>,
        b: Arc<Material>,
        weight: f64,
    },
}

impl Material {
    pub fn new_lambertian(albedo: Color) -> Material {
        Material::Lambertian { albedo }
    }

    pub fn new_metal(albedo: Color, fuzz: f64) -> Material {
        Material::Metal {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn new_dielectric(eta: f64) -> Material {
        Material::Dielectric {
            eta,
            transmittance: Color::WHITE,
        }
    }

    pub fn new_emissive(emittance: Color) -> Material {
        Material::Emissive { emittance }
    }

    pub fn new_mix(a: Arc<Material>, b: Arc<Material>, weight: f64) -> Material {
        Material::Mix {
            a,
            b,
            weight: weight.clamp(0.0, 1.0),
        }
    }

    pub fn scatter(
        &self,
        ray_in: &Ray,
        intersection: &PrimitiveIntersection,
        sampler: &mut TileSampler,
    ) -> Scatter {
        // The intersection normal is already oriented against the ray
        let normal = intersection.normal;
        match self {
            Material::Lambertian { albedo } => {
                let w_i = cosine_sample_hemisphere(sampler.sample_2d(), &normal);
                let cos_theta = w_i.dot(&normal);
                if cos_theta <= 0.0 {
                    return Scatter::Absorbed;
                }
                Scatter::Diffuse {
                    ray: Ray::new(intersection.location, w_i),
                    attenuation: *albedo * (cos_theta * FRAC_1_PI),
                    pdf: cos_theta * FRAC_1_PI,
                }
            }
            Material::Metal { albedo, fuzz } => {
                let reflected = reflect(&ray_in.direction, &normal);
                let w_i = if *fuzz > 0.0 {
                    let perturbed = reflected + sample_sphere(sampler.sample_2d()) * *fuzz;
                    let magnitude = perturbed.magnitude();
                    if magnitude < 1e-12 {
                        return Scatter::Absorbed;
                    }
                    perturbed / magnitude
                } else {
                    reflected
                };
                // Perturbation can push the ray below the surface
                if w_i.dot(&normal) <= 0.0 {
                    return Scatter::Absorbed;
                }
                Scatter::Specular {
                    ray: Ray::new(intersection.location, w_i),
                    attenuation: *albedo,
                }
            }
            Material::Dielectric { eta, transmittance } => {
                let eta_relative = if intersection.front_face {
                    1.0 / eta
                } else {
                    *eta
                };
                let cos_theta = (-ray_in.direction).dot(&normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

                let cannot_refract = eta_relative * sin_theta > 1.0;
                let w_i = if cannot_refract
                    || sampler.sample_1d().take() < schlick(cos_theta, eta_relative)
                {
                    reflect(&ray_in.direction, &normal)
                } else {
                    refract(&ray_in.direction, &normal, cos_theta, eta_relative)
                };
                Scatter::Specular {
                    ray: Ray::new(intersection.location, w_i.normalized()),
                    attenuation: *transmittance,
                }
            }
            Material::Emissive { .. } => Scatter::Absorbed,
            Material::Mix { a, b, weight } => {
                let chosen = if sampler.sample_1d().take() < *weight {
                    a
                } else {
                    b
                };
                match chosen.scatter(ray_in, intersection, sampler) {
                    Scatter::Diffuse { ray, .. } => {
                        // Replace the component's terms with the mixture's so
                        // MIS sees consistent densities
                        let w_o = -ray_in.direction;
                        let cos_theta = ray.direction.dot(&normal).abs();
                        let f = self.f(&w_o, &ray.direction, &normal);
                        let pdf = self.pdf(&w_o, &ray.direction, &normal).value_or(0.0);
                        if pdf <= 0.0 {
                            return Scatter::Absorbed;
                        }
                        Scatter::Diffuse {
                            ray,
                            attenuation: f * cos_theta,
                            pdf,
                        }
                    }
                    other => other,
                }
            }
        }
    }

    /// The BRDF value for a pair of directions, both pointing away from the
    /// surface. Zero for perfectly specular materials.
    pub fn f(&self, w_o: &Vector, w_i: &Vector, normal: &Normal) -> Color {
        match self {
            Material::Lambertian { albedo } => {
                if normal.same_hemisphere(w_o, w_i) {
                    *albedo * FRAC_1_PI
                } else {
                    Color::BLACK
                }
            }
            Material::Metal { .. } | Material::Dielectric { .. } | Material::Emissive { .. } => {
                Color::BLACK
            }
            Material::Mix { a, b, weight } => {
                a.f(w_o, w_i, normal) * *weight + b.f(w_o, w_i, normal) * (1.0 - *weight)
            }
        }
    }

    /// The density of `scatter` proposing `w_i` given `w_o`.
    pub fn pdf(&self, w_o: &Vector, w_i: &Vector, normal: &Normal) -> Pdf {
        match self {
            Material::Lambertian { .. } => {
                if normal.same_hemisphere(w_o, w_i) {
                    Pdf::NonDelta(w_i.dot(normal).abs() * FRAC_1_PI)
                } else {
                    Pdf::NonDelta(0.0)
                }
            }
            Material::Metal { .. } | Material::Dielectric { .. } => Pdf::Delta,
            Material::Emissive { .. } => Pdf::NonDelta(0.0),
            Material::Mix { a, b, weight } => {
                let pdf_a = a.pdf(w_o, w_i, normal);
                let pdf_b = b.pdf(w_o, w_i, normal);
                if pdf_a.is_delta() && pdf_b.is_delta() {
                    Pdf::Delta
                } else {
                    Pdf::NonDelta(
                        pdf_a.value_or(0.0) * *weight + pdf_b.value_or(0.0) * (1.0 - *weight),
                    )
                }
            }
        }
    }

    /// Radiance emitted at the intersection. Back-face hits emit nothing.
    pub fn emission(&self, intersection: &PrimitiveIntersection) -> Color {
        match self {
            Material::Emissive { emittance } => {
                if intersection.front_face {
                    *emittance
                } else {
                    Color::BLACK
                }
            }
            Material::Mix { a, b, weight } => {
                a.emission(intersection) * *weight + b.emission(intersection) * (1.0 - *weight)
            }
            _ => Color::BLACK,
        }
    }

    /// Whether the material has any finite-density scattering lobe. Purely
    /// specular (and purely emissive) surfaces cannot be connected to by
    /// shadow rays.
    pub fn has_non_specular(&self) -> bool {
        match self {
            Material::Lambertian { .. } => true,
            Material::Metal { .. } | Material::Dielectric { .. } | Material::Emissive { .. } => {
                false
            }
            Material::Mix { a, b, .. } => a.has_non_specular() || b.has_non_specular(),
        }
    }
}

pub fn reflect(direction: &Vector, normal: &Normal) -> Vector {
    *direction - *normal * (normal.dot(direction) * 2.0)
}

// `cos_theta` is the angle against the oriented normal; `eta_relative` is
// the ratio of the indices of refraction across the boundary.
fn refract(direction: &Vector, normal: &Normal, cos_theta: f64, eta_relative: f64) -> Vector {
    let r_perpendicular = (*direction + *normal * cos_theta) * eta_relative;
    let r_parallel =
        *normal * -(1.0 - r_perpendicular.magnitude_squared()).abs().sqrt();
    r_perpendicular + r_parallel
}

// Schlick approximation of Fresnel reflectance
fn schlick(cos_theta: f64, eta_relative: f64) -> f64 {
    let r0 = ((1.0 - eta_relative) / (1.0 + eta_relative)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
}
