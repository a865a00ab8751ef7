pub mod sampling_fns {
    use super::samplers::Sample2d;
    use crate::geometry::normal::Normal;
    use crate::geometry::traits::DotProduct;
    use crate::geometry::vector::Vector;
    use std::f64::consts::FRAC_PI_2;
    use std::f64::consts::FRAC_PI_4;
    use std::f64::consts::PI;

    /// https://pbr-book.org/3ed-2018/Monte_Carlo_Integration/Importance_Sampling#PowerHeuristic
    pub fn power_heuristic(n_f: usize, pdf_f: f64, n_g: usize, pdf_g: f64) -> f64 {
        let f = n_f as f64 * pdf_f;
        let g = n_g as f64 * pdf_g;
        (f * f) / (f * f + g * g)
    }

    /// Concentric disk sampling; returns (x, y) inside the unit disk.
    pub fn sample_disk(sample: Sample2d) -> (f64, f64) {
        let (u, v) = sample.take();
        let (u, v) = (2.0 * u - 1.0, 2.0 * v - 1.0);
        if u == 0.0 || v == 0.0 {
            return (0.0, 0.0);
        }
        let (r, theta) = if u.abs() > v.abs() {
            (u, FRAC_PI_4 * v / u)
        } else {
            (v, FRAC_PI_2 - FRAC_PI_4 * u / v)
        };
        (theta.cos() * r, theta.sin() * r)
    }

    pub fn sample_sphere(sample: Sample2d) -> Vector {
        let (u, v) = sample.take();
        let z = 1.0 - 2.0 * u;
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = 2.0 * PI * v;
        Vector(r * phi.cos(), r * phi.sin(), z)
    }

    pub fn sample_hemisphere(sample: Sample2d, normal: &Normal) -> Vector {
        let v = sample_sphere(sample);
        if v.dot(normal) > 0.0 {
            v
        } else {
            -v
        }
    }

    pub fn cosine_sample_hemisphere(sample: Sample2d, normal: &Normal) -> Vector {
        let normal: Vector = normal.into();
        let (tangent, bitangent) = normal.generate_tangents();
        let (x, y) = sample_disk(sample);
        let z = (1.0 - x * x - y * y).max(0.0).sqrt();
        tangent * x + bitangent * y + normal * z
    }

    /// Samples a direction inside the cone of half-angle `acos(cos_theta_max)`
    /// around `axis`, uniform over the subtended solid angle.
    pub fn sample_cone(sample: Sample2d, axis: &Vector, cos_theta_max: f64) -> Vector {
        let (u, v) = sample.take();
        let cos_theta = 1.0 - u * (1.0 - cos_theta_max);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * v;
        let (tangent, bitangent) = axis.generate_tangents();
        tangent * (sin_theta * phi.cos()) + bitangent * (sin_theta * phi.sin()) + *axis * cos_theta
    }

    /// Returns uniform barycentric co-ordinates.
    pub fn sample_triangle(sample: Sample2d) -> (f64, f64) {
        let (u, v) = sample.take();
        let su = u.sqrt();
        (1.0 - su, v * su)
    }
}

pub mod samplers {
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use rand_distr::Uniform;
    use std::{
        collections::hash_map::DefaultHasher,
        hash::{Hash, Hasher},
    };

    // These exist to avoid accidental copying/reuse of samples. They *do not
    // implement Copy* and can only be used via `take`, which consumes `self`.
    pub struct Sample1d(f64);
    impl Sample1d {
        pub fn take(self) -> f64 {
            self.0
        }
    }

    pub struct Sample2d(f64, f64);
    impl Sample2d {
        pub fn take(self) -> (f64, f64) {
            (self.0, self.1)
        }
    }

    /// The per-tile random stream. Every (tile, pass) pair maps to one seed,
    /// so the rendered image does not depend on which worker picks up the
    /// tile or in what order tiles complete.
    #[derive(Clone)]
    pub struct TileSampler {
        rng: SmallRng,
        dist: Uniform<f64>,
    }

    impl TileSampler {
        pub fn new(seed: u64) -> Self {
            Self {
                rng: SmallRng::seed_from_u64(seed),
                dist: Uniform::new(0.0, 1.0),
            }
        }

        pub fn for_tile(
            tile_x: usize,
            tile_y: usize,
            pass_index: usize,
            scene_fingerprint: u64,
        ) -> Self {
            let mut hasher = DefaultHasher::new();
            scene_fingerprint.hash(&mut hasher);
            tile_x.hash(&mut hasher);
            tile_y.hash(&mut hasher);
            pass_index.hash(&mut hasher);
            Self::new(hasher.finish())
        }

        /// Returns a value in [0, 1)
        pub fn sample_1d(&mut self) -> Sample1d {
            Sample1d(self.rng.sample(self.dist))
        }

        /// Returns a value in [0, 1)^2
        pub fn sample_2d(&mut self) -> Sample2d {
            Sample2d(self.rng.sample(self.dist), self.rng.sample(self.dist))
        }
    }
}
