use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use crate::{
    error::RenderError,
    geometry::{point::Point, traits::DotProduct, vector::Vector},
    ray::Ray,
    sampling::samplers::Sample2d,
    sampling::sampling_fns::sample_disk,
};

/// A thin-lens perspective camera. With aperture 0 it degenerates to a
/// pinhole; the lens sample is still consumed so the random stream layout
/// does not depend on the camera.
#[derive(Debug)]
pub struct Camera {
    origin: Point,
    // Orthonormal basis; w points from the scene towards the camera
    u: Vector,
    v: Vector,
    w: Vector,
    horizontal: Vector,
    vertical: Vector,
    lower_left: Point,
    lens_radius: f64,
    focus_distance: f64,
    film_width: usize,
    film_height: usize,
    // Area of the image rectangle projected to unit distance, for emitted
    // importance
    image_plane_area: f64,
}

/// A connection from a scene point to a point on the lens, produced for
/// light paths that terminate on the camera.
pub struct CameraWiSample {
    /// Emitted importance along the connection.
    pub we: f64,
    /// Unit direction from the reference point towards the lens.
    pub w_i: Vector,
    /// Solid-angle density of sampling this lens point from the reference.
    pub pdf: f64,
    pub lens_point: Point,
    /// The pixel the connection lands on.
    pub raster: (usize, usize),
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        look_from: Point,
        look_at: Point,
        up: Vector,
        vfov_degrees: f64,
        film_width: usize,
        film_height: usize,
        aperture: f64,
        focus_distance: f64,
    ) -> Result<Camera, RenderError> {
        if film_width == 0 || film_height == 0 {
            return Err(RenderError::InvalidConfig(
                "film dimensions must be positive".to_string(),
            ));
        }
        if !(0.0..180.0).contains(&vfov_degrees)
            || vfov_degrees <= 0.0
            || focus_distance <= 0.0
            || aperture < 0.0
        {
            return Err(RenderError::DegenerateCamera);
        }

        let forward = look_at - look_from;
        if forward.magnitude_squared() < 1e-12 || !forward.is_finite() {
            return Err(RenderError::DegenerateCamera);
        }
        let w = -forward.normalized();
        let u_unnormalized = up.cross(&w);
        if u_unnormalized.magnitude_squared() < 1e-12 {
            return Err(RenderError::DegenerateCamera);
        }
        let u = u_unnormalized.normalized();
        let v = w.cross(&u);

        let aspect = film_width as f64 / film_height as f64;
        let viewport_height = 2.0 * (vfov_degrees.to_radians() / 2.0).tan();
        let viewport_width = viewport_height * aspect;

        let horizontal = u * (viewport_width * focus_distance);
        let vertical = v * (viewport_height * focus_distance);
        let lower_left =
            look_from - horizontal / 2.0 - vertical / 2.0 - w * focus_distance;

        Ok(Camera {
            origin: look_from,
            u,
            v,
            w,
            horizontal,
            vertical,
            lower_left,
            lens_radius: aperture / 2.0,
            focus_distance,
            film_width,
            film_height,
            image_plane_area: viewport_width * viewport_height,
        })
    }

    pub fn film_bounds(&self) -> (usize, usize) {
        (self.film_width, self.film_height)
    }

    /// Generates the ray for pixel (x, y) with the given sub-pixel and lens
    /// samples. Pixel (0, 0) is the top-left corner.
    pub fn generate_ray(&self, x: usize, y: usize, film: Sample2d, lens: Sample2d) -> Ray {
        let (fx, fy) = film.take();
        let s = (x as f64 + fx) / self.film_width as f64;
        let t = 1.0 - (y as f64 + fy) / self.film_height as f64;

        let (dx, dy) = sample_disk(lens);
        let offset = self.u * (dx * self.lens_radius) + self.v * (dy * self.lens_radius);
        let origin = self.origin + offset;
        let target = self.lower_left + self.horizontal * s + self.vertical * t;

        Ray::new(origin, (target - origin).normalized())
    }

    /// Positional and directional densities of `generate_ray` having
    /// produced `ray`, in the measures BDPT needs.
    #[allow(non_snake_case)]
    pub fn pdf_We(&self, ray: &Ray) -> (f64, f64) {
        let pdf_pos = if self.lens_radius > 0.0 {
            1.0 / (PI * self.lens_radius * self.lens_radius)
        } else {
            1.0
        };
        let cos_theta = ray.direction.dot(&-self.w);
        if cos_theta <= 0.0 {
            return (pdf_pos, 0.0);
        }
        let pdf_dir = 1.0 / (self.image_plane_area * cos_theta.powi(3));
        (pdf_pos, pdf_dir)
    }

    /// Samples a point on the lens as seen from `reference` and projects the
    /// connection onto the film. Returns None when the reference is behind
    /// the camera or the projection misses the image.
    #[allow(non_snake_case)]
    pub fn sample_Wi(&self, reference: &Point, lens: Sample2d) -> Option<CameraWiSample> {
        let (dx, dy) = sample_disk(lens);
        let lens_point =
            self.origin + self.u * (dx * self.lens_radius) + self.v * (dy * self.lens_radius);

        let d = lens_point - *reference;
        let dist_squared = d.magnitude_squared();
        if dist_squared < 1e-12 {
            return None;
        }
        let dist = dist_squared.sqrt();
        let w_i = d / dist;

        // Direction leaving the camera towards the reference
        let leaving = -w_i;
        let cos_theta = leaving.dot(&-self.w);
        if cos_theta <= 0.0 {
            return None;
        }

        // All lens points image through the same spot on the focus plane
        let p_focus = lens_point + leaving * (self.focus_distance / cos_theta);
        let rel = p_focus - self.lower_left;
        let s = rel.dot(&self.u) / self.horizontal.magnitude();
        let t = rel.dot(&self.v) / self.vertical.magnitude();
        if !(0.0..1.0).contains(&s) || !(0.0..1.0).contains(&t) {
            return None;
        }
        let px = ((s * self.film_width as f64) as usize).min(self.film_width - 1);
        let py = (((1.0 - t) * self.film_height as f64) as usize).min(self.film_height - 1);

        let lens_area = if self.lens_radius > 0.0 {
            PI * self.lens_radius * self.lens_radius
        } else {
            1.0
        };
        Some(CameraWiSample {
            we: 1.0 / (self.image_plane_area * lens_area * cos_theta.powi(4)),
            w_i,
            pdf: dist_squared / (cos_theta * lens_area),
            lens_point,
            raster: (px, py),
        })
    }

    pub fn position(&self) -> Point {
        self.origin
    }

    /// Folds the camera pose into a hasher, for the scene fingerprint.
    pub fn hash_into<H: Hasher>(&self, hasher: &mut H) {
        for value in [
            self.origin.x(),
            self.origin.y(),
            self.origin.z(),
            self.horizontal.x(),
            self.horizontal.y(),
            self.horizontal.z(),
            self.vertical.x(),
            self.vertical.y(),
            self.vertical.z(),
            self.lens_radius,
            self.focus_distance,
        ] {
            value.to_bits().hash(hasher);
        }
        self.film_width.hash(hasher);
        self.film_height.hash(hasher);
    }
}
