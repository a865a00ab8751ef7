use std::f64::consts::PI;
use std::sync::Arc;

use crate::{
    bounds::Bounds,
    geometry::{normal::Normal, point::Point, traits::DotProduct, vector::Vector},
    intersection::ShapeIntersection,
    mesh::TriangleMesh,
    pdf::Pdf,
    ray::Ray,
    sampling::samplers::Sample2d,
    sampling::sampling_fns::{sample_cone, sample_sphere},
};

#[derive(Debug)]
pub enum Shape {
    Sphere {
        origin: Point,
        radius: f64,
        radius_squared: f64,
        inv_radius: f64,
    },
    Quad {
        origin: Point,
        e1: Vector,
        e2: Vector,
        normal: Normal,
        area: f64,
    },
    Mesh {
        mesh: Arc<TriangleMesh>,
    },
}

/// A point sampled on the surface of a shape, with the solid-angle density
/// of having sampled it from the reference point.
pub struct ShapeSample {
    pub location: Point,
    pub normal: Normal,
    pub w_i: Vector,
    pub pdf: Pdf,
}

impl Shape {
    pub fn new_sphere(origin: Point, radius: f64) -> Shape {
        Shape::Sphere {
            origin,
            radius,
            radius_squared: radius * radius,
            inv_radius: 1.0 / radius,
        }
    }

    pub fn new_quad(origin: Point, e1: Vector, e2: Vector) -> Shape {
        let n = e1.cross(&e2);
        Shape::Quad {
            origin,
            e1,
            e2,
            normal: Normal::from(n.normalized()),
            area: n.magnitude(),
        }
    }

    pub fn new_mesh(mesh: Arc<TriangleMesh>) -> Shape {
        Shape::Mesh { mesh }
    }

    // Should update the ray's max_distance if an intersection is found
    pub fn intersect(&self, ray: &mut Ray) -> Option<ShapeIntersection> {
        match self {
            Shape::Sphere {
                origin,
                radius_squared,
                inv_radius,
                ..
            } => {
                let oc = ray.origin - *origin;
                let a = ray.direction.magnitude_squared();
                let b = 2.0 * oc.dot(&ray.direction);
                let c = oc.magnitude_squared() - radius_squared;
                let discriminant = b * b - 4.0 * a * c;

                if discriminant < 0.0 {
                    return None;
                }

                let discriminant_sqrt = discriminant.sqrt();
                let inv_2_a = 1.0 / (2.0 * a);
                for distance in [
                    (-b - discriminant_sqrt) * inv_2_a,
                    (-b + discriminant_sqrt) * inv_2_a,
                ] {
                    if let Some(location) = ray.update_max_distance(distance) {
                        let normal = Normal::from((location - *origin) * *inv_radius);
                        let theta = normal.y().clamp(-1.0, 1.0).acos();
                        let phi = normal.z().atan2(normal.x());
                        return Some(ShapeIntersection {
                            location,
                            normal,
                            uv: (0.5 + phi / (2.0 * PI), theta / PI),
                        });
                    }
                }

                None
            }
            Shape::Quad {
                origin,
                e1,
                e2,
                normal,
                ..
            } => {
                let denominator = normal.dot(&ray.direction);
                if denominator.abs() < 1e-12 {
                    return None;
                }
                let distance = normal.dot(&(*origin - ray.origin)) / denominator;

                // Check the edge co-ordinates before committing the distance
                let location = ray.at(distance);
                let d = location - *origin;
                let e1_len2 = e1.magnitude_squared();
                let e2_len2 = e2.magnitude_squared();
                let u = d.dot(e1) / e1_len2;
                let v = d.dot(e2) / e2_len2;
                if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
                    return None;
                }

                ray.update_max_distance(distance)
                    .map(|location| ShapeIntersection {
                        location,
                        normal: *normal,
                        uv: (u, v),
                    })
            }
            Shape::Mesh { mesh } => mesh.intersect(ray),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Shape::Sphere { origin, radius, .. } => Bounds::new(
                *origin - Vector(*radius, *radius, *radius),
                *origin + Vector(*radius, *radius, *radius),
            ),
            Shape::Quad { origin, e1, e2, .. } => {
                Bounds::new(*origin, *origin + *e1)
                    + Bounds::new(*origin + *e2, *origin + *e1 + *e2)
            }
            Shape::Mesh { mesh } => mesh.bounds(),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Shape::Sphere { radius_squared, .. } => 4.0 * PI * radius_squared,
            Shape::Quad { area, .. } => *area,
            Shape::Mesh { mesh } => mesh.area(),
        }
    }

    /// Samples a point on the shape as seen from `reference`, returning the
    /// solid-angle density of the sampled direction.
    pub fn sample_from(&self, sample: Sample2d, reference: &Point) -> ShapeSample {
        match self {
            Shape::Sphere {
                origin,
                radius,
                radius_squared,
                ..
            } => {
                let to_center = *origin - *reference;
                let dist_squared = to_center.magnitude_squared();
                if dist_squared <= *radius_squared {
                    // Reference is inside: every direction hits the sphere
                    let w_i = sample_sphere(sample);
                    let mut probe = Ray::new(*reference, w_i);
                    return match self.intersect(&mut probe) {
                        Some(hit) => ShapeSample {
                            location: hit.location,
                            normal: hit.normal,
                            w_i,
                            pdf: Pdf::NonDelta(1.0 / (4.0 * PI)),
                        },
                        // Degenerate (reference on the surface)
                        None => ShapeSample {
                            location: *reference,
                            normal: Normal::from(-w_i),
                            w_i,
                            pdf: Pdf::NonDelta(0.0),
                        },
                    };
                }

                // Uniform over the cone subtended by the sphere
                let dist = dist_squared.sqrt();
                let axis = to_center / dist;
                let sin_theta_max_squared = radius_squared / dist_squared;
                let cos_theta_max = (1.0 - sin_theta_max_squared).max(0.0).sqrt();
                let w_i = sample_cone(sample, &axis, cos_theta_max).normalized();

                let mut probe = Ray::new(*reference, w_i);
                let (location, normal) = match self.intersect(&mut probe) {
                    Some(hit) => (hit.location, hit.normal),
                    None => {
                        // Grazing numerical miss: project the closest point
                        // along the chord onto the surface
                        let t = to_center.dot(&w_i);
                        let near = *reference + w_i * t;
                        let normal = Normal::from((near - *origin).normalized());
                        (*origin + normal * *radius, normal)
                    }
                };
                ShapeSample {
                    location,
                    normal,
                    w_i,
                    pdf: Pdf::NonDelta(1.0 / (2.0 * PI * (1.0 - cos_theta_max))),
                }
            }
            Shape::Quad {
                origin,
                e1,
                e2,
                normal,
                area,
            } => {
                let (u, v) = sample.take();
                let location = *origin + *e1 * u + *e2 * v;
                let d = location - *reference;
                let dist_squared = d.magnitude_squared();
                let w_i = d / dist_squared.sqrt();
                let cos_theta = normal.dot(&w_i).abs();
                let pdf = if cos_theta < 1e-12 {
                    0.0
                } else {
                    dist_squared / (cos_theta * area)
                };
                ShapeSample {
                    location,
                    normal: *normal,
                    w_i,
                    pdf: Pdf::NonDelta(pdf),
                }
            }
            Shape::Mesh { mesh } => mesh.sample_from(sample, reference),
        }
    }

    /// The solid-angle density `sample_from` would have for the direction
    /// `w_i`, required for weighing BRDF-sampled light hits.
    pub fn pdf_from(&self, reference: &Point, w_i: &Vector) -> Pdf {
        match self {
            Shape::Sphere {
                origin,
                radius_squared,
                ..
            } => {
                let to_center = *origin - *reference;
                let dist_squared = to_center.magnitude_squared();
                if dist_squared <= *radius_squared {
                    return Pdf::NonDelta(1.0 / (4.0 * PI));
                }
                let mut probe = Ray::new(*reference, *w_i);
                if self.intersect(&mut probe).is_none() {
                    return Pdf::NonDelta(0.0);
                }
                let sin_theta_max_squared = radius_squared / dist_squared;
                let cos_theta_max = (1.0 - sin_theta_max_squared).max(0.0).sqrt();
                Pdf::NonDelta(1.0 / (2.0 * PI * (1.0 - cos_theta_max)))
            }
            Shape::Quad { .. } | Shape::Mesh { .. } => {
                let mut probe = Ray::new(*reference, *w_i);
                match self.intersect(&mut probe) {
                    Some(hit) => {
                        let dist_squared = reference.distance_squared(&hit.location);
                        let cos_theta = hit.normal.dot(w_i).abs();
                        if cos_theta < 1e-12 {
                            Pdf::NonDelta(0.0)
                        } else {
                            Pdf::NonDelta(dist_squared / (cos_theta * self.area()))
                        }
                    }
                    None => Pdf::NonDelta(0.0),
                }
            }
        }
    }

    /// Samples a point uniformly over the surface, for starting light paths.
    /// Returns the point, its normal, and the area density.
    pub fn sample_point(&self, sample: Sample2d) -> (Point, Normal, f64) {
        match self {
            Shape::Sphere { origin, radius, .. } => {
                let v = sample_sphere(sample);
                let normal = Normal::from(v);
                (*origin + v * *radius, normal, 1.0 / self.area())
            }
            Shape::Quad {
                origin,
                e1,
                e2,
                normal,
                area,
            } => {
                let (u, v) = sample.take();
                (*origin + *e1 * u + *e2 * v, *normal, 1.0 / area)
            }
            Shape::Mesh { mesh } => mesh.sample_point(sample),
        }
    }
}
