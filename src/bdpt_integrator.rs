//! Bidirectional path tracing. A camera subpath and a light subpath are
//! built per pixel sample; every way of splicing them into a complete path
//! is evaluated as its own sampling strategy and the strategies are combined
//! with the power-2 heuristic. Forward and reverse area densities are cached
//! on the vertices during the random walks so each weight is evaluated in
//! time linear in the path length.

use std::sync::Arc;

use crate::{
    color::Color,
    constants::RAY_EPSILON,
    film::Splat,
    geometry::{normal::Normal, point::Point, traits::DotProduct, vector::Vector},
    light::{Light, LightSample},
    material::Scatter,
    ray::Ray,
    sampling::samplers::TileSampler,
    scene::Scene,
};

#[derive(Clone)]
enum VertexKind {
    Camera,
    /// A vertex on a light source. `light` is None for the virtual vertex
    /// created when a camera ray escapes to the environment.
    Light {
        light: Option<Arc<Light>>,
        infinite: bool,
    },
    Surface {
        primitive: Arc<crate::primitive::Primitive>,
    },
}

#[derive(Clone)]
struct Vertex {
    kind: VertexKind,
    point: Point,
    /// Shading normal, oriented against the arriving ray.
    normal: Normal,
    /// Geometric normal as the shape defines it (outward / per winding).
    ng: Normal,
    /// Unit direction towards the previous vertex of the subpath.
    wo: Vector,
    /// Product of terms along the subpath up to (and including) this vertex.
    throughput: Color,
    /// Area density of generating this vertex while walking the subpath.
    pdf_fwd: f64,
    /// Area density of generating it while walking the other way.
    pdf_rev: f64,
    delta: bool,
}

const NO_NORMAL: Normal = Normal(0.0, 0.0, 0.0);

impl Vertex {
    fn camera(point: Point) -> Vertex {
        Vertex {
            kind: VertexKind::Camera,
            point,
            normal: NO_NORMAL,
            ng: NO_NORMAL,
            wo: Vector::NULL,
            throughput: Color::WHITE,
            pdf_fwd: 1.0,
            pdf_rev: 0.0,
            delta: false,
        }
    }

    fn is_on_surface(&self) -> bool {
        self.ng != NO_NORMAL
    }

    fn is_light(&self) -> bool {
        match &self.kind {
            VertexKind::Light { .. } => true,
            VertexKind::Surface { primitive } => primitive.area_light.is_some(),
            VertexKind::Camera => false,
        }
    }

    fn is_infinite_light(&self) -> bool {
        matches!(self.kind, VertexKind::Light { infinite: true, .. })
    }

    fn is_delta_light(&self) -> bool {
        match &self.kind {
            VertexKind::Light {
                light: Some(light), ..
            } => light.is_delta(),
            _ => false,
        }
    }

    /// Whether a shadow-ray connection can be made through this vertex.
    fn is_connectible(&self) -> bool {
        match &self.kind {
            VertexKind::Camera => true,
            VertexKind::Light { .. } => true,
            VertexKind::Surface { primitive } => primitive.material.has_non_specular(),
        }
    }

    /// The light this vertex emits with, if any.
    fn light(&self) -> Option<&Arc<Light>> {
        match &self.kind {
            VertexKind::Light { light, .. } => light.as_ref(),
            VertexKind::Surface { primitive } => primitive.area_light.as_ref(),
            VertexKind::Camera => None,
        }
    }

    /// Emitted radiance towards `towards`, for s = 0 strategies.
    #[allow(non_snake_case)]
    fn Le(&self, scene: &Scene, towards: &Vertex) -> Color {
        if !self.is_light() {
            return Color::BLACK;
        }
        if self.is_infinite_light() {
            // The escape vertex stands in for all infinite lights together
            let escape = Ray::new(towards.point, -self.wo);
            return scene.background(&escape);
        }
        let direction = (towards.point - self.point).normalized();
        match self.light() {
            Some(light) => match light.as_ref() {
                Light::Area { emittance, .. } => {
                    // One-sided emission from the geometric front face
                    if self.ng.dot(&direction) > 0.0 {
                        *emittance
                    } else {
                        Color::BLACK
                    }
                }
                _ => Color::BLACK,
            },
            None => Color::BLACK,
        }
    }

    /// BRDF value for scattering from the previous vertex towards `next`.
    fn f(&self, next: &Vertex) -> Color {
        let d = next.point - self.point;
        if d.magnitude_squared() < 1e-18 {
            return Color::BLACK;
        }
        let w_i = d.normalized();
        match &self.kind {
            VertexKind::Surface { primitive } => {
                primitive.material.f(&self.wo, &w_i, &self.normal)
            }
            _ => Color::BLACK,
        }
    }

    /// Converts a solid-angle density at this vertex into an area density
    /// at `next`.
    fn convert_density(&self, pdf: f64, next: &Vertex) -> f64 {
        if next.is_infinite_light() {
            // Densities towards infinite lights stay in solid angle
            return pdf;
        }
        let w = next.point - self.point;
        let dist_squared = w.magnitude_squared();
        if dist_squared == 0.0 {
            return 0.0;
        }
        let mut pdf = pdf / dist_squared;
        if next.is_on_surface() {
            pdf *= next.ng.dot(&(w / dist_squared.sqrt())).abs();
        }
        pdf
    }

    /// Area density of this vertex generating `next`, given that the
    /// subpath arrived from `prev`.
    fn pdf(&self, scene: &Scene, prev: Option<&Vertex>, next: &Vertex) -> f64 {
        if let VertexKind::Light { .. } = self.kind {
            return self.pdf_light(scene, next);
        }

        let to_next = next.point - self.point;
        if to_next.magnitude_squared() < 1e-18 {
            return 0.0;
        }
        let w_next = to_next.normalized();

        let pdf_solid_angle = match &self.kind {
            VertexKind::Camera => {
                let (_, pdf_dir) = scene.camera.pdf_We(&Ray::new(self.point, w_next));
                pdf_dir
            }
            VertexKind::Surface { primitive } => {
                let w_prev = match prev {
                    Some(prev) => (prev.point - self.point).normalized(),
                    None => return 0.0,
                };
                primitive
                    .material
                    .pdf(&w_prev, &w_next, &self.normal)
                    .value_or(0.0)
            }
            VertexKind::Light { .. } => unreachable!(),
        };
        self.convert_density(pdf_solid_angle, next)
    }

    /// Area density of this (light) vertex emitting towards `v`.
    fn pdf_light(&self, scene: &Scene, v: &Vertex) -> f64 {
        let w = v.point - self.point;
        let dist_squared = w.magnitude_squared();
        if dist_squared == 0.0 {
            return 0.0;
        }
        let inv_dist_squared = 1.0 / dist_squared;
        let w = w * inv_dist_squared.sqrt();

        let mut pdf = if self.is_infinite_light() {
            let (_, world_radius) = scene.world_sphere();
            1.0 / (std::f64::consts::PI * world_radius * world_radius)
        } else {
            let pdf_dir = match self.light().map(Arc::as_ref) {
                Some(Light::Area { .. }) => {
                    // Cosine-weighted hemisphere around the emitter normal
                    let cos_theta = self.ng.dot(&w);
                    if cos_theta > 0.0 {
                        cos_theta * std::f64::consts::FRAC_1_PI
                    } else {
                        0.0
                    }
                }
                Some(Light::Point { .. }) => 1.0 / (4.0 * std::f64::consts::PI),
                _ => 0.0,
            };
            pdf_dir * inv_dist_squared
        };
        if v.is_on_surface() {
            pdf *= v.ng.dot(&w).abs();
        }
        pdf
    }

    /// Density of a light subpath *starting* at this vertex and heading
    /// towards `v`, including the light selection probability.
    fn pdf_light_origin(&self, scene: &Scene, v: &Vertex) -> f64 {
        let w = v.point - self.point;
        if w.magnitude_squared() == 0.0 {
            return 0.0;
        }
        let w = w.normalized();
        if self.is_infinite_light() {
            return infinite_light_density(scene, &-w);
        }
        match self.light() {
            Some(light) => {
                let selection_pdf = scene.light_sampler.pdf_of(light);
                let pdf_pos = match light.as_ref() {
                    Light::Area { shape, .. } => 1.0 / shape.area(),
                    // Delta position; the zero is never used because the
                    // strategy is gated by the delta-light flag
                    Light::Point { .. } => 0.0,
                    _ => 0.0,
                };
                selection_pdf * pdf_pos
            }
            None => 0.0,
        }
    }
}

/// Combined density of next-event estimation sampling the direction
/// `w_towards_env` via any of the infinite lights.
fn infinite_light_density(scene: &Scene, w_towards_env: &Vector) -> f64 {
    scene
        .lights
        .iter()
        .enumerate()
        .filter(|(_, light)| light.is_infinite())
        .map(|(index, light)| {
            light.pdf_Li(&Point::O, w_towards_env).value_or(0.0) * scene.light_sampler.pdf(index)
        })
        .sum()
}

/// Extends a subpath by repeatedly sampling the BSDF, recording forward and
/// reverse densities on the way. `pdf_dir` is the solid-angle density of the
/// initial ray; `importance_transport` is true for light subpaths.
#[allow(clippy::too_many_arguments)]
fn random_walk(
    scene: &Scene,
    sampler: &mut TileSampler,
    mut ray: Ray,
    mut beta: Color,
    pdf_dir: f64,
    max_vertices: usize,
    importance_transport: bool,
    path: &mut Vec<Vertex>,
) {
    if max_vertices == 0 || pdf_dir == 0.0 || beta.is_black() {
        return;
    }
    let mut pdf_fwd = pdf_dir;

    loop {
        let intersection = match scene.intersect(&mut ray) {
            Some(intersection) => intersection,
            None => {
                // Escaped camera rays become a virtual vertex standing for
                // the environment; light subpaths just end
                if !importance_transport {
                    path.push(Vertex {
                        kind: VertexKind::Light {
                            light: None,
                            infinite: true,
                        },
                        point: ray.at(2.0 * scene.world_sphere().1),
                        normal: NO_NORMAL,
                        ng: NO_NORMAL,
                        wo: -ray.direction,
                        throughput: beta,
                        // Solid-angle density, kept as-is for infinite lights
                        pdf_fwd,
                        pdf_rev: 0.0,
                        delta: false,
                    });
                }
                return;
            }
        };

        let outward_ng = if intersection.front_face {
            intersection.normal
        } else {
            -intersection.normal
        };
        let mut vertex = Vertex {
            kind: VertexKind::Surface {
                primitive: Arc::clone(&intersection.primitive),
            },
            point: intersection.location,
            normal: intersection.normal,
            ng: outward_ng,
            wo: -ray.direction,
            throughput: beta,
            pdf_fwd: 0.0,
            pdf_rev: 0.0,
            delta: false,
        };
        vertex.pdf_fwd = path
            .last()
            .expect("random_walk starts with a seeded path")
            .convert_density(pdf_fwd, &vertex);

        if path.len() + 1 >= max_vertices {
            path.push(vertex);
            return;
        }

        // Sample the next direction and cache the reverse density at the
        // previous vertex
        let (next_ray, pdf_rev_solid_angle) =
            match intersection.material().scatter(&ray, &intersection, sampler) {
                Scatter::Absorbed => {
                    path.push(vertex);
                    return;
                }
                Scatter::Specular {
                    ray: scattered,
                    attenuation,
                } => {
                    vertex.delta = true;
                    pdf_fwd = 0.0;
                    beta = beta * attenuation;
                    (scattered, 0.0)
                }
                Scatter::Diffuse {
                    ray: scattered,
                    attenuation,
                    pdf,
                } => {
                    if pdf <= 0.0 || attenuation.is_black() {
                        path.push(vertex);
                        return;
                    }
                    beta = beta * attenuation / pdf;
                    pdf_fwd = pdf;
                    let w_o = vertex.wo;
                    let pdf_rev = intersection
                        .material()
                        .pdf(&scattered.direction, &w_o, &intersection.normal)
                        .value_or(0.0);
                    (scattered, pdf_rev)
                }
            };

        let prev = path.last_mut().expect("path is seeded");
        let pdf_rev_area = vertex.convert_density(pdf_rev_solid_angle, prev);
        prev.pdf_rev = pdf_rev_area;
        path.push(vertex);

        if beta.is_black() {
            return;
        }
        ray = next_ray;
    }
}

fn generate_camera_subpath(
    scene: &Scene,
    sampler: &mut TileSampler,
    x: usize,
    y: usize,
    max_vertices: usize,
) -> Vec<Vertex> {
    let ray = scene
        .camera
        .generate_ray(x, y, sampler.sample_2d(), sampler.sample_2d());
    let (_, pdf_dir) = scene.camera.pdf_We(&ray);

    let mut path = Vec::with_capacity(max_vertices);
    path.push(Vertex::camera(ray.origin));
    random_walk(
        scene,
        sampler,
        ray,
        Color::WHITE,
        pdf_dir,
        max_vertices,
        false,
        &mut path,
    );
    path
}

fn generate_light_subpath(
    scene: &Scene,
    sampler: &mut TileSampler,
    max_vertices: usize,
) -> Vec<Vertex> {
    let mut path = Vec::with_capacity(max_vertices);
    let (_, light, selection_pdf) = match scene.light_sampler.sample(sampler.sample_1d()) {
        Some(sampled) => sampled,
        None => return path,
    };

    let (world_center, world_radius) = scene.world_sphere();
    let le_sample = light.sample_Le(
        sampler.sample_2d(),
        sampler.sample_2d(),
        world_center,
        world_radius,
    );
    if le_sample.pdf_pos <= 0.0 || le_sample.pdf_dir <= 0.0 || le_sample.Le.is_black() {
        return path;
    }

    let is_infinite = light.is_infinite();
    path.push(Vertex {
        kind: VertexKind::Light {
            light: Some(Arc::clone(light)),
            infinite: is_infinite,
        },
        point: le_sample.ray.origin,
        normal: le_sample.normal,
        ng: le_sample.normal,
        wo: Vector::NULL,
        throughput: le_sample.Le,
        pdf_fwd: le_sample.pdf_pos * selection_pdf,
        pdf_rev: 0.0,
        delta: light.is_delta(),
    });

    let cos_theta = le_sample.normal.dot(&le_sample.ray.direction).abs();
    let beta =
        le_sample.Le * cos_theta / (selection_pdf * le_sample.pdf_pos * le_sample.pdf_dir);
    let initial_direction = le_sample.ray.direction;
    random_walk(
        scene,
        sampler,
        le_sample.ray,
        beta,
        le_sample.pdf_dir,
        max_vertices,
        true,
        &mut path,
    );

    // For infinite lights the first surface vertex is distributed over the
    // world disk, not by solid angle from a point
    if is_infinite && path.len() > 1 {
        let cos_theta = initial_direction.dot(&path[1].ng).abs();
        path[1].pdf_fwd = if path[1].is_on_surface() {
            le_sample.pdf_pos * cos_theta
        } else {
            le_sample.pdf_pos
        };
        path[0].pdf_fwd = infinite_light_density(scene, &-initial_direction);
    }

    path
}

/// Geometry term between two vertices including mutual visibility.
fn g_term(scene: &Scene, a: &Vertex, b: &Vertex) -> f64 {
    let d = b.point - a.point;
    let dist_squared = d.magnitude_squared();
    if dist_squared < 1e-18 {
        return 0.0;
    }
    let dist = dist_squared.sqrt();
    let w = d / dist;

    let mut g = 1.0 / dist_squared;
    if a.is_on_surface() {
        g *= a.ng.dot(&w).abs();
    }
    if b.is_on_surface() {
        g *= b.ng.dot(&w).abs();
    }
    if g == 0.0 {
        return 0.0;
    }

    let mut shadow_ray = Ray::new(a.point, w);
    shadow_ray.update_max_distance(dist - RAY_EPSILON);
    if scene.intersects(&shadow_ray) {
        0.0
    } else {
        g
    }
}

/// The power-2 MIS weight of strategy (s, t), evaluated from the cached
/// vertex densities. `sampled` replaces the endpoint that was freshly drawn
/// for s = 1 or t = 1 strategies.
fn mis_weight(
    scene: &Scene,
    light_path: &[Vertex],
    camera_path: &[Vertex],
    sampled: Option<&Vertex>,
    s: usize,
    t: usize,
) -> f64 {
    if s + t == 2 {
        return 1.0;
    }

    // Work on copies of the subpaths so the reverse densities the current
    // strategy implies can be patched in
    let mut lv: Vec<Vertex> = light_path[..s].to_vec();
    let mut cv: Vec<Vertex> = camera_path[..t].to_vec();
    if s == 1 {
        if let Some(sampled) = sampled {
            lv[0] = sampled.clone();
        }
    }
    if t == 1 {
        if let Some(sampled) = sampled {
            cv[0] = sampled.clone();
        }
    }

    // The connection endpoints are treated as non-delta for this strategy
    if s > 0 {
        lv[s - 1].delta = false;
    }
    cv[t - 1].delta = false;

    let pt_rev = if s > 0 {
        let prev = if s > 1 { Some(&lv[s - 2]) } else { None };
        lv[s - 1].pdf(scene, prev, &cv[t - 1])
    } else {
        cv[t - 1].pdf_light_origin(scene, &cv[t - 2])
    };
    cv[t - 1].pdf_rev = pt_rev;
    if t > 1 {
        let pt_minus_rev = if s > 0 {
            cv[t - 1].pdf(scene, Some(&lv[s - 1]), &cv[t - 2])
        } else {
            cv[t - 1].pdf_light(scene, &cv[t - 2])
        };
        cv[t - 2].pdf_rev = pt_minus_rev;
    }
    if s > 0 {
        let prev = if t > 1 { Some(&cv[t - 2]) } else { None };
        let qs_rev = cv[t - 1].pdf(scene, prev, &lv[s - 1]);
        lv[s - 1].pdf_rev = qs_rev;
    }
    if s > 1 {
        let qs_minus_rev = lv[s - 1].pdf(scene, Some(&cv[t - 1]), &lv[s - 2]);
        lv[s - 2].pdf_rev = qs_minus_rev;
    }

    // Delta densities are stored as zero; for the ratio they count as one
    // so the two sides of a delta vertex cancel
    let remap = |pdf: f64| if pdf != 0.0 { pdf } else { 1.0 };

    let mut sum = 0.0;
    let mut ri = 1.0;
    for i in (1..t).rev() {
        ri *= remap(cv[i].pdf_rev) / remap(cv[i].pdf_fwd);
        if !cv[i].delta && !cv[i - 1].delta {
            sum += ri * ri;
        }
    }
    let mut ri = 1.0;
    for i in (0..s).rev() {
        ri *= remap(lv[i].pdf_rev) / remap(lv[i].pdf_fwd);
        let delta_origin = if i > 0 {
            lv[i - 1].delta
        } else {
            lv[0].is_delta_light()
        };
        if !lv[i].delta && !delta_origin {
            sum += ri * ri;
        }
    }

    1.0 / (1.0 + sum)
}

/// Estimates the radiance for pixel (x, y). Strategies that land on other
/// pixels (t = 1 camera connections) are appended to `splats`.
#[allow(non_snake_case)]
pub fn estimate_Li(
    sampler: &mut TileSampler,
    x: usize,
    y: usize,
    scene: &Scene,
    sample_in_pass: u32,
    splats: &mut Vec<Splat>,
) -> Color {
    let max_depth = scene.sampling_config.max_depth;
    let camera_path = generate_camera_subpath(scene, sampler, x, y, max_depth + 1);
    let light_path = generate_light_subpath(scene, sampler, max_depth);

    let mut L = Color::BLACK;
    for t in 1..=camera_path.len() {
        for s in 0..=light_path.len() {
            if s + t > max_depth + 1 {
                break;
            }
            if (s == 1 && t == 1) || (s == 0 && t < 2) {
                continue;
            }
            // Paths ending on the environment are handled purely by s = 0
            if t > 1 && s != 0 && matches!(camera_path[t - 1].kind, VertexKind::Light { .. }) {
                continue;
            }

            if t == 1 {
                if let Some(splat) =
                    connect_to_camera(scene, sampler, &light_path, &camera_path, s, sample_in_pass)
                {
                    splats.push(splat);
                }
            } else {
                L += connect(scene, sampler, &light_path, &camera_path, s, t);
            }
        }
    }
    L
}

/// Evaluates one (s, t >= 2) strategy.
fn connect(
    scene: &Scene,
    sampler: &mut TileSampler,
    light_path: &[Vertex],
    camera_path: &[Vertex],
    s: usize,
    t: usize,
) -> Color {
    let pt = &camera_path[t - 1];

    if s == 0 {
        // The camera subpath already is a complete path
        if !pt.is_light() {
            return Color::BLACK;
        }
        let contribution = pt.Le(scene, &camera_path[t - 2]) * pt.throughput;
        if contribution.is_black() {
            return Color::BLACK;
        }
        let weight = mis_weight(scene, light_path, camera_path, None, s, t);
        return contribution * weight;
    }

    if s == 1 {
        // Fresh light sample connected to the camera subpath end
        if !pt.is_connectible() {
            return Color::BLACK;
        }
        let (_, light, selection_pdf) = match scene.light_sampler.sample(sampler.sample_1d()) {
            Some(sampled) => sampled,
            None => return Color::BLACK,
        };
        let LightSample {
            Li,
            w_i,
            pdf,
            shadow_ray,
            location,
            normal,
        } = light.sample_Li(sampler.sample_2d(), &pt.point);
        // Delta lights sample their single direction with certainty
        let light_pdf = pdf.value_or(1.0);
        if Li.is_black() || light_pdf <= 0.0 {
            return Color::BLACK;
        }

        let mut sampled = Vertex {
            kind: VertexKind::Light {
                light: Some(Arc::clone(light)),
                infinite: light.is_infinite(),
            },
            point: location,
            normal,
            ng: normal,
            wo: -w_i,
            throughput: Li / (light_pdf * selection_pdf),
            pdf_fwd: 0.0,
            pdf_rev: 0.0,
            delta: false,
        };
        sampled.pdf_fwd = sampled.pdf_light_origin(scene, pt);

        let mut contribution = pt.throughput * pt.f(&sampled) * sampled.throughput;
        if pt.is_on_surface() {
            contribution *= w_i.dot(&pt.normal).abs();
        }
        if contribution.is_black() || scene.intersects(&shadow_ray) {
            return Color::BLACK;
        }
        let weight = mis_weight(scene, light_path, camera_path, Some(&sampled), s, t);
        return contribution * weight;
    }

    // General endpoint connection
    let qs = &light_path[s - 1];
    if !qs.is_connectible() || !pt.is_connectible() {
        return Color::BLACK;
    }
    let contribution = qs.throughput * qs.f(pt) * pt.f(qs) * pt.throughput;
    if contribution.is_black() {
        return Color::BLACK;
    }
    let g = g_term(scene, qs, pt);
    if g == 0.0 {
        return Color::BLACK;
    }
    let weight = mis_weight(scene, light_path, camera_path, None, s, t);
    contribution * (g * weight)
}

/// Evaluates a t = 1 strategy: a light subpath vertex is connected straight
/// to the camera lens, contributing to whatever pixel it projects to.
fn connect_to_camera(
    scene: &Scene,
    sampler: &mut TileSampler,
    light_path: &[Vertex],
    camera_path: &[Vertex],
    s: usize,
    sample_in_pass: u32,
) -> Option<Splat> {
    let qs = &light_path[s - 1];
    if !qs.is_connectible() {
        return None;
    }

    let camera_sample = scene.camera.sample_Wi(&qs.point, sampler.sample_2d())?;
    if camera_sample.pdf <= 0.0 || camera_sample.we <= 0.0 {
        return None;
    }

    let sampled = Vertex {
        kind: VertexKind::Camera,
        point: camera_sample.lens_point,
        normal: NO_NORMAL,
        ng: NO_NORMAL,
        wo: Vector::NULL,
        throughput: Color::WHITE * (camera_sample.we / camera_sample.pdf),
        pdf_fwd: 1.0,
        pdf_rev: 0.0,
        delta: false,
    };

    let mut contribution = qs.throughput * qs.f(&sampled) * sampled.throughput;
    if qs.is_on_surface() {
        contribution *= camera_sample.w_i.dot(&qs.normal).abs();
    }
    if contribution.is_black() {
        return None;
    }

    let distance = (camera_sample.lens_point - qs.point).magnitude();
    let mut shadow_ray = Ray::new(qs.point, camera_sample.w_i);
    shadow_ray.update_max_distance(distance - RAY_EPSILON);
    if scene.intersects(&shadow_ray) {
        return None;
    }

    let weight = mis_weight(scene, light_path, camera_path, Some(&sampled), s, 1);
    let value = contribution * weight;
    if value.is_black() {
        return None;
    }
    Some(Splat {
        x: camera_sample.raster.0,
        y: camera_sample.raster.1,
        sample_index: sample_in_pass,
        value,
    })
}

#[cfg(test)]
mod tests {
    use crate::sampling::sampling_fns::power_heuristic;

    #[test]
    fn power_heuristic_is_normalized() {
        let pdf_a = 0.7;
        let pdf_b = 0.2;
        let w_a = power_heuristic(1, pdf_a, 1, pdf_b);
        let w_b = power_heuristic(1, pdf_b, 1, pdf_a);
        assert!((w_a + w_b - 1.0).abs() < 1e-12);
    }
}
