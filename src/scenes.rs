//! Built-in scenes for the CLI and the integration tests. Scene files and
//! mesh loaders live outside the engine; these presets construct scenes
//! directly through the same API a loader would use.

use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::{
    camera::Camera,
    color::Color,
    geometry::{point::Point, vector::Vector},
    light::Light,
    material::Material,
    primitive::Primitive,
    scene::{SamplingConfig, Scene},
    shape::Shape,
};

fn quad(origin: Point, e1: Vector, e2: Vector, material: Arc<Material>) -> Arc<Primitive> {
    Arc::new(Primitive::new(
        Arc::new(Shape::new_quad(origin, e1, e2)),
        material,
        None,
    ))
}

fn sphere(origin: Point, radius: f64, material: Arc<Material>) -> Arc<Primitive> {
    Arc::new(Primitive::new(
        Arc::new(Shape::new_sphere(origin, radius)),
        material,
        None,
    ))
}

/// An emitting quad: the primitive and its area light share the shape.
fn quad_light(
    origin: Point,
    e1: Vector,
    e2: Vector,
    emittance: Color,
) -> (Arc<Primitive>, Arc<Light>) {
    let shape = Arc::new(Shape::new_quad(origin, e1, e2));
    let light = Arc::new(Light::Area {
        shape: Arc::clone(&shape),
        emittance,
    });
    let primitive = Arc::new(Primitive::new(
        shape,
        Arc::new(Material::new_emissive(emittance)),
        Some(Arc::clone(&light)),
    ));
    (primitive, light)
}

/// Nothing but a uniform environment; the simplest possible scene.
pub fn environment(width: usize, height: usize, radiance: Color) -> Scene {
    let camera = Camera::new(
        Point(0.0, 0.0, 0.0),
        Point(0.0, 0.0, -1.0),
        Vector(0.0, 1.0, 0.0),
        60.0,
        width,
        height,
        0.0,
        1.0,
    )
    .expect("preset camera is valid");
    let lights = vec![Arc::new(Light::UniformInfinite { radiance })];
    Scene::new(vec![], lights, camera, SamplingConfig { max_depth: 4 })
}

/// A large white Lambertian floor under a unit environment; pixels looking
/// at the floor converge to the albedo.
pub fn furnace(width: usize, height: usize, albedo: Color) -> Scene {
    let camera = Camera::new(
        Point(0.0, 5.0, 0.0),
        Point(0.0, 0.0, 0.0),
        Vector(0.0, 0.0, -1.0),
        40.0,
        width,
        height,
        0.0,
        5.0,
    )
    .expect("preset camera is valid");
    let floor = quad(
        Point(-500.0, 0.0, 500.0),
        Vector(0.0, 0.0, -1000.0),
        Vector(1000.0, 0.0, 0.0),
        Arc::new(Material::new_lambertian(albedo)),
    );
    let lights = vec![Arc::new(Light::UniformInfinite {
        radiance: Color::WHITE,
    })];
    Scene::new(vec![floor], lights, camera, SamplingConfig { max_depth: 8 })
}

/// The classic box: white walls, red left, green right, quad light in the
/// ceiling, a mirror and a glass sphere.
pub fn cornell(width: usize, height: usize) -> Scene {
    let white = Arc::new(Material::new_lambertian(Color {
        r: 0.73,
        g: 0.73,
        b: 0.73,
    }));
    let red = Arc::new(Material::new_lambertian(Color {
        r: 0.65,
        g: 0.05,
        b: 0.05,
    }));
    let green = Arc::new(Material::new_lambertian(Color {
        r: 0.12,
        g: 0.45,
        b: 0.15,
    }));

    let (light_primitive, light) = quad_light(
        Point(0.35, 0.9995, 0.35),
        Vector(0.3, 0.0, 0.0),
        Vector(0.0, 0.0, 0.3),
        Color {
            r: 15.0,
            g: 15.0,
            b: 15.0,
        },
    );

    let primitives = vec![
        // Floor, normal up
        quad(
            Point(0.0, 0.0, 0.0),
            Vector(0.0, 0.0, 1.0),
            Vector(1.0, 0.0, 0.0),
            Arc::clone(&white),
        ),
        // Ceiling, normal down
        quad(
            Point(0.0, 1.0, 0.0),
            Vector(1.0, 0.0, 0.0),
            Vector(0.0, 0.0, 1.0),
            Arc::clone(&white),
        ),
        // Back wall
        quad(
            Point(0.0, 0.0, 0.0),
            Vector(1.0, 0.0, 0.0),
            Vector(0.0, 1.0, 0.0),
            Arc::clone(&white),
        ),
        // Left wall
        quad(
            Point(0.0, 0.0, 0.0),
            Vector(0.0, 1.0, 0.0),
            Vector(0.0, 0.0, 1.0),
            red,
        ),
        // Right wall
        quad(
            Point(1.0, 0.0, 0.0),
            Vector(0.0, 0.0, 1.0),
            Vector(0.0, 1.0, 0.0),
            green,
        ),
        light_primitive,
        sphere(
            Point(0.3, 0.15, 0.4),
            0.15,
            Arc::new(Material::new_metal(
                Color {
                    r: 0.9,
                    g: 0.9,
                    b: 0.9,
                },
                0.0,
            )),
        ),
        sphere(
            Point(0.7, 0.15, 0.65),
            0.15,
            Arc::new(Material::new_dielectric(1.5)),
        ),
    ];

    let camera = Camera::new(
        Point(0.5, 0.5, 2.4),
        Point(0.5, 0.5, 0.5),
        Vector(0.0, 1.0, 0.0),
        40.0,
        width,
        height,
        0.0,
        1.9,
    )
    .expect("preset camera is valid");

    Scene::new(
        primitives,
        vec![light],
        camera,
        SamplingConfig { max_depth: 8 },
    )
}

/// A glass sphere focusing a small bright quad light onto a diffuse floor.
/// The caustic under the sphere is essentially invisible to unidirectional
/// path tracing at low sample counts.
pub fn caustic(width: usize, height: usize) -> Scene {
    let floor = quad(
        Point(-10.0, 0.0, 10.0),
        Vector(0.0, 0.0, -20.0),
        Vector(20.0, 0.0, 0.0),
        Arc::new(Material::new_lambertian(Color {
            r: 0.8,
            g: 0.8,
            b: 0.8,
        })),
    );
    let glass = sphere(
        Point(0.0, 0.55, 0.0),
        0.3,
        Arc::new(Material::new_dielectric(1.5)),
    );
    let (light_primitive, light) = quad_light(
        Point(-0.1, 1.4, -0.1),
        Vector(0.2, 0.0, 0.0),
        Vector(0.0, 0.0, 0.2),
        Color {
            r: 40.0,
            g: 40.0,
            b: 40.0,
        },
    );

    let camera = Camera::new(
        Point(0.0, 1.0, 2.2),
        Point(0.0, 0.35, 0.0),
        Vector(0.0, 1.0, 0.0),
        45.0,
        width,
        height,
        0.0,
        2.4,
    )
    .expect("preset camera is valid");

    Scene::new(
        vec![floor, glass, light_primitive],
        vec![light],
        camera,
        SamplingConfig { max_depth: 10 },
    )
}

/// A field of randomly materialled spheres under a gradient sky.
pub fn sphere_grid(width: usize, height: usize) -> Scene {
    let mut rng = rand::rngs::StdRng::seed_from_u64(19);

    let mut primitives = vec![sphere(
        Point(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Material::new_lambertian(Color {
            r: 0.7,
            g: 0.65,
            b: 0.55,
        })),
    )];

    for x in -3..3 {
        for z in -3..3 {
            let radius = rng.gen_range(0.15..0.3);
            let albedo = Color {
                r: rng.gen_range(0.2..0.95),
                g: rng.gen_range(0.2..0.95),
                b: rng.gen_range(0.2..0.95),
            };
            let material: Arc<Material> = match rng.gen_range(0..10) {
                0 | 1 => Arc::new(Material::new_metal(albedo, rng.gen_range(0.0..0.3))),
                2 => Arc::new(Material::new_dielectric(1.0 + rng.gen::<f64>())),
                3 => Arc::new(Material::new_mix(
                    Arc::new(Material::new_lambertian(albedo)),
                    Arc::new(Material::new_metal(Color::WHITE, 0.05)),
                    0.7,
                )),
                _ => Arc::new(Material::new_lambertian(albedo)),
            };
            primitives.push(sphere(
                Point(
                    x as f64 + rng.gen_range(0.0..0.6),
                    radius,
                    z as f64 + rng.gen_range(0.0..0.3),
                ),
                radius,
                material,
            ));
        }
    }

    let lights = vec![Arc::new(Light::GradientInfinite {
        horizon: Color::WHITE,
        zenith: Color {
            r: 0.5,
            g: 0.7,
            b: 1.0,
        },
    })];

    let camera = Camera::new(
        Point(4.0, 1.6, 4.0),
        Point(0.0, 0.3, 0.0),
        Vector(0.0, 1.0, 0.0),
        35.0,
        width,
        height,
        0.05,
        5.6,
    )
    .expect("preset camera is valid");

    Scene::new(primitives, lights, camera, SamplingConfig { max_depth: 6 })
}
