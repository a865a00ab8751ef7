use std::sync::Arc;

use approx::assert_abs_diff_eq;
use glint::{
    bvh::Bvh,
    color::Color,
    geometry::point::Point,
    material::Material,
    p,
    primitive::Primitive,
    ray::Ray,
    sampling::sampling_fns::sample_sphere,
    shape::Shape,
    v,
};
use pretty_assertions::assert_eq;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn sphere_primitive(origin: Point, radius: f64) -> Arc<Primitive> {
    Arc::new(Primitive::new(
        Arc::new(Shape::new_sphere(origin, radius)),
        Arc::new(Material::new_lambertian(Color::WHITE)),
        None,
    ))
}

#[test]
fn two_spheres() {
    let bvh = Bvh::new(vec![
        sphere_primitive(p!(0.5, 0.5, 0.5), 0.5),
        sphere_primitive(p!(1.5, 0.5, 0.5), 0.5),
    ]);

    // From the left
    assert_eq!(
        p!(0, 0.5, 0.5),
        bvh.intersect(&mut Ray::new(p!(-1, 0.5, 0.5), v!(1, 0, 0)))
            .unwrap()
            .location
    );

    // From the right
    assert_eq!(
        p!(2, 0.5, 0.5),
        bvh.intersect(&mut Ray::new(p!(3, 0.5, 0.5), v!(-1, 0, 0)))
            .unwrap()
            .location
    );

    // From inside the first sphere
    assert_eq!(
        p!(1, 0.5, 0.5),
        bvh.intersect(&mut Ray::new(p!(0.5, 0.5, 0.5), v!(1, 0, 0)))
            .unwrap()
            .location
    );
    assert_eq!(
        p!(0, 0.5, 0.5),
        bvh.intersect(&mut Ray::new(p!(0.5, 0.5, 0.5), v!(-1, 0, 0)))
            .unwrap()
            .location
    );
}

#[test]
fn empty_scene_hits_nothing() {
    let bvh = Bvh::new(vec![]);
    assert!(bvh
        .intersect(&mut Ray::new(p!(0, 0, 0), v!(1, 0, 0)))
        .is_none());
    assert!(!bvh.intersects(&Ray::new(p!(0, 0, 0), v!(1, 0, 0))));
}

#[test]
fn matches_brute_force() {
    let mut rng = SmallRng::seed_from_u64(42);
    let primitives: Vec<Arc<Primitive>> = (0..60)
        .map(|_| {
            sphere_primitive(
                Point(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                ),
                rng.gen_range(0.1..1.5),
            )
        })
        .collect();
    let bvh = Bvh::new(primitives.clone());

    let mut sampler = glint::sampling::samplers::TileSampler::new(7);
    let mut hits = 0;
    for _ in 0..500 {
        let origin = Point(
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
            rng.gen_range(-15.0..15.0),
        );
        let direction = sample_sphere(sampler.sample_2d());
        let brute_force = primitives
            .iter()
            .filter_map(|primitive| {
                let mut probe = Ray::new(origin, direction);
                primitive.intersect(&mut probe).map(|hit| hit.distance)
            })
            .min_by(f64::total_cmp);

        let mut ray = Ray::new(origin, direction);
        let traversed = bvh.intersect(&mut ray).map(|hit| hit.distance);

        match (brute_force, traversed) {
            (None, None) => {}
            (Some(expected), Some(actual)) => {
                hits += 1;
                assert_abs_diff_eq!(expected, actual, epsilon = 1e-9);
            }
            (expected, actual) => {
                panic!("brute force {:?} but traversal {:?}", expected, actual)
            }
        }
    }
    // The scene is dense enough that many rays must hit
    assert!(hits > 100, "only {} rays hit", hits);
}

#[test]
fn shadow_query_respects_max_distance() {
    let bvh = Bvh::new(vec![sphere_primitive(p!(5, 0, 0), 1.0)]);

    let mut blocked = Ray::new(p!(0, 0, 0), v!(1, 0, 0));
    blocked.update_max_distance(10.0);
    assert!(bvh.intersects(&blocked));

    // The occluder lies beyond the ray's reach
    let mut short = Ray::new(p!(0, 0, 0), v!(1, 0, 0));
    short.update_max_distance(2.0);
    assert!(!bvh.intersects(&short));
}
