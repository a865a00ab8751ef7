use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use glint::{
    color::Color,
    error::RenderError,
    integrator::Integrator,
    renderer::{new_cancel_flag, render_progressive, PassResult, RenderConfig},
    scenes,
};
use pretty_assertions::assert_eq;

fn render_all(
    scene: Arc<glint::scene::Scene>,
    config: RenderConfig,
    integrator: Integrator,
) -> Vec<PassResult> {
    let render = render_progressive(scene, config, integrator, new_cancel_flag())
        .expect("valid configuration");
    render.passes.iter().collect()
}

#[test]
fn rejects_invalid_configuration() {
    let scene = Arc::new(scenes::environment(4, 4, Color::WHITE));

    for config in [
        RenderConfig {
            max_passes: 0,
            ..RenderConfig::default()
        },
        RenderConfig {
            max_samples_per_pixel: 0,
            ..RenderConfig::default()
        },
        RenderConfig {
            tile_size: 0,
            ..RenderConfig::default()
        },
        RenderConfig {
            adaptive_threshold: -0.5,
            ..RenderConfig::default()
        },
        RenderConfig {
            adaptive_min_samples_fraction: 1.5,
            ..RenderConfig::default()
        },
        RenderConfig {
            firefly_clamp: Some(0.0),
            ..RenderConfig::default()
        },
    ] {
        let result = render_progressive(
            Arc::clone(&scene),
            config,
            Integrator::PathTracing,
            new_cancel_flag(),
        );
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }
}

#[test]
fn empty_scene_renders_the_environment() {
    let scene = Arc::new(scenes::environment(1, 1, Color::WHITE));
    let config = RenderConfig {
        max_passes: 1,
        max_samples_per_pixel: 1,
        num_workers: 1,
        ..RenderConfig::default()
    };
    let passes = render_all(scene, config, Integrator::PathTracing);

    assert_eq!(passes.len(), 1);
    assert!(passes[0].is_last);
    assert_eq!(passes[0].pixels, vec![Color::WHITE]);
    assert_eq!(passes[0].stats.total_samples, 1);
    assert_eq!(passes[0].stats.primitive_count, 0);
}

#[test]
fn pass_schedule_doubles_and_finishes_the_budget() {
    let scene = Arc::new(scenes::environment(2, 2, Color::WHITE));
    let config = RenderConfig {
        max_passes: 5,
        max_samples_per_pixel: 8,
        num_workers: 1,
        ..RenderConfig::default()
    };
    let passes = render_all(scene, config, Integrator::PathTracing);

    // 1 + 2 + 4 + 1: the last pass takes exactly the remainder
    let per_pixel: Vec<u64> = passes.iter().map(|p| p.stats.total_samples / 4).collect();
    assert_eq!(per_pixel, vec![1, 3, 7, 8]);
    assert!(passes.last().unwrap().is_last);
    assert!(passes[..passes.len() - 1].iter().all(|p| !p.is_last));

    // Monotone counts, budget respected
    for pair in passes.windows(2) {
        assert!(pair[1].stats.min_samples >= pair[0].stats.min_samples);
        assert!(pair[1].stats.total_samples >= pair[0].stats.total_samples);
    }
    assert_eq!(passes.last().unwrap().stats.max_samples, 8);
}

#[test]
fn deterministic_across_worker_counts() {
    for integrator in [Integrator::PathTracing, Integrator::Bdpt] {
        let render = |workers: usize| {
            let scene = Arc::new(scenes::cornell(32, 32));
            let config = RenderConfig {
                max_passes: 2,
                max_samples_per_pixel: 3,
                num_workers: workers,
                tile_size: 8,
                ..RenderConfig::default()
            };
            render_all(scene, config, integrator)
                .pop()
                .expect("at least one pass")
                .pixels
        };

        let single = render(1);
        let threaded = render(8);
        assert_eq!(single, threaded, "{:?} differs across worker counts", integrator);
    }
}

#[test]
fn repeated_renders_are_bit_identical() {
    let run = || {
        let scene = Arc::new(scenes::sphere_grid(16, 16));
        let config = RenderConfig {
            max_passes: 2,
            max_samples_per_pixel: 2,
            num_workers: 4,
            tile_size: 8,
            ..RenderConfig::default()
        };
        render_all(scene, config, Integrator::PathTracing)
            .pop()
            .unwrap()
            .pixels
    };
    assert_eq!(run(), run());
}

#[test]
fn emissive_quad_viewed_head_on() {
    use glint::{
        camera::Camera,
        geometry::{point::Point, vector::Vector},
        light::Light,
        material::Material,
        primitive::Primitive,
        scene::{SamplingConfig, Scene},
        shape::Shape,
    };

    let emittance = Color {
        r: 15.0,
        g: 15.0,
        b: 15.0,
    };
    // A large quad at z = 0 facing +z, camera looking straight at it
    let shape = Arc::new(Shape::new_quad(
        Point(-10.0, -10.0, 0.0),
        Vector(20.0, 0.0, 0.0),
        Vector(0.0, 20.0, 0.0),
    ));
    let light = Arc::new(Light::Area {
        shape: Arc::clone(&shape),
        emittance,
    });
    let primitive = Arc::new(Primitive::new(
        shape,
        Arc::new(Material::new_emissive(emittance)),
        Some(Arc::clone(&light)),
    ));
    let camera = Camera::new(
        Point(0.0, 0.0, 5.0),
        Point(0.0, 0.0, 0.0),
        Vector(0.0, 1.0, 0.0),
        45.0,
        4,
        4,
        0.0,
        5.0,
    )
    .unwrap();
    let scene = Arc::new(Scene::new(
        vec![primitive],
        vec![light],
        camera,
        SamplingConfig { max_depth: 4 },
    ));

    let config = RenderConfig {
        max_passes: 2,
        max_samples_per_pixel: 4,
        num_workers: 1,
        ..RenderConfig::default()
    };
    let passes = render_all(scene, config, Integrator::PathTracing);
    for pixel in &passes.last().unwrap().pixels {
        // Every camera ray hits the emitter front face; the estimate is
        // exact, not just unbiased
        assert_eq!(*pixel, emittance);
    }
}

#[test]
fn furnace_converges_to_albedo() {
    let albedo = 0.5;
    let scene = Arc::new(scenes::furnace(
        8,
        8,
        Color {
            r: albedo,
            g: albedo,
            b: albedo,
        },
    ));
    let config = RenderConfig {
        max_passes: 8,
        max_samples_per_pixel: 128,
        num_workers: 0,
        ..RenderConfig::default()
    };
    let passes = render_all(scene, config, Integrator::PathTracing);
    let pixels = &passes.last().unwrap().pixels;

    let mean = pixels.iter().map(|p| p.luminance()).sum::<f64>() / pixels.len() as f64;
    assert_abs_diff_eq!(mean, albedo, epsilon = 0.03);
}

#[test]
fn adaptive_termination_stops_converged_pixels() {
    // Zero-variance scene: every pixel converges as soon as it is allowed to
    let scene = Arc::new(scenes::environment(4, 4, Color::WHITE));
    let config = RenderConfig {
        max_passes: 4,
        max_samples_per_pixel: 8,
        num_workers: 1,
        adaptive_min_samples_fraction: 0.5,
        adaptive_threshold: 0.05,
        ..RenderConfig::default()
    };
    let passes = render_all(scene, config, Integrator::PathTracing);
    let last = passes.last().unwrap();

    // Budget is 8 but sampling stops at the 4-sample minimum
    assert_eq!(last.stats.max_samples, 4);
    assert_eq!(last.stats.min_samples, 4);
    // The image is still exact
    assert_eq!(last.pixels, vec![Color::WHITE; 16]);

    // Counts never decrease between passes
    for pair in passes.windows(2) {
        assert!(pair[1].stats.min_samples >= pair[0].stats.min_samples);
    }
}

#[test]
fn cancellation_finishes_the_current_pass() {
    let config = RenderConfig {
        max_passes: 5,
        max_samples_per_pixel: 64,
        num_workers: 2,
        tile_size: 8,
        ..RenderConfig::default()
    };
    let cancel = new_cancel_flag();
    let render = render_progressive(
        Arc::new(scenes::cornell(32, 32)),
        config,
        Integrator::PathTracing,
        Arc::clone(&cancel),
    )
    .unwrap();

    let first = render
        .passes
        .recv_timeout(Duration::from_secs(60))
        .expect("first pass arrives");
    cancel.store(true, Ordering::Relaxed);

    let mut results = vec![first];
    results.extend(render.passes.iter());

    // The stream ended early, with exactly one is_last marker at the end
    assert!(results.len() < 5);
    assert!(results.last().unwrap().is_last);
    assert!(results[..results.len() - 1].iter().all(|p| !p.is_last));
}

#[test]
fn tile_events_cover_the_image() {
    let scene = Arc::new(scenes::environment(10, 6, Color::WHITE));
    let config = RenderConfig {
        max_passes: 1,
        max_samples_per_pixel: 1,
        num_workers: 1,
        tile_size: 4,
        emit_tile_events: true,
        ..RenderConfig::default()
    };
    let render = render_progressive(scene, config, Integrator::PathTracing, new_cancel_flag())
        .expect("valid configuration");
    let _passes: Vec<_> = render.passes.iter().collect();
    let events: Vec<_> = render.tile_events.unwrap().iter().collect();

    // 3 x 2 tiles, each with PNG payload
    assert_eq!(events.len(), 6);
    let mut covered = 0;
    for event in &events {
        assert_eq!(event.pass_index, 0);
        assert!(!event.png.is_empty());
        // PNG magic
        assert_eq!(&event.png[..4], &[0x89, b'P', b'N', b'G']);
        covered += event.width * event.height;
    }
    assert_eq!(covered, 60);
}
