use std::sync::Arc;

use approx::assert_abs_diff_eq;
use glint::{
    color::Color,
    geometry::traits::DotProduct,
    light::{Light, LightSampler},
    p,
    pdf::Pdf,
    ray::Ray,
    sampling::samplers::TileSampler,
    shape::Shape,
    v,
};
use pretty_assertions::assert_eq;

fn quad_light() -> Light {
    // 1x1 emitter at y = 2 with its normal pointing down
    Light::Area {
        shape: Arc::new(Shape::new_quad(
            p!(-0.5, 2, -0.5),
            v!(1, 0, 0),
            v!(0, 0, 1),
        )),
        emittance: Color {
            r: 10.0,
            g: 10.0,
            b: 10.0,
        },
    }
}

#[test]
fn area_sample_points_at_the_light() {
    let light = quad_light();
    let mut sampler = TileSampler::new(21);
    let reference = p!(0, 0, 0);

    for _ in 0..32 {
        let sample = light.sample_Li(sampler.sample_2d(), &reference);
        assert!(sample.w_i.y() > 0.0, "light is above the reference");
        assert_abs_diff_eq!(sample.w_i.magnitude(), 1.0, epsilon = 1e-9);
        assert_eq!(
            sample.Li,
            Color {
                r: 10.0,
                g: 10.0,
                b: 10.0
            }
        );
        assert!(sample.pdf.value_or(0.0) > 0.0);
        // The shadow ray stops just short of the light surface
        assert!(sample.shadow_ray.max_distance < (sample.location - reference).magnitude());
        assert_abs_diff_eq!(sample.location.y(), 2.0, epsilon = 1e-9);
    }
}

#[test]
fn area_light_is_one_sided() {
    let light = quad_light();
    let mut sampler = TileSampler::new(22);
    // Above the quad, on its back side
    let sample = light.sample_Li(sampler.sample_2d(), &p!(0, 4, 0));
    assert_eq!(sample.Li, Color::BLACK);
}

#[test]
fn area_pdf_matches_sampling() {
    let light = quad_light();
    let mut sampler = TileSampler::new(23);
    let reference = p!(0.2, 0, -0.1);

    for _ in 0..32 {
        let sample = light.sample_Li(sampler.sample_2d(), &reference);
        let sampled_pdf = sample.pdf.value_or(0.0);
        let queried_pdf = light.pdf_Li(&reference, &sample.w_i).value_or(0.0);
        assert_abs_diff_eq!(queried_pdf, sampled_pdf, epsilon = 1e-6 * sampled_pdf);
    }
    // Directions that miss the quad have zero density
    assert_eq!(
        light.pdf_Li(&reference, &v!(0, -1, 0)).value_or(1.0),
        0.0
    );
}

#[test]
fn sphere_light_cone_sampling() {
    let light = Light::Area {
        shape: Arc::new(Shape::new_sphere(p!(0, 5, 0), 1.0)),
        emittance: Color::WHITE,
    };
    let mut sampler = TileSampler::new(24);
    let reference = p!(0, 0, 0);

    for _ in 0..32 {
        let sample = light.sample_Li(sampler.sample_2d(), &reference);
        // Every sampled direction lies in the cone subtended by the sphere
        let cos_to_center = sample.w_i.dot(&v!(0, 1, 0));
        let cos_theta_max = (1.0 - (1.0_f64 / 25.0)).sqrt();
        assert!(cos_to_center >= cos_theta_max - 1e-9);
        assert_eq!(sample.Li, Color::WHITE);
        assert_abs_diff_eq!(
            sample.pdf.value_or(0.0),
            1.0 / (2.0 * std::f64::consts::PI * (1.0 - cos_theta_max)),
            epsilon = 1e-9
        );
    }
}

#[test]
fn point_light_is_delta() {
    let light = Light::Point {
        origin: p!(0, 3, 0),
        intensity: Color::WHITE,
    };
    assert!(light.is_delta());

    let mut sampler = TileSampler::new(25);
    let sample = light.sample_Li(sampler.sample_2d(), &p!(0, 0, 0));
    assert_eq!(sample.pdf, Pdf::Delta);
    assert_eq!(sample.w_i, v!(0, 1, 0));
    // Inverse square falloff
    assert_abs_diff_eq!(sample.Li.r, 1.0 / 9.0, epsilon = 1e-12);
}

#[test]
fn infinite_lights_shade_the_escape_direction() {
    let uniform = Light::UniformInfinite {
        radiance: Color {
            r: 0.5,
            g: 0.6,
            b: 0.7,
        },
    };
    let up = Ray::new(p!(0, 0, 0), v!(0, 1, 0));
    let down = Ray::new(p!(0, 0, 0), v!(0, -1, 0));
    assert_eq!(
        uniform.Le(&up),
        Color {
            r: 0.5,
            g: 0.6,
            b: 0.7
        }
    );
    assert_eq!(uniform.Le(&up), uniform.Le(&down));

    let gradient = Light::GradientInfinite {
        horizon: Color::BLACK,
        zenith: Color::WHITE,
    };
    assert_eq!(gradient.Le(&up), Color::WHITE);
    assert_eq!(gradient.Le(&down), Color::BLACK);
    let level = Ray::new(p!(0, 0, 0), v!(1, 0, 0));
    assert_abs_diff_eq!(gradient.Le(&level).r, 0.5, epsilon = 1e-9);

    assert!(uniform.is_infinite());
    assert!(!uniform.is_delta());
}

#[test]
fn image_light_looks_up_pixels() {
    // 2x1 map: left half red, right half blue
    let mut image = image::Rgb32FImage::new(2, 1);
    image.put_pixel(0, 0, image::Rgb([1.0, 0.0, 0.0]));
    image.put_pixel(1, 0, image::Rgb([0.0, 0.0, 1.0]));
    let light = Light::new_image_infinite(&image, 0.0);

    // phi = -pi/2 maps to u = 0.25, phi = +pi/2 to u = 0.75
    let left = Ray::new(p!(0, 0, 0), v!(0, 0, -1));
    let right = Ray::new(p!(0, 0, 0), v!(0, 0, 1));
    let red = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
    let blue = Color {
        r: 0.0,
        g: 0.0,
        b: 1.0,
    };
    assert_eq!(light.Le(&left), red);
    assert_eq!(light.Le(&right), blue);

    // A half-turn around the vertical axis swaps the halves
    let rotated = Light::new_image_infinite(&image, std::f64::consts::PI);
    assert_eq!(rotated.Le(&left), blue);
    assert_eq!(rotated.Le(&right), red);
}

#[test]
fn sample_le_leaves_the_light() {
    let light = quad_light();
    let mut sampler = TileSampler::new(26);

    for _ in 0..32 {
        let le = light.sample_Le(
            sampler.sample_2d(),
            sampler.sample_2d(),
            p!(0, 0, 0),
            100.0,
        );
        // Quad normal points down, so emission heads downwards
        assert!(le.ray.direction.y() < 0.0);
        assert_abs_diff_eq!(le.ray.origin.y(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(le.pdf_pos, 1.0, epsilon = 1e-9);
        assert!(le.pdf_dir > 0.0);
    }
}

#[test]
fn power_sampler_prefers_bright_lights() {
    let dim = Arc::new(Light::Area {
        shape: Arc::new(Shape::new_quad(p!(0, 2, 0), v!(1, 0, 0), v!(0, 0, 1))),
        emittance: Color {
            r: 1.0,
            g: 1.0,
            b: 1.0,
        },
    });
    let bright = Arc::new(Light::Area {
        shape: Arc::new(Shape::new_quad(p!(5, 2, 0), v!(1, 0, 0), v!(0, 0, 1))),
        emittance: Color {
            r: 99.0,
            g: 99.0,
            b: 99.0,
        },
    });
    let sampler_distribution = LightSampler::new(&[Arc::clone(&dim), Arc::clone(&bright)]);

    assert_abs_diff_eq!(sampler_distribution.pdf(0), 0.01, epsilon = 1e-9);
    assert_abs_diff_eq!(sampler_distribution.pdf(1), 0.99, epsilon = 1e-9);
    assert_abs_diff_eq!(sampler_distribution.pdf_of(&bright), 0.99, epsilon = 1e-9);

    // Selection follows the distribution
    let mut sampler = TileSampler::new(27);
    let mut bright_picks = 0;
    for _ in 0..200 {
        let (index, _, pdf) = sampler_distribution.sample(sampler.sample_1d()).unwrap();
        if index == 1 {
            bright_picks += 1;
            assert_abs_diff_eq!(pdf, 0.99, epsilon = 1e-9);
        }
    }
    assert!(bright_picks > 150);
}
