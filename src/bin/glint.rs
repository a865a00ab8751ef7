use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use glint::{
    color::Color,
    integrator::Integrator,
    renderer::{new_cancel_flag, render_progressive, RenderConfig},
    scene::Scene,
    scenes,
};
use log::{error, info, LevelFilter};

#[derive(Parser)]
#[clap(about = "Progressive physically-based raytracer")]
struct Cli {
    /// Scene preset: cornell, caustic, sphere-grid, environment
    #[clap(long, short, default_value_t = String::from("cornell"))]
    scene: String,

    #[clap(long, default_value_t = 512)]
    width: usize,

    #[clap(long, default_value_t = 512)]
    height: usize,

    #[clap(long, default_value_t = 8)]
    max_passes: usize,

    #[clap(long, default_value_t = 256)]
    max_samples: usize,

    /// Worker threads; 0 uses every CPU
    #[clap(long, default_value_t = 0)]
    workers: usize,

    /// Integrator: path-tracing or bdpt
    #[clap(long, default_value_t = String::from("path-tracing"))]
    integrator: String,

    #[clap(long, default_value_t = String::from("out"))]
    out: String,
}

fn save_png(path: &PathBuf, pixels: &[Color], width: usize, height: usize) -> Result<(), String> {
    let mut data = Vec::with_capacity(width * height * 3);
    for color in pixels {
        let (r, g, b) = color.to_rgb();
        data.extend_from_slice(&[r, g, b]);
    }
    let image = image::RgbImage::from_raw(width as u32, height as u32, data)
        .ok_or_else(|| "pixel buffer does not match dimensions".to_string())?;
    image.save(path).map_err(|e| e.to_string())
}

fn run(args: Cli) -> Result<(), String> {
    let scene: Scene = match args.scene.as_str() {
        "cornell" => scenes::cornell(args.width, args.height),
        "caustic" => scenes::caustic(args.width, args.height),
        "sphere-grid" => scenes::sphere_grid(args.width, args.height),
        "environment" => scenes::environment(args.width, args.height, Color::WHITE),
        other => return Err(format!("unknown scene preset '{}'", other)),
    };

    let integrator = match args.integrator.as_str() {
        "path-tracing" => Integrator::PathTracing,
        "bdpt" => Integrator::Bdpt,
        other => return Err(format!("unknown integrator '{}'", other)),
    };

    let config = RenderConfig {
        max_passes: args.max_passes,
        max_samples_per_pixel: args.max_samples,
        num_workers: args.workers,
        ..RenderConfig::default()
    };

    let out_dir = PathBuf::from(&args.out).join(&args.scene);
    std::fs::create_dir_all(&out_dir).map_err(|e| e.to_string())?;
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let render = render_progressive(Arc::new(scene), config, integrator, new_cancel_flag())
        .map_err(|e| e.to_string())?;

    let mut last_pixels = None;
    for pass in render.passes.iter() {
        info!(
            "pass {}: {} samples total ({:.1} avg), {} ms",
            pass.pass_index,
            pass.stats.total_samples,
            pass.stats.avg_samples,
            pass.stats.elapsed_ms
        );
        let path = out_dir.join(format!(
            "render_{}_pass_{}.png",
            timestamp, pass.pass_index
        ));
        save_png(&path, &pass.pixels, pass.width, pass.height)?;
        last_pixels = Some((pass.pixels.clone(), pass.width, pass.height));
    }

    if let Ok(e) = render.errors.try_recv() {
        return Err(e.to_string());
    }

    match last_pixels {
        Some((pixels, width, height)) => {
            let path = out_dir.join(format!("render_{}.png", timestamp));
            save_png(&path, &pixels, width, height)?;
            info!("Output written to {}", path.display());
            Ok(())
        }
        None => Err("render produced no passes".to_string()),
    }
}

fn main() {
    env_logger::Builder::new()
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Cli::parse();
    if let Err(message) = run(args) {
        error!("{}", message);
        std::process::exit(1);
    }
}
