use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};

use crate::{
    color::Color,
    error::RenderError,
    film::{encode_png, Film, PixelBlock, Splat},
    integrator::{Integrator, PathSettings},
    sampling::samplers::TileSampler,
    scene::Scene,
};

/// How hard to work on the image. Everything that changes *what* the image
/// converges to lives in the scene's SamplingConfig instead.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub max_passes: usize,
    /// Total per-pixel sample budget across all passes.
    pub max_samples_per_pixel: usize,
    /// 0 means one worker per host CPU.
    pub num_workers: usize,
    pub tile_size: usize,
    pub rr_min_bounces: usize,
    pub rr_min_samples: usize,
    /// Fraction of the per-pixel budget a pixel must reach before the
    /// adaptive criterion may stop it within a pass.
    pub adaptive_min_samples_fraction: f64,
    /// Relative 95% confidence half-width below which a pixel stops for the
    /// rest of the pass. 0 disables adaptive termination.
    pub adaptive_threshold: f64,
    /// Per-sample luminance ceiling. Applied after MIS weighting.
    pub firefly_clamp: Option<f64>,
    pub emit_tile_events: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            max_passes: 10,
            max_samples_per_pixel: 256,
            num_workers: 0,
            tile_size: 64,
            rr_min_bounces: 3,
            rr_min_samples: 16,
            adaptive_min_samples_fraction: 0.1,
            adaptive_threshold: 0.0,
            firefly_clamp: None,
            emit_tile_events: false,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_passes == 0 {
            return Err(RenderError::InvalidConfig(
                "max_passes must be at least 1".to_string(),
            ));
        }
        if self.max_samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig(
                "max_samples_per_pixel must be at least 1".to_string(),
            ));
        }
        if self.tile_size == 0 {
            return Err(RenderError::InvalidConfig(
                "tile_size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.adaptive_min_samples_fraction) {
            return Err(RenderError::InvalidConfig(
                "adaptive_min_samples_fraction must lie in [0, 1]".to_string(),
            ));
        }
        if self.adaptive_threshold < 0.0 || !self.adaptive_threshold.is_finite() {
            return Err(RenderError::InvalidConfig(
                "adaptive_threshold must be non-negative".to_string(),
            ));
        }
        if let Some(clamp) = self.firefly_clamp {
            if clamp <= 0.0 {
                return Err(RenderError::InvalidConfig(
                    "firefly_clamp must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Aggregate counters published with every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    pub total_samples: u64,
    pub min_samples: u32,
    pub max_samples: u32,
    pub avg_samples: f64,
    pub primitive_count: usize,
    pub non_finite_samples: u64,
    pub elapsed_ms: u64,
}

/// One completed pass: a snapshot of the framebuffer and where the render
/// stands. `is_last` marks the final pass, whether by schedule, budget or
/// cancellation.
#[derive(Debug, Clone)]
pub struct PassResult {
    pub pass_index: usize,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub stats: RenderStats,
    pub is_last: bool,
}

/// Progress notification for a single tile within a pass, carrying the
/// tile's current colors as an encoded PNG block.
#[derive(Debug, Clone)]
pub struct TileEvent {
    pub tile_x: usize,
    pub tile_y: usize,
    pub pass_index: usize,
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
    pub png: Vec<u8>,
}

pub type CancelFlag = Arc<AtomicBool>;

pub fn new_cancel_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}

/// The receiving half of a progressive render. Dropping the receivers
/// stops the render at the next pass boundary.
pub struct Render {
    pub passes: mpsc::Receiver<PassResult>,
    pub tile_events: Option<mpsc::Receiver<TileEvent>>,
    pub errors: mpsc::Receiver<RenderError>,
}

#[derive(Debug, Clone, Copy)]
struct Tile {
    tile_x: usize,
    tile_y: usize,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

struct TileOutput {
    tile_x: usize,
    tile_y: usize,
    block: PixelBlock,
    splats: Vec<Splat>,
    non_finite: u64,
}

/// Read-only view of the per-pixel statistics at the start of a pass, from
/// which workers make their adaptive decisions.
struct PassSnapshot {
    samples: Vec<u32>,
    lum_sum: Vec<f64>,
    lum_sq: Vec<f64>,
}

fn generate_tiles(width: usize, height: usize, tile_size: usize) -> Vec<Tile> {
    let mut tiles = Vec::new();
    for (tile_y, y0) in (0..height).step_by(tile_size).enumerate() {
        for (tile_x, x0) in (0..width).step_by(tile_size).enumerate() {
            tiles.push(Tile {
                tile_x,
                tile_y,
                x0,
                y0,
                x1: (x0 + tile_size).min(width),
                y1: (y0 + tile_size).min(height),
            });
        }
    }
    tiles
}

/// Per-pass sample counts: doubling from 1, with the last pass taking
/// exactly what remains of the per-pixel budget.
fn pass_schedule(max_passes: usize, max_samples_per_pixel: usize) -> Vec<usize> {
    let mut schedule = Vec::new();
    let mut total = 0;
    let mut next = 1;
    for _ in 0..max_passes {
        if total >= max_samples_per_pixel {
            break;
        }
        let samples = next.min(max_samples_per_pixel - total);
        schedule.push(samples);
        total += samples;
        next *= 2;
    }
    schedule
}

/// Starts a progressive render and returns its event streams. Configuration
/// and scene preconditions are checked here, before any worker starts; once
/// this returns Ok the render only ends by completing or by cancellation.
pub fn render_progressive(
    scene: Arc<Scene>,
    config: RenderConfig,
    integrator: Integrator,
    cancel: CancelFlag,
) -> Result<Render, RenderError> {
    config.validate()?;
    let (width, height) = scene.film_bounds();
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidConfig(
            "film dimensions must be positive".to_string(),
        ));
    }

    let (passes_tx, passes_rx) = mpsc::channel();
    let (errors_tx, errors_rx) = mpsc::channel();
    let (tile_events_tx, tile_events_rx) = if config.emit_tile_events {
        let (tx, rx) = mpsc::channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    thread::spawn(move || {
        run_render(scene, config, integrator, cancel, passes_tx, tile_events_tx);
        // The error stream closes silently on success; nothing is ever sent
        // after passes begin
        drop(errors_tx);
    });

    Ok(Render {
        passes: passes_rx,
        tile_events: tile_events_rx,
        errors: errors_rx,
    })
}

fn run_render(
    scene: Arc<Scene>,
    config: RenderConfig,
    integrator: Integrator,
    cancel: CancelFlag,
    passes_tx: mpsc::Sender<PassResult>,
    tile_events_tx: Option<mpsc::Sender<TileEvent>>,
) {
    let (width, height) = scene.film_bounds();
    let num_workers = if config.num_workers == 0 {
        num_cpus::get()
    } else {
        config.num_workers
    };
    let tiles = generate_tiles(width, height, config.tile_size);
    let schedule = pass_schedule(config.max_passes, config.max_samples_per_pixel);
    let settings = PathSettings {
        rr_min_bounces: config.rr_min_bounces,
        rr_min_samples: config.rr_min_samples,
    };
    let adaptive_min_samples =
        (config.adaptive_min_samples_fraction * config.max_samples_per_pixel as f64).ceil() as u32;

    let mut film = Film::new(width, height);
    let mut non_finite_total = 0u64;
    let start = Instant::now();

    info!(
        "Rendering {}x{} with {:?}: {} tiles, {} workers, {} passes planned",
        width,
        height,
        integrator,
        tiles.len(),
        num_workers,
        schedule.len()
    );

    for (pass_index, &samples_this_pass) in schedule.iter().enumerate() {
        let snapshot = Arc::new(PassSnapshot {
            samples: film.pixels.samples.clone(),
            lum_sum: film.pixels.sum.iter().map(|c| c.luminance()).collect(),
            lum_sq: film.pixels.lum_sq.clone(),
        });

        let next_tile = AtomicUsize::new(0);
        let (results_tx, results_rx) = mpsc::channel::<TileOutput>();
        // (tile_y, tile_x) tagged splat batches, ordered before merging so
        // the framebuffer does not depend on tile completion order
        let mut splat_batches: Vec<(usize, usize, Vec<Splat>)> = Vec::new();

        thread::scope(|scope| {
            for _ in 0..num_workers {
                let results_tx = results_tx.clone();
                let scene = &scene;
                let tiles = &tiles;
                let next_tile = &next_tile;
                let cancel = &cancel;
                let snapshot = &snapshot;
                let config = &config;
                scope.spawn(move || loop {
                    // Cancellation is polled at tile granularity only
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let index = next_tile.fetch_add(1, Ordering::SeqCst);
                    if index >= tiles.len() {
                        break;
                    }
                    let output = render_tile(
                        scene,
                        &tiles[index],
                        pass_index,
                        samples_this_pass,
                        integrator,
                        &settings,
                        snapshot,
                        config,
                        adaptive_min_samples,
                        width,
                    );
                    if results_tx.send(output).is_err() {
                        break;
                    }
                });
            }
            drop(results_tx);

            // Single consumer: merge tiles as they complete
            for output in results_rx.iter() {
                film.merge_tile(&output.block);
                non_finite_total += output.non_finite;

                if let Some(tx) = &tile_events_tx {
                    let event = tile_event(&film, &output, pass_index);
                    // A dropped event receiver is not an error; passes keep
                    // flowing
                    let _ = tx.send(event);
                }

                if !output.splats.is_empty() {
                    splat_batches.push((output.tile_y, output.tile_x, output.splats));
                }
                debug!(
                    "pass {} tile ({}, {}) merged",
                    pass_index, output.tile_x, output.tile_y
                );
            }
        });

        // Deterministic splat application: batches ordered by tile, then a
        // stable sort by target pixel and in-pass sample index
        splat_batches.sort_by_key(|&(tile_y, tile_x, _)| (tile_y, tile_x));
        let mut splats: Vec<Splat> = splat_batches.into_iter().flat_map(|(_, _, s)| s).collect();
        splats.sort_by_key(|splat| (splat.y, splat.x, splat.sample_index));
        for splat in &splats {
            film.add_splat(splat);
        }

        let cancelled = cancel.load(Ordering::Relaxed);
        let is_last = cancelled || pass_index + 1 == schedule.len();
        let stats = collect_stats(&film, &scene, non_finite_total, start);
        info!(
            "pass {} done: {} total samples, {:.1} avg/pixel, {} ms",
            pass_index, stats.total_samples, stats.avg_samples, stats.elapsed_ms
        );

        let result = PassResult {
            pass_index,
            width,
            height,
            pixels: film.snapshot(),
            stats,
            is_last,
        };
        if passes_tx.send(result).is_err() {
            // Receiver went away; treat like cancellation
            break;
        }
        if is_last {
            break;
        }
    }
}

fn collect_stats(
    film: &Film,
    scene: &Scene,
    non_finite_samples: u64,
    start: Instant,
) -> RenderStats {
    let samples = &film.pixels.samples;
    let total_samples: u64 = samples.iter().map(|&n| n as u64).sum();
    RenderStats {
        total_samples,
        min_samples: samples.iter().copied().min().unwrap_or(0),
        max_samples: samples.iter().copied().max().unwrap_or(0),
        avg_samples: total_samples as f64 / samples.len() as f64,
        primitive_count: scene.primitive_count(),
        non_finite_samples,
        elapsed_ms: start.elapsed().as_millis() as u64,
    }
}

fn tile_event(film: &Film, output: &TileOutput, pass_index: usize) -> TileEvent {
    let block = &output.block;
    let pixels: Vec<Color> = (block.y0..block.y0 + block.height)
        .flat_map(|y| (block.x0..block.x0 + block.width).map(move |x| (x, y)))
        .map(|(x, y)| film.pixels.mean_at(x, y))
        .collect();
    TileEvent {
        tile_x: output.tile_x,
        tile_y: output.tile_y,
        pass_index,
        x0: block.x0,
        y0: block.y0,
        width: block.width,
        height: block.height,
        png: encode_png(&pixels, block.width, block.height),
    }
}

#[allow(clippy::too_many_arguments)]
fn render_tile(
    scene: &Scene,
    tile: &Tile,
    pass_index: usize,
    samples_this_pass: usize,
    integrator: Integrator,
    settings: &PathSettings,
    snapshot: &PassSnapshot,
    config: &RenderConfig,
    adaptive_min_samples: u32,
    film_width: usize,
) -> TileOutput {
    let mut sampler =
        TileSampler::for_tile(tile.tile_x, tile.tile_y, pass_index, scene.fingerprint());
    let mut block = PixelBlock::new(tile.x0, tile.y0, tile.x1 - tile.x0, tile.y1 - tile.y0);
    let mut splats: Vec<Splat> = Vec::new();
    let mut sample_splats: Vec<Splat> = Vec::new();
    let mut non_finite = 0u64;

    for y in tile.y0..tile.y1 {
        for x in tile.x0..tile.x1 {
            let offset = x + y * film_width;
            let mut n = snapshot.samples[offset];
            let mut lum_sum = snapshot.lum_sum[offset];
            let mut lum_sq = snapshot.lum_sq[offset];

            for k in 0..samples_this_pass {
                if config.adaptive_threshold > 0.0
                    && n >= adaptive_min_samples.max(2)
                    && converged(n, lum_sum, lum_sq, config.adaptive_threshold)
                {
                    break;
                }

                sample_splats.clear();
                let value = integrator.estimate_Li(
                    &mut sampler,
                    scene,
                    x,
                    y,
                    n as usize,
                    k as u32,
                    settings,
                    &mut sample_splats,
                );
                let value = sanitize(value, config.firefly_clamp, &mut non_finite);
                block.add_sample(x, y, value);

                for mut splat in sample_splats.drain(..) {
                    splat.value = sanitize(splat.value, config.firefly_clamp, &mut non_finite);
                    if !splat.value.is_black() {
                        splats.push(splat);
                    }
                }

                n += 1;
                let luminance = value.luminance();
                lum_sum += luminance;
                lum_sq += luminance * luminance;
            }
        }
    }

    TileOutput {
        tile_x: tile.tile_x,
        tile_y: tile.tile_y,
        block,
        splats,
        non_finite,
    }
}

/// The per-pixel stop criterion: the 95% confidence half-width of the mean
/// luminance, relative to the mean, has fallen under the threshold.
fn converged(n: u32, lum_sum: f64, lum_sq: f64, threshold: f64) -> bool {
    let n = n as f64;
    let mean = lum_sum / n;
    let variance = (lum_sq / n - mean * mean).max(0.0);
    let half_width = 1.96 * (variance / n).sqrt();
    half_width <= threshold * mean.max(1e-9)
}

/// Replaces non-finite sample values with black (counting them) and applies
/// the firefly ceiling.
fn sanitize(value: Color, firefly_clamp: Option<f64>, non_finite: &mut u64) -> Color {
    if !value.is_finite() {
        *non_finite += 1;
        if *non_finite == 1 {
            warn!("non-finite radiance sample replaced with black");
        }
        return Color::BLACK;
    }
    if let Some(ceiling) = firefly_clamp {
        let luminance = value.luminance();
        if luminance > ceiling {
            return value * (ceiling / luminance);
        }
    }
    value
}
