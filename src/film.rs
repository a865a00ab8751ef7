use std::io::Cursor;

use crate::color::Color;

/// A cross-pixel light contribution produced by BDPT's camera connections.
/// Splats are collected per tile and merged at the pass boundary in a
/// deterministic order.
#[derive(Debug, Clone, PartialEq)]
pub struct Splat {
    pub x: usize,
    pub y: usize,
    /// Index of the camera sample (within the pass) that produced the splat;
    /// part of the deterministic merge order.
    pub sample_index: u32,
    pub value: Color,
}

/// Per-pixel accumulation state for a rectangular region. Tiles and the
/// whole-image film share this layout so merging is a pairwise add.
pub struct PixelBlock {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
    /// Sum of camera-path radiance samples.
    pub sum: Vec<Color>,
    /// Sum of squared sample luminance, for the adaptive stop criterion.
    pub lum_sq: Vec<f64>,
    /// Samples taken per pixel.
    pub samples: Vec<u32>,
}

impl PixelBlock {
    pub fn new(x0: usize, y0: usize, width: usize, height: usize) -> PixelBlock {
        PixelBlock {
            x0,
            y0,
            width,
            height,
            sum: vec![Color::BLACK; width * height],
            lum_sq: vec![0.0; width * height],
            samples: vec![0; width * height],
        }
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(x >= self.x0 && y >= self.y0);
        (x - self.x0) + (y - self.y0) * self.width
    }

    pub fn add_sample(&mut self, x: usize, y: usize, value: Color) {
        let offset = self.offset(x, y);
        self.sum[offset] += value;
        let luminance = value.luminance();
        self.lum_sq[offset] += luminance * luminance;
        self.samples[offset] += 1;
    }

    pub fn samples_at(&self, x: usize, y: usize) -> u32 {
        self.samples[self.offset(x, y)]
    }

    /// Mean color of a pixel; black while it has no samples.
    pub fn mean_at(&self, x: usize, y: usize) -> Color {
        let offset = self.offset(x, y);
        if self.samples[offset] == 0 {
            Color::BLACK
        } else {
            self.sum[offset] / self.samples[offset] as f64
        }
    }

}

/// The whole-image accumulator owned by the renderer. Camera-path samples
/// and splats are kept separate; the published framebuffer is the sum of
/// the camera-path mean and the normalized splat buffer.
pub struct Film {
    pub pixels: PixelBlock,
    splat: Vec<Color>,
}

impl Film {
    pub fn new(width: usize, height: usize) -> Film {
        Film {
            pixels: PixelBlock::new(0, 0, width, height),
            splat: vec![Color::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.width
    }

    pub fn height(&self) -> usize {
        self.pixels.height
    }

    pub fn merge_tile(&mut self, tile: &PixelBlock) {
        for ty in 0..tile.height {
            let y = tile.y0 + ty;
            for tx in 0..tile.width {
                let x = tile.x0 + tx;
                let from = tx + ty * tile.width;
                let to = x + y * self.pixels.width;
                self.pixels.sum[to] += tile.sum[from];
                self.pixels.lum_sq[to] += tile.lum_sq[from];
                self.pixels.samples[to] += tile.samples[from];
            }
        }
    }

    pub fn add_splat(&mut self, splat: &Splat) {
        self.splat[splat.x + splat.y * self.pixels.width] += splat.value;
    }

    pub fn total_samples(&self) -> u64 {
        self.pixels.samples.iter().map(|&n| n as u64).sum()
    }

    /// The current framebuffer: camera-path mean plus the splat buffer
    /// normalized by the average camera samples per pixel.
    pub fn snapshot(&self) -> Vec<Color> {
        let pixel_count = (self.pixels.width * self.pixels.height) as f64;
        let avg_samples = self.total_samples() as f64 / pixel_count;
        (0..self.pixels.sum.len())
            .map(|offset| {
                let n = self.pixels.samples[offset];
                let mean = if n == 0 {
                    Color::BLACK
                } else {
                    self.pixels.sum[offset] / n as f64
                };
                if avg_samples > 0.0 {
                    mean + self.splat[offset] / avg_samples
                } else {
                    mean
                }
            })
            .collect()
    }
}

/// Encodes an RGB block as PNG bytes, for per-tile progress events and for
/// the CLI's pass outputs.
pub fn encode_png(pixels: &[Color], width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for color in pixels {
        let (r, g, b) = color.to_rgb();
        data.extend_from_slice(&[r, g, b]);
    }
    let image = image::RgbImage::from_raw(width as u32, height as u32, data)
        .expect("buffer size matches dimensions");
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("in-memory PNG encoding cannot fail");
    bytes.into_inner()
}
