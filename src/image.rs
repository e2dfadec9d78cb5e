//! The progressive accumulation buffer and its Ward tone-mapped PPM
//! encoding. Mirrors the teacher's `Framebuffer`/`write_ppm` split (plain
//! accumulator, format written on demand) but accumulates radiance across
//! iterations instead of holding one final color per pixel.

use crate::constants::{DISPLAY_LUMINANCE_MAX, GAMMA_ENCODE, LUMINANCE_WEIGHTS};
use crate::vec3::Color;
use std::io::{self, Write};

/// A width×height grid of accumulated (unnormalized) radiance sums. Each
/// iteration adds one sample per pixel via [`Image::add_to_pixel`]; the
/// running total is divided down by the iteration count only at encode
/// time, in [`Image::write_ppm`].
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::zero(); (width as usize) * (height as usize)],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Adds `radiance` to the pixel at `(x, y)`. The vertical axis is
    /// flipped at write time (`height - 1 - y`) so the image-plane's
    /// bottom-up `y` produces top-down PPM output.
    pub fn add_to_pixel(&mut self, x: u32, y: u32, radiance: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let flipped_y = self.height - 1 - y;
        let index = (x + flipped_y * self.width) as usize;
        self.pixels[index] += radiance;
    }

    /// Writes the accumulated image as binary PPM (P6), dividing every
    /// pixel by `max(iteration, 1)` and applying Ward tone mapping
    /// followed by gamma encoding.
    pub fn write_ppm(&self, out: &mut impl Write, iteration: u32) -> io::Result<()> {
        write!(out, "P6\n# http://www.hxa.name/minilight\n\n")?;
        write!(out, "{} {}\n255\n", self.width, self.height)?;

        let divider = 1.0 / (iteration.max(1) as f64);
        let scale = self.ward_scale(divider);

        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in &self.pixels {
            let scaled = *pixel * divider;
            for channel in [scaled.x, scaled.y, scaled.z] {
                let gamma_encoded = (channel * scale).max(0.0).powf(GAMMA_ENCODE);
                let quantized = (gamma_encoded * 255.0 + 0.5).floor().min(255.0);
                bytes.push(quantized as u8);
            }
        }
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Ward's tone-mapping scale factor, derived from the image's
    /// log-average (adaptation) luminance.
    fn ward_scale(&self, divider: f64) -> f64 {
        let (wr, wg, wb) = LUMINANCE_WEIGHTS;
        let n = self.pixels.len().max(1) as f64;

        let log_sum: f64 = self
            .pixels
            .iter()
            .map(|p| {
                let scaled = *p * divider;
                let y = scaled.x * wr + scaled.y * wg + scaled.z * wb;
                y.max(1e-4).log10()
            })
            .sum();

        let adapt_luminance = 10f64.powf(log_sum / n);

        let ld = DISPLAY_LUMINANCE_MAX;
        let a = 1.219 + (ld / 4.0).powf(0.4);
        let b = 1.219 + adapt_luminance.powf(0.4);
        (a / b).powf(2.5) / ld
    }
}
