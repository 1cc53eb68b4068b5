//! Decoded tattoo images.
//!
//! Decoding happens outside the engine; this type only holds the finished
//! RGBA8 buffer and knows how to sample it.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ImageError {
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// A decoded RGBA8 image with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct TattooImage {
    width: u32,
    height: u32,
    /// Row-major RGBA8, top row first
    pixels: Vec<u8>,
}

impl TattooImage {
    /// Wrap a row-major RGBA8 buffer
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ImageError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A single-color image, mostly useful for tests and previews
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Result<Self, ImageError> {
        let count = width as usize * height as usize;
        Self::new(width, height, color.repeat(count))
    }

    pub fn from_rgba_image(image: image::RgbaImage) -> Result<Self, ImageError> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }

    /// Convert any decoded image to RGBA8
    pub fn from_dynamic(image: &image::DynamicImage) -> Result<Self, ImageError> {
        Self::from_rgba_image(image.to_rgba8())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Texel as normalized RGBA; coordinates are clamped to the image
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let idx = (y * self.width as usize + x) * 4;
        let p = &self.pixels[idx..idx + 4];
        [
            p[0] as f32 / 255.0,
            p[1] as f32 / 255.0,
            p[2] as f32 / 255.0,
            p[3] as f32 / 255.0,
        ]
    }

    /// Bilinear sample at a position in texel space, where texel centres sit
    /// at `i + 0.5`. Edges are clamped.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> [f32; 4] {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        // Interpolate premultiplied so transparent texels do not bleed color.
        // The lerp form keeps uniform regions exact.
        let premul = |c: [f32; 4]| [c[0] * c[3], c[1] * c[3], c[2] * c[3], c[3]];
        let lerp = |a: [f32; 4], b: [f32; 4], t: f32| {
            [
                a[0] + (b[0] - a[0]) * t,
                a[1] + (b[1] - a[1]) * t,
                a[2] + (b[2] - a[2]) * t,
                a[3] + (b[3] - a[3]) * t,
            ]
        };
        let top = lerp(premul(c00), premul(c10), tx);
        let bottom = lerp(premul(c01), premul(c11), tx);
        let mut out = lerp(top, bottom, ty);

        if out[3] > 0.0 {
            out[0] /= out[3];
            out[1] /= out[3];
            out[2] /= out[3];
        }
        out
    }
}
