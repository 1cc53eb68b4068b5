//! CPU pixel surface - float RGBA storage with straight alpha

/// A float RGBA CPU surface.
/// Stores pixels as [f32; 4] in 0-1 range, alpha not premultiplied.
#[derive(Debug, Clone)]
pub struct CpuSurface {
    /// Surface dimensions
    pub width: u32,
    pub height: u32,
    /// Pixel data in row-major order, top row first
    pixels: Vec<[f32; 4]>,
}

impl CpuSurface {
    /// Create a new surface filled with `color`
    pub fn new(width: u32, height: u32, color: [f32; 4]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![color; pixel_count],
        }
    }

    /// Clear the surface to a solid color
    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        Some(self.pixels[index])
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[index] = color;
    }

    /// Composite a color over an existing pixel (Porter-Duff over, straight alpha).
    ///
    /// A fully transparent source leaves the destination untouched. Resulting
    /// alpha is never lower than either input alpha.
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let src_alpha = color[3].clamp(0.0, 1.0);
        if src_alpha <= 0.0 {
            return;
        }

        let index = (y as usize) * (self.width as usize) + (x as usize);
        let dst = self.pixels[index];

        let dst_weight = dst[3] * (1.0 - src_alpha);
        let out_alpha = src_alpha + dst_weight;
        let mix = |s: f32, d: f32| (s * src_alpha + d * dst_weight) / out_alpha;

        self.pixels[index] = [
            mix(color[0], dst[0]),
            mix(color[1], dst[1]),
            mix(color[2], dst[2]),
            out_alpha,
        ];
    }

    /// Get raw pixel data for GPU upload
    /// Returns the pixel data as a byte slice suitable for an Rgba32Float texture
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Quantize a rectangular region to RGBA8, row-major.
    /// The region must lie within the surface.
    pub fn region_rgba8(&self, x: u32, y: u32, width: u32, height: u32) -> Vec<u8> {
        let mut output = Vec::with_capacity((width * height * 4) as usize);
        for row in y..y + height {
            let start = (row as usize) * (self.width as usize) + (x as usize);
            for pixel in &self.pixels[start..start + width as usize] {
                output.extend(pixel.map(to_u8));
            }
        }
        output
    }

    /// Get the total number of pixels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Get direct access to pixel data
    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }
}

#[inline]
fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSPARENT: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

    #[test]
    fn test_new_surface() {
        let surface = CpuSurface::new(100, 100, TRANSPARENT);
        assert_eq!(surface.width, 100);
        assert_eq!(surface.height, 100);
        assert_eq!(surface.pixel_count(), 10000);
    }

    #[test]
    fn test_get_set_pixel() {
        let mut surface = CpuSurface::new(10, 10, TRANSPARENT);
        let color = [1.0, 0.5, 0.25, 1.0];

        surface.set_pixel(5, 5, color);
        assert_eq!(surface.get_pixel(5, 5), Some(color));

        // Out of bounds should return None
        assert_eq!(surface.get_pixel(100, 100), None);
    }

    #[test]
    fn test_clear() {
        let mut surface = CpuSurface::new(10, 10, TRANSPARENT);
        let white = [1.0, 1.0, 1.0, 1.0];

        surface.clear(white);

        assert!(surface.pixels().iter().all(|p| *p == white));
    }

    #[test]
    fn test_blend_half_red_over_white() {
        let mut surface = CpuSurface::new(10, 10, [1.0, 1.0, 1.0, 1.0]);

        surface.blend_pixel(5, 5, [1.0, 0.0, 0.0, 0.5]);

        let result = surface.get_pixel(5, 5).unwrap();
        assert!((result[0] - 1.0).abs() < 1e-6);
        assert!((result[1] - 0.5).abs() < 1e-6);
        assert!((result[2] - 0.5).abs() < 1e-6);
        assert!((result[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_blend_over_transparent_keeps_source_color() {
        let mut surface = CpuSurface::new(1, 1, TRANSPARENT);
        surface.blend_pixel(0, 0, [0.2, 0.4, 0.6, 0.5]);

        let result = surface.get_pixel(0, 0).unwrap();
        assert!((result[0] - 0.2).abs() < 1e-6);
        assert!((result[2] - 0.6).abs() < 1e-6);
        assert!((result[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_alpha_is_noop() {
        let mut surface = CpuSurface::new(1, 1, [0.1, 0.2, 0.3, 0.4]);
        surface.blend_pixel(0, 0, [1.0, 1.0, 1.0, 0.0]);
        assert_eq!(surface.get_pixel(0, 0), Some([0.1, 0.2, 0.3, 0.4]));
    }

    #[test]
    fn test_alpha_is_monotonic() {
        let mut surface = CpuSurface::new(1, 1, TRANSPARENT);
        let stamp = [0.0, 0.0, 1.0, 0.3];
        surface.blend_pixel(0, 0, stamp);
        let first = surface.get_pixel(0, 0).unwrap()[3];
        surface.blend_pixel(0, 0, stamp);
        let second = surface.get_pixel(0, 0).unwrap()[3];
        assert!(second >= first);
        assert!(second >= stamp[3]);
    }

    #[test]
    fn test_as_bytes() {
        let surface = CpuSurface::new(2, 2, TRANSPARENT);
        // 4 pixels * 4 components * 4 bytes per f32 = 64 bytes
        assert_eq!(surface.as_bytes().len(), 64);
    }

    #[test]
    fn test_region_rgba8() {
        let mut surface = CpuSurface::new(4, 4, [1.0, 1.0, 1.0, 1.0]);
        surface.set_pixel(2, 1, [1.0, 0.0, 0.0, 1.0]);
        let region = surface.region_rgba8(2, 1, 2, 2);
        assert_eq!(region.len(), 16);
        assert_eq!(&region[..4], &[255, 0, 0, 255]);
        assert_eq!(&region[4..8], &[255, 255, 255, 255]);
    }
}
