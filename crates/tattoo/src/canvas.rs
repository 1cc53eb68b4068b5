//! Paintable canvas texture with dirty tracking
//!
//! The canvas is the CPU side of the texture every registered surface
//! samples. Painting marks it dirty; the renderer polls the flag and either
//! re-uploads everything (`as_bytes`, `to_rgba8`) or only the changed tiles
//! (`take_dirty_regions`).

use std::collections::HashSet;

use tattlab_config::CanvasConfig;
use tracing::debug;

use crate::constants::DEFAULT_TILE_SIZE;
use crate::surface::CpuSurface;

/// Tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

/// Pixel rectangle, half-open: `[x, x + width) x [y, y + height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub fn x_end(&self) -> u32 {
        self.x + self.width
    }

    #[inline]
    pub fn y_end(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x_end() && y >= self.y && y < self.y_end()
    }
}

/// Dirty region for GPU upload
#[derive(Debug, Clone)]
pub struct DirtyRegion {
    /// Pixel offset in texture (x, y)
    pub offset: (u32, u32),
    /// Region dimensions (width, height)
    pub size: (u32, u32),
    /// RGBA8 pixel data (row-major)
    pub data: Vec<u8>,
}

/// Fixed-size paintable texture
#[derive(Debug, Clone)]
pub struct CanvasTexture {
    surface: CpuSurface,
    base_color: [f32; 4],
    tile_size: u32,
    tiles_x: u32,
    tiles_y: u32,
    dirty: bool,
    dirty_tiles: HashSet<TileCoord>,
    revision: u64,
}

impl CanvasTexture {
    /// Create a canvas filled with `base_color`. It starts dirty so the
    /// renderer performs an initial upload.
    pub fn new(width: u32, height: u32, base_color: [f32; 4]) -> Self {
        Self::with_tile_size(width, height, base_color, DEFAULT_TILE_SIZE)
    }

    pub fn with_tile_size(width: u32, height: u32, base_color: [f32; 4], tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        let mut canvas = Self {
            surface: CpuSurface::new(width, height, base_color),
            base_color,
            tile_size,
            tiles_x: width.div_ceil(tile_size),
            tiles_y: height.div_ceil(tile_size),
            dirty: false,
            dirty_tiles: HashSet::new(),
            revision: 0,
        };
        canvas.mark_all_tiles_dirty();
        canvas
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::with_tile_size(
            config.width,
            config.height,
            config.base_color,
            config.tile_size,
        )
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.surface.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.surface.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.surface.width, self.surface.height)
    }

    pub fn base_color(&self) -> [f32; 4] {
        self.base_color
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.surface.get_pixel(x, y)
    }

    pub fn surface(&self) -> &CpuSurface {
        &self.surface
    }

    pub(crate) fn surface_mut(&mut self) -> &mut CpuSurface {
        &mut self.surface
    }

    /// Whether the texture changed since the last upload
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Counter bumped on every mutation, including `reset`
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Flag the whole canvas for upload without touching pixels
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Record a modified region; tiles covering it become dirty
    pub fn mark_region_dirty(&mut self, rect: PixelRect) {
        let x_end = rect.x_end().min(self.width());
        let y_end = rect.y_end().min(self.height());
        if rect.x >= x_end || rect.y >= y_end {
            return;
        }

        let tiles_before = self.dirty_tiles.len();
        for ty in rect.y / self.tile_size..=(y_end - 1) / self.tile_size {
            for tx in rect.x / self.tile_size..=(x_end - 1) / self.tile_size {
                self.dirty_tiles.insert(TileCoord { x: tx, y: ty });
            }
        }
        self.dirty = true;
        self.revision += 1;

        debug!(
            "mark_region_dirty: ({}, {}) {}x{} -> {} new tiles (total {})",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            self.dirty_tiles.len() - tiles_before,
            self.dirty_tiles.len()
        );
    }

    /// Acknowledge an upload
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
        self.dirty_tiles.clear();
    }

    #[inline]
    pub fn dirty_tile_count(&self) -> usize {
        self.dirty_tiles.len()
    }

    /// Tile bounds in pixel coordinates (edge tiles may be smaller)
    pub fn tile_bounds(&self, coord: TileCoord) -> PixelRect {
        let x = coord.x * self.tile_size;
        let y = coord.y * self.tile_size;
        PixelRect {
            x,
            y,
            width: self.tile_size.min(self.width().saturating_sub(x)),
            height: self.tile_size.min(self.height().saturating_sub(y)),
        }
    }

    /// Take dirty tiles as RGBA8 regions, clearing the dirty state.
    /// Regions are ordered row by row.
    pub fn take_dirty_regions(&mut self) -> Vec<DirtyRegion> {
        let mut tiles: Vec<TileCoord> = self.dirty_tiles.drain().collect();
        tiles.sort_by_key(|t| (t.y, t.x));
        self.dirty = false;

        tiles
            .into_iter()
            .map(|coord| {
                let b = self.tile_bounds(coord);
                DirtyRegion {
                    offset: (b.x, b.y),
                    size: (b.width, b.height),
                    data: self.surface.region_rgba8(b.x, b.y, b.width, b.height),
                }
            })
            .collect()
    }

    /// Restore the base fill everywhere and clear the dirty state.
    ///
    /// The revision still advances so a renderer comparing revisions knows
    /// the texture content changed.
    pub fn reset(&mut self) {
        self.surface.clear(self.base_color);
        self.clear_dirty();
        self.revision += 1;
        debug!("Canvas reset to {:?}", self.base_color);
    }

    /// Raw float pixel bytes (Rgba32Float layout)
    pub fn as_bytes(&self) -> &[u8] {
        self.surface.as_bytes()
    }

    /// Whole canvas quantized to RGBA8
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.surface
            .region_rgba8(0, 0, self.surface.width, self.surface.height)
    }

    /// Whole canvas as an `image` buffer, e.g. for saving to disk
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            let p = self.surface.get_pixel(x, y).unwrap_or(self.base_color);
            image::Rgba(p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        })
    }

    fn mark_all_tiles_dirty(&mut self) {
        for ty in 0..self.tiles_y {
            for tx in 0..self.tiles_x {
                self.dirty_tiles.insert(TileCoord { x: tx, y: ty });
            }
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    #[test]
    fn test_new_canvas_is_filled_and_dirty() {
        let canvas = CanvasTexture::with_tile_size(300, 300, WHITE, 128);
        assert_eq!(canvas.dimensions(), (300, 300));
        assert!(canvas.is_dirty());
        // 300x300 with 128 tile size gives 3x3 tiles
        assert_eq!(canvas.dirty_tile_count(), 9);
        assert_eq!(canvas.pixel(299, 299), Some(WHITE));
    }

    #[test]
    fn test_mark_region_dirty() {
        let mut canvas = CanvasTexture::with_tile_size(256, 256, WHITE, 128);
        canvas.clear_dirty();
        assert!(!canvas.is_dirty());

        // A region spanning all 4 tiles
        canvas.mark_region_dirty(PixelRect {
            x: 100,
            y: 100,
            width: 56,
            height: 56,
        });
        assert!(canvas.is_dirty());
        assert_eq!(canvas.dirty_tile_count(), 4);
    }

    #[test]
    fn test_mark_region_outside_is_ignored() {
        let mut canvas = CanvasTexture::with_tile_size(64, 64, WHITE, 32);
        canvas.clear_dirty();
        let revision = canvas.revision();
        canvas.mark_region_dirty(PixelRect {
            x: 80,
            y: 0,
            width: 10,
            height: 10,
        });
        assert!(!canvas.is_dirty());
        assert_eq!(canvas.revision(), revision);
    }

    #[test]
    fn test_take_dirty_regions() {
        let mut canvas = CanvasTexture::with_tile_size(150, 150, WHITE, 128);
        canvas.clear_dirty();
        canvas.mark_region_dirty(PixelRect {
            x: 140,
            y: 140,
            width: 5,
            height: 5,
        });

        let regions = canvas.take_dirty_regions();
        assert_eq!(regions.len(), 1);
        // Edge tile is 22x22 pixels
        assert_eq!(regions[0].offset, (128, 128));
        assert_eq!(regions[0].size, (22, 22));
        assert_eq!(regions[0].data.len(), 22 * 22 * 4);
        assert!(!canvas.is_dirty());
        assert_eq!(canvas.dirty_tile_count(), 0);
    }

    #[test]
    fn test_reset_restores_every_pixel() {
        let mut canvas = CanvasTexture::with_tile_size(64, 64, WHITE, 16);
        for y in 0..64 {
            for x in 0..64 {
                canvas.surface_mut().set_pixel(x, y, [0.0, 0.0, 0.0, 1.0]);
            }
        }
        canvas.mark_region_dirty(PixelRect {
            x: 0,
            y: 0,
            width: 64,
            height: 64,
        });
        let before = canvas.revision();

        canvas.reset();

        assert!(canvas.surface().pixels().iter().all(|p| *p == WHITE));
        assert!(!canvas.is_dirty());
        assert_eq!(canvas.dirty_tile_count(), 0);
        assert!(canvas.revision() > before);
    }

    #[test]
    fn test_to_rgba_image() {
        let canvas = CanvasTexture::new(4, 2, [1.0, 0.0, 0.0, 1.0]);
        let image = canvas.to_rgba_image();
        assert_eq!(image.dimensions(), (4, 2));
        assert_eq!(image.get_pixel(3, 1).0, [255, 0, 0, 255]);
        assert_eq!(canvas.to_rgba8().len(), 4 * 2 * 4);
    }
}
