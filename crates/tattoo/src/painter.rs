//! UV canvas painter
//!
//! Stamps a tattoo image into the canvas at a UV location. The image is
//! resampled to a `base_size * size_scale` square centred on the mapped
//! point and composited over the existing pixels.

use glam::Vec2;
use tracing::{debug, warn};

use crate::canvas::{CanvasTexture, PixelRect};
use crate::tattoo_image::TattooImage;
use crate::validation::{PlacementError, validate_size_scale};

/// Map a UV coordinate to canvas pixel space.
///
/// U maps directly to x. V is flipped (`height - v * height`) because texture
/// space has v pointing up while canvas rows run top to bottom.
#[inline]
pub fn uv_to_canvas(uv: Vec2, width: u32, height: u32) -> Vec2 {
    let h = height as f32;
    Vec2::new(uv.x * width as f32, h - uv.y * h)
}

/// Pixels covered by a square stamp of side `size` centred at `center`.
///
/// A pixel is covered when its centre lies in `[x0, x0 + size)` on both axes.
/// The result is clamped to the canvas; `None` if nothing remains.
pub fn stamp_rect(center: Vec2, size: f32, width: u32, height: u32) -> Option<PixelRect> {
    let x0 = center.x - size * 0.5;
    let y0 = center.y - size * 0.5;

    let covered = |start: f32, limit: u32| {
        let lo = ((start - 0.5).ceil() as i64).clamp(0, limit as i64);
        let hi = ((start + size - 0.5).ceil() as i64).clamp(0, limit as i64);
        (lo as u32, hi as u32)
    };
    let (x_lo, x_hi) = covered(x0, width);
    let (y_lo, y_hi) = covered(y0, height);

    if x_lo >= x_hi || y_lo >= y_hi {
        return None;
    }
    Some(PixelRect {
        x: x_lo,
        y: y_lo,
        width: x_hi - x_lo,
        height: y_hi - y_lo,
    })
}

/// Stamp `image` into `canvas` at `uv`.
///
/// Returns the modified pixel rectangle, or `None` when the stamp falls
/// entirely outside the canvas. Each call is an independent stamp; repeated
/// calls accumulate.
///
/// # Errors
/// * `MissingUv` if the hit carried no UV coordinate
/// * `InvalidScale` if `size_scale` is not a positive finite number
pub fn paint_tattoo(
    canvas: &mut CanvasTexture,
    uv: Option<Vec2>,
    image: &TattooImage,
    base_size: f32,
    size_scale: f32,
) -> Result<Option<PixelRect>, PlacementError> {
    let Some(uv) = uv else {
        warn!("paint_tattoo: hit has no UV coordinates");
        return Err(PlacementError::MissingUv);
    };
    let size_scale = validate_size_scale(size_scale)?;
    let size = base_size * size_scale;
    if !(size.is_finite() && size > 0.0) {
        return Err(PlacementError::InvalidScale(size_scale));
    }

    let (width, height) = canvas.dimensions();
    let center = uv_to_canvas(uv, width, height);
    let x0 = center.x - size * 0.5;
    let y0 = center.y - size * 0.5;

    let Some(rect) = stamp_rect(center, size, width, height) else {
        debug!("paint_tattoo: stamp at {:?} lies outside the canvas", center);
        return Ok(None);
    };

    // Destination pixel centre -> source texel space
    let sx = image.width() as f32 / size;
    let sy = image.height() as f32 / size;

    let surface = canvas.surface_mut();
    for py in rect.y..rect.y_end() {
        let src_y = (py as f32 + 0.5 - y0) * sy;
        for px in rect.x..rect.x_end() {
            let src_x = (px as f32 + 0.5 - x0) * sx;
            let color = image.sample_bilinear(src_x, src_y);
            surface.blend_pixel(px, py, color);
        }
    }
    canvas.mark_region_dirty(rect);

    debug!(
        "paint_tattoo: uv=({:.3}, {:.3}) size={:.1} -> ({}, {}) {}x{}",
        uv.x, uv.y, size, rect.x, rect.y, rect.width, rect.height
    );
    Ok(Some(rect))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    fn red_square(size: u32) -> TattooImage {
        TattooImage::solid(size, size, [255, 0, 0, 255]).unwrap()
    }

    #[test]
    fn test_uv_to_canvas_flips_v() {
        let p = uv_to_canvas(Vec2::new(0.25, 0.75), 1024, 1024);
        assert_eq!(p, Vec2::new(256.0, 256.0));
        let p = uv_to_canvas(Vec2::new(0.0, 0.0), 1024, 512);
        assert_eq!(p, Vec2::new(0.0, 512.0));
    }

    #[test]
    fn test_center_stamp_covers_expected_pixels() {
        let mut canvas = CanvasTexture::new(1024, 1024, WHITE);
        let rect = paint_tattoo(
            &mut canvas,
            Some(Vec2::new(0.5, 0.5)),
            &red_square(100),
            100.0,
            1.0,
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            rect,
            PixelRect {
                x: 462,
                y: 462,
                width: 100,
                height: 100
            }
        );
        for y in 455..570 {
            for x in 455..570 {
                let expected = if rect.contains(x, y) { RED } else { WHITE };
                assert_eq!(canvas.pixel(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
        assert!(canvas.is_dirty());
    }

    #[test]
    fn test_stamp_is_clamped_at_corner() {
        let mut canvas = CanvasTexture::new(256, 256, WHITE);
        // uv (0, 0) maps to the bottom-left corner of the canvas
        let rect = paint_tattoo(
            &mut canvas,
            Some(Vec2::new(0.0, 0.0)),
            &red_square(8),
            50.0,
            1.0,
        )
        .unwrap()
        .unwrap();

        assert_eq!(rect.x, 0);
        assert_eq!(rect.x_end(), 25);
        assert_eq!(rect.y, 231);
        assert_eq!(rect.y_end(), 256);
        assert_eq!(canvas.pixel(0, 255), Some(RED));
        assert_eq!(canvas.pixel(25, 255), Some(WHITE));
    }

    #[test]
    fn test_stamp_outside_canvas_is_noop() {
        let mut canvas = CanvasTexture::new(64, 64, WHITE);
        canvas.clear_dirty();
        let result = paint_tattoo(
            &mut canvas,
            Some(Vec2::new(3.0, 3.0)),
            &red_square(4),
            10.0,
            1.0,
        )
        .unwrap();
        assert!(result.is_none());
        assert!(!canvas.is_dirty());
    }

    #[test]
    fn test_size_scale_changes_footprint() {
        let mut canvas = CanvasTexture::new(1024, 1024, WHITE);
        let rect = paint_tattoo(
            &mut canvas,
            Some(Vec2::new(0.5, 0.5)),
            &red_square(10),
            100.0,
            0.5,
        )
        .unwrap()
        .unwrap();
        assert_eq!((rect.x, rect.width), (487, 50));
    }

    #[test]
    fn test_missing_uv() {
        let mut canvas = CanvasTexture::new(16, 16, WHITE);
        let before = canvas.revision();
        let err = paint_tattoo(&mut canvas, None, &red_square(4), 8.0, 1.0).unwrap_err();
        assert_eq!(err, PlacementError::MissingUv);
        assert_eq!(canvas.revision(), before);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let mut canvas = CanvasTexture::new(16, 16, WHITE);
        let err = paint_tattoo(
            &mut canvas,
            Some(Vec2::splat(0.5)),
            &red_square(4),
            8.0,
            0.0,
        )
        .unwrap_err();
        assert_eq!(err, PlacementError::InvalidScale(0.0));
    }

    #[test]
    fn test_transparent_pixels_leave_canvas_untouched() {
        let mut canvas = CanvasTexture::new(32, 32, WHITE);
        let clear = TattooImage::solid(4, 4, [0, 0, 255, 0]).unwrap();
        paint_tattoo(&mut canvas, Some(Vec2::splat(0.5)), &clear, 16.0, 1.0).unwrap();
        assert!(canvas.surface().pixels().iter().all(|p| *p == WHITE));
    }

    #[test]
    fn test_repeated_stamps_are_monotonic_in_alpha() {
        let mut canvas = CanvasTexture::new(32, 32, [0.0, 0.0, 0.0, 0.0]);
        let half = TattooImage::solid(4, 4, [0, 0, 255, 128]).unwrap();
        let uv = Some(Vec2::splat(0.5));

        paint_tattoo(&mut canvas, uv, &half, 8.0, 1.0).unwrap();
        let first = canvas.pixel(16, 16).unwrap()[3];
        paint_tattoo(&mut canvas, uv, &half, 8.0, 1.0).unwrap();
        let second = canvas.pixel(16, 16).unwrap()[3];

        assert!(first > 0.49 && first < 0.51);
        assert!(second >= first);
        assert!(second > 0.74 && second < 0.76);
    }

    #[test]
    fn test_opaque_stamp_converges_after_one() {
        let mut canvas = CanvasTexture::new(32, 32, WHITE);
        let uv = Some(Vec2::splat(0.5));
        let image = red_square(4);
        paint_tattoo(&mut canvas, uv, &image, 8.0, 1.0).unwrap();
        let once = canvas.surface().pixels().to_vec();
        paint_tattoo(&mut canvas, uv, &image, 8.0, 1.0).unwrap();
        assert_eq!(canvas.surface().pixels(), once.as_slice());
    }
}
