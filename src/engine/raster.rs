//! Raster operations used by the compositor and the layout engine
//!
//! All functions work on straight (non-premultiplied) RGBA8 buffers.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Pixel, Rgba, RgbaImage};
use rayon::prelude::*;

/// Top-left corner of a device screen on its template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenOffset {
    pub x: u32,
    pub y: u32,
}

impl ScreenOffset {
    /// Offset with x and y exchanged, used when the frame is turned sideways
    pub fn swapped(self) -> Self {
        ScreenOffset { x: self.y, y: self.x }
    }
}

/// Find where the screen starts on a mask
///
/// The mask is black everywhere except the screen. Returns the smallest x and
/// the smallest y among pixels whose red channel is non-zero; the two minima
/// may come from different pixels. `None` when the mask is entirely black.
pub fn extract_screen_offset(mask: &RgbaImage) -> Option<ScreenOffset> {
    let row_len = mask.width() as usize * 4;
    if row_len == 0 {
        return None;
    }

    // Rows are scanned in parallel; each contributes its first lit column.
    mask.as_raw()
        .par_chunks(row_len)
        .enumerate()
        .filter_map(|(y, row)| {
            row.chunks_exact(4)
                .position(|px| px[0] > 0)
                .map(|x| (x as u32, y as u32))
        })
        .reduce_with(|a, b| (a.0.min(b.0), a.1.min(b.1)))
        .map(|(x, y)| ScreenOffset { x, y })
}

/// Normalized squared distance between two colors, 0.0 (equal) to 1.0
fn color_diff(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    let sum: f64 = a
        .0
        .iter()
        .zip(b.0.iter())
        .map(|(&ca, &cb)| {
            let d = ca as f64 - cb as f64;
            d * d
        })
        .sum();
    sum / (4.0 * 255.0 * 255.0)
}

/// Crop away the border that has the same color as the top-left pixel
///
/// With `crop_only_frames` the image is cropped only when that border exists on
/// all four sides. Uniform images are returned unchanged.
pub fn autocrop(image: &RgbaImage, tolerance: f64, crop_only_frames: bool) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let border = *image.get_pixel(0, 0);
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if color_diff(pixel, &border) <= tolerance {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return image.clone();
    };

    if crop_only_frames && (x0 == 0 || y0 == 0 || x1 == width - 1 || y1 == height - 1) {
        return image.clone();
    }

    imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}

/// Aspect-fill the target size and center-crop the excess
pub fn cover(image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    image
        .resize_to_fill(width.max(1), height.max(1), FilterType::Triangle)
        .to_rgba8()
}

/// Scale the alpha channel by the brightness of `mask` placed at `(x, y)`
///
/// Black mask pixels make the image transparent, white ones keep it. Pixels
/// outside the mask are untouched.
pub fn apply_mask(image: &mut RgbaImage, mask: &RgbaImage, x: i64, y: i64) {
    let (width, height) = image.dimensions();

    for (mx, my, m) in mask.enumerate_pixels() {
        let tx = x + mx as i64;
        let ty = y + my as i64;
        if tx < 0 || ty < 0 || tx >= width as i64 || ty >= height as i64 {
            continue;
        }

        let avg = (m.0[0] as u32 + m.0[1] as u32 + m.0[2] as u32) / 3;
        let pixel = image.get_pixel_mut(tx as u32, ty as u32);
        pixel.0[3] = (pixel.0[3] as u32 * avg / 255) as u8;
    }
}

/// Set every color channel to black, keeping alpha
pub fn darken(image: &mut RgbaImage) {
    image.par_chunks_mut(4).for_each(|px| {
        px[0] = 0;
        px[1] = 0;
        px[2] = 0;
    });
}

/// Multiply the alpha channel by `factor` (0.0 - 1.0)
pub fn apply_opacity(image: &mut RgbaImage, factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    image.par_chunks_mut(4).for_each(|px| {
        px[3] = (px[3] as f32 * factor).round() as u8;
    });
}

/// Gaussian blur of all four channels
pub fn blur(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Composite `under` beneath the existing pixels of `base`
///
/// Opaque base pixels stay as they are, transparent ones show `under`.
pub fn composite_behind(base: &mut RgbaImage, under: &RgbaImage, x: i64, y: i64) {
    let (width, height) = base.dimensions();

    for (ux, uy, pixel) in under.enumerate_pixels() {
        let tx = x + ux as i64;
        let ty = y + uy as i64;
        if tx < 0 || ty < 0 || tx >= width as i64 || ty >= height as i64 {
            continue;
        }

        let dst = base.get_pixel_mut(tx as u32, ty as u32);
        let mut merged = *pixel;
        merged.blend(dst);
        *dst = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn mask_with_rect(w: u32, h: u32, x: u32, y: u32, rw: u32, rh: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |px, py| {
            if px >= x && px < x + rw && py >= y && py < y + rh {
                WHITE
            } else {
                BLACK
            }
        })
    }

    #[test]
    fn test_offset_of_rectangle() {
        let mask = mask_with_rect(120, 80, 17, 9, 40, 30);
        assert_eq!(extract_screen_offset(&mask), Some(ScreenOffset { x: 17, y: 9 }));
    }

    #[test]
    fn test_offset_minima_are_independent() {
        let mut mask = RgbaImage::from_pixel(50, 50, BLACK);
        mask.put_pixel(30, 5, Rgba([1, 0, 0, 255]));
        mask.put_pixel(4, 40, WHITE);
        assert_eq!(extract_screen_offset(&mask), Some(ScreenOffset { x: 4, y: 5 }));
    }

    #[test]
    fn test_offset_ignores_non_red_pixels() {
        let mut mask = RgbaImage::from_pixel(10, 10, BLACK);
        mask.put_pixel(1, 1, Rgba([0, 255, 255, 255]));
        mask.put_pixel(6, 7, WHITE);
        assert_eq!(extract_screen_offset(&mask), Some(ScreenOffset { x: 6, y: 7 }));
    }

    #[test]
    fn test_all_black_mask_has_no_offset() {
        let mask = RgbaImage::from_pixel(64, 64, BLACK);
        assert_eq!(extract_screen_offset(&mask), None);
        assert_eq!(extract_screen_offset(&RgbaImage::new(0, 0)), None);
    }

    #[test]
    fn test_autocrop_to_screen() {
        let mask = mask_with_rect(60, 100, 10, 10, 40, 80);
        let cropped = autocrop(&mask, 0.0002, true);
        assert_eq!(cropped.dimensions(), (40, 80));
        assert_eq!(*cropped.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_autocrop_frames_only() {
        // Content touches the left edge, so there is no full frame to remove.
        let mask = mask_with_rect(60, 100, 0, 10, 40, 80);
        assert_eq!(autocrop(&mask, 0.0002, true).dimensions(), (60, 100));
        assert_eq!(autocrop(&mask, 0.0002, false).dimensions(), (40, 80));
    }

    #[test]
    fn test_autocrop_uniform_image() {
        let image = RgbaImage::from_pixel(8, 8, WHITE);
        assert_eq!(autocrop(&image, 0.0002, false).dimensions(), (8, 8));
    }

    #[test]
    fn test_cover_exact_dimensions() {
        for (sw, sh) in [(1920, 1080), (375, 812), (100, 100), (3, 500)] {
            let shot = DynamicImage::ImageRgba8(RgbaImage::from_pixel(sw, sh, WHITE));
            for (w, h) in [(40, 80), (80, 40), (33, 33), (1, 7)] {
                assert_eq!(cover(&shot, w, h).dimensions(), (w, h), "{sw}x{sh} -> {w}x{h}");
            }
        }
    }

    #[test]
    fn test_apply_mask_uses_brightness() {
        let mut image = RgbaImage::from_pixel(3, 1, Rgba([200, 10, 10, 255]));
        let mut mask = RgbaImage::new(3, 1);
        mask.put_pixel(0, 0, WHITE);
        mask.put_pixel(1, 0, BLACK);
        mask.put_pixel(2, 0, Rgba([0, 0, 0, 0]));
        apply_mask(&mut image, &mask, 0, 0);
        assert_eq!(image.get_pixel(0, 0).0[3], 255);
        assert_eq!(image.get_pixel(1, 0).0[3], 0);
        assert_eq!(image.get_pixel(2, 0).0[3], 0);
    }

    #[test]
    fn test_apply_mask_outside_is_untouched() {
        let mut image = RgbaImage::from_pixel(4, 4, WHITE);
        let mask = RgbaImage::from_pixel(2, 2, BLACK);
        apply_mask(&mut image, &mask, 3, 3);
        assert_eq!(image.get_pixel(3, 3).0[3], 0);
        assert_eq!(image.get_pixel(2, 2).0[3], 255);
    }

    #[test]
    fn test_darken_and_opacity() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([120, 60, 30, 200]));
        darken(&mut image);
        apply_opacity(&mut image, 0.1);
        assert_eq!(*image.get_pixel(1, 1), Rgba([0, 0, 0, 20]));
    }

    #[test]
    fn test_composite_behind_keeps_opaque_base() {
        let bezel = Rgba([40, 40, 40, 255]);
        let mut base = RgbaImage::from_pixel(4, 1, bezel);
        base.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        base.put_pixel(2, 0, Rgba([0, 0, 0, 0]));
        let shot = RgbaImage::from_pixel(4, 1, Rgba([255, 0, 0, 255]));

        composite_behind(&mut base, &shot, 0, 0);

        assert_eq!(*base.get_pixel(0, 0), bezel);
        assert_eq!(*base.get_pixel(1, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*base.get_pixel(3, 0), bezel);
    }

    #[test]
    fn test_blur_spreads_alpha() {
        let mut image = RgbaImage::new(21, 21);
        image.put_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let blurred = blur(&image, 2.0);
        assert!(blurred.get_pixel(10, 10).0[3] < 255);
        assert!(blurred.get_pixel(11, 10).0[3] > 0);
    }
}
