//! Auto-crop of uniform near-white margins.
//!
//! Runs before every other stage so that downstream size-dependent work
//! (resampling targets, the white-ratio probe) sees the cropped geometry.

use image::{imageops, RgbaImage};

/// Inclusive bounding box `(x0, y0, x1, y1)` of all pixels that are *not*
/// near-white, where near-white means every channel is above `threshold`.
///
/// Returns `None` when no such pixel exists (fully white image).
#[must_use]
pub fn content_bounds(image: &RgbaImage, threshold: u8) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = image.dimensions();
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..h {
        for x in 0..w {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            if r > threshold && g > threshold && b > threshold {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds
}

/// Crop away the near-white margin around the image content.
///
/// The content bounding box is expanded outward by `padding` pixels
/// (clamped to the image extents) and the region is copied out. An image
/// with no non-white content is returned unchanged.
#[must_use]
pub fn auto_crop(image: &RgbaImage, threshold: u8, padding: u32) -> RgbaImage {
    let Some((x0, y0, x1, y1)) = content_bounds(image, threshold) else {
        return image.clone();
    };
    let (w, h) = image.dimensions();
    let x0 = x0.saturating_sub(padding);
    let y0 = y0.saturating_sub(padding);
    let x1 = x1.saturating_add(padding).min(w - 1);
    let y1 = y1.saturating_add(padding).min(h - 1);
    imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}
