//! Matte construction: mask normalization, alpha mapping, resampling and
//! final compositing.
//!
//! A raw saliency mask arrives as arbitrary-range floats at the model's
//! fixed input resolution. This module rescales it into `[0, 1]`, maps it to
//! an 8-bit alpha channel (graded or binary), resamples the channel to the
//! working canvas size and merges it with the original RGB pixels.

use image::{imageops, GrayImage, RgbaImage};

/// Default hard-matte cut level on the 0-255 alpha scale (~0.55 normalized).
pub const DEFAULT_HARD_THRESHOLD: u8 = 140;

/// Rescale an arbitrary-range float mask into `[0, 1]`.
///
/// Linear min/max normalization over the whole buffer. A flat mask
/// (`max == min`) uses divisor 1 and therefore maps to all-zero output
/// rather than dividing by zero.
#[must_use]
pub fn normalize_mask(mask: &[f32]) -> Vec<f32> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in mask {
        min = min.min(v);
        max = max.max(v);
    }
    let denom = if max > min { max - min } else { 1.0 };
    mask.iter().map(|&v| (v - min) / denom).collect()
}

/// Soft alpha mapper: `clamp01(v)^gamma * 255`.
///
/// Monotonically non-decreasing in the mask value for any fixed gamma, so
/// gradation (hair, blur, translucency) survives. `gamma` is clamped to a
/// small positive floor to keep the curve defined.
#[must_use]
pub fn soft_alpha(mask: &[f32], gamma: f32) -> Vec<u8> {
    let gamma = gamma.max(0.01);
    mask.iter()
        .map(|&v| {
            let a = v.clamp(0.0, 1.0).powf(gamma) * 255.0;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                a.round().clamp(0.0, 255.0) as u8
            }
        })
        .collect()
}

/// Hard alpha mapper: 255 where `v >= threshold`, otherwise 0.
///
/// The output is strictly binary, as required for downstream cut-path
/// consumers; any later softening must be requested explicitly via blur or
/// feather.
#[must_use]
pub fn hard_alpha(gray: &[u8], threshold: u8) -> Vec<u8> {
    gray.iter()
        .map(|&v| if v >= threshold { 255 } else { 0 })
        .collect()
}

/// Smoothly resample an alpha channel to new dimensions.
///
/// Treats the channel as a grayscale image and resizes with a triangle
/// (bilinear-class) filter, so upscaling a low-resolution matte produces
/// interpolated intermediate values instead of blocky replication. Handles
/// both up- and down-scaling and non-square destinations; a zero-area
/// destination yields an empty buffer.
#[must_use]
pub fn resample(alpha: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    if dst_w == 0 || dst_h == 0 {
        return Vec::new();
    }
    if src_w == dst_w && src_h == dst_h {
        return alpha.to_vec();
    }
    let src = GrayImage::from_raw(src_w, src_h, alpha.to_vec())
        .unwrap_or_else(|| GrayImage::new(src_w.max(1), src_h.max(1)));
    imageops::resize(&src, dst_w, dst_h, imageops::FilterType::Triangle).into_raw()
}

/// Merge original RGB with a computed alpha channel into an RGBA buffer.
///
/// R, G and B are copied unchanged (straight alpha, no premultiplication);
/// A comes from the dimension-matched alpha channel.
#[must_use]
pub fn composite(original: &RgbaImage, alpha: &[u8]) -> RgbaImage {
    let (w, h) = original.dimensions();
    debug_assert_eq!(alpha.len(), (w * h) as usize);
    let mut out = original.clone();
    for (i, px) in out.pixels_mut().enumerate() {
        px[3] = alpha.get(i).copied().unwrap_or(0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn normalize_rescales_into_unit_interval() {
        let mask = vec![-2.0, 0.0, 2.0, 6.0];
        let out = normalize_mask(&mask);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.25).abs() < 1e-6);
        assert!((out[2] - 0.5).abs() < 1e-6);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_output_always_in_unit_interval() {
        let mask: Vec<f32> = (0..100).map(|i| (i as f32) * 13.7 - 512.0).collect();
        for &v in &normalize_mask(&mask) {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn normalize_flat_mask_is_all_zero() {
        let mask = vec![0.7f32; 64];
        let out = normalize_mask(&mask);
        assert!(out.iter().all(|&v| v.abs() < f32::EPSILON));
    }

    #[test]
    fn soft_alpha_is_monotone_in_mask_value() {
        let mask: Vec<f32> = (0..=100).map(|i| i as f32 / 100.0).collect();
        for gamma in [0.5, 1.0, 1.7, 2.5] {
            let alpha = soft_alpha(&mask, gamma);
            for pair in alpha.windows(2) {
                assert!(pair[1] >= pair[0], "gamma {gamma}: not monotone");
            }
            assert_eq!(alpha[0], 0);
            assert_eq!(alpha[100], 255);
        }
    }

    #[test]
    fn soft_alpha_gamma_one_is_linear_scale() {
        let alpha = soft_alpha(&[0.0, 0.5, 1.0], 1.0);
        assert_eq!(alpha, vec![0, 128, 255]);
    }

    #[test]
    fn soft_alpha_clamps_out_of_range_mask_values() {
        let alpha = soft_alpha(&[-3.0, 1.5], 1.0);
        assert_eq!(alpha, vec![0, 255]);
    }

    #[test]
    fn hard_alpha_output_is_strictly_binary() {
        let gray: Vec<u8> = (0..=255).map(|v| v as u8).collect();
        let alpha = hard_alpha(&gray, DEFAULT_HARD_THRESHOLD);
        assert!(alpha.iter().all(|&v| v == 0 || v == 255));
        assert_eq!(alpha[139], 0);
        assert_eq!(alpha[140], 255);
    }

    #[test]
    fn resample_upscale_interpolates_smoothly() {
        // 2x2 checker must not become blocky nearest-neighbor replication.
        let out = resample(&[0, 255, 255, 0], 2, 2, 4, 4);
        assert_eq!(out.len(), 16);
        assert!(out.iter().any(|&v| v > 0 && v < 255));
    }

    #[test]
    fn resample_same_dimensions_is_identity() {
        let alpha = vec![10u8, 20, 30, 40];
        assert_eq!(resample(&alpha, 2, 2, 2, 2), alpha);
    }

    #[test]
    fn resample_accepts_non_square_destination() {
        let alpha = vec![128u8; 4 * 4];
        let out = resample(&alpha, 4, 4, 7, 3);
        assert_eq!(out.len(), 21);
    }

    #[test]
    fn resample_zero_area_destination_is_empty() {
        assert!(resample(&[1, 2, 3, 4], 2, 2, 0, 5).is_empty());
    }

    #[test]
    fn composite_copies_rgb_and_writes_alpha() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([40, 50, 60, 255]));

        let out = composite(&img, &[0, 200]);
        assert_eq!(out.get_pixel(0, 0).0, [10, 20, 30, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [40, 50, 60, 200]);
    }
}
