//! White-background alpha extraction.
//!
//! A heuristic path that derives the matte directly from RGB values, with no
//! neural mask: product shots and scans on a plain white backdrop cut
//! cleanly on a "near-white" test. Also hosts the background-likelihood
//! probe that lets auto mode pick between this path and the neural one.

use image::{imageops, RgbaImage};

/// Maximum allowed spread among R, G and B for a pixel to count as
/// near-white rather than merely bright (hard policy).
const NEAR_WHITE_SPREAD: u8 = 12;

/// Empirical falloff gain of the soft policy: alpha rises by 8 per unit the
/// darkest channel drops below the tolerance. Preserved from the original
/// tuning, not re-derived.
pub const SOFT_FALLOFF_GAIN: u32 = 8;

/// Channel floor above which a pixel counts as white for the
/// background-likelihood probe.
const PROBE_WHITE_FLOOR: u8 = 245;

/// Probe images are downsampled to at most this width before counting.
const PROBE_MAX_WIDTH: u32 = 700;

/// Fraction of white pixels above which an image is classified as
/// white-background.
const WHITE_RATIO_CUTOFF: f32 = 0.35;

/// Hard white-background policy: binary alpha from a near-white test.
///
/// A pixel is background when R, G and B are all at or above `tolerance`
/// *and* their spread is below 12 — near-white, not just bright-colored.
/// Background maps to alpha 0, everything else to 255.
#[must_use]
pub fn white_alpha_hard(image: &RgbaImage, tolerance: u8) -> Vec<u8> {
    image
        .pixels()
        .map(|px| {
            let [r, g, b, _] = px.0;
            let hi = r.max(g).max(b);
            let lo = r.min(g).min(b);
            let near_white = lo >= tolerance && hi - lo < NEAR_WHITE_SPREAD;
            if near_white {
                0
            } else {
                255
            }
        })
        .collect()
}

/// Soft white-background policy: graded alpha near the tolerance boundary.
///
/// Pixels with every channel at or above `tolerance` are fully transparent;
/// otherwise alpha scales with how far the darkest channel sits below the
/// tolerance (`(tolerance - min(R,G,B)) * 8`, clamped to 255), which falls
/// off much more smoothly around the threshold than the hard policy.
#[must_use]
pub fn white_alpha_soft(image: &RgbaImage, tolerance: u8) -> Vec<u8> {
    image
        .pixels()
        .map(|px| {
            let [r, g, b, _] = px.0;
            let lo = r.min(g).min(b);
            if lo >= tolerance {
                0
            } else {
                let a = u32::from(tolerance - lo) * SOFT_FALLOFF_GAIN;
                #[allow(clippy::cast_possible_truncation)]
                {
                    a.min(255) as u8
                }
            }
        })
        .collect()
}

/// Fraction of probe pixels with all channels above 245.
///
/// The image is downsampled to at most 700 px wide (aspect preserved)
/// before counting, so the probe cost is bounded for large inputs. A
/// zero-area image yields 0.
#[must_use]
pub fn white_background_ratio(image: &RgbaImage) -> f32 {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return 0.0;
    }
    let probe;
    let view = if w > PROBE_MAX_WIDTH {
        let scaled_h = ((u64::from(h) * u64::from(PROBE_MAX_WIDTH)) / u64::from(w)).max(1);
        #[allow(clippy::cast_possible_truncation)]
        {
            probe = imageops::resize(
                image,
                PROBE_MAX_WIDTH,
                scaled_h as u32,
                imageops::FilterType::Triangle,
            );
        }
        &probe
    } else {
        image
    };

    let total = view.width() * view.height();
    let white = view
        .pixels()
        .filter(|px| px.0[0] > PROBE_WHITE_FLOOR && px.0[1] > PROBE_WHITE_FLOOR && px.0[2] > PROBE_WHITE_FLOOR)
        .count();
    #[allow(clippy::cast_precision_loss)]
    {
        white as f32 / total as f32
    }
}

/// Classify an image as white-background when more than 35% of probe pixels
/// are white. Used by auto mode to route between the heuristic extractor
/// and the neural path.
#[must_use]
pub fn is_white_background(image: &RgbaImage) -> bool {
    white_background_ratio(image) > WHITE_RATIO_CUTOFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn hard_policy_cuts_pure_white_keeps_dark() {
        let mut img = solid(2, 1, [255, 255, 255]);
        img.put_pixel(1, 0, Rgba([10, 10, 10, 255]));
        let alpha = white_alpha_hard(&img, 238);
        assert_eq!(alpha, vec![0, 255]);
    }

    #[test]
    fn hard_policy_keeps_bright_but_colored_pixels() {
        // Bright yellow: all channels above tolerance would be needed, and
        // even bright near-tolerance colors fail the spread test.
        let img = solid(1, 1, [250, 250, 180]);
        assert_eq!(white_alpha_hard(&img, 238), vec![255]);

        let tinted = solid(1, 1, [255, 244, 240]);
        assert_eq!(white_alpha_hard(&tinted, 238), vec![255]);
    }

    #[test]
    fn hard_policy_output_is_binary() {
        let mut img = RgbaImage::new(4, 4);
        for (i, px) in img.pixels_mut().enumerate() {
            let v = (i * 17 % 256) as u8;
            *px = Rgba([v, v.wrapping_add(5), v, 255]);
        }
        for &a in &white_alpha_hard(&img, 238) {
            assert!(a == 0 || a == 255);
        }
    }

    #[test]
    fn soft_policy_transparent_above_tolerance() {
        let img = solid(2, 2, [240, 250, 245]);
        assert_eq!(white_alpha_soft(&img, 238), vec![0; 4]);
    }

    #[test]
    fn soft_policy_grades_near_the_boundary() {
        // min channel 230, tolerance 238: (238 - 230) * 8 = 64.
        let img = solid(1, 1, [230, 240, 250]);
        assert_eq!(white_alpha_soft(&img, 238), vec![64]);

        // Far from white saturates at 255.
        let dark = solid(1, 1, [10, 10, 10]);
        assert_eq!(white_alpha_soft(&dark, 238), vec![255]);
    }

    #[test]
    fn soft_policy_is_smoother_than_hard_near_boundary() {
        let img = solid(1, 1, [236, 240, 240]);
        let soft = white_alpha_soft(&img, 238);
        let hard = white_alpha_hard(&img, 238);
        assert_eq!(hard, vec![255]);
        assert!(soft[0] > 0 && soft[0] < 255, "got {}", soft[0]);
    }

    #[test]
    fn white_ratio_one_for_all_white_zero_for_all_dark() {
        let white = solid(8, 8, [255, 255, 255]);
        assert!((white_background_ratio(&white) - 1.0).abs() < f32::EPSILON);

        let dark = solid(8, 8, [30, 30, 30]);
        assert!(white_background_ratio(&dark).abs() < f32::EPSILON);
    }

    #[test]
    fn white_ratio_downsamples_wide_images() {
        // Must not blow up on large inputs; a uniform white image stays
        // classified as white after the probe resize.
        let wide = solid(1400, 2, [255, 255, 255]);
        assert!(is_white_background(&wide));
    }

    #[test]
    fn is_white_background_follows_ratio_cutoff() {
        // 50% white halves: above the 0.35 cutoff.
        let mut img = solid(10, 10, [255, 255, 255]);
        for y in 0..10 {
            for x in 0..5 {
                img.put_pixel(x, y, Rgba([20, 20, 20, 255]));
            }
        }
        assert!(is_white_background(&img));

        // 25% white: below the cutoff.
        let mut img = solid(10, 10, [20, 20, 20]);
        for y in 0..5 {
            for x in 0..5 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        assert!(!is_white_background(&img));
    }

    #[test]
    fn white_ratio_zero_area_image_is_zero() {
        let img = RgbaImage::new(0, 0);
        assert!(white_background_ratio(&img).abs() < f32::EPSILON);
    }
}
