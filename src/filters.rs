//! Generic 2D single-channel buffer filters.
//!
//! All filters operate on flat row-major `Vec<u8>` alpha channels with
//! explicit width/height, consume their input and return a new buffer
//! (or the input unchanged for no-op parameters). Out-of-bounds sample
//! coordinates clamp to the nearest valid row/column.

/// Maximum morphology window radius. Caps worst-case cost at O(w*h*r^2).
const MAX_MORPH_RADIUS: u32 = 10;

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    {
        i.clamp(0, len as isize - 1) as usize
    }
}

/// Separable box blur with a `2*radius + 1` square window.
///
/// Two passes with sliding-window running sums, O(w*h) regardless of radius:
/// the horizontal pass stores the *unnormalized* window sum per pixel, the
/// vertical pass accumulates those sums and divides once by `window^2`. That
/// single division is the full 2D normalization for a separable
/// uniform-weight filter.
///
/// Radius 0 (or a degenerate buffer) returns the input unchanged, and the
/// effective radius is capped at the larger image dimension. Edge samples
/// clamp to the nearest valid coordinate, so output values never leave the
/// `[min, max]` range of the sampled neighborhood.
#[must_use]
pub fn box_blur(alpha: Vec<u8>, width: u32, height: u32, radius: u32) -> Vec<u8> {
    if radius == 0 || width == 0 || height == 0 {
        return alpha;
    }
    let (w, h) = (width as usize, height as usize);
    debug_assert_eq!(alpha.len(), w * h);
    // Past the larger dimension a wider window only re-samples clamped edge
    // texels; capping here also keeps the running sums inside u64.
    let radius = radius.min(width.max(height));
    #[allow(clippy::cast_possible_wrap)]
    let r = radius as isize;

    // Horizontal pass: raw running sums, no normalization yet.
    let mut sums = vec![0u64; w * h];
    for y in 0..h {
        let row = &alpha[y * w..(y + 1) * w];
        let mut sum: u64 = 0;
        for x in -r..=r {
            sum += u64::from(row[clamp_index(x, w)]);
        }
        sums[y * w] = sum;
        for x in 1..w {
            #[allow(clippy::cast_possible_wrap)]
            let x = x as isize;
            sum += u64::from(row[clamp_index(x + r, w)]);
            sum -= u64::from(row[clamp_index(x - r - 1, w)]);
            #[allow(clippy::cast_sign_loss)]
            {
                sums[y * w + x as usize] = sum;
            }
        }
    }

    // Vertical pass: accumulate row sums and divide by window^2.
    let window = 2 * u64::from(radius) + 1;
    #[allow(clippy::cast_precision_loss)]
    let norm = (window * window) as f64;
    let mut out = vec![0u8; w * h];
    for x in 0..w {
        let mut sum: u64 = 0;
        for y in -r..=r {
            sum += sums[clamp_index(y, h) * w + x];
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        {
            out[x] = (sum as f64 / norm).round().clamp(0.0, 255.0) as u8;
        }
        for y in 1..h {
            #[allow(clippy::cast_possible_wrap)]
            let yi = y as isize;
            sum += sums[clamp_index(yi + r, h) * w + x];
            sum -= sums[clamp_index(yi - r - 1, h) * w + x];
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            {
                out[y * w + x] = (sum as f64 / norm).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Morphological erode/dilate with a signed amount.
///
/// Positive `amount` dilates (neighborhood maximum), negative erodes
/// (neighborhood minimum), zero is a no-op. The square window radius is
/// `min(10, |amount|)`; edge samples clamp to the nearest valid coordinate.
#[must_use]
pub fn morph(alpha: Vec<u8>, width: u32, height: u32, amount: i32) -> Vec<u8> {
    if amount == 0 || width == 0 || height == 0 {
        return alpha;
    }
    let (w, h) = (width as usize, height as usize);
    debug_assert_eq!(alpha.len(), w * h);
    let dilate = amount > 0;
    #[allow(clippy::cast_possible_wrap)]
    let r = amount.unsigned_abs().min(MAX_MORPH_RADIUS) as isize;

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        #[allow(clippy::cast_possible_wrap)]
        let yi = y as isize;
        for x in 0..w {
            #[allow(clippy::cast_possible_wrap)]
            let xi = x as isize;
            let mut acc = if dilate { u8::MIN } else { u8::MAX };
            for dy in -r..=r {
                let row = clamp_index(yi + dy, h) * w;
                for dx in -r..=r {
                    let v = alpha[row + clamp_index(xi + dx, w)];
                    acc = if dilate { acc.max(v) } else { acc.min(v) };
                }
            }
            out[y * w + x] = acc;
        }
    }
    out
}

/// Feather: soften an already-cut edge with a half-strength blur.
///
/// Amount 0 is a no-op; otherwise applies [`box_blur`] with radius
/// `ceil(amount / 2)`.
#[must_use]
pub fn feather(alpha: Vec<u8>, width: u32, height: u32, amount: u32) -> Vec<u8> {
    if amount == 0 {
        return alpha;
    }
    box_blur(alpha, width, height, amount.div_ceil(2))
}
