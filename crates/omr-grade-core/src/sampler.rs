//! Circular fill-ratio sampling on a binarized raster.

use crate::domain::MAX_RADIUS;
use crate::raster::RasterBuffer;

/// Inner disc radius, as a fraction of the sample radius, for ring weighting.
pub const RING_INNER_FRACTION: f64 = 0.55;

/// Weight of pixels inside the inner disc when ring weighting is enabled.
pub const RING_INNER_WEIGHT: f64 = 0.4;

/// Weighted fraction of black pixels inside a disc.
///
/// The sampling window is the `2r` square whose top-left corner is
/// `(cx - r, cy - r)` clamped to zero; pixels are measured from the window
/// center. Parts of the window outside the buffer are not sampled, so circles
/// near or past the edge never panic. With `emphasize_ring`, pixels within
/// `0.55r` of the center count 0.4 instead of 1.0. Radii above
/// [`MAX_RADIUS`] are clamped to it.
///
/// Returns a value in `[0, 1]`, or 0 if no pixel was sampled.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn sample_circle(
    buffer: &RasterBuffer,
    cx: i64,
    cy: i64,
    radius: u32,
    emphasize_ring: bool,
) -> f64 {
    let r = i64::from(radius.min(MAX_RADIUS));
    if r == 0 {
        return 0.0;
    }

    let origin_x = (cx - r).max(0);
    let origin_y = (cy - r).max(0);
    let width = i64::from(buffer.width());
    let height = i64::from(buffer.height());

    let rr = r * r;
    let inner = (r as f64 * RING_INNER_FRACTION).powi(2);

    let mut black = 0.0;
    let mut total = 0.0;

    for ly in 0..2 * r {
        let py = origin_y + ly;
        if py >= height {
            break;
        }
        let dy = ly - r;
        for lx in 0..2 * r {
            let px = origin_x + lx;
            if px >= width {
                break;
            }
            let dx = lx - r;
            let dist2 = dx * dx + dy * dy;
            if dist2 > rr {
                continue;
            }

            let weight = if emphasize_ring && dist2 as f64 <= inner {
                RING_INNER_WEIGHT
            } else {
                1.0
            };
            if buffer.is_black(px as u32, py as u32) {
                black += weight;
            }
            total += weight;
        }
    }

    if total > 0.0 {
        black / total
    } else {
        0.0
    }
}

#[cfg(test)]
#[allow(clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn buffer_from_fn(w: u32, h: u32, f: impl Fn(u32, u32) -> bool) -> RasterBuffer {
        RasterBuffer::from_rgb(RgbImage::from_fn(w, h, |x, y| {
            if f(x, y) {
                BLACK
            } else {
                WHITE
            }
        }))
    }

    fn within(x: u32, y: u32, cx: i64, cy: i64, radius: f64) -> bool {
        let dx = f64::from(x) - cx as f64;
        let dy = f64::from(y) - cy as f64;
        dx * dx + dy * dy <= radius * radius
    }

    #[test]
    fn test_all_black_is_one() {
        let buffer = buffer_from_fn(50, 50, |_, _| true);
        assert!((sample_circle(&buffer, 25, 25, 10, false) - 1.0).abs() < 1e-12);
        assert!((sample_circle(&buffer, 25, 25, 10, true) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_white_is_zero() {
        let buffer = buffer_from_fn(50, 50, |_, _| false);
        assert!(sample_circle(&buffer, 25, 25, 10, false).abs() < 1e-12);
        assert!(sample_circle(&buffer, 25, 25, 10, true).abs() < 1e-12);
    }

    #[test]
    fn test_left_half_black_is_about_half() {
        let buffer = buffer_from_fn(50, 50, |x, _| x < 25);
        let ratio = sample_circle(&buffer, 25, 25, 10, false);
        assert!(ratio > 0.4 && ratio < 0.6, "ratio {ratio}");
    }

    #[test]
    fn test_ring_weighting_discounts_center_ink() {
        // Ink only in the middle of the circle
        let buffer = buffer_from_fn(60, 60, |x, y| within(x, y, 30, 30, 4.0));
        let plain = sample_circle(&buffer, 30, 30, 12, false);
        let ring = sample_circle(&buffer, 30, 30, 12, true);
        assert!(plain > 0.0);
        assert!(ring < plain, "ring {ring} should be below plain {plain}");
    }

    #[test]
    fn test_ring_weighting_exact_for_inner_disc_ink() {
        // r = 12: the window holds 439 pixels within r, 137 of them within
        // 0.55r (d² <= 43). Ink exactly on those 137.
        let buffer = buffer_from_fn(60, 60, |x, y| within(x, y, 30, 30, 43f64.sqrt()));
        let plain = sample_circle(&buffer, 30, 30, 12, false);
        let ring = sample_circle(&buffer, 30, 30, 12, true);

        assert!((plain - 137.0 / 439.0).abs() < 1e-12, "plain {plain}");
        let inner = RING_INNER_WEIGHT * 137.0;
        let expected = inner / (inner + 302.0);
        assert!((ring - expected).abs() < 1e-12, "ring {ring}");
    }

    #[test]
    fn test_ring_weighting_favours_rim_ink() {
        // Ink only in the outer annulus
        let buffer = buffer_from_fn(60, 60, |x, y| {
            within(x, y, 30, 30, 12.0) && !within(x, y, 30, 30, 8.0)
        });
        let plain = sample_circle(&buffer, 30, 30, 12, false);
        let ring = sample_circle(&buffer, 30, 30, 12, true);
        assert!(ring > plain, "ring {ring} should exceed plain {plain}");
    }

    #[test]
    fn test_edge_windows_are_clipped() {
        let buffer = buffer_from_fn(20, 20, |_, _| true);
        for (cx, cy) in [(0, 0), (-5, -5), (19, 19), (25, 3), (3, 25)] {
            let ratio = sample_circle(&buffer, cx, cy, 8, false);
            assert!((0.0..=1.0).contains(&ratio), "ratio {ratio} at ({cx}, {cy})");
        }
        // Only in-buffer pixels are counted, and all of them are black
        assert!((sample_circle(&buffer, 19, 19, 8, false) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_left_clamp_shifts_the_disc() {
        // A window clamped at the origin is measured from (r, r), not from
        // the requested center. Ink on a single pixel at (4, 4) is seen by
        // a circle requested at (0, 0); the r = 4 window holds 47 pixels.
        let buffer = buffer_from_fn(20, 20, |x, y| x == 4 && y == 4);
        let clamped = sample_circle(&buffer, 0, 0, 4, false);
        assert!((clamped - 1.0 / 47.0).abs() < 1e-12, "clamped {clamped}");
        assert!((clamped - sample_circle(&buffer, 4, 4, 4, false)).abs() < 1e-12);

        // Ink at the requested center is only sampled if it lies on the shifted disc
        let buffer = buffer_from_fn(20, 20, |x, y| x == 0 && y == 0);
        assert!(sample_circle(&buffer, 0, 0, 4, false).abs() < 1e-12);
    }

    #[test]
    fn test_huge_radius_does_not_overflow() {
        let buffer = buffer_from_fn(16, 16, |_, _| true);
        let ratio = sample_circle(&buffer, 8, 8, u32::MAX, true);
        assert!((0.0..=1.0).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn test_window_past_buffer_is_zero() {
        let buffer = buffer_from_fn(20, 20, |_, _| true);
        assert!(sample_circle(&buffer, 100, 100, 5, false).abs() < 1e-12);
    }

    #[test]
    fn test_zero_radius_is_zero() {
        let buffer = buffer_from_fn(10, 10, |_, _| true);
        assert!(sample_circle(&buffer, 5, 5, 0, true).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_bounded_for_mixed_content() {
        let buffer = buffer_from_fn(64, 64, |x, y| (x * 7 + y * 3) % 5 == 0);
        for cx in (0..64).step_by(9) {
            for cy in (0..64).step_by(11) {
                for ring in [false, true] {
                    let ratio = sample_circle(&buffer, cx, cy, 6, ring);
                    assert!((0.0..=1.0).contains(&ratio));
                }
            }
        }
    }
}
