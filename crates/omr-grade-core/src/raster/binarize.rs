//! Global luminance thresholding.

use image::Rgb;

use super::RasterBuffer;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Perceptual luminance (Rec. 709 weights) of an RGB pixel.
#[must_use]
pub fn luminance(pixel: Rgb<u8>) -> f64 {
    let [r, g, b] = pixel.0;
    0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b)
}

/// Converts the buffer to pure black and white in place.
///
/// Pixels with luminance strictly below `threshold` become black.
pub fn binarize(buffer: &mut RasterBuffer, threshold: u8) {
    let threshold = f64::from(threshold);
    for pixel in buffer.pixels_mut().pixels_mut() {
        *pixel = if luminance(*pixel) < threshold {
            BLACK
        } else {
            WHITE
        };
    }
}
