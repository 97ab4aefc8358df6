//! Raster buffers: decoding, scaling and binarization.

mod binarize;

pub use binarize::{binarize, luminance};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use tracing::debug;

use crate::domain::GradeError;

/// Default bound on the decoded raster width.
pub const DEFAULT_MAX_WIDTH: u32 = 1200;

/// RGB pixel buffer owned by one pipeline invocation.
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    pixels: RgbImage,
}

impl RasterBuffer {
    /// Wraps an existing RGB image without scaling.
    #[must_use]
    pub const fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Converts a decoded image, scaling it down to at most `max_width` pixels wide.
    ///
    /// Images narrower than `max_width` keep their native size.
    #[must_use]
    pub fn from_image(image: &DynamicImage, max_width: u32) -> Self {
        let (width, height) = image.dimensions();
        let (target_w, target_h) = scaled_dimensions(width, height, max_width);

        let pixels = if (target_w, target_h) == (width, height) {
            image.to_rgb8()
        } else {
            debug!("Scaling {width}x{height} to {target_w}x{target_h}");
            image
                .resize_exact(target_w, target_h, FilterType::Triangle)
                .to_rgb8()
        };

        Self { pixels }
    }

    /// Buffer width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Buffer height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Returns true if the pixel's first channel is 0.
    ///
    /// Only meaningful after [`binarize`]. Panics if out of bounds.
    #[must_use]
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y).0[0] == 0
    }

    /// Borrow the underlying pixels.
    #[must_use]
    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }
}

/// Decodes an encoded image into a raster at most `max_width` wide.
///
/// # Errors
///
/// Returns [`GradeError::EmptyInput`] for empty input and
/// [`GradeError::Decode`] if the bytes are not a decodable image.
pub fn rasterize(bytes: &[u8], max_width: u32) -> Result<RasterBuffer, GradeError> {
    if bytes.is_empty() {
        return Err(GradeError::EmptyInput);
    }
    let image = image::load_from_memory(bytes)?;
    Ok(RasterBuffer::from_image(&image, max_width))
}

/// Uniformly scaled output size for a width bound.
///
/// scale = min(max_width, width) / width, each side rounded and kept >= 1.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width == 0 || max_width >= width {
        return (width, height);
    }
    let scale = f64::from(max_width.max(1)) / f64::from(width);
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}
