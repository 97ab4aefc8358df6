//! Image source port for loading sheet images.

use crate::domain::EncodedImage;

/// Port for reading encoded sheet images from a source.
pub trait ImageSource: Send + Sync {
    /// Returns an iterator over images from this source, in grading order.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if an image cannot be read.
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<EncodedImage>> + Send + '_>;

    /// Returns the total number of images, if known.
    fn count_hint(&self) -> Option<usize>;
}
