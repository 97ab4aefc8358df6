//! Encoded sheet images as read from a source.

/// An encoded image plus the path it was read from.
///
/// Decoding is deferred to the rasterizer.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Path or name of the image.
    pub path: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Creates an encoded image from a path and its bytes.
    #[must_use]
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}
