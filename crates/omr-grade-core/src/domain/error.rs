//! Error kinds surfaced by the grading pipeline.

use thiserror::Error;

/// Errors produced while detecting or grading a sheet.
///
/// None of these are retried automatically. A failed call leaves the
/// session state from earlier calls untouched.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GradeError {
    /// The input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The input image data was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A response was graded before any key was detected.
    #[error("no answer key detected yet; detect a key image first")]
    MissingKey,

    /// A detection run produced the wrong number of answers.
    #[error("expected {expected} answers, got {actual}; adjust the grid parameters")]
    GridSize {
        /// Fixed question count.
        expected: usize,
        /// Length actually produced.
        actual: usize,
    },

    /// Grid parameters outside their accepted range.
    #[error("invalid grid parameters: {0}")]
    InvalidParams(String),
}
