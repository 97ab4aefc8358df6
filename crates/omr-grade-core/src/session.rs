//! Grading session: answer key plus the graded rows collected so far.

use tracing::{debug, info};

use crate::detector::{Detection, GridDetector};
use crate::domain::{AnswerSequence, GradeError, GradedRow, GridParams, QUESTION_COUNT};
use crate::raster::{binarize, rasterize, DEFAULT_MAX_WIDTH};
use crate::scorer::grade;

/// Runs the full pipeline on one encoded image.
///
/// Decode and scale, binarize with the params' threshold, then detect.
///
/// # Errors
///
/// Returns [`GradeError::EmptyInput`] or [`GradeError::Decode`] if the image
/// cannot be decoded. [`GradeError::GridSize`] from the detector is passed
/// through; an [`AnswerSequence`] always holds one answer per question.
pub fn detect_image(
    bytes: &[u8],
    params: &GridParams,
    max_width: u32,
) -> Result<Detection, GradeError> {
    let mut buffer = rasterize(bytes, max_width)?;
    debug!(
        "Rasterized {}x{}, threshold {}",
        buffer.width(),
        buffer.height(),
        params.threshold()
    );
    binarize(&mut buffer, params.threshold());

    GridDetector::new(params.clone()).detect_with_scores(&buffer)
}

/// Session state for grading responses against one key.
///
/// The key is replaced by each [`detect_key`](Self::detect_key) call; graded
/// rows only grow until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct GradingSession {
    max_width: u32,
    key: Option<AnswerSequence>,
    rows: Vec<GradedRow>,
}

impl Default for GradingSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH)
    }
}

impl GradingSession {
    /// Creates an empty session that rasterizes images at most `max_width` wide.
    #[must_use]
    pub const fn new(max_width: u32) -> Self {
        Self {
            max_width,
            key: None,
            rows: Vec::new(),
        }
    }

    /// Detects the answer key from an encoded image, replacing any previous key.
    ///
    /// # Errors
    ///
    /// Propagates decode and grid-size errors from [`detect_image`]. The
    /// previous key is kept on error.
    pub fn detect_key(
        &mut self,
        bytes: &[u8],
        params: &GridParams,
    ) -> Result<&AnswerSequence, GradeError> {
        let detection = detect_image(bytes, params, self.max_width)?;
        info!(
            "Key detected: {} ({}/{} answered)",
            detection.answers,
            detection.answers.answered(),
            QUESTION_COUNT
        );
        Ok(self.key.insert(detection.answers))
    }

    /// Detects a response and appends its graded row.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::MissingKey`] before any key was detected (checked
    /// before decoding), otherwise propagates errors from [`detect_image`].
    /// Nothing is appended on error.
    pub fn grade_response(
        &mut self,
        bytes: &[u8],
        params: &GridParams,
    ) -> Result<(GradedRow, AnswerSequence), GradeError> {
        let key = self.key.as_ref().ok_or(GradeError::MissingKey)?;
        let detection = detect_image(bytes, params, self.max_width)?;

        let row = grade(&detection.answers, key, self.rows.len() + 1);
        info!(
            "Graded response #{}: {}/{} ({}%)",
            row.index, row.score, row.max, row.percent
        );
        self.rows.push(row);
        Ok((row, detection.answers))
    }

    /// The current answer key, if one was detected.
    #[must_use]
    pub const fn key(&self) -> Option<&AnswerSequence> {
        self.key.as_ref()
    }

    /// Graded rows in the order they were produced.
    #[must_use]
    pub fn rows(&self) -> &[GradedRow] {
        &self.rows
    }

    /// Clears the key and all graded rows.
    pub fn reset(&mut self) {
        self.key = None;
        self.rows.clear();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]
mod tests {
    use super::*;
    use crate::domain::ChoiceLabel;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn params() -> GridParams {
        GridParams::builder().origin(30.0, 30.0).build().unwrap()
    }

    /// PNG of a sheet whose question `q` is marked with `answers[q]` ('-' = blank).
    fn sheet_png(answers: &str) -> Vec<u8> {
        let p = params();
        let marks: Vec<(usize, usize)> = answers
            .chars()
            .enumerate()
            .filter_map(|(q, c)| ChoiceLabel::from_letter(c).map(|l| (q, l.index())))
            .collect();
        let img = RgbImage::from_fn(300, 980, |x, y| {
            let inked = marks.iter().any(|&(q, c)| {
                let dx = f64::from(x) - (p.x() + c as f64 * p.col_width());
                let dy = f64::from(y) - (p.y() + q as f64 * p.row_height());
                dx * dx + dy * dy <= 100.0
            });
            if inked {
                Rgb([20, 20, 30])
            } else {
                Rgb([245, 245, 240])
            }
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    const KEY: &str = "ABCDEABCDEABCDEABCDEABCDEA";

    #[test]
    fn test_detect_image_yields_one_answer_per_question() {
        let detection = detect_image(&sheet_png(KEY), &params(), DEFAULT_MAX_WIDTH).unwrap();
        assert_eq!(detection.answers.len(), QUESTION_COUNT);
        assert_eq!(detection.answers.to_string(), KEY);

        let err = detect_image(b"", &params(), DEFAULT_MAX_WIDTH).unwrap_err();
        assert!(matches!(err, GradeError::EmptyInput));
    }

    #[test]
    fn test_grade_before_key_is_missing_key() {
        let mut session = GradingSession::default();
        let err = session.grade_response(&sheet_png(KEY), &params()).unwrap_err();
        assert!(matches!(err, GradeError::MissingKey));
        assert!(session.rows().is_empty());
    }

    #[test]
    fn test_missing_key_checked_before_decode() {
        let mut session = GradingSession::default();
        let err = session.grade_response(b"garbage", &params()).unwrap_err();
        assert!(matches!(err, GradeError::MissingKey));
    }

    #[test]
    fn test_key_then_responses() {
        let mut session = GradingSession::default();
        let key = session.detect_key(&sheet_png(KEY), &params()).unwrap();
        assert_eq!(key.to_string(), KEY);

        let (row, answers) = session.grade_response(&sheet_png(KEY), &params()).unwrap();
        assert_eq!(row.index, 1);
        assert_eq!(row.score, 26);
        assert_eq!(row.percent, 100.0);
        assert_eq!(answers.to_string(), KEY);

        let (row, _) = session
            .grade_response(&sheet_png("ABCDEABCDEABCDEABCDEEEEEEE"), &params())
            .unwrap();
        assert_eq!(row.index, 2);
        assert_eq!(row.score, 21);

        assert_eq!(session.rows().len(), 2);
        assert_eq!(session.rows()[0].score, 26);
    }

    #[test]
    fn test_decode_failure_keeps_state() {
        let mut session = GradingSession::default();
        session.detect_key(&sheet_png(KEY), &params()).unwrap();
        session.grade_response(&sheet_png(KEY), &params()).unwrap();

        let err = session.grade_response(b"not an image", &params()).unwrap_err();
        assert!(matches!(err, GradeError::Decode(_)));
        assert_eq!(session.rows().len(), 1);

        let err = session.detect_key(&[], &params()).unwrap_err();
        assert!(matches!(err, GradeError::EmptyInput));
        assert_eq!(session.key().map(ToString::to_string).as_deref(), Some(KEY));
    }

    #[test]
    fn test_new_key_overwrites_old() {
        let mut session = GradingSession::default();
        session.detect_key(&sheet_png(KEY), &params()).unwrap();
        let other = "BBBBBBBBBBBBBBBBBBBBBBBBBB";
        session.detect_key(&sheet_png(other), &params()).unwrap();
        assert_eq!(session.key().unwrap().to_string(), other);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = GradingSession::default();
        session.detect_key(&sheet_png(KEY), &params()).unwrap();
        session.grade_response(&sheet_png(KEY), &params()).unwrap();
        session.reset();
        assert!(session.key().is_none());
        assert!(session.rows().is_empty());
    }

    #[test]
    fn test_blank_key_caps_score() {
        let mut session = GradingSession::default();
        let key = "ABCDEABCDEABCDEABCDEABCD--";
        session.detect_key(&sheet_png(key), &params()).unwrap();
        let (row, _) = session.grade_response(&sheet_png(key), &params()).unwrap();
        assert_eq!(row.score, 24);
        assert_eq!(row.percent, 92.3);
    }
}
