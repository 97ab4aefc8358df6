//! Grid detection: per-choice fill ratios and answer selection.
//!
//! Every question row is scored choice by choice with [`sample_circle`],
//! searching a small square of center offsets to absorb print and photo
//! misalignment. [`pick_with_margin`] then turns the ratio vector into at
//! most one answer.

use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::{AnswerSequence, ChoiceLabel, GradeError, GridParams, QUESTION_COUNT};
use crate::raster::RasterBuffer;
use crate::sampler::sample_circle;

/// Fill ratios and selected answer for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionScores {
    /// Zero-based question index.
    pub question: usize,
    /// Best fill ratio per choice, in column order.
    pub ratios: Vec<f64>,
    /// Selected answer, if any.
    pub answer: Option<ChoiceLabel>,
}

/// Detected answers plus the ratios they were selected from.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// One answer slot per question.
    pub answers: AnswerSequence,
    /// Per-question ratio vectors, in question order.
    pub scores: Vec<QuestionScores>,
}

/// Scores a fixed 26-row grid of answer circles.
#[derive(Debug, Clone)]
pub struct GridDetector {
    params: GridParams,
}

impl GridDetector {
    /// Creates a detector for the given grid parameters.
    #[must_use]
    pub const fn new(params: GridParams) -> Self {
        Self { params }
    }

    /// Returns the detector parameters.
    #[must_use]
    pub const fn params(&self) -> &GridParams {
        &self.params
    }

    /// Detects the answer for every question of a binarized buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::GridSize`] if the detected sequence does not have
    /// [`QUESTION_COUNT`] entries.
    pub fn detect(&self, buffer: &RasterBuffer) -> Result<AnswerSequence, GradeError> {
        self.detect_with_scores(buffer).map(|d| d.answers)
    }

    /// Like [`detect`](Self::detect), but also returns every ratio vector.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::GridSize`] if the detected sequence does not have
    /// [`QUESTION_COUNT`] entries.
    pub fn detect_with_scores(&self, buffer: &RasterBuffer) -> Result<Detection, GradeError> {
        let scores: Vec<QuestionScores> = (0..QUESTION_COUNT)
            .map(|question| {
                let ratios = self.question_ratios(buffer, question);
                let answer = self.select(&ratios);
                trace!(question, ?ratios, ?answer, "scored question");
                QuestionScores {
                    question,
                    ratios,
                    answer,
                }
            })
            .collect();

        let answers = AnswerSequence::new(scores.iter().map(|s| s.answer).collect())?;
        debug!(
            "Detected {}/{} answers: {answers}",
            answers.answered(),
            answers.len()
        );

        Ok(Detection { answers, scores })
    }

    /// Best fill ratio for each choice of one question.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn question_ratios(&self, buffer: &RasterBuffer, question: usize) -> Vec<f64> {
        let p = &self.params;
        let cy = p.y() + question as f64 * p.row_height();
        (0..usize::from(p.choices()))
            .map(|choice| {
                let cx = p.x() + choice as f64 * p.col_width();
                self.best_ratio_near(buffer, cx, cy)
            })
            .collect()
    }

    /// Maximum ratio over the center search neighborhood; first maximum wins.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn best_ratio_near(&self, buffer: &RasterBuffer, cx: f64, cy: f64) -> f64 {
        let radius = self.params.radius();
        let ring = self.params.ring();
        search_offsets(self.params.center_search())
            .map(|(dx, dy)| {
                let x = (cx + dx as f64).round() as i64;
                let y = (cy + dy as f64).round() as i64;
                sample_circle(buffer, x, y, radius, ring)
            })
            .fold(0.0, |best, ratio| if ratio > best { ratio } else { best })
    }

    fn select(&self, ratios: &[f64]) -> Option<ChoiceLabel> {
        pick_with_margin(
            ratios,
            self.params.min_fill(),
            self.params.margin(),
            self.params.force_pick(),
        )
        .and_then(ChoiceLabel::from_index)
    }
}

/// Every integer offset in `[-s, s]²`, `dx`-major.
///
/// Yields `(2s + 1)²` offsets, starting at `(-s, -s)`.
pub fn search_offsets(s: u32) -> impl Iterator<Item = (i64, i64)> {
    let s = i64::from(s);
    (-s..=s).flat_map(move |dx| (-s..=s).map(move |dy| (dx, dy)))
}

/// Selects the index of the best choice, or `None`.
///
/// The best choice is the first index holding the maximum ratio. It is
/// rejected if `min_fill` is given and the maximum is below it, or, unless
/// `force_pick` is set, if any other ratio lies within `margin` of the maximum.
#[must_use]
pub fn pick_with_margin(
    ratios: &[f64],
    min_fill: Option<f64>,
    margin: f64,
    force_pick: bool,
) -> Option<usize> {
    let (best, max) = ratios
        .iter()
        .copied()
        .enumerate()
        .fold(None, |acc, (i, r)| match acc {
            Some((_, m)) if r <= m => acc,
            _ => Some((i, r)),
        })?;

    if min_fill.is_some_and(|min| max < min) {
        return None;
    }
    if force_pick {
        return Some(best);
    }

    let ambiguous = ratios
        .iter()
        .enumerate()
        .any(|(i, &r)| i != best && max - r <= margin);

    (!ambiguous).then_some(best)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
mod tests {
    use super::*;
    use crate::domain::SelectionMode;
    use image::{Rgb, RgbImage};

    fn label(c: char) -> Option<ChoiceLabel> {
        ChoiceLabel::from_letter(c)
    }

    fn pick(ratios: &[f64], params: &GridParams) -> Option<ChoiceLabel> {
        GridDetector::new(params.clone()).select(ratios)
    }

    fn absolute(fill: f64, margin: f64) -> GridParams {
        GridParams::builder()
            .fill_pct(fill)
            .margin_pct(margin)
            .build()
            .unwrap()
    }

    fn relative(margin: f64) -> GridParams {
        GridParams::builder()
            .mode(SelectionMode::Relative)
            .margin_pct(margin)
            .build()
            .unwrap()
    }

    /// White sheet with filled discs at the given (question, choice) cells.
    fn sheet(params: &GridParams, marks: &[(usize, usize)], fill_radius: f64) -> RasterBuffer {
        let w = (params.x() + params.col_width() * f64::from(params.choices())) as u32 + 20;
        let h = (params.y() + params.row_height() * QUESTION_COUNT as f64) as u32 + 20;
        let img = RgbImage::from_fn(w, h, |x, y| {
            let inked = marks.iter().any(|&(q, c)| {
                let cx = params.x() + c as f64 * params.col_width();
                let cy = params.y() + q as f64 * params.row_height();
                let dx = f64::from(x) - cx;
                let dy = f64::from(y) - cy;
                dx * dx + dy * dy <= fill_radius * fill_radius
            });
            if inked {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        RasterBuffer::from_rgb(img)
    }

    #[test]
    fn test_clear_mark_in_absolute_mode() {
        let ratios = [0.10, 0.62, 0.08, 0.05, 0.03];
        assert_eq!(pick(&ratios, &absolute(35.0, 10.0)), label('B'));
    }

    #[test]
    fn test_close_competitor_is_ambiguous() {
        let ratios = [0.40, 0.45, 0.05, 0.02, 0.01];
        assert_eq!(pick(&ratios, &absolute(35.0, 10.0)), None);
    }

    #[test]
    fn test_relative_mode_has_no_fill_floor() {
        let ratios = [0.50, 0.10, 0.05, 0.02, 0.01];
        assert_eq!(pick(&ratios, &relative(10.0)), label('A'));

        let faint = [0.20, 0.02, 0.01, 0.0, 0.0];
        assert_eq!(pick(&faint, &relative(10.0)), label('A'));
        assert_eq!(pick(&faint, &absolute(35.0, 10.0)), None);
    }

    #[test]
    fn test_fill_gate_applies_regardless_of_margin() {
        let ratios = [0.30, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(pick(&ratios, &absolute(35.0, 0.0)), None);
        let forced = GridParams::builder().force_pick(true).build().unwrap();
        assert_eq!(pick(&ratios, &forced), None);
    }

    #[test]
    fn test_force_pick_overrides_ambiguity() {
        let ratios = [0.40, 0.45, 0.05, 0.02, 0.01];
        let params = GridParams::builder().force_pick(true).build().unwrap();
        assert_eq!(pick(&ratios, &params), label('B'));

        let tied = [0.0; 5];
        let params = GridParams::builder()
            .mode(SelectionMode::Relative)
            .force_pick(true)
            .build()
            .unwrap();
        assert_eq!(pick(&tied, &params), label('A'));
    }

    #[test]
    fn test_first_maximum_wins() {
        assert_eq!(pick_with_margin(&[0.2, 0.9, 0.9], None, 0.0, true), Some(1));
        assert_eq!(pick_with_margin(&[0.9, 0.9], None, 0.0, false), None);
    }

    #[test]
    fn test_margin_boundary_is_ambiguous() {
        // Exactly representable gap equal to the margin counts as a tie
        assert_eq!(pick_with_margin(&[0.5, 0.25], None, 0.25, false), None);
        assert_eq!(pick_with_margin(&[0.5, 0.25], None, 0.125, false), Some(0));
    }

    #[test]
    fn test_single_choice_never_ambiguous() {
        assert_eq!(pick_with_margin(&[0.0], None, 1.0, false), Some(0));
        assert_eq!(pick_with_margin(&[0.1], Some(0.35), 0.1, false), None);
    }

    #[test]
    fn test_empty_ratios() {
        assert_eq!(pick_with_margin(&[], None, 0.1, true), None);
    }

    #[test]
    fn test_search_offsets() {
        assert_eq!(search_offsets(0).collect::<Vec<_>>(), vec![(0, 0)]);
        let offsets: Vec<_> = search_offsets(1).collect();
        assert_eq!(offsets.len(), 9);
        assert_eq!(offsets[0], (-1, -1));
        assert_eq!(offsets[1], (-1, 0));
        assert_eq!(offsets[8], (1, 1));
        assert_eq!(search_offsets(3).count(), 49);
    }

    #[test]
    fn test_detect_always_returns_question_count() {
        let params = GridParams::builder().origin(20.0, 20.0).build().unwrap();
        let blank = sheet(&params, &[], 0.0);
        let answers = GridDetector::new(params).detect(&blank).unwrap();
        assert_eq!(answers.len(), QUESTION_COUNT);
        assert_eq!(answers.answered(), 0);

        // A tiny buffer that the grid mostly misses still yields 26 slots
        let tiny = RasterBuffer::from_rgb(RgbImage::new(5, 5));
        let params = GridParams::builder().build().unwrap();
        let answers = GridDetector::new(params).detect(&tiny).unwrap();
        assert_eq!(answers.len(), QUESTION_COUNT);
    }

    #[test]
    fn test_detect_marked_sheet() {
        let params = GridParams::builder().origin(20.0, 20.0).build().unwrap();
        let marks = [(0, 0), (1, 3), (2, 4), (25, 1)];
        let buffer = sheet(&params, &marks, 10.0);

        let detection = GridDetector::new(params).detect_with_scores(&buffer).unwrap();
        let answers = detection.answers.as_slice();
        assert_eq!(answers[0], label('A'));
        assert_eq!(answers[1], label('D'));
        assert_eq!(answers[2], label('E'));
        assert_eq!(answers[25], label('B'));
        assert_eq!(detection.answers.answered(), 4);

        let q1 = &detection.scores[1];
        assert_eq!(q1.ratios.len(), 5);
        assert!(q1.ratios[3] > 0.6);
        assert!(q1.ratios[0].abs() < 1e-12);
    }

    #[test]
    fn test_center_search_recovers_shifted_marks() {
        let printed = GridParams::builder().origin(26.0, 25.0).build().unwrap();
        let buffer = sheet(&printed, &[(4, 2)], 8.0);

        // Grid configured 6px/5px off from where the marks were printed
        let misaligned = GridParams::builder()
            .origin(20.0, 20.0)
            .radius(8)
            .fill_pct(90.0)
            .build()
            .unwrap();
        let answers = GridDetector::new(misaligned).detect(&buffer).unwrap();
        assert_eq!(answers.as_slice()[4], None);

        let searching = GridParams::builder()
            .origin(20.0, 20.0)
            .radius(8)
            .fill_pct(90.0)
            .center_search(6)
            .build()
            .unwrap();
        let answers = GridDetector::new(searching).detect(&buffer).unwrap();
        assert_eq!(answers.as_slice()[4], label('C'));
    }

    #[test]
    fn test_ratios_stay_in_unit_interval() {
        let params = GridParams::builder()
            .origin(20.0, 20.0)
            .ring(true)
            .center_search(2)
            .build()
            .unwrap();
        let buffer = sheet(&params, &[(0, 0), (3, 1), (3, 2)], 14.0);
        let detection = GridDetector::new(params).detect_with_scores(&buffer).unwrap();
        for scores in &detection.scores {
            assert!(scores.ratios.iter().all(|r| (0.0..=1.0).contains(r)));
        }
    }
}
