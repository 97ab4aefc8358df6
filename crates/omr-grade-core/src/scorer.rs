//! Scoring detected answers against a key.

use crate::domain::{AnswerSequence, GradedRow};

/// Grades `answers` against `key`.
///
/// A question counts only when both slots hold the same label; an empty
/// slot never matches, not even an empty key slot.
#[must_use]
pub fn grade(answers: &AnswerSequence, key: &AnswerSequence, index: usize) -> GradedRow {
    let score = answers
        .iter()
        .zip(key.iter())
        .filter(|(answer, expected)| answer.is_some() && answer == expected)
        .count();
    let max = key.len();

    GradedRow {
        index,
        score,
        max,
        percent: percent(score, max),
    }
}

/// `score / max` as a percentage rounded to one decimal place.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn percent(score: usize, max: usize) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (score as f64 / max as f64 * 1000.0).round() / 10.0
}
