//! Grading result types.

use serde::{Deserialize, Serialize};

use super::AnswerSequence;

/// Score for a single response sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradedRow {
    /// 1-based position in the session's graded list.
    pub index: usize,
    /// Number of questions answered the same as the key.
    pub score: usize,
    /// Number of questions on the sheet.
    pub max: usize,
    /// `score / max` as a percentage, rounded to one decimal.
    pub percent: f64,
}

/// A graded response together with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseResult {
    /// Path or name of the response image.
    pub path: String,
    /// Timestamp of grading (ISO 8601).
    pub timestamp: String,
    /// The score.
    #[serde(flatten)]
    pub row: GradedRow,
    /// Answers detected on the response.
    pub answers: AnswerSequence,
}
