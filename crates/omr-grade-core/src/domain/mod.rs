//! Core domain types for bubble-sheet grading.

mod answer;
mod encoded;
mod error;
mod params;
mod result;

pub use answer::{AnswerSequence, ChoiceLabel, MAX_CHOICES, QUESTION_COUNT};
pub use encoded::EncodedImage;
pub use error::GradeError;
pub use params::{
    GridParams, GridParamsBuilder, Preset, SelectionMode, MAX_CENTER_SEARCH, MAX_RADIUS,
};
pub use result::{GradedRow, ResponseResult};
