//! OMR Grade Core - Bubble-sheet detection and scoring
//!
//! This crate contains the domain types, the detection pipeline
//! (rasterize, binarize, circle sampling, grid selection), the scorer and
//! the grading session that ties them together.

pub mod detector;
pub mod domain;
pub mod ports;
pub mod raster;
pub mod sampler;
pub mod scorer;
pub mod session;

pub use detector::{pick_with_margin, Detection, GridDetector, QuestionScores};
pub use domain::{
    AnswerSequence, ChoiceLabel, EncodedImage, GradeError, GradedRow, GridParams,
    GridParamsBuilder, Preset, ResponseResult, SelectionMode, QUESTION_COUNT,
};
pub use ports::{ImageSource, ProgressEvent, ProgressSink, ResultOutput};
pub use raster::{binarize, rasterize, RasterBuffer, DEFAULT_MAX_WIDTH};
pub use sampler::sample_circle;
pub use scorer::grade;
pub use session::{detect_image, GradingSession};
