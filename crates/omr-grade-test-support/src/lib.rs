//! Test support utilities for omr-grade.
//!
//! Provides port mocks and a synthetic bubble sheet builder for testing
//! detection and grading without scanned fixtures.
//!
//! # Example
//!
//! ```
//! use omr_grade_test_support::{MockImageSource, SyntheticSheetBuilder};
//!
//! // Render a key and a response that differs on question 2
//! let key = SyntheticSheetBuilder::standard().answers("ABCDE").encoded("key.png");
//! let response = SyntheticSheetBuilder::standard().answers("AACDE").encoded("r1.png");
//!
//! let source = MockImageSource::new(vec![key, response]);
//! ```

mod builders;
mod mocks;

pub use builders::{Mark, SyntheticSheetBuilder};
pub use mocks::{MockImageSource, MockProgressSink, MockResultOutput};
