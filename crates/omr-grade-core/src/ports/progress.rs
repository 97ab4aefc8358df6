//! Progress reporting port for UI integration.

use crate::domain::ResponseResult;

/// Events emitted while grading a batch of responses.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Grading started for a response image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in batch, if known.
        total: Option<usize>,
    },
    /// A response was graded.
    Graded {
        /// The graded response.
        result: ResponseResult,
    },
    /// A response was skipped because it could not be read or decoded.
    Skipped {
        /// Path to the image.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All responses have been processed.
    Finished {
        /// Responses graded.
        graded: usize,
        /// Responses skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
