//! Result output port for writing graded responses.

use crate::domain::ResponseResult;

/// Port for outputting graded responses.
pub trait ResultOutput: Send + Sync {
    /// Writes a single graded response.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &ResponseResult) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
