//! JSON output adapter.

use anyhow::Result;
use omr_grade_core::{ResponseResult, ResultOutput};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON Lines output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes any serializable value as one JSON document.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_value<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    /// Writes a batch of results as a JSON array.
    pub fn write_array(&self, results: &[ResponseResult], pretty: bool) -> Result<()> {
        self.write_value(results, pretty)
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, result: &ResponseResult) -> Result<()> {
        self.write_value(result, false)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
