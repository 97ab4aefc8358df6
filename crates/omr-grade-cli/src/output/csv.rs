//! CSV output adapter.

use anyhow::Result;
use omr_grade_core::{ResponseResult, ResultOutput};
use std::io::{self, Write};
use std::sync::Mutex;

const HEADER: &str = "index,score,max,percent";

struct CsvWriter {
    writer: Box<dyn Write + Send>,
    header_written: bool,
}

impl CsvWriter {
    fn ensure_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{HEADER}")?;
            self.header_written = true;
        }
        Ok(())
    }
}

/// CSV output adapter: one `index,score,max,percent` row per graded response.
///
/// The header is written before the first row, or on flush when no rows
/// were written.
pub struct CsvOutput {
    inner: Mutex<CsvWriter>,
}

impl CsvOutput {
    /// Creates a new CSV output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new CSV output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Mutex::new(CsvWriter {
                writer,
                header_written: false,
            }),
        }
    }
}

/// Formats one CSV row. Percent uses the shortest decimal form (`100`, `76.9`).
fn format_row(result: &ResponseResult) -> String {
    let row = &result.row;
    format!("{},{},{},{}", row.index, row.score, row.max, row.percent)
}

impl ResultOutput for CsvOutput {
    #[allow(clippy::significant_drop_tightening)]
    fn write(&self, result: &ResponseResult) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        inner.ensure_header()?;
        writeln!(inner.writer, "{}", format_row(result))?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        inner.ensure_header()?;
        inner.writer.flush()?;
        Ok(())
    }
}
