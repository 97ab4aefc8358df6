//! Grade command - score response sheets against a key sheet.

use std::fs::File;
use std::io::{BufWriter, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use omr_grade_adapters::{read_image, FsImageSource};
use omr_grade_core::{
    GradeError, GradingSession, ImageSource, ProgressEvent, ProgressSink, ResponseResult,
    ResultOutput,
};
use tracing::{debug, info, warn};

use super::grid::GridArgs;
use crate::config::AppConfig;
use crate::output::{CsvOutput, JsonOutput, ProgressBar};

/// Output format for graded rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `index,score,max,percent` with a header row
    #[default]
    Csv,
    /// Single JSON array
    Json,
    /// JSON Lines (one JSON object per line)
    Jsonl,
}

impl OutputFormat {
    fn from_config(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "jsonl" => Some(Self::Jsonl),
            _ => None,
        }
    }
}

/// Arguments for `omr-grade grade`.
#[derive(Args, Clone, Debug)]
pub struct GradeArgs {
    /// Answer key sheet image
    #[arg(long, value_name = "IMAGE")]
    pub key: PathBuf,

    /// Response sheet files or directories, graded in order
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write results to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl GradeArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if !self.recursive {
            self.recursive = config.input.recursive.unwrap_or(false);
        }
        if self.format.is_none() {
            self.format = config
                .output
                .format
                .as_deref()
                .and_then(OutputFormat::from_config);
        }
        if !self.progress {
            self.progress = config.output.progress.unwrap_or(false);
        }
        self.grid = self.grid.with_config(config);
        self
    }

    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

/// Counts from one grading run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeSummary {
    /// Responses graded.
    pub graded: usize,
    /// Responses that could not be read or decoded.
    pub skipped: usize,
}

/// Run the grade command.
///
/// Expects `args` to have been processed through `with_config()` first.
/// Fails if the key cannot be read or decoded; unreadable responses are
/// skipped and reported through the progress sink.
pub fn run(args: &GradeArgs) -> Result<GradeSummary> {
    let params = args.grid.to_params()?;
    let mut session = GradingSession::new(args.grid.max_width()?);

    let key_image = read_image(&args.key)?;
    let key = session
        .detect_key(&key_image.bytes, &params)
        .with_context(|| format!("Failed to detect answer key: {}", key_image.path))?;
    if key.answered() == 0 {
        warn!("Answer key {} has no detected answers", key_image.path);
    }

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let writer: Box<dyn std::io::Write + Send> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file: {}", path.display())
        })?)),
        None => Box::new(std::io::stdout()),
    };

    let summary = match args.format() {
        OutputFormat::Csv => {
            let output = CsvOutput::new(writer);
            grade_all(&mut session, &params, &source, &output, &progress)?.0
        }
        OutputFormat::Jsonl => {
            let output = JsonOutput::new(writer);
            grade_all(&mut session, &params, &source, &output, &progress)?.0
        }
        OutputFormat::Json => {
            let output = JsonOutput::new(writer);
            let (summary, results) =
                grade_all(&mut session, &params, &source, &Discard, &progress)?;
            output.write_array(&results, args.pretty)?;
            output.flush()?;
            summary
        }
    };

    info!(
        "Graded {} response(s), skipped {}",
        summary.graded, summary.skipped
    );
    Ok(summary)
}

/// Sink for formats that only write once all results are known.
struct Discard;

impl ResultOutput for Discard {
    fn write(&self, _result: &ResponseResult) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Grade every response from `source`, writing each result as it is produced.
fn grade_all(
    session: &mut GradingSession,
    params: &omr_grade_core::GridParams,
    source: &dyn ImageSource,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
) -> Result<(GradeSummary, Vec<ResponseResult>)> {
    let total = source.count_hint();
    let mut skipped = 0usize;
    let mut results = Vec::new();

    for (index, image_result) in source.images().enumerate() {
        let image = match image_result {
            Ok(img) => img,
            Err(e) => {
                // Error message contains the path via anyhow context
                progress.on_event(ProgressEvent::Skipped {
                    path: format!("image {index}"),
                    reason: format!("{e:#}"),
                });
                skipped += 1;
                continue;
            }
        };

        progress.on_event(ProgressEvent::Started {
            path: image.path.clone(),
            index,
            total,
        });

        let (row, answers) = match session.grade_response(&image.bytes, params) {
            Ok(graded) => graded,
            Err(e @ (GradeError::Decode(_) | GradeError::EmptyInput)) => {
                debug!("Decode failed for {}: {e}", image.path);
                progress.on_event(ProgressEvent::Skipped {
                    path: image.path,
                    reason: e.to_string(),
                });
                skipped += 1;
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to grade {}", image.path));
            }
        };

        let result = ResponseResult {
            path: image.path,
            timestamp: iso_timestamp(),
            row,
            answers,
        };

        progress.on_event(ProgressEvent::Graded {
            result: result.clone(),
        });
        output.write(&result)?;
        results.push(result);
    }

    output.flush()?;

    let summary = GradeSummary {
        graded: results.len(),
        skipped,
    };
    progress.on_event(ProgressEvent::Finished {
        graded: summary.graded,
        skipped: summary.skipped,
    });

    Ok((summary, results))
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
