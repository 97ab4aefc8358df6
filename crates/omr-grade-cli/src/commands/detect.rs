//! Detect command - read the answers marked on one sheet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use omr_grade_adapters::read_image;
use omr_grade_core::{detect_image, AnswerSequence, QuestionScores, ResultOutput};
use serde::Serialize;
use tracing::info;

use super::grid::GridArgs;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for `omr-grade detect`.
#[derive(Args, Clone, Debug)]
pub struct DetectArgs {
    /// Sheet image to read
    pub image: PathBuf,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Include the per-choice fill ratios of every question
    #[arg(long)]
    pub scores: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl DetectArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.grid = self.grid.with_config(config);
        self
    }
}

/// JSON document printed by `detect`.
#[derive(Debug, Serialize)]
struct DetectReport {
    path: String,
    answers: AnswerSequence,
    answered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<Vec<QuestionScores>>,
}

/// Run the detect command.
pub fn run(args: &DetectArgs) -> Result<()> {
    let params = args.grid.to_params()?;
    let max_width = args.grid.max_width()?;
    let image = read_image(&args.image)?;

    let detection = detect_image(&image.bytes, &params, max_width)
        .with_context(|| format!("Failed to detect answers: {}", image.path))?;
    info!("Detected {} on {}", detection.answers, image.path);

    let report = DetectReport {
        path: image.path,
        answered: detection.answers.answered(),
        answers: detection.answers,
        scores: args.scores.then_some(detection.scores),
    };

    let output = JsonOutput::stdout();
    output.write_value(&report, args.pretty)?;
    output.flush()
}
