//! CLI command definitions and handlers.

pub mod detect;
pub mod grade;
pub mod grid;

use clap::{Parser, Subcommand};

/// OMR Grade - Bubble-sheet answer detection and grading
#[derive(Parser)]
#[command(name = "omr-grade")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Detect the answers marked on a single sheet
    Detect(detect::DetectArgs),
    /// Grade response sheets against an answer key sheet
    Grade(grade::GradeArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed.
    Success = 0,
    /// Command failed (I/O, decode of the key, invalid parameters).
    Error = 1,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
