//! Configuration file support for omr-grade.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/omr-grade/config.toml` (lowest priority)
//! - Project-local: `.omr-grade.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use omr_grade_core::domain::{MAX_CENTER_SEARCH, MAX_CHOICES, MAX_RADIUS};
use omr_grade_core::{Preset, SelectionMode};
use serde::Deserialize;
use tracing::{debug, info};

const PROJECT_CONFIG: &str = ".omr-grade.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Grid geometry.
    pub grid: GridConfig,
    /// Binarization and choice selection.
    pub selection: SelectionConfig,
    /// Input discovery and rasterization.
    pub input: InputConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Grid geometry configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Center x of question 1, choice A.
    pub x: Option<f64>,
    /// Center y of question 1, choice A.
    pub y: Option<f64>,
    /// Horizontal spacing between choices.
    pub col_width: Option<f64>,
    /// Vertical spacing between questions.
    pub row_height: Option<f64>,
    /// Sampling radius in pixels.
    pub radius: Option<u32>,
    /// Number of choices per question.
    pub choices: Option<u8>,
}

/// Selection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Named preset, applied before the explicit values below.
    pub preset: Option<Preset>,
    /// Luminance threshold (0-255).
    pub threshold: Option<u8>,
    /// Minimum fill percentage in absolute mode.
    pub fill_pct: Option<f64>,
    /// Required lead over the runner-up, in percent.
    pub margin_pct: Option<f64>,
    /// "absolute" or "relative".
    pub mode: Option<SelectionMode>,
    /// Local center search radius in pixels.
    pub center_search: Option<u32>,
    /// Weight the bubble rim over its center.
    pub ring: Option<bool>,
    /// Pick the best choice even when ambiguous.
    pub force_pick: Option<bool>,
}

/// Input configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
    /// Maximum raster width before detection.
    pub max_width: Option<u32>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "csv", "json" or "jsonl".
    pub format: Option<String>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [("grid.x", self.grid.x), ("grid.y", self.grid.y)] {
            if let Some(v) = value {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(format!("{name} must be >= 0, got {v}"));
                }
            }
        }
        for (name, value) in [
            ("grid.col_width", self.grid.col_width),
            ("grid.row_height", self.grid.row_height),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(format!("{name} must be > 0, got {v}"));
                }
            }
        }
        if let Some(r) = self.grid.radius {
            if !(1..=MAX_RADIUS).contains(&r) {
                return Err(format!("grid.radius must be 1-{MAX_RADIUS}, got {r}"));
            }
        }
        if let Some(c) = self.grid.choices {
            if !(1..=MAX_CHOICES).contains(&c) {
                return Err(format!("grid.choices must be 1-{MAX_CHOICES}, got {c}"));
            }
        }

        for (name, value) in [
            ("selection.fill_pct", self.selection.fill_pct),
            ("selection.margin_pct", self.selection.margin_pct),
        ] {
            if let Some(v) = value {
                if !(0.0..=100.0).contains(&v) {
                    return Err(format!("{name} must be 0-100, got {v}"));
                }
            }
        }
        if let Some(s) = self.selection.center_search {
            if s > MAX_CENTER_SEARCH {
                return Err(format!(
                    "selection.center_search must be 0-{MAX_CENTER_SEARCH}, got {s}"
                ));
            }
        }

        if self.input.max_width == Some(0) {
            return Err("input.max_width must be >= 1".to_string());
        }

        if let Some(ref f) = self.output.format {
            if !matches!(f.as_str(), "csv" | "json" | "jsonl") {
                return Err(format!(
                    "output.format must be 'csv', 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Grid
        self.grid.x = other.grid.x.or(self.grid.x);
        self.grid.y = other.grid.y.or(self.grid.y);
        self.grid.col_width = other.grid.col_width.or(self.grid.col_width);
        self.grid.row_height = other.grid.row_height.or(self.grid.row_height);
        self.grid.radius = other.grid.radius.or(self.grid.radius);
        self.grid.choices = other.grid.choices.or(self.grid.choices);

        // Selection
        self.selection.preset = other.selection.preset.or(self.selection.preset);
        self.selection.threshold = other.selection.threshold.or(self.selection.threshold);
        self.selection.fill_pct = other.selection.fill_pct.or(self.selection.fill_pct);
        self.selection.margin_pct = other.selection.margin_pct.or(self.selection.margin_pct);
        self.selection.mode = other.selection.mode.or(self.selection.mode);
        self.selection.center_search = other
            .selection
            .center_search
            .or(self.selection.center_search);
        self.selection.ring = other.selection.ring.or(self.selection.ring);
        self.selection.force_pick = other.selection.force_pick.or(self.selection.force_pick);

        // Input
        self.input.recursive = other.input.recursive.or(self.input.recursive);
        self.input.max_width = other.input.max_width.or(self.input.max_width);

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("omr-grade").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.omr-grade.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
