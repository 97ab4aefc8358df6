//! Grid and selection options shared by `detect` and `grade`.

use anyhow::{bail, Result};
use clap::Args;
use omr_grade_core::domain::{MAX_CENTER_SEARCH, MAX_CHOICES, MAX_RADIUS};
use omr_grade_core::{GridParams, Preset, SelectionMode, DEFAULT_MAX_WIDTH};

use crate::config::AppConfig;

/// Parse a coordinate (finite, >= 0).
fn parse_coordinate(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be >= 0"))
    }
}

/// Parse a spacing (finite, > 0).
fn parse_spacing(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} must be > 0"))
    }
}

/// Parse a percentage (0-100).
fn parse_percent(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0..=100"))
    }
}

/// Grid geometry and selection arguments.
#[derive(Args, Clone, Debug, Default)]
pub struct GridArgs {
    /// Center x of question 1, choice A (pixels after scaling)
    #[arg(long, value_parser = parse_coordinate)]
    pub x: Option<f64>,

    /// Center y of question 1, choice A (pixels after scaling)
    #[arg(long, value_parser = parse_coordinate)]
    pub y: Option<f64>,

    /// Horizontal distance between choices [default: 48]
    #[arg(long, value_parser = parse_spacing)]
    pub col_width: Option<f64>,

    /// Vertical distance between questions [default: 36]
    #[arg(long, value_parser = parse_spacing)]
    pub row_height: Option<f64>,

    /// Sampling radius in pixels [default: 12]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RADIUS)))]
    pub radius: Option<u32>,

    /// Luminance threshold below which a pixel is ink [default: 140]
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Choices per question [default: 5]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=i64::from(MAX_CHOICES)))]
    pub choices: Option<u8>,

    /// Minimum fill percentage for absolute mode [default: 35]
    #[arg(long, value_parser = parse_percent)]
    pub fill_pct: Option<f64>,

    /// Required lead over the runner-up, in percent [default: 10]
    #[arg(long, value_parser = parse_percent)]
    pub margin_pct: Option<f64>,

    /// Selection mode: absolute or relative [default: absolute]
    #[arg(long)]
    pub mode: Option<SelectionMode>,

    /// Search radius for the best bubble center [default: 0]
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_CENTER_SEARCH)))]
    pub center_search: Option<u32>,

    /// Weight the bubble rim over its center
    #[arg(long)]
    pub ring: bool,

    /// Pick the darkest choice even when ambiguous
    #[arg(long)]
    pub force_pick: bool,

    /// Preset for threshold, fill and margin: standard, lenient or strict
    #[arg(long)]
    pub preset: Option<Preset>,

    /// Maximum width images are scaled to before detection [default: 1200]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_width: Option<u32>,
}

impl GridArgs {
    /// Fill unset options from configuration; CLI values always win.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        let grid = &config.grid;
        let selection = &config.selection;

        self.x = self.x.or(grid.x);
        self.y = self.y.or(grid.y);
        self.col_width = self.col_width.or(grid.col_width);
        self.row_height = self.row_height.or(grid.row_height);
        self.radius = self.radius.or(grid.radius);
        self.choices = self.choices.or(grid.choices);

        self.preset = self.preset.or(selection.preset);
        self.threshold = self.threshold.or(selection.threshold);
        self.fill_pct = self.fill_pct.or(selection.fill_pct);
        self.margin_pct = self.margin_pct.or(selection.margin_pct);
        self.mode = self.mode.or(selection.mode);
        self.center_search = self.center_search.or(selection.center_search);

        // Boolean flags: CLI can only turn them on, config decides otherwise
        if !self.ring {
            self.ring = selection.ring.unwrap_or(false);
        }
        if !self.force_pick {
            self.force_pick = selection.force_pick.unwrap_or(false);
        }

        self.max_width = self.max_width.or(config.input.max_width);
        self
    }

    /// Maximum raster width with fallback to the default.
    ///
    /// A zero width can only arrive through configuration and is rejected.
    pub fn max_width(&self) -> Result<u32> {
        match self.max_width {
            Some(0) => bail!("max_width must be >= 1, got 0"),
            Some(width) => Ok(width),
            None => Ok(DEFAULT_MAX_WIDTH),
        }
    }

    /// Build validated grid parameters.
    ///
    /// The preset is applied first so explicit threshold, fill and margin
    /// values override it.
    pub fn to_params(&self) -> Result<GridParams> {
        let mut builder = GridParams::builder();

        if let Some(preset) = self.preset {
            builder = builder.preset(preset);
        }

        let defaults = GridParams::default();
        builder = builder
            .origin(self.x.unwrap_or(defaults.x()), self.y.unwrap_or(defaults.y()))
            .spacing(
                self.col_width.unwrap_or(defaults.col_width()),
                self.row_height.unwrap_or(defaults.row_height()),
            )
            .ring(self.ring)
            .force_pick(self.force_pick);

        if let Some(radius) = self.radius {
            builder = builder.radius(radius);
        }
        if let Some(choices) = self.choices {
            builder = builder.choices(choices);
        }
        if let Some(threshold) = self.threshold {
            builder = builder.threshold(threshold);
        }
        if let Some(fill) = self.fill_pct {
            builder = builder.fill_pct(fill);
        }
        if let Some(margin) = self.margin_pct {
            builder = builder.margin_pct(margin);
        }
        if let Some(mode) = self.mode {
            builder = builder.mode(mode);
        }
        if let Some(search) = self.center_search {
            builder = builder.center_search(search);
        }

        Ok(builder.build()?)
    }
}
