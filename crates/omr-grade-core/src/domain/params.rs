//! Grid layout and selection parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::answer::MAX_CHOICES;
use super::GradeError;

/// Upper bound for the local center search radius.
///
/// The search samples `(2s + 1)²` circles per choice.
pub const MAX_CENTER_SEARCH: u32 = 32;

/// Upper bound for the sampling radius.
///
/// Keeps the squared window distances well inside `i64`.
pub const MAX_RADIUS: u32 = 1024;

/// How a choice is selected from the per-choice fill ratios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Require a minimum fill ratio and no close competitor.
    #[default]
    Absolute,
    /// Require only that no competitor is within the margin.
    Relative,
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "relative" => Ok(Self::Relative),
            other => Err(format!(
                "mode must be 'absolute' or 'relative', got '{other}'"
            )),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absolute => "absolute",
            Self::Relative => "relative",
        })
    }
}

/// Named sets of threshold/fill/margin values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Threshold 140, fill 35%, margin 10%.
    #[default]
    Standard,
    /// Threshold at least 120, fill 25%, margin 20%.
    Lenient,
    /// Threshold at most 200, fill 60%, margin 5%.
    Strict,
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "preset must be 'standard', 'lenient' or 'strict', got '{other}'"
            )),
        }
    }
}

/// Validated parameters for one detection call.
///
/// Obtained through [`GridParams::builder`]; every field is range-checked
/// by [`GridParamsBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridParams {
    x: f64,
    y: f64,
    col_width: f64,
    row_height: f64,
    radius: u32,
    threshold: u8,
    choices: u8,
    fill_pct: f64,
    margin_pct: f64,
    mode: SelectionMode,
    center_search: u32,
    ring: bool,
    force_pick: bool,
}

impl GridParams {
    /// Starts a builder populated with the default values.
    #[must_use]
    pub fn builder() -> GridParamsBuilder {
        GridParamsBuilder::default()
    }

    /// Center x of question 1, choice A.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Center y of question 1, choice A.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Horizontal distance between choice columns.
    #[must_use]
    pub const fn col_width(&self) -> f64 {
        self.col_width
    }

    /// Vertical distance between question rows.
    #[must_use]
    pub const fn row_height(&self) -> f64 {
        self.row_height
    }

    /// Sampling radius in pixels.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Luminance threshold used for binarization.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Number of choices per question.
    #[must_use]
    pub const fn choices(&self) -> u8 {
        self.choices
    }

    /// Minimum fill percentage in absolute mode.
    #[must_use]
    pub const fn fill_pct(&self) -> f64 {
        self.fill_pct
    }

    /// Ambiguity margin percentage.
    #[must_use]
    pub const fn margin_pct(&self) -> f64 {
        self.margin_pct
    }

    /// Selection mode.
    #[must_use]
    pub const fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Local center search radius in pixels.
    #[must_use]
    pub const fn center_search(&self) -> u32 {
        self.center_search
    }

    /// Whether ring-weighted sampling is enabled.
    #[must_use]
    pub const fn ring(&self) -> bool {
        self.ring
    }

    /// Whether ambiguity rejection is suppressed.
    #[must_use]
    pub const fn force_pick(&self) -> bool {
        self.force_pick
    }

    /// Minimum accepted fill ratio, or `None` in relative mode.
    #[must_use]
    pub fn min_fill(&self) -> Option<f64> {
        match self.mode {
            SelectionMode::Absolute => Some(self.fill_pct / 100.0),
            SelectionMode::Relative => None,
        }
    }

    /// Ambiguity margin as a ratio.
    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin_pct / 100.0
    }
}

impl Default for GridParams {
    fn default() -> Self {
        let b = GridParamsBuilder::default();
        Self {
            x: b.x,
            y: b.y,
            col_width: b.col_width,
            row_height: b.row_height,
            radius: b.radius,
            threshold: b.threshold,
            choices: b.choices,
            fill_pct: b.fill_pct,
            margin_pct: b.margin_pct,
            mode: b.mode,
            center_search: b.center_search,
            ring: b.ring,
            force_pick: b.force_pick,
        }
    }
}

/// Builder for [`GridParams`].
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct GridParamsBuilder {
    x: f64,
    y: f64,
    col_width: f64,
    row_height: f64,
    radius: u32,
    threshold: u8,
    choices: u8,
    fill_pct: f64,
    margin_pct: f64,
    mode: SelectionMode,
    center_search: u32,
    ring: bool,
    force_pick: bool,
}

impl Default for GridParamsBuilder {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            col_width: 48.0,
            row_height: 36.0,
            radius: 12,
            threshold: 140,
            choices: 5,
            fill_pct: 35.0,
            margin_pct: 10.0,
            mode: SelectionMode::Absolute,
            center_search: 0,
            ring: false,
            force_pick: false,
        }
    }
}

impl GridParamsBuilder {
    /// Sets the origin (center of question 1, choice A).
    #[must_use]
    pub const fn origin(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Sets column and row spacing.
    #[must_use]
    pub const fn spacing(mut self, col_width: f64, row_height: f64) -> Self {
        self.col_width = col_width;
        self.row_height = row_height;
        self
    }

    #[must_use]
    pub const fn radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub const fn threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn choices(mut self, choices: u8) -> Self {
        self.choices = choices;
        self
    }

    #[must_use]
    pub const fn fill_pct(mut self, fill_pct: f64) -> Self {
        self.fill_pct = fill_pct;
        self
    }

    #[must_use]
    pub const fn margin_pct(mut self, margin_pct: f64) -> Self {
        self.margin_pct = margin_pct;
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn center_search(mut self, center_search: u32) -> Self {
        self.center_search = center_search;
        self
    }

    #[must_use]
    pub const fn ring(mut self, ring: bool) -> Self {
        self.ring = ring;
        self
    }

    #[must_use]
    pub const fn force_pick(mut self, force_pick: bool) -> Self {
        self.force_pick = force_pick;
        self
    }

    /// Applies a preset to threshold, fill and margin.
    ///
    /// Lenient and strict clamp the current threshold rather than replacing it,
    /// so apply the preset before any explicit threshold.
    #[must_use]
    pub fn preset(mut self, preset: Preset) -> Self {
        match preset {
            Preset::Standard => {
                self.threshold = 140;
                self.fill_pct = 35.0;
                self.margin_pct = 10.0;
            }
            Preset::Lenient => {
                self.threshold = self.threshold.max(120);
                self.fill_pct = 25.0;
                self.margin_pct = 20.0;
            }
            Preset::Strict => {
                self.threshold = self.threshold.min(200);
                self.fill_pct = 60.0;
                self.margin_pct = 5.0;
            }
        }
        self
    }

    /// Validates and builds the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::InvalidParams`] naming the first field out of range.
    pub fn build(self) -> Result<GridParams, GradeError> {
        let invalid = |msg: String| Err(GradeError::InvalidParams(msg));

        if !(self.x.is_finite() && self.x >= 0.0) {
            return invalid(format!("x must be a finite value >= 0, got {}", self.x));
        }
        if !(self.y.is_finite() && self.y >= 0.0) {
            return invalid(format!("y must be a finite value >= 0, got {}", self.y));
        }
        if !(self.col_width.is_finite() && self.col_width > 0.0) {
            return invalid(format!("col_width must be > 0, got {}", self.col_width));
        }
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return invalid(format!("row_height must be > 0, got {}", self.row_height));
        }
        if !(1..=MAX_RADIUS).contains(&self.radius) {
            return invalid(format!("radius must be 1-{MAX_RADIUS}, got {}", self.radius));
        }
        if !(1..=MAX_CHOICES).contains(&self.choices) {
            return invalid(format!(
                "choices must be 1-{MAX_CHOICES}, got {}",
                self.choices
            ));
        }
        if !(0.0..=100.0).contains(&self.fill_pct) {
            return invalid(format!("fill_pct must be 0-100, got {}", self.fill_pct));
        }
        if !(0.0..=100.0).contains(&self.margin_pct) {
            return invalid(format!(
                "margin_pct must be 0-100, got {}",
                self.margin_pct
            ));
        }
        if self.center_search > MAX_CENTER_SEARCH {
            return invalid(format!(
                "center_search must be 0-{MAX_CENTER_SEARCH}, got {}",
                self.center_search
            ));
        }

        Ok(GridParams {
            x: self.x,
            y: self.y,
            col_width: self.col_width,
            row_height: self.row_height,
            radius: self.radius,
            threshold: self.threshold,
            choices: self.choices,
            fill_pct: self.fill_pct,
            margin_pct: self.margin_pct,
            mode: self.mode,
            center_search: self.center_search,
            ring: self.ring,
            force_pick: self.force_pick,
        })
    }
}
