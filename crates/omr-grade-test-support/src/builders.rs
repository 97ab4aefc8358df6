//! Synthetic bubble sheet builders for testing.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use omr_grade_core::{ChoiceLabel, EncodedImage, GridParams, QUESTION_COUNT};

const PAPER: Rgb<u8> = Rgb([246, 244, 238]);
const INK: Rgb<u8> = Rgb([24, 24, 36]);
const PRINT: Rgb<u8> = Rgb([90, 90, 90]);

/// How a bubble is filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    /// Solid fill out to `radius - 2`.
    Filled,
    /// Solid fill out to a fraction of the radius.
    Partial(f64),
    /// Only the rim is inked, as with a circled answer.
    Circled,
}

/// Builder for rendering bubble sheets on a known grid.
///
/// The grid geometry (origin, spacing, radius, choices) is taken from a
/// [`GridParams`], so a sheet built here is read back exactly by a detector
/// using the same parameters.
pub struct SyntheticSheetBuilder {
    params: GridParams,
    marks: Vec<(usize, usize, Mark)>,
    outlines: bool,
    shift: (f64, f64),
    margin: u32,
}

impl SyntheticSheetBuilder {
    /// Starts an unmarked sheet laid out for `params`.
    #[must_use]
    pub fn new(params: &GridParams) -> Self {
        Self {
            params: params.clone(),
            marks: Vec::new(),
            outlines: true,
            shift: (0.0, 0.0),
            margin: 40,
        }
    }

    /// Starts a sheet with the default grid at origin (40, 40).
    #[must_use]
    #[allow(clippy::missing_panics_doc, clippy::expect_used)]
    pub fn standard() -> Self {
        let params = GridParams::builder()
            .origin(40.0, 40.0)
            .build()
            .expect("default grid is valid");
        Self::new(&params)
    }

    /// Marks `choice` on `question` (both zero-based).
    #[must_use]
    pub fn mark(mut self, question: usize, choice: usize, mark: Mark) -> Self {
        self.marks.push((question, choice, mark));
        self
    }

    /// Fills one bubble per question from a letter string, `-` for blank.
    ///
    /// `"AB-D"` fills A on question 1, B on question 2 and D on question 4.
    #[must_use]
    pub fn answers(mut self, answers: &str) -> Self {
        for (question, c) in answers.chars().enumerate() {
            if let Some(label) = ChoiceLabel::from_letter(c) {
                self.marks.push((question, label.index(), Mark::Filled));
            }
        }
        self
    }

    /// Whether to print the empty bubble outlines (default true).
    #[must_use]
    pub const fn outlines(mut self, outlines: bool) -> Self {
        self.outlines = outlines;
        self
    }

    /// Offsets everything printed on the sheet, simulating misalignment.
    #[must_use]
    pub const fn shifted(mut self, dx: f64, dy: f64) -> Self {
        self.shift = (dx, dy);
        self
    }

    /// Renders the sheet.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn build(&self) -> RgbImage {
        let p = &self.params;
        let right = p.x() + p.col_width() * f64::from(p.choices() - 1);
        let bottom = p.y() + p.row_height() * (QUESTION_COUNT - 1) as f64;
        let width = (right + self.shift.0).max(0.0) as u32 + self.margin;
        let height = (bottom + self.shift.1).max(0.0) as u32 + self.margin;

        let radius = f64::from(p.radius());
        let mut img = RgbImage::from_pixel(width, height, PAPER);

        for question in 0..QUESTION_COUNT {
            for choice in 0..usize::from(p.choices()) {
                let cx = p.x() + choice as f64 * p.col_width() + self.shift.0;
                let cy = p.y() + question as f64 * p.row_height() + self.shift.1;

                let mark = self
                    .marks
                    .iter()
                    .find(|(q, c, _)| *q == question && *c == choice)
                    .map(|(_, _, m)| *m);

                match mark {
                    Some(Mark::Filled) => fill_disc(&mut img, cx, cy, radius - 2.0, INK),
                    Some(Mark::Partial(fraction)) => {
                        fill_disc(&mut img, cx, cy, radius * fraction, INK);
                    }
                    Some(Mark::Circled) => fill_ring(&mut img, cx, cy, radius - 3.0, radius, INK),
                    None => {}
                }
                if self.outlines && mark.is_none() {
                    fill_ring(&mut img, cx, cy, radius - 1.0, radius, PRINT);
                }
            }
        }

        img
    }

    /// Renders the sheet and encodes it.
    ///
    /// # Panics
    ///
    /// Panics if the image cannot be encoded in `format`.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn encode(&self, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(self.build())
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode synthetic sheet");
        bytes
    }

    /// Renders the sheet as PNG bytes.
    #[must_use]
    pub fn png(&self) -> Vec<u8> {
        self.encode(ImageFormat::Png)
    }

    /// Renders the sheet as an [`EncodedImage`] with the given name.
    #[must_use]
    pub fn encoded(&self, name: &str) -> EncodedImage {
        EncodedImage::new(name, self.png())
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
fn fill_ring(img: &mut RgbImage, cx: f64, cy: f64, inner: f64, outer: f64, color: Rgb<u8>) {
    let x0 = (cx - outer).floor().max(0.0) as u32;
    let y0 = (cy - outer).floor().max(0.0) as u32;
    let x1 = ((cx + outer).ceil().max(0.0) as u32).min(img.width().saturating_sub(1));
    let y1 = ((cy + outer).ceil().max(0.0) as u32).min(img.height().saturating_sub(1));
    let (inner2, outer2) = (inner.max(0.0).powi(2), outer.powi(2));

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            let d2 = dx * dx + dy * dy;
            if d2 <= outer2 && (inner <= 0.0 || d2 >= inner2) {
                img.put_pixel(x, y, color);
            }
        }
    }
}

fn fill_disc(img: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Rgb<u8>) {
    fill_ring(img, cx, cy, 0.0, radius, color);
}
