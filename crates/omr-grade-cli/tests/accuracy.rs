//! Detection accuracy tests on synthetic sheets.
//!
//! Each test renders a sheet with known marks, runs the full detection
//! pipeline and checks which answers survive the selection policy.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use image::ImageFormat;
use omr_grade_core::{
    detect_image, grade, ChoiceLabel, Detection, GridParams, GridParamsBuilder, Preset,
    SelectionMode, DEFAULT_MAX_WIDTH,
};
use omr_grade_test_support::{Mark, SyntheticSheetBuilder};

const KEY: &str = "ABCDEABCDEABCDEABCDEABCDEA";

fn base() -> GridParamsBuilder {
    GridParams::builder().origin(40.0, 40.0)
}

fn read(sheet: &SyntheticSheetBuilder, params: &GridParams) -> Detection {
    detect_image(&sheet.png(), params, DEFAULT_MAX_WIDTH).unwrap()
}

fn label(c: char) -> Option<ChoiceLabel> {
    ChoiceLabel::from_letter(c)
}

#[test]
fn test_clean_sheet_reads_exactly() {
    let params = base().build().unwrap();
    let detection = read(&SyntheticSheetBuilder::standard().answers(KEY), &params);
    assert_eq!(detection.answers.to_string(), KEY);
}

#[test]
fn test_unmarked_sheet_reads_blank() {
    let params = base().build().unwrap();
    let detection = read(&SyntheticSheetBuilder::standard(), &params);
    assert_eq!(detection.answers.answered(), 0);
}

#[test]
fn test_twenty_of_twenty_six() {
    let params = base().build().unwrap();
    let key = read(&SyntheticSheetBuilder::standard().answers(KEY), &params).answers;
    let response = read(
        &SyntheticSheetBuilder::standard().answers("ABCDEABCDEABCDEABCDE------"),
        &params,
    )
    .answers;

    let row = grade(&response, &key, 1);
    assert_eq!(row.score, 20);
    assert_eq!(row.max, 26);
    assert_eq!(row.percent, 76.9);
}

#[test]
fn test_jpeg_sheet_reads_exactly() {
    let params = base().build().unwrap();
    let jpeg = SyntheticSheetBuilder::standard()
        .answers(KEY)
        .encode(ImageFormat::Jpeg);
    let detection = detect_image(&jpeg, &params, DEFAULT_MAX_WIDTH).unwrap();
    assert_eq!(detection.answers.to_string(), KEY);
}

// === Presets ===

fn light_mark_sheet() -> SyntheticSheetBuilder {
    SyntheticSheetBuilder::standard()
        .outlines(false)
        .mark(0, 2, Mark::Partial(0.55))
}

#[test]
fn test_light_mark_below_standard_fill() {
    let params = base().preset(Preset::Standard).build().unwrap();
    let detection = read(&light_mark_sheet(), &params);
    assert_eq!(detection.answers.as_slice()[0], None);
    assert!(detection.scores[0].ratios[2] > 0.25);
    assert!(detection.scores[0].ratios[2] < 0.35);
}

#[test]
fn test_light_mark_accepted_by_lenient() {
    let params = base().preset(Preset::Lenient).build().unwrap();
    let detection = read(&light_mark_sheet(), &params);
    assert_eq!(detection.answers.as_slice()[0], label('C'));
}

#[test]
fn test_medium_mark_rejected_by_strict() {
    let sheet = SyntheticSheetBuilder::standard().mark(0, 1, Mark::Partial(0.7));

    let standard = base().build().unwrap();
    assert_eq!(read(&sheet, &standard).answers.as_slice()[0], label('B'));

    let strict = base().preset(Preset::Strict).build().unwrap();
    assert_eq!(read(&sheet, &strict).answers.as_slice()[0], None);
}

#[test]
fn test_strict_accepts_full_marks() {
    let params = base().preset(Preset::Strict).build().unwrap();
    let detection = read(&SyntheticSheetBuilder::standard().answers(KEY), &params);
    assert_eq!(detection.answers.to_string(), KEY);
}

// === Selection mode ===

#[test]
fn test_relative_mode_accepts_light_mark_over_outlines() {
    let sheet = SyntheticSheetBuilder::standard().mark(0, 2, Mark::Partial(0.55));

    let absolute = base().build().unwrap();
    assert_eq!(read(&sheet, &absolute).answers.as_slice()[0], None);

    let relative = base().mode(SelectionMode::Relative).build().unwrap();
    assert_eq!(read(&sheet, &relative).answers.as_slice()[0], label('C'));
}

#[test]
fn test_relative_mode_keeps_blank_rows_blank() {
    let params = base().mode(SelectionMode::Relative).build().unwrap();
    let detection = read(&SyntheticSheetBuilder::standard().answers("AB"), &params);
    assert_eq!(detection.answers.answered(), 2);
}

// === Ambiguity ===

#[test]
fn test_double_mark_is_ambiguous() {
    let sheet = SyntheticSheetBuilder::standard()
        .mark(0, 1, Mark::Filled)
        .mark(0, 3, Mark::Filled);

    let params = base().build().unwrap();
    assert_eq!(read(&sheet, &params).answers.as_slice()[0], None);

    let forced = base().force_pick(true).build().unwrap();
    assert_eq!(read(&sheet, &forced).answers.as_slice()[0], label('B'));
}

#[test]
fn test_force_pick_still_respects_fill() {
    let params = base().force_pick(true).build().unwrap();
    let detection = read(&SyntheticSheetBuilder::standard(), &params);
    assert_eq!(detection.answers.answered(), 0);
}

// === Ring emphasis ===

#[test]
fn test_ring_emphasis_raises_circled_ratio() {
    let sheet = SyntheticSheetBuilder::standard()
        .outlines(false)
        .mark(0, 0, Mark::Circled);

    let plain = read(&sheet, &base().build().unwrap());
    let ring = read(&sheet, &base().ring(true).build().unwrap());

    assert!(ring.scores[0].ratios[0] > plain.scores[0].ratios[0]);
    assert_eq!(ring.answers.as_slice()[0], label('A'));
}

// === Misalignment ===

#[test]
fn test_center_search_recovers_shifted_sheet() {
    let sheet = SyntheticSheetBuilder::standard().answers(KEY).shifted(9.0, 9.0);

    let fixed = read(&sheet, &base().build().unwrap());
    assert_ne!(fixed.answers.to_string(), KEY);

    let searched = read(&sheet, &base().center_search(10).build().unwrap());
    assert_eq!(searched.answers.to_string(), KEY);
    assert!(searched.scores[0].ratios[0] > 0.7);
}

// === Scaling ===

#[test]
fn test_large_sheet_scaled_to_max_width() {
    let large = GridParams::builder()
        .origin(120.0, 120.0)
        .spacing(144.0, 108.0)
        .radius(36)
        .build()
        .unwrap();
    let sheet = SyntheticSheetBuilder::new(&large).answers(KEY);
    assert_eq!(sheet.build().width(), 736);

    // Half scale: grid coordinates halve with it
    let half = GridParams::builder()
        .origin(60.0, 60.0)
        .spacing(72.0, 54.0)
        .radius(18)
        .build()
        .unwrap();
    let detection = detect_image(&sheet.png(), &half, 368).unwrap();
    assert_eq!(detection.answers.to_string(), KEY);
}

// === Choice count ===

#[test]
fn test_four_choice_grid() {
    let params = base().choices(4).build().unwrap();
    let sheet = SyntheticSheetBuilder::new(&params).answers("ABCDDCBA");
    let detection = read(&sheet, &params);
    assert_eq!(&detection.answers.to_string()[..8], "ABCDDCBA");
    assert!(detection.scores.iter().all(|q| q.ratios.len() == 4));
}
