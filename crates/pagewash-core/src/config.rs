// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing configuration: one record per sheet plus the batch-wide run
// settings. Every struct carries the stock defaults and can be loaded from or
// written to JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PagewashError, Result};
use crate::selector::SheetPolicy;
use crate::types::{
    AxisPair, Border, ColorDepth, Directions, Extent, Layout, Point, QuarterTurn, Rect,
};

/// Upper bound on the number of points sampled along one rotation scan line.
pub const MAX_ROTATION_SCAN_SIZE: u32 = 10_000;

// ---------------------------------------------------------------------------
// Filter settings
// ---------------------------------------------------------------------------

/// Black-area filter: removes large solid dark regions such as photocopy
/// margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackFilterConfig {
    pub directions: Directions,
    /// Bar length along the scan direction.
    pub size: AxisPair<u32>,
    /// Stripe thickness across the scan direction.
    pub depth: AxisPair<u32>,
    pub step: AxisPair<u32>,
    /// Fraction of dark pixels a bar needs to count as a black area.
    pub threshold: f64,
    /// Gap tolerance handed to the region fill.
    pub intensity: u32,
}

impl Default for BlackFilterConfig {
    fn default() -> Self {
        Self {
            directions: Directions::BOTH,
            size: AxisPair::both(20),
            depth: AxisPair::both(500),
            step: AxisPair::both(5),
            threshold: 0.95,
            intensity: 20,
        }
    }
}

/// Noise filter: clears small isolated dark clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseFilterConfig {
    /// Largest cluster (in pixels) still treated as noise.
    pub intensity: u32,
}

impl Default for NoiseFilterConfig {
    fn default() -> Self {
        Self { intensity: 4 }
    }
}

/// Blur filter: clears sparsely populated windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurFilterConfig {
    pub size: AxisPair<u32>,
    pub step: AxisPair<u32>,
    /// Dark-pixel ratio at or below which a window is cleared.
    pub intensity: f64,
}

impl Default for BlurFilterConfig {
    fn default() -> Self {
        Self {
            size: AxisPair::both(100),
            step: AxisPair::both(50),
            intensity: 0.01,
        }
    }
}

/// Gray filter: clears windows that hold only light gray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrayFilterConfig {
    pub size: AxisPair<u32>,
    pub step: AxisPair<u32>,
    /// Darkness (fraction of 255) below which a window is cleared.
    pub threshold: f64,
}

impl Default for GrayFilterConfig {
    fn default() -> Self {
        Self {
            size: AxisPair::both(50),
            step: AxisPair::both(20),
            threshold: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Detector settings
// ---------------------------------------------------------------------------

/// Mask detection: edge scans outward from each seed point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskScanConfig {
    pub directions: Directions,
    pub size: AxisPair<u32>,
    pub depth: AxisPair<Extent>,
    pub step: AxisPair<u32>,
    pub threshold: AxisPair<f64>,
    /// Smallest accepted mask width/height.
    pub minimum: AxisPair<u32>,
    /// Largest accepted mask width/height; derived from the layout when unset.
    pub maximum: Option<AxisPair<u32>>,
}

impl Default for MaskScanConfig {
    fn default() -> Self {
        Self {
            directions: Directions::HORIZONTAL,
            size: AxisPair::both(50),
            depth: AxisPair::both(Extent::Full),
            step: AxisPair::both(10),
            threshold: AxisPair::both(0.1),
            minimum: AxisPair::both(100),
            maximum: None,
        }
    }
}

/// Rotation detection and correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskewConfig {
    /// Horizontal scans the left and right edges, vertical the top and bottom.
    pub directions: Directions,
    /// Scan line length.
    pub size: Extent,
    /// Accumulated blackness, as a fraction of a fully black line, that ends a scan.
    pub depth: f64,
    /// Largest angle tried, in degrees.
    pub range: f64,
    /// Angle increment, in degrees.
    pub step: f64,
    /// Accepted for compatibility; no detector consults it.
    pub threshold: f64,
    /// Largest standard deviation of the per-edge angles that is still accepted.
    pub deviation: f64,
    /// Rotate on a 2x supersampled copy.
    pub qpixels: bool,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            directions: Directions::HORIZONTAL,
            size: Extent::Pixels(1500),
            depth: 0.666666,
            range: 2.0,
            step: 0.1,
            threshold: 0.1,
            deviation: 1.0,
            qpixels: true,
        }
    }
}

/// Border detection: bars slid inward from the sheet edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderScanConfig {
    pub directions: Directions,
    pub size: AxisPair<u32>,
    pub step: AxisPair<u32>,
    /// Absolute number of dark pixels that marks the content edge.
    pub threshold: AxisPair<u32>,
}

impl Default for BorderScanConfig {
    fn default() -> Self {
        Self {
            directions: Directions::VERTICAL,
            size: AxisPair::both(5),
            step: AxisPair::both(5),
            threshold: AxisPair::both(5),
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet configuration
// ---------------------------------------------------------------------------

/// Everything that controls the processing of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub layout: Layout,
    pub pre_rotate: Option<QuarterTurn>,
    pub post_rotate: Option<QuarterTurn>,
    pub pre_mirror: Directions,
    pub post_mirror: Directions,
    pub pre_wipes: Vec<Rect>,
    pub wipes: Vec<Rect>,
    pub post_wipes: Vec<Rect>,
    /// Strip around the centre of a double-page sheet to wipe: (left, right).
    pub middle_wipe: (u32, u32),
    pub pre_border: Border,
    pub border: Border,
    pub post_border: Border,
    pub pre_masks: Vec<Rect>,
    /// Masks kept in addition to detected ones.
    pub masks: Vec<Rect>,
    /// Seed points for mask detection; the layout supplies them when empty.
    pub points: Vec<Point>,
    /// Colour written outside masks.
    pub mask_color: u8,
    pub black_filter: BlackFilterConfig,
    pub noise_filter: NoiseFilterConfig,
    pub blur_filter: BlurFilterConfig,
    pub gray_filter: GrayFilterConfig,
    pub mask_scan: MaskScanConfig,
    pub deskew: DeskewConfig,
    pub border_scan: BorderScanConfig,
    /// Brightness fraction above which a pixel counts as white.
    pub white_threshold: f64,
    /// Brightness fraction below which a pixel counts as black.
    pub black_threshold: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            pre_rotate: None,
            post_rotate: None,
            pre_mirror: Directions::default(),
            post_mirror: Directions::default(),
            pre_wipes: Vec::new(),
            wipes: Vec::new(),
            post_wipes: Vec::new(),
            middle_wipe: (0, 0),
            pre_border: Border::default(),
            border: Border::default(),
            post_border: Border::default(),
            pre_masks: Vec::new(),
            masks: Vec::new(),
            points: Vec::new(),
            mask_color: 255,
            black_filter: BlackFilterConfig::default(),
            noise_filter: NoiseFilterConfig::default(),
            blur_filter: BlurFilterConfig::default(),
            gray_filter: GrayFilterConfig::default(),
            mask_scan: MaskScanConfig::default(),
            deskew: DeskewConfig::default(),
            border_scan: BorderScanConfig::default(),
            white_threshold: 0.9,
            black_threshold: 0.5,
        }
    }
}

impl SheetConfig {
    /// Switch to `layout`, applying its template: the double layout turns the
    /// sheet upright before processing and back afterwards. Explicit rotation
    /// settings made later override the template.
    pub fn apply_layout(&mut self, layout: Layout) {
        self.layout = layout;
        if layout == Layout::Double {
            self.pre_rotate = Some(QuarterTurn::Clockwise);
            self.post_rotate = Some(QuarterTurn::CounterClockwise);
        }
    }

    /// Gray level at or below which a pixel counts as black.
    pub fn black_cutoff(&self) -> u8 {
        (255.0 * (1.0 - self.black_threshold)) as u8
    }

    /// Gray level below which a pixel counts as non-white.
    pub fn white_cutoff(&self) -> u8 {
        (255.0 * self.white_threshold) as u8
    }

    /// Mask detection seed points for a `width` x `height` sheet.
    pub fn mask_points(&self, width: u32, height: u32) -> Vec<Point> {
        if !self.points.is_empty() {
            return self.points.clone();
        }
        let (w, h) = (width as i32, height as i32);
        match self.layout {
            Layout::None => Vec::new(),
            Layout::Single => vec![Point::new(w / 2, h / 2)],
            Layout::Double => vec![Point::new(w / 4, h / 2), Point::new(w - w / 4, h / 2)],
        }
    }

    /// Largest accepted mask size for a `width` x `height` sheet.
    pub fn mask_maximum(&self, width: u32, height: u32) -> AxisPair<u32> {
        match (self.mask_scan.maximum, self.layout) {
            (Some(maximum), _) => maximum,
            (None, Layout::Double) => AxisPair::new(width / 2, height),
            (None, _) => AxisPair::new(width, height),
        }
    }

    /// Wipe areas including the middle wipe of a double-page sheet.
    pub fn effective_wipes(&self, width: u32, height: u32) -> Vec<Rect> {
        let mut wipes = self.wipes.clone();
        let (left, right) = self.middle_wipe;
        if self.layout == Layout::Double && (left > 0 || right > 0) {
            let middle = (width / 2) as i32;
            wipes.push(Rect::new(
                middle - left as i32,
                0,
                middle + right as i32,
                height as i32 - 1,
            ));
        }
        wipes
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        check_fraction("white-threshold", self.white_threshold)?;
        check_fraction("black-threshold", self.black_threshold)?;
        check_fraction("blackfilter-scan-threshold", self.black_filter.threshold)?;
        check_fraction("blurfilter-intensity", self.blur_filter.intensity)?;
        check_fraction("grayfilter-threshold", self.gray_filter.threshold)?;
        check_fraction("mask-scan-threshold", self.mask_scan.threshold.horizontal)?;
        check_fraction("mask-scan-threshold", self.mask_scan.threshold.vertical)?;

        check_positive("blackfilter-scan-size", self.black_filter.size)?;
        check_positive("blackfilter-scan-depth", self.black_filter.depth)?;
        check_positive("blackfilter-scan-step", self.black_filter.step)?;
        check_positive("blurfilter-size", self.blur_filter.size)?;
        check_positive("blurfilter-step", self.blur_filter.step)?;
        check_positive("grayfilter-size", self.gray_filter.size)?;
        check_positive("grayfilter-step", self.gray_filter.step)?;
        check_positive("mask-scan-step", self.mask_scan.step)?;
        check_positive("border-scan-size", self.border_scan.size)?;
        check_positive("border-scan-step", self.border_scan.step)?;

        if self.deskew.step.is_nan() || self.deskew.step <= 0.0 {
            return Err(PagewashError::Config(format!(
                "deskew-scan-step must be positive, got {}",
                self.deskew.step
            )));
        }
        let negative = |value: f64| value.is_nan() || value < 0.0;
        if negative(self.deskew.range) || negative(self.deskew.deviation) {
            return Err(PagewashError::Config(
                "deskew-scan-range and deskew-scan-deviation must not be negative".into(),
            ));
        }
        if self.deskew.range >= 90.0 {
            return Err(PagewashError::Config(format!(
                "deskew-scan-range must be below 90 degrees, got {}",
                self.deskew.range
            )));
        }

        let rects = self
            .pre_wipes
            .iter()
            .chain(&self.wipes)
            .chain(&self.post_wipes)
            .chain(&self.pre_masks)
            .chain(&self.masks);
        for rect in rects {
            if !rect.is_valid() {
                return Err(PagewashError::Config(format!(
                    "rectangle {rect} has left > right or top > bottom"
                )));
            }
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PagewashError::Config(format!(
            "{name} must be within 0.0..=1.0, got {value}"
        )))
    }
}

fn check_positive(name: &str, value: AxisPair<u32>) -> Result<()> {
    if value.horizontal == 0 || value.vertical == 0 {
        return Err(PagewashError::Config(format!("{name} must be at least 1")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Batch-wide settings around the per-sheet record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub sheet: SheetConfig,
    pub policy: SheetPolicy,
    pub start_sheet: u32,
    /// Last sheet to process; open-ended when unset.
    pub end_sheet: Option<u32>,
    /// Output file type; follows the input when unset.
    pub output_depth: Option<ColorDepth>,
    /// Write output files (false in test-only mode).
    pub write_output: bool,
    /// Expand `%` patterns in file names into sheet numbers.
    pub multi_sheet: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sheet: SheetConfig::default(),
            policy: SheetPolicy::default(),
            start_sheet: 1,
            end_sheet: None,
            output_depth: None,
            write_output: true,
            multi_sheet: true,
        }
    }
}

impl RunConfig {
    /// Load a run configuration from a JSON file. Missing fields keep their
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(end) = self.end_sheet {
            if end < self.start_sheet {
                return Err(PagewashError::Config(format!(
                    "end-sheet {end} lies before start-sheet {}",
                    self.start_sheet
                )));
            }
        }
        self.sheet.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The stock configuration passes validation and has the documented cut-offs.
    #[test]
    fn defaults_validate() {
        let config = RunConfig::default();
        config.validate().expect("defaults are valid");
        assert_eq!(config.sheet.black_cutoff(), 127);
        assert_eq!(config.sheet.white_cutoff(), 229);
        assert_eq!(config.start_sheet, 1);
    }

    /// Thresholds outside 0..=1 and zero steps are configuration errors.
    #[test]
    fn validation_rejects_bad_values() {
        let mut sheet = SheetConfig::default();
        sheet.white_threshold = 1.5;
        assert!(matches!(sheet.validate(), Err(PagewashError::Config(_))));

        let mut sheet = SheetConfig::default();
        sheet.gray_filter.step = AxisPair::new(20, 0);
        assert!(sheet.validate().is_err());

        let mut sheet = SheetConfig::default();
        sheet.deskew.step = 0.0;
        assert!(sheet.validate().is_err());

        let mut sheet = SheetConfig::default();
        sheet.wipes.push(Rect::new(10, 0, 5, 5));
        assert!(sheet.validate().is_err());
    }

    /// Deskew angles must stay below a right angle.
    #[test]
    fn deskew_range_below_right_angle() {
        let mut sheet = SheetConfig::default();
        sheet.deskew.range = 89.9;
        sheet.validate().expect("steep but valid range");

        for range in [90.0, 120.0] {
            sheet.deskew.range = range;
            assert!(
                matches!(sheet.validate(), Err(PagewashError::Config(_))),
                "range {range} should be rejected"
            );
        }
    }

    /// The double layout seeds two points, halves the mask width, and
    /// rotates the sheet upright.
    #[test]
    fn double_layout_template() {
        let mut sheet = SheetConfig::default();
        sheet.apply_layout(Layout::Double);
        sheet.middle_wipe = (10, 20);

        assert_eq!(
            sheet.mask_points(400, 200),
            vec![Point::new(100, 100), Point::new(300, 100)]
        );
        assert_eq!(sheet.mask_maximum(400, 200), AxisPair::new(200, 200));
        assert_eq!(sheet.pre_rotate, Some(QuarterTurn::Clockwise));
        assert_eq!(sheet.post_rotate, Some(QuarterTurn::CounterClockwise));
        assert_eq!(
            sheet.effective_wipes(400, 200),
            vec![Rect::new(190, 0, 220, 199)]
        );
    }

    /// Explicit points win over the layout; no layout and no points means no seeds.
    #[test]
    fn mask_points_sources() {
        let mut sheet = SheetConfig::default();
        assert_eq!(sheet.mask_points(100, 60), vec![Point::new(50, 30)]);

        sheet.layout = Layout::None;
        assert!(sheet.mask_points(100, 60).is_empty());

        sheet.points = vec![Point::new(5, 6)];
        assert_eq!(sheet.mask_points(100, 60), vec![Point::new(5, 6)]);
    }

    /// Partial JSON documents fill the rest from defaults.
    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{ "start_sheet": 3, "sheet": { "noise_filter": { "intensity": 2 } } }"#;
        let config: RunConfig = serde_json::from_str(json).expect("valid JSON");
        assert_eq!(config.start_sheet, 3);
        assert_eq!(config.sheet.noise_filter.intensity, 2);
        assert_eq!(config.sheet.blur_filter, BlurFilterConfig::default());
        assert!(config.write_output);
    }

    /// A configuration written to a file loads back unchanged.
    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("run.json");

        let mut config = RunConfig::default();
        config.sheet.apply_layout(Layout::Double);
        config.end_sheet = Some(12);
        std::fs::write(&path, config.to_json_pretty().expect("serialize")).expect("write");

        let loaded = RunConfig::from_json_file(&path).expect("load");
        assert_eq!(loaded, config);
    }
}
