// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line options. Every option overrides the matching field of the
// run configuration, which starts from `--config` or the defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use pagewash_core::{
    AxisPair, Border, ColorDepth, Directions, Extent, Feature, Layout, Point, QuarterTurn, Rect,
    RunConfig, SheetSelector,
};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Clean a single scan
  pagewash scan.pgm clean.pgm

  # Numbered sheets, two pages per sheet, bilevel output
  pagewash --layout double --type pbm scan%03d.pgm clean%03d.pbm

  # Skip deskewing on sheets 4 to 7 and report what happened
  pagewash --no-deskew=4-7 --report json scan%d.pgm out%d.pgm

  # Show the effective configuration
  pagewash --config run.json --dump-config

Switches taking an optional sheet list need `=`: `--no-deskew` alone
applies to every sheet, `--no-deskew=1,3,5-7` to those sheets only.
"#;

/// Post-process scanned book pages: remove scanner artifacts, find the page
/// content, straighten and centre it.
#[derive(Parser, Debug)]
#[command(
    name = "pagewash",
    version,
    about = "Post-process scanned sheets: artifact filters, masking, deskew and centering",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
pub struct Cli {
    /// Input file, or a pattern such as `scan%03d.pgm` for numbered sheets.
    pub input: Option<String>,

    /// Output file or pattern. Not needed with --test-only.
    pub output: Option<String>,

    // -- Run ------------------------------------------------------------------
    /// JSON run configuration to start from.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub dump_config: bool,

    /// Print a per-sheet report on stdout after the run.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub report: Option<ReportFormat>,

    /// Sheet layout template: single, double or none.
    #[arg(short, long)]
    pub layout: Option<Layout>,

    /// First sheet number for numbered input.
    #[arg(short, long)]
    pub start_sheet: Option<u32>,

    /// Last sheet number for numbered input.
    #[arg(short, long)]
    pub end_sheet: Option<u32>,

    /// Sheets to process, e.g. `1,3,5-7`.
    #[arg(long = "sheet", value_name = "SHEETS")]
    pub sheets: Option<SheetSelector>,

    /// Sheets to leave out entirely.
    #[arg(short = 'x', long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub exclude: Option<SheetSelector>,

    /// Sheets to pass through with only rotation and mirroring.
    #[arg(short = 'n', long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_processing: Option<SheetSelector>,

    /// Output file type: pbm or pgm. Defaults to the input type.
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub output_type: Option<ColorDepth>,

    /// Process without writing output files.
    #[arg(short = 'T', long)]
    pub test_only: bool,

    /// Treat `%` in file names literally.
    #[arg(long)]
    pub no_multi_pages: bool,

    /// Warnings and errors only.
    #[arg(short, long)]
    pub quiet: bool,

    /// More log output; repeat for even more.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    // -- Pre- and post-processing ------------------------------------------
    /// Quarter turn before processing: 90 or -90.
    #[arg(long, allow_hyphen_values = true, value_name = "DEGREES")]
    pub pre_rotate: Option<QuarterTurn>,

    /// Quarter turn after processing: 90 or -90.
    #[arg(long, allow_hyphen_values = true, value_name = "DEGREES")]
    pub post_rotate: Option<QuarterTurn>,

    /// Mirror before processing: h, v or h,v.
    #[arg(short = 'M', long, value_name = "DIRECTIONS")]
    pub pre_mirror: Option<Directions>,

    /// Mirror after processing.
    #[arg(long, value_name = "DIRECTIONS")]
    pub post_mirror: Option<Directions>,

    /// Area to wipe before processing, `l,t,r,b`; repeatable.
    #[arg(long, value_name = "RECT")]
    pub pre_wipe: Vec<Rect>,

    /// Area to wipe after centering, `l,t,r,b`; repeatable.
    #[arg(short = 'W', long, value_name = "RECT")]
    pub wipe: Vec<Rect>,

    /// Area to wipe after all other processing; repeatable.
    #[arg(long, value_name = "RECT")]
    pub post_wipe: Vec<Rect>,

    /// Wipe `l,r` pixels around the middle of a double-layout sheet.
    #[arg(long, value_name = "L,R")]
    pub middle_wipe: Option<AxisPair<u32>>,

    /// Border to clear before processing, `l,t,r,b`.
    #[arg(long, value_name = "BORDER")]
    pub pre_border: Option<Border>,

    /// Border to clear after centering.
    #[arg(short = 'B', long, value_name = "BORDER")]
    pub border: Option<Border>,

    /// Border to clear after all other processing.
    #[arg(long, value_name = "BORDER")]
    pub post_border: Option<Border>,

    /// Keep only this area before processing; repeatable.
    #[arg(long, value_name = "RECT")]
    pub pre_mask: Vec<Rect>,

    /// Extra content area kept alongside detected masks; repeatable.
    #[arg(short = 'm', long, value_name = "RECT")]
    pub mask: Vec<Rect>,

    /// Seed point for mask detection, `x,y`; repeatable.
    #[arg(short = 'p', long, value_name = "POINT")]
    pub mask_point: Vec<Point>,

    /// Gray value painted outside masks.
    #[arg(long, value_name = "COLOR")]
    pub mask_color: Option<u8>,

    // -- Filters --------------------------------------------------------------
    #[arg(long, value_name = "DIRECTIONS")]
    pub blackfilter_scan_direction: Option<Directions>,
    #[arg(long, value_name = "SIZE")]
    pub blackfilter_scan_size: Option<AxisPair<u32>>,
    #[arg(long, value_name = "DEPTH")]
    pub blackfilter_scan_depth: Option<AxisPair<u32>>,
    #[arg(long, value_name = "STEP")]
    pub blackfilter_scan_step: Option<AxisPair<u32>>,
    #[arg(long, value_name = "RATIO")]
    pub blackfilter_scan_threshold: Option<f64>,
    #[arg(long, value_name = "PIXELS")]
    pub blackfilter_intensity: Option<u32>,

    /// Largest dark cluster removed as noise.
    #[arg(long, value_name = "PIXELS")]
    pub noisefilter_intensity: Option<u32>,

    #[arg(long, value_name = "SIZE")]
    pub blurfilter_size: Option<AxisPair<u32>>,
    #[arg(long, value_name = "STEP")]
    pub blurfilter_step: Option<AxisPair<u32>>,
    #[arg(long, value_name = "RATIO")]
    pub blurfilter_intensity: Option<f64>,

    #[arg(long, value_name = "SIZE")]
    pub grayfilter_size: Option<AxisPair<u32>>,
    #[arg(long, value_name = "STEP")]
    pub grayfilter_step: Option<AxisPair<u32>>,
    #[arg(long, value_name = "RATIO")]
    pub grayfilter_threshold: Option<f64>,

    // -- Detection ------------------------------------------------------------
    #[arg(long, value_name = "DIRECTIONS")]
    pub mask_scan_direction: Option<Directions>,
    #[arg(long, value_name = "SIZE")]
    pub mask_scan_size: Option<AxisPair<u32>>,
    /// Bar depth per axis; -1 spans the whole sheet.
    #[arg(long, allow_hyphen_values = true, value_name = "DEPTH")]
    pub mask_scan_depth: Option<AxisPair<Extent>>,
    #[arg(long, value_name = "STEP")]
    pub mask_scan_step: Option<AxisPair<u32>>,
    #[arg(long, value_name = "RATIO")]
    pub mask_scan_threshold: Option<AxisPair<f64>>,
    #[arg(long, value_name = "W,H")]
    pub mask_scan_minimum: Option<AxisPair<u32>>,
    #[arg(long, value_name = "W,H")]
    pub mask_scan_maximum: Option<AxisPair<u32>>,

    #[arg(long, value_name = "DIRECTIONS")]
    pub deskew_scan_direction: Option<Directions>,
    /// Scan line length; -1 spans the whole mask.
    #[arg(long, allow_hyphen_values = true, value_name = "PIXELS")]
    pub deskew_scan_size: Option<Extent>,
    #[arg(long, value_name = "RATIO")]
    pub deskew_scan_depth: Option<f64>,
    #[arg(long, value_name = "DEGREES")]
    pub deskew_scan_range: Option<f64>,
    #[arg(long, value_name = "DEGREES")]
    pub deskew_scan_step: Option<f64>,
    /// Accepted for compatibility; rotation detection does not use it.
    #[arg(long, value_name = "RATIO")]
    pub deskew_scan_threshold: Option<f64>,
    #[arg(long, value_name = "DEGREES")]
    pub deskew_scan_deviation: Option<f64>,
    /// Rotate at normal resolution instead of doubled.
    #[arg(long)]
    pub no_qpixels: bool,

    #[arg(long, value_name = "DIRECTIONS")]
    pub border_scan_direction: Option<Directions>,
    #[arg(long, value_name = "SIZE")]
    pub border_scan_size: Option<AxisPair<u32>>,
    #[arg(long, value_name = "STEP")]
    pub border_scan_step: Option<AxisPair<u32>>,
    #[arg(long, value_name = "PIXELS")]
    pub border_scan_threshold: Option<AxisPair<u32>>,

    /// Brightness ratio above which a pixel counts as white.
    #[arg(short = 'w', long, value_name = "RATIO")]
    pub white_threshold: Option<f64>,

    /// Darkness ratio above which a pixel counts as black.
    #[arg(short = 'b', long, value_name = "RATIO")]
    pub black_threshold: Option<f64>,

    // -- Feature switches -----------------------------------------------------
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_blackfilter: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_noisefilter: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_blurfilter: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_grayfilter: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_mask_scan: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_mask_center: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_deskew: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_wipe: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_border: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_border_scan: Option<SheetSelector>,
    #[arg(long, value_name = "SHEETS", num_args = 0..=1, require_equals = true, default_missing_value = "all")]
    pub no_border_center: Option<SheetSelector>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// One line per sheet.
    Text,
    /// The full batch summary as JSON.
    Json,
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl Cli {
    /// Tracing filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    /// The run configuration: `--config` (or the defaults) with every given
    /// option applied on top.
    pub fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("Failed to read configuration {}", path.display()))?,
            None => RunConfig::default(),
        };

        set(&mut config.start_sheet, &self.start_sheet);
        if self.end_sheet.is_some() {
            config.end_sheet = self.end_sheet;
        }
        if self.output_type.is_some() {
            config.output_depth = self.output_type;
        }
        if self.test_only {
            config.write_output = false;
        }
        if self.no_multi_pages {
            config.multi_sheet = false;
        }

        let policy = &mut config.policy;
        set(&mut policy.sheets, &self.sheets);
        if let Some(exclude) = &self.exclude {
            policy.set_exclude(exclude.clone());
        }
        set(&mut policy.ignore, &self.no_processing);
        let switches = [
            (Feature::BlackFilter, &self.no_blackfilter),
            (Feature::NoiseFilter, &self.no_noisefilter),
            (Feature::BlurFilter, &self.no_blurfilter),
            (Feature::GrayFilter, &self.no_grayfilter),
            (Feature::MaskScan, &self.no_mask_scan),
            (Feature::MaskCenter, &self.no_mask_center),
            (Feature::Deskew, &self.no_deskew),
            (Feature::Wipe, &self.no_wipe),
            (Feature::Border, &self.no_border),
            (Feature::BorderScan, &self.no_border_scan),
            (Feature::BorderCenter, &self.no_border_center),
        ];
        for (feature, selector) in switches {
            if let Some(selector) = selector {
                policy.disable(feature, selector.clone());
            }
        }

        let sheet = &mut config.sheet;
        // The layout template goes first so explicit rotations win.
        if let Some(layout) = self.layout {
            sheet.apply_layout(layout);
        }
        if self.pre_rotate.is_some() {
            sheet.pre_rotate = self.pre_rotate;
        }
        if self.post_rotate.is_some() {
            sheet.post_rotate = self.post_rotate;
        }
        set(&mut sheet.pre_mirror, &self.pre_mirror);
        set(&mut sheet.post_mirror, &self.post_mirror);
        sheet.pre_wipes.extend(&self.pre_wipe);
        sheet.wipes.extend(&self.wipe);
        sheet.post_wipes.extend(&self.post_wipe);
        if let Some(middle) = self.middle_wipe {
            sheet.middle_wipe = (middle.horizontal, middle.vertical);
        }
        set(&mut sheet.pre_border, &self.pre_border);
        set(&mut sheet.border, &self.border);
        set(&mut sheet.post_border, &self.post_border);
        sheet.pre_masks.extend(&self.pre_mask);
        sheet.masks.extend(&self.mask);
        sheet.points.extend(&self.mask_point);
        set(&mut sheet.mask_color, &self.mask_color);
        set(&mut sheet.white_threshold, &self.white_threshold);
        set(&mut sheet.black_threshold, &self.black_threshold);

        let black = &mut sheet.black_filter;
        set(&mut black.directions, &self.blackfilter_scan_direction);
        set(&mut black.size, &self.blackfilter_scan_size);
        set(&mut black.depth, &self.blackfilter_scan_depth);
        set(&mut black.step, &self.blackfilter_scan_step);
        set(&mut black.threshold, &self.blackfilter_scan_threshold);
        set(&mut black.intensity, &self.blackfilter_intensity);
        set(&mut sheet.noise_filter.intensity, &self.noisefilter_intensity);
        set(&mut sheet.blur_filter.size, &self.blurfilter_size);
        set(&mut sheet.blur_filter.step, &self.blurfilter_step);
        set(&mut sheet.blur_filter.intensity, &self.blurfilter_intensity);
        set(&mut sheet.gray_filter.size, &self.grayfilter_size);
        set(&mut sheet.gray_filter.step, &self.grayfilter_step);
        set(&mut sheet.gray_filter.threshold, &self.grayfilter_threshold);

        let mask = &mut sheet.mask_scan;
        set(&mut mask.directions, &self.mask_scan_direction);
        set(&mut mask.size, &self.mask_scan_size);
        set(&mut mask.depth, &self.mask_scan_depth);
        set(&mut mask.step, &self.mask_scan_step);
        set(&mut mask.threshold, &self.mask_scan_threshold);
        set(&mut mask.minimum, &self.mask_scan_minimum);
        if self.mask_scan_maximum.is_some() {
            mask.maximum = self.mask_scan_maximum;
        }

        let deskew = &mut sheet.deskew;
        set(&mut deskew.directions, &self.deskew_scan_direction);
        set(&mut deskew.size, &self.deskew_scan_size);
        set(&mut deskew.depth, &self.deskew_scan_depth);
        set(&mut deskew.range, &self.deskew_scan_range);
        set(&mut deskew.step, &self.deskew_scan_step);
        set(&mut deskew.threshold, &self.deskew_scan_threshold);
        set(&mut deskew.deviation, &self.deskew_scan_deviation);
        if self.no_qpixels {
            deskew.qpixels = false;
        }

        let border = &mut sheet.border_scan;
        set(&mut border.directions, &self.border_scan_direction);
        set(&mut border.size, &self.border_scan_size);
        set(&mut border.step, &self.border_scan_step);
        set(&mut border.threshold, &self.border_scan_threshold);

        Ok(config)
    }
}
