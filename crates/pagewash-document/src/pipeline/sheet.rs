// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet processor — runs every stage on one sheet in a fixed order. Masks are
// detected three times: after the noise and blur filters, again right before
// deskewing, and once more after deskewing for centring, since each earlier
// stage changes what the detector sees.

use std::time::Instant;

use pagewash_core::error::Result;
use pagewash_core::{
    AxisPair, Directions, Feature, Layout, MaskRegion, Point, SheetConfig, SheetPolicy,
};
use tracing::{debug, info, instrument};

use crate::canvas::{Canvas, WHITE};
use crate::deskew::deskew_masks;
use crate::image::{apply_border, apply_wipes, flip_rotate, mirror};
use crate::pipeline::report::{SheetReport, Stage, StageOutcome, StageReport};
use crate::scan::{
    apply_masks, black_filter, blur_filter, center_border, center_mask, detect_border,
    detect_masks, gray_filter, noise_filter,
};

/// Applies one [`SheetConfig`] to sheets, honouring the per-sheet feature
/// switches of a [`SheetPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct SheetProcessor<'a> {
    config: &'a SheetConfig,
    policy: &'a SheetPolicy,
}

/// Stage outcomes in execution order.
#[derive(Default)]
struct StageLog(Vec<StageReport>);

impl StageLog {
    fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        debug!(?stage, ?outcome, "Stage finished");
        self.0.push(StageReport { stage, outcome });
    }
}

impl<'a> SheetProcessor<'a> {
    pub fn new(config: &'a SheetConfig, policy: &'a SheetPolicy) -> Self {
        Self { config, policy }
    }

    /// Run all stages on `canvas`, which holds sheet number `sheet`.
    #[instrument(skip(self, canvas), fields(width = canvas.width(), height = canvas.height()))]
    pub fn process(&self, sheet: u32, mut canvas: Canvas) -> Result<(Canvas, SheetReport)> {
        let started = Instant::now();
        let config = self.config;
        let enabled = |feature: Feature| self.policy.enabled(feature, sheet);
        let mut log = StageLog::default();

        // -- Preparation ------------------------------------------------------

        match config.pre_rotate {
            Some(turn) => {
                canvas = flip_rotate(&canvas, turn)?;
                log.record(Stage::PreRotate, StageOutcome::Transformed);
            }
            None => log.record(Stage::PreRotate, StageOutcome::Skipped),
        }
        log.record(Stage::PreMirror, mirror_stage(&mut canvas, config.pre_mirror));

        if enabled(Feature::Wipe) {
            let changed = apply_wipes(&mut canvas, &config.pre_wipes, WHITE);
            log.record(Stage::PreWipe, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::PreWipe, StageOutcome::Skipped);
        }
        if enabled(Feature::Border) {
            let changed = apply_border(&mut canvas, config.pre_border, WHITE);
            log.record(Stage::PreBorder, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::PreBorder, StageOutcome::Skipped);
        }
        if config.pre_masks.is_empty() {
            log.record(Stage::PreMask, StageOutcome::Skipped);
        } else {
            let changed = apply_masks(&mut canvas, &config.pre_masks, config.mask_color);
            log.record(Stage::PreMask, StageOutcome::Pixels { changed });
        }

        // Seeds and size limits follow the sheet as it stands after turning.
        let points = config.mask_points(canvas.width(), canvas.height());
        let maximum = config.mask_maximum(canvas.width(), canvas.height());
        let explicit: Vec<MaskRegion> = config.masks.iter().copied().map(MaskRegion::valid).collect();

        // -- Filters ----------------------------------------------------------

        if enabled(Feature::BlackFilter) {
            let changed = black_filter(&mut canvas, &config.black_filter, config.black_cutoff())?;
            log.record(Stage::BlackFilter, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::BlackFilter, StageOutcome::Skipped);
        }
        if enabled(Feature::NoiseFilter) {
            let removed = noise_filter(&mut canvas, &config.noise_filter, config.white_cutoff());
            log.record(Stage::NoiseFilter, StageOutcome::Clusters { removed });
        } else {
            log.record(Stage::NoiseFilter, StageOutcome::Skipped);
        }
        if enabled(Feature::BlurFilter) {
            let changed = blur_filter(&mut canvas, &config.blur_filter, config.white_cutoff());
            log.record(Stage::BlurFilter, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::BlurFilter, StageOutcome::Skipped);
        }

        // -- Masks and deskew -------------------------------------------------

        let mut detected = Vec::new();
        if enabled(Feature::MaskScan) {
            detected = self.scan_masks(&canvas, &points, maximum, Stage::MaskScan, &mut log);
        } else {
            log.record(Stage::MaskScan, StageOutcome::Skipped);
        }

        let applied: Vec<_> = explicit.iter().chain(&detected).map(|mask| mask.rect).collect();
        if applied.is_empty() {
            log.record(Stage::MaskApply, StageOutcome::Skipped);
        } else {
            let changed = apply_masks(&mut canvas, &applied, config.mask_color);
            log.record(Stage::MaskApply, StageOutcome::Pixels { changed });
        }

        if enabled(Feature::GrayFilter) {
            let changed = gray_filter(&mut canvas, &config.gray_filter, config.black_cutoff());
            log.record(Stage::GrayFilter, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::GrayFilter, StageOutcome::Skipped);
        }

        if enabled(Feature::Deskew) && enabled(Feature::MaskScan) {
            detected = self.scan_masks(&canvas, &points, maximum, Stage::MaskRescan, &mut log);
        } else {
            log.record(Stage::MaskRescan, StageOutcome::Skipped);
        }
        if enabled(Feature::Deskew) {
            let masks: Vec<MaskRegion> = explicit.iter().chain(&detected).copied().collect();
            let degrees = deskew_masks(&mut canvas, &masks, &config.deskew)?;
            log.record(Stage::Deskew, StageOutcome::Rotations { degrees });
        } else {
            log.record(Stage::Deskew, StageOutcome::Skipped);
        }

        let centering = enabled(Feature::MaskCenter) && config.layout != Layout::None;
        if centering && enabled(Feature::MaskScan) {
            detected = self.scan_masks(&canvas, &points, maximum, Stage::MaskCenterScan, &mut log);
        } else {
            log.record(Stage::MaskCenterScan, StageOutcome::Skipped);
        }
        // Only centre when every seed point produced its mask.
        if centering && !points.is_empty() && detected.len() == points.len() {
            let mut moved = Vec::new();
            for (point, mask) in points.iter().zip(&detected) {
                moved.extend(center_mask(&mut canvas, *point, mask.rect)?);
            }
            log.record(Stage::MaskCenter, StageOutcome::Centered { moved });
        } else {
            log.record(Stage::MaskCenter, StageOutcome::Skipped);
        }

        // -- Wipes and borders ------------------------------------------------

        if enabled(Feature::Wipe) {
            let wipes = config.effective_wipes(canvas.width(), canvas.height());
            let changed = apply_wipes(&mut canvas, &wipes, WHITE);
            log.record(Stage::Wipe, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::Wipe, StageOutcome::Skipped);
        }
        if enabled(Feature::Border) {
            let changed = apply_border(&mut canvas, config.border, WHITE);
            log.record(Stage::Border, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::Border, StageOutcome::Skipped);
        }

        if enabled(Feature::BorderScan) {
            let border = detect_border(&canvas, &config.border_scan, config.black_cutoff());
            let changed = apply_border(&mut canvas, border, WHITE);
            log.record(Stage::BorderScan, StageOutcome::Border { border, changed });
            if enabled(Feature::BorderCenter) {
                let moved = center_border(&mut canvas, border)?.into_iter().collect();
                log.record(Stage::BorderCenter, StageOutcome::Centered { moved });
            } else {
                log.record(Stage::BorderCenter, StageOutcome::Skipped);
            }
        } else {
            log.record(Stage::BorderScan, StageOutcome::Skipped);
            log.record(Stage::BorderCenter, StageOutcome::Skipped);
        }

        if enabled(Feature::Wipe) {
            let changed = apply_wipes(&mut canvas, &config.post_wipes, WHITE);
            log.record(Stage::PostWipe, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::PostWipe, StageOutcome::Skipped);
        }
        if enabled(Feature::Border) {
            let changed = apply_border(&mut canvas, config.post_border, WHITE);
            log.record(Stage::PostBorder, StageOutcome::Pixels { changed });
        } else {
            log.record(Stage::PostBorder, StageOutcome::Skipped);
        }

        // -- Finishing --------------------------------------------------------

        log.record(Stage::PostMirror, mirror_stage(&mut canvas, config.post_mirror));
        match config.post_rotate {
            Some(turn) => {
                canvas = flip_rotate(&canvas, turn)?;
                log.record(Stage::PostRotate, StageOutcome::Transformed);
            }
            None => log.record(Stage::PostRotate, StageOutcome::Skipped),
        }

        let report = SheetReport {
            sheet,
            width: canvas.width(),
            height: canvas.height(),
            stages: log.0,
            elapsed: started.elapsed(),
        };
        info!(
            sheet,
            width = report.width,
            height = report.height,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Sheet processed"
        );
        Ok((canvas, report))
    }

    fn scan_masks(
        &self,
        canvas: &Canvas,
        points: &[Point],
        maximum: AxisPair<u32>,
        stage: Stage,
        log: &mut StageLog,
    ) -> Vec<MaskRegion> {
        let detected = detect_masks(canvas, points, &self.config.mask_scan, maximum);
        let masks = detected.iter().map(|mask| mask.rect).collect();
        log.record(stage, StageOutcome::Masks { masks });
        detected
    }
}

fn mirror_stage(canvas: &mut Canvas, directions: Directions) -> StageOutcome {
    if directions.is_empty() {
        StageOutcome::Skipped
    } else {
        mirror(canvas, directions);
        StageOutcome::Transformed
    }
}
