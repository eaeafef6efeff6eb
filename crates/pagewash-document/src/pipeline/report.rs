// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-sheet processing reports, serialisable for `--report json`.

use std::time::Duration;

use pagewash_core::{Border, Rect};
use serde::Serialize;

/// The pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    PreRotate,
    PreMirror,
    PreWipe,
    PreBorder,
    PreMask,
    BlackFilter,
    NoiseFilter,
    BlurFilter,
    MaskScan,
    MaskApply,
    GrayFilter,
    MaskRescan,
    Deskew,
    MaskCenterScan,
    MaskCenter,
    Wipe,
    Border,
    BorderScan,
    BorderCenter,
    PostWipe,
    PostBorder,
    PostMirror,
    PostRotate,
}

/// What a stage did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum StageOutcome {
    /// Disabled for this sheet, or nothing configured.
    Skipped,
    Pixels { changed: u64 },
    Clusters { removed: u64 },
    Masks { masks: Vec<Rect> },
    /// Correction applied per deskewed mask, in degrees.
    Rotations { degrees: Vec<f64> },
    Border { border: Border, changed: u64 },
    /// Shifts applied to centred areas.
    Centered { moved: Vec<(i32, i32)> },
    Transformed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

/// Everything that happened to one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub sheet: u32,
    /// Final dimensions, after any post-rotation.
    pub width: u32,
    pub height: u32,
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
}

impl SheetReport {
    /// The outcome recorded for `stage`, if it was reached.
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| &report.outcome)
    }

    /// Whether `stage` ran rather than being skipped.
    pub fn ran(&self, stage: Stage) -> bool {
        self.outcome(stage)
            .is_some_and(|outcome| *outcome != StageOutcome::Skipped)
    }
}
