// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewash-document — Sheet processing for Pagewash.
//
// Provides the pixel canvas and region fill, the artifact filters (black
// area, noise, blur, gray), mask and border detection, deskewing, whole-sheet
// geometry and PBM/PGM codecs, and the per-sheet pipeline with its batch driver.

pub mod canvas;
pub mod deskew;
pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary entry points so callers can use `pagewash_document::SheetProcessor` etc.
pub use crate::image::{load_canvas, save_canvas};
pub use canvas::{Canvas, RegionFiller};
pub use pipeline::{BatchRunner, BatchSummary, SheetProcessor, SheetReport, Stage, StageOutcome};
