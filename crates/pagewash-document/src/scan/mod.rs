// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning module — edge-scan detectors for content masks and sheet borders,
// and the four artifact filters (black area, noise, blur, gray).

pub mod detect;
pub mod filters;

pub use detect::{
    apply_masks, center_border, center_mask, detect_border, detect_border_edge, detect_edge,
    detect_mask, detect_masks,
};
pub use filters::{black_filter, blur_filter, gray_filter, noise_filter};
