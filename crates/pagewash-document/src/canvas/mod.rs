// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canvas module — the bounds-checked pixel buffer every stage works on, and
// the tolerance-aware region fill.

pub mod buffer;
pub mod fill;

pub use buffer::{BLACK, Canvas, WHITE};
pub use fill::RegionFiller;
