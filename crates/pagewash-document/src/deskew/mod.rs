// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deskew module — rotation estimation from content edges, and the rotation
// transform with optional 2x supersampling ("qpixels").

pub mod estimate;
pub mod transform;

pub use estimate::{consensus_angle, detect_edge_rotation, detect_rotation, edge_rotation_peak};
pub use transform::{deskew_masks, from_qpixels, rotate, to_qpixels};
