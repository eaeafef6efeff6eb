// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — whole-sheet geometry (mirror, quarter turns, wipes, borders)
// and reading/writing sheets as PBM, PGM or any format the `image` crate knows.

pub mod codec;
pub mod geometry;

pub use codec::{decode_pbm, encode_pbm, load_canvas, save_canvas};
pub use geometry::{apply_border, apply_wipes, flip_rotate, mirror};
