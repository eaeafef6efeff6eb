// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Whole-sheet geometry: mirroring, 90-degree turns, wipes and borders.

use pagewash_core::error::Result;
use pagewash_core::{Border, Directions, QuarterTurn, Rect};
use tracing::debug;

use crate::canvas::Canvas;
use crate::scan::apply_masks;

/// Mirror `canvas` in place along the requested axes. Both axes together
/// amount to a half turn.
pub fn mirror(canvas: &mut Canvas, directions: Directions) {
    if directions.is_empty() {
        return;
    }
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    for y in 0..height {
        for x in 0..width {
            let xx = if directions.horizontal { width - x - 1 } else { x };
            let yy = if directions.vertical { height - y - 1 } else { y };
            // Each pair is swapped once, from its earlier pixel.
            if (yy, xx) > (y, x) {
                let (here, there) = (canvas.get(x, y), canvas.get(xx, yy));
                canvas.set(x, y, there);
                canvas.set(xx, yy, here);
            }
        }
    }
}

/// A copy of `canvas` turned by a quarter; width and height swap.
pub fn flip_rotate(canvas: &Canvas, turn: QuarterTurn) -> Result<Canvas> {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    let direction = turn.direction();
    let mut turned = Canvas::new(canvas.height(), canvas.width(), canvas.depth())?;
    for y in 0..height {
        let xx = if direction > 0 { height - 1 } else { 0 } - y * direction;
        for x in 0..width {
            let yy = if direction < 0 { width - 1 } else { 0 } + x * direction;
            turned.set(xx, yy, canvas.get(x, y));
        }
    }
    Ok(turned)
}

/// Paint every rectangle in `wipes` with `color`. Returns the changed pixels.
pub fn apply_wipes(canvas: &mut Canvas, wipes: &[Rect], color: u8) -> u64 {
    wipes
        .iter()
        .map(|wipe| {
            let changed = canvas.fill_rect(*wipe, color);
            debug!(wipe = %wipe, changed, "Wipe applied");
            changed
        })
        .sum()
}

/// Paint everything outside `border` with `color`. A zero border is a no-op.
pub fn apply_border(canvas: &mut Canvas, border: Border, color: u8) -> u64 {
    if border.is_zero() {
        return 0;
    }
    let mask = border.to_mask(canvas.width(), canvas.height());
    debug!(?border, mask = %mask, "Applying border");
    apply_masks(canvas, &[mask], color)
}
