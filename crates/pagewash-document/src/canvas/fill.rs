// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region fill with a gap tolerance. A fill spreads through pixels whose
// value lies in a match range, painting straight lines out from each seed and
// bridging up to `intensity - 1` non-matching pixels along a line. Pending
// seeds live on an explicit stack so very large regions cannot exhaust the
// call stack.

use pagewash_core::error::{PagewashError, Result};
use tracing::debug;

use super::buffer::Canvas;

/// Parameters of one fill: the colour painted, the matched value range, and
/// the gap tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionFiller {
    pub color: u8,
    pub min: u8,
    pub max: u8,
    pub intensity: u32,
}

/// Tracks pixels this fill painted when the paint colour itself matches.
struct Visited {
    width: usize,
    painted: Vec<bool>,
}

/// A cleared flag per pixel, reserved up front so exhaustion is an error.
fn flag_buffer(len: usize) -> Result<Vec<bool>> {
    let mut flags = Vec::new();
    flags
        .try_reserve_exact(len)
        .map_err(|_| PagewashError::Allocation { bytes: len })?;
    flags.resize(len, false);
    Ok(flags)
}

impl Visited {
    fn new(canvas: &Canvas) -> Result<Self> {
        Ok(Self {
            width: canvas.width() as usize,
            painted: flag_buffer(canvas.pixels().len())?,
        })
    }

    fn slot(&mut self, canvas: &Canvas, x: i32, y: i32) -> Option<&mut bool> {
        if canvas.in_bounds(x, y) {
            self.painted.get_mut(y as usize * self.width + x as usize)
        } else {
            None
        }
    }
}

impl RegionFiller {
    pub fn new(color: u8, min: u8, max: u8, intensity: u32) -> Self {
        Self {
            color,
            min,
            max,
            intensity,
        }
    }

    fn matches(&self, pixel: u8) -> bool {
        pixel >= self.min && pixel <= self.max
    }

    /// Paint from the pixel after `(x, y)` along `(step_x, step_y)`.
    ///
    /// The first step must hit a matching pixel. After that each matching
    /// pixel resets the tolerance counter to `intensity` and each
    /// non-matching pixel decrements it; the walk stops when the counter runs
    /// out or the canvas edge is reached. Returns the number of pixels
    /// painted.
    pub fn fill_line(&self, canvas: &mut Canvas, x: i32, y: i32, step_x: i32, step_y: i32) -> u32 {
        self.walk_line(canvas, x, y, step_x, step_y, None, &mut 0)
    }

    fn walk_line(
        &self,
        canvas: &mut Canvas,
        mut x: i32,
        mut y: i32,
        step_x: i32,
        step_y: i32,
        mut visited: Option<&mut Visited>,
        changed: &mut u64,
    ) -> u32 {
        let mut distance = 0;
        let mut tolerance: i64 = 1;
        loop {
            x += step_x;
            y += step_y;
            let already_painted = visited
                .as_deref_mut()
                .and_then(|v| v.slot(canvas, x, y).map(|slot| *slot))
                .unwrap_or(false);
            if !already_painted && self.matches(canvas.get(x, y)) {
                tolerance = self.intensity as i64;
            } else {
                tolerance -= 1;
            }
            if tolerance > 0 && canvas.in_bounds(x, y) {
                if canvas.set(x, y, self.color) {
                    *changed += 1;
                }
                if let Some(slot) = visited.as_deref_mut().and_then(|v| v.slot(canvas, x, y)) {
                    *slot = true;
                }
                distance += 1;
            } else {
                return distance;
            }
        }
    }

    /// Fill the region connected to `(x, y)`. Nothing happens when the seed
    /// pixel does not match. Returns the number of pixels changed.
    pub fn flood_fill(&self, canvas: &mut Canvas, x: i32, y: i32) -> Result<u64> {
        // A paint colour inside the match range would re-match forever; the
        // visited map stops that.
        let mut visited = if self.matches(self.color) {
            Some(Visited::new(canvas)?)
        } else {
            None
        };
        let mut pending = vec![(x, y)];
        let mut changed = 0u64;

        while let Some((x, y)) = pending.pop() {
            let seen = visited
                .as_mut()
                .and_then(|v| v.slot(canvas, x, y).map(|slot| *slot))
                .unwrap_or(false);
            if seen || !self.matches(canvas.get(x, y)) {
                continue;
            }
            if canvas.set(x, y, self.color) {
                changed += 1;
            }
            if let Some(slot) = visited.as_mut().and_then(|v| v.slot(canvas, x, y)) {
                *slot = true;
            }

            // The cross through the seed, then seeds on both sides of each arm.
            let arms = [(-1, 0), (0, -1), (1, 0), (0, 1)];
            let mut seeds = Vec::new();
            let mut lengths = [0u32; 4];
            for (arm, &(step_x, step_y)) in arms.iter().enumerate() {
                lengths[arm] = self.walk_line(
                    canvas,
                    x,
                    y,
                    step_x,
                    step_y,
                    visited.as_mut(),
                    &mut changed,
                );
            }
            for (arm, &(step_x, step_y)) in arms.iter().enumerate() {
                let (mut line_x, mut line_y) = (x, y);
                for _ in 0..lengths[arm] {
                    line_x += step_x;
                    line_y += step_y;
                    if step_x != 0 {
                        seeds.push((line_x, line_y + 1));
                        seeds.push((line_x, line_y - 1));
                    } else {
                        seeds.push((line_x + 1, line_y));
                        seeds.push((line_x - 1, line_y));
                    }
                }
            }
            // Reverse so seeds are visited in the order they were found.
            pending.extend(seeds.into_iter().rev());
        }

        debug!(x, y, changed, color = self.color, "Region fill complete");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};
    use pagewash_core::{ColorDepth, Rect};

    fn canvas_with_block(block: Rect) -> Canvas {
        let mut canvas = Canvas::new(20, 20, ColorDepth::Grayscale).expect("canvas");
        canvas.fill_rect(block, BLACK);
        canvas
    }

    /// A line only starts when the first step hits a matching pixel.
    #[test]
    fn fill_line_needs_matching_first_pixel() {
        let mut canvas = canvas_with_block(Rect::new(5, 5, 9, 5));
        let filler = RegionFiller::new(WHITE, 0, 0, 3);
        assert_eq!(filler.fill_line(&mut canvas, 5, 6, 1, 0), 0);
        // From (4,5) rightwards: five black pixels, then two tolerated white ones.
        assert_eq!(filler.fill_line(&mut canvas, 4, 5, 1, 0), 7);
        assert_eq!(canvas.count_in_range(canvas.bounds(), 0, 0), 0);
    }

    /// A solid block is erased entirely from any pixel inside it.
    #[test]
    fn flood_fill_erases_connected_block() {
        let block = Rect::new(3, 4, 12, 15);
        let mut canvas = canvas_with_block(block);
        canvas.set(18, 18, BLACK);

        let filler = RegionFiller::new(WHITE, 0, 0, 1);
        let changed = filler.flood_fill(&mut canvas, 7, 9).expect("fill");
        assert_eq!(changed, 120);
        assert_eq!(canvas.count_in_range(block, 0, 0), 0);
        assert_eq!(canvas.get(18, 18), BLACK, "disconnected pixel survives");
    }

    /// Filling twice gives the same canvas as filling once.
    #[test]
    fn flood_fill_is_idempotent() {
        let mut canvas = canvas_with_block(Rect::new(2, 2, 8, 8));
        canvas.fill_rect(Rect::new(8, 8, 14, 10), BLACK);
        let filler = RegionFiller::new(WHITE, 0, 0, 1);

        filler.flood_fill(&mut canvas, 4, 4).expect("first fill");
        let once = canvas.clone();
        assert_eq!(filler.flood_fill(&mut canvas, 4, 4).expect("second fill"), 0);
        assert_eq!(canvas, once);
    }

    /// A paint colour inside the match range still terminates.
    #[test]
    fn flood_fill_with_matching_color_terminates() {
        let mut canvas = canvas_with_block(Rect::new(0, 0, 19, 19));
        let filler = RegionFiller::new(10, 0, 50, 2);
        filler.flood_fill(&mut canvas, 10, 10).expect("fill");
        assert_eq!(canvas.count_in_range(canvas.bounds(), 10, 10), 400);
    }

    /// Seeds outside the canvas or on non-matching pixels do nothing.
    #[test]
    fn flood_fill_ignores_non_matching_seed() {
        let mut canvas = canvas_with_block(Rect::new(2, 2, 4, 4));
        let before = canvas.clone();
        let filler = RegionFiller::new(WHITE, 0, 0, 5);
        assert_eq!(filler.flood_fill(&mut canvas, -3, 7).expect("outside"), 0);
        assert_eq!(filler.flood_fill(&mut canvas, 10, 10).expect("white seed"), 0);
        assert_eq!(canvas, before);
    }

    /// A page that is black from edge to edge is cleared without recursion.
    #[test]
    fn flood_fill_clears_black_page() {
        let mut canvas = Canvas::filled(1000, 1000, ColorDepth::Grayscale, BLACK).expect("canvas");
        let filler = RegionFiller::new(WHITE, 0, 0, 1);
        let changed = filler.flood_fill(&mut canvas, 500, 500).expect("fill");
        assert_eq!(changed, 1_000_000);
        assert_eq!(canvas.count_in_range(canvas.bounds(), 0, 0), 0);
    }

    /// A visited map that cannot be reserved is an allocation error.
    #[test]
    fn oversized_flag_buffer_is_an_error() {
        assert!(matches!(
            flag_buffer(usize::MAX),
            Err(PagewashError::Allocation { bytes: usize::MAX })
        ));
        assert_eq!(flag_buffer(16).expect("small buffer").len(), 16);
    }
}
