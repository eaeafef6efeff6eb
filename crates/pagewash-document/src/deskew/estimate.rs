// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotation estimation. A slanted scan line is moved from outside one edge of
// a content area towards its centre; the sharpest jump in accumulated
// darkness marks the angle at which the line lies parallel to the edge.
// Candidate angles alternate around zero, and the per-edge estimates must
// agree before a rotation is accepted.

use pagewash_core::Rect;
use pagewash_core::config::{DeskewConfig, MAX_ROTATION_SCAN_SIZE};
use tracing::{debug, instrument};

use crate::canvas::{Canvas, WHITE};

/// Sharpest rise in line darkness for a scan line of slope `slope` moved by
/// `shift` into `area`.
///
/// `shift = (1, 0)` starts outside the left edge, `(-1, 0)` outside the
/// right edge, `(0, 1)` above the top edge and `(0, -1)` below the bottom
/// edge. Returns 0 when the scan reaches the middle of the area without
/// having gathered `depth` worth of darkness.
pub fn edge_rotation_peak(
    canvas: &Canvas,
    slope: f64,
    config: &DeskewConfig,
    shift: (i32, i32),
    area: Rect,
) -> i64 {
    let (width, height) = (area.width(), area.height());
    if width <= 0 || height <= 0 || !slope.is_finite() {
        return 0;
    }
    let (shift_x, shift_y) = shift;
    let line_length = |across: i32| {
        (config.size.resolve(across as u32) as i32)
            .min(MAX_ROTATION_SCAN_SIZE as i32)
            .min(across)
    };

    let (size, max_depth, mut x, mut y, step_x, step_y) = if shift_y == 0 {
        let size = line_length(height);
        let half = size / 2;
        let outer = (slope.abs() * half as f64) as i32;
        let side = if shift_x > 0 {
            area.left.saturating_sub(outer)
        } else {
            area.right.saturating_add(outer)
        };
        (
            size,
            width / 2,
            side as f64 + half as f64 * slope,
            (area.top + height / 2 - half) as f64,
            -slope,
            1.0,
        )
    } else {
        let size = line_length(width);
        let half = size / 2;
        let outer = (slope.abs() * half as f64) as i32;
        let side = if shift_y > 0 {
            area.top.saturating_sub(outer)
        } else {
            area.bottom.saturating_add(outer)
        };
        (
            size,
            height / 2,
            (area.left + width / 2 - half) as f64,
            side as f64 - half as f64 * slope,
            1.0,
            slope,
        )
    };

    // Steep slopes put points far off the canvas; casts and shifts saturate
    // there and those points never fall inside `area`.
    let mut line = Vec::with_capacity(size.max(0) as usize);
    for _ in 0..size {
        line.push((x as i32, y as i32));
        x += step_x;
        y += step_y;
    }

    let max_blackness = (WHITE as f64 * size as f64 * config.depth) as i64;
    let mut last = 0i64;
    let mut max_diff = 0i64;
    let mut accumulated = 0i64;
    let mut depth = 0;
    while accumulated < max_blackness && depth < max_depth {
        let mut blackness = 0i64;
        for point in line.iter_mut() {
            let (px, py) = *point;
            point.0 = point.0.saturating_add(shift_x);
            point.1 = point.1.saturating_add(shift_y);
            if area.contains(px, py) {
                blackness += (WHITE - canvas.get(px, py)) as i64;
            }
        }
        let diff = blackness - last;
        last = blackness;
        if diff >= max_diff {
            max_diff = diff;
        }
        accumulated += blackness;
        depth += 1;
    }

    if depth < max_depth { max_diff } else { 0 }
}

/// Best angle, in degrees, for one edge of `area`. Candidates run
/// 0, -step, +step, -2*step, ... up to `range`; a later candidate wins only
/// with a strictly higher peak.
pub fn detect_edge_rotation(canvas: &Canvas, config: &DeskewConfig, shift: (i32, i32), area: Rect) -> f64 {
    let range = config.range.to_radians();
    let step = config.step.to_radians();
    if step.is_nan() || step <= 0.0 {
        return 0.0;
    }

    let mut rotation = 0.0f64;
    let mut best = 0.0f64;
    let mut max_peak = 0i64;
    while rotation <= range {
        let peak = edge_rotation_peak(canvas, rotation.tan(), config, shift, area);
        if peak > max_peak {
            best = rotation;
            max_peak = peak;
        }
        rotation = if rotation >= 0.0 {
            -(rotation + step)
        } else {
            -rotation
        };
    }
    best.to_degrees()
}

/// Mean of `estimates` when their population standard deviation is at most
/// `max_deviation`, otherwise 0.
pub fn consensus_angle(estimates: &[f64], max_deviation: f64) -> f64 {
    if estimates.is_empty() {
        return 0.0;
    }
    let count = estimates.len() as f64;
    let average = estimates.iter().sum::<f64>() / count;
    let variance = estimates
        .iter()
        .map(|estimate| (estimate - average).powi(2))
        .sum::<f64>()
        / count;
    let deviation = variance.sqrt();
    if deviation <= max_deviation {
        average
    } else {
        debug!(average, deviation, max_deviation, "Edge estimates disagree, not rotating");
        0.0
    }
}

/// Rotation of the content in `area`, in degrees. Horizontal scanning
/// measures the left and right edges, vertical scanning the top and bottom
/// edges.
#[instrument(skip(canvas, config), fields(area = %area))]
pub fn detect_rotation(canvas: &Canvas, area: Rect, config: &DeskewConfig) -> f64 {
    let mut estimates = Vec::with_capacity(4);
    if config.directions.horizontal {
        estimates.push(detect_edge_rotation(canvas, config, (1, 0), area));
        estimates.push(detect_edge_rotation(canvas, config, (-1, 0), area));
    }
    if config.directions.vertical {
        estimates.push(detect_edge_rotation(canvas, config, (0, 1), area));
        estimates.push(detect_edge_rotation(canvas, config, (0, -1), area));
    }
    debug!(?estimates, "Edge rotations measured");
    consensus_angle(&estimates, config.deviation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BLACK;
    use crate::deskew::transform::rotate;
    use pagewash_core::{ColorDepth, Directions, Extent};

    fn block_canvas(size: u32, block: Rect) -> Canvas {
        let mut canvas = Canvas::new(size, size, ColorDepth::Grayscale).expect("canvas");
        canvas.fill_rect(block, BLACK);
        canvas
    }

    /// Estimates that spread too far are rejected whatever their mean.
    #[test]
    fn consensus_rejects_deviation() {
        assert_eq!(consensus_angle(&[1.0, -1.0], 0.5), 0.0);
        assert_eq!(consensus_angle(&[1.5, 1.5], 0.5), 1.5);
        assert!((consensus_angle(&[1.0, 1.2], 0.5) - 1.1).abs() < 1e-9);
        assert_eq!(consensus_angle(&[], 1.0), 0.0);
    }

    /// A straight block edge produces its sharpest step at angle zero.
    #[test]
    fn straight_block_has_no_rotation() {
        let canvas = block_canvas(200, Rect::new(50, 50, 149, 149));
        let config = DeskewConfig {
            directions: Directions::BOTH,
            ..DeskewConfig::default()
        };
        assert_eq!(detect_rotation(&canvas, Rect::new(40, 40, 159, 159), &config), 0.0);
    }

    /// The peak of a straight edge is one full dark line.
    #[test]
    fn peak_of_straight_edge() {
        let canvas = block_canvas(200, Rect::new(50, 50, 149, 149));
        let peak = edge_rotation_peak(
            &canvas,
            0.0,
            &DeskewConfig::default(),
            (1, 0),
            Rect::new(40, 40, 159, 159),
        );
        assert_eq!(peak, 100 * WHITE as i64);
    }

    /// All four edges of a rotated block agree on a positive angle.
    #[test]
    fn rotated_block_is_detected() {
        let straight = block_canvas(400, Rect::new(100, 100, 299, 299));
        let tilted = rotate(&straight, 1.0f64.to_radians()).expect("rotate");
        let config = DeskewConfig {
            directions: Directions::BOTH,
            ..DeskewConfig::default()
        };
        let angle = detect_rotation(&tilted, Rect::new(80, 80, 319, 319), &config);
        assert!(angle > 0.8 && angle < 1.5, "detected {angle}");
    }

    /// The scan line never grows past the length cap, however tall the area.
    #[test]
    fn scan_line_is_capped() {
        let mut canvas = Canvas::new(20, 12_000, ColorDepth::Grayscale).expect("canvas");
        canvas.fill_rect(Rect::new(2, 0, 19, 11_999), BLACK);
        let config = DeskewConfig {
            size: Extent::Pixels(20_000),
            ..DeskewConfig::default()
        };
        let peak = edge_rotation_peak(&canvas, 0.0, &config, (1, 0), canvas.bounds());
        assert_eq!(peak, MAX_ROTATION_SCAN_SIZE as i64 * WHITE as i64);
    }

    /// Angles up to a right angle stay finite and never overflow the scan.
    #[test]
    fn steep_candidates_are_harmless() {
        let canvas = block_canvas(200, Rect::new(50, 50, 149, 149));
        let config = DeskewConfig {
            directions: Directions::BOTH,
            range: 90.0,
            step: 0.5,
            ..DeskewConfig::default()
        };
        let area = Rect::new(40, 40, 159, 159);
        for slope in [89.99f64.to_radians().tan(), 90f64.to_radians().tan(), f64::INFINITY] {
            for shift in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let peak = edge_rotation_peak(&canvas, slope, &config, shift, area);
                assert!(peak >= 0, "slope {slope} shift {shift:?}");
                let peak = edge_rotation_peak(&canvas, -slope, &config, shift, area);
                assert!(peak >= 0, "slope {} shift {shift:?}", -slope);
            }
        }
        let angle = detect_rotation(&canvas, area, &config);
        assert!(angle.is_finite() && angle.abs() <= 90.0, "detected {angle}");
    }

    /// An empty area cannot be measured.
    #[test]
    fn degenerate_area_has_no_peak() {
        let canvas = block_canvas(50, Rect::new(10, 10, 20, 20));
        let peak = edge_rotation_peak(
            &canvas,
            0.0,
            &DeskewConfig::default(),
            (1, 0),
            Rect::new(30, 30, 10, 10),
        );
        assert_eq!(peak, 0);
    }
}
