// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-scan detectors. A scan bar is slid step by step away from a start
// position while its darkness is sampled; the scan ends where the darkness
// drops off (content masks) or first reaches a pixel count (sheet borders).

use pagewash_core::config::{BorderScanConfig, MaskScanConfig};
use pagewash_core::error::Result;
use pagewash_core::{AxisPair, Border, Extent, MaskRegion, Point, Rect};
use tracing::{debug, info, instrument};

use crate::canvas::{Canvas, WHITE};

// ---------------------------------------------------------------------------
// Mask detection
// ---------------------------------------------------------------------------

/// Slide a bar from `start` by `shift` until its darkness falls below
/// `threshold` times the running average, or to zero. Returns the number of
/// positions sampled (at least 1).
///
/// A horizontal shift moves a `size`-wide bar spanning `depth` rows; a
/// vertical shift moves a `size`-tall bar spanning `depth` columns.
pub fn detect_edge(
    canvas: &Canvas,
    start: Point,
    shift: (i32, i32),
    size: u32,
    depth: Extent,
    threshold: f64,
) -> u32 {
    let (shift_x, shift_y) = shift;
    if shift_x == 0 && shift_y == 0 {
        return 1;
    }
    let half = size as i32 / 2;
    let mut bar = if shift_y == 0 {
        let half_depth = depth.resolve(canvas.height()) as i32 / 2;
        Rect::new(
            start.x - half,
            start.y - half_depth,
            start.x + half,
            start.y + half_depth,
        )
    } else {
        let half_depth = depth.resolve(canvas.width()) as i32 / 2;
        Rect::new(
            start.x - half_depth,
            start.y - half,
            start.x + half_depth,
            start.y + half,
        )
    };

    let mut total: i64 = 0;
    let mut count: u32 = 0;
    loop {
        let blackness = (WHITE - canvas.average_brightness(bar)) as i64;
        total += blackness;
        count += 1;
        // Outside the canvas everything reads white, so this always ends.
        if (blackness as f64) < threshold * total as f64 / count as f64 || blackness == 0 {
            return count;
        }
        bar = bar.translate(shift_x, shift_y);
    }
}

/// Find the content area around `point`.
///
/// Enabled axes are scanned in both directions; a disabled axis spans the
/// whole sheet. When the measured width or height falls outside
/// `minimum..=maximum`, that axis is replaced by a `maximum`-sized span
/// centred on the point and the mask is marked invalid.
pub fn detect_mask(
    canvas: &Canvas,
    point: Point,
    config: &MaskScanConfig,
    maximum: AxisPair<u32>,
) -> MaskRegion {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let half_h = config.size.horizontal as i32 / 2;
    let half_v = config.size.vertical as i32 / 2;
    let step_h = config.step.horizontal as i32;
    let step_v = config.step.vertical as i32;

    let (mut left, mut right) = if config.directions.horizontal {
        let scan = |shift: i32| {
            detect_edge(
                canvas,
                point,
                (shift, 0),
                config.size.horizontal,
                config.depth.horizontal,
                config.threshold.horizontal,
            ) as i32
        };
        (
            point.x - step_h * scan(-step_h) - half_h,
            point.x + step_h * scan(step_h) + half_h,
        )
    } else {
        (0, w - 1)
    };
    let (mut top, mut bottom) = if config.directions.vertical {
        let scan = |shift: i32| {
            detect_edge(
                canvas,
                point,
                (0, shift),
                config.size.vertical,
                config.depth.vertical,
                config.threshold.vertical,
            ) as i32
        };
        (
            point.y - step_v * scan(-step_v) - half_v,
            point.y + step_v * scan(step_v) + half_v,
        )
    } else {
        (0, h - 1)
    };

    let mut valid = true;
    let width = right - left;
    if width < config.minimum.horizontal as i32 || width > maximum.horizontal as i32 {
        let half = maximum.horizontal as i32 / 2;
        left = point.x - half;
        right = point.x + half;
        valid = false;
    }
    let height = bottom - top;
    if height < config.minimum.vertical as i32 || height > maximum.vertical as i32 {
        let half = maximum.vertical as i32 / 2;
        top = point.y - half;
        bottom = point.y + half;
        valid = false;
    }

    MaskRegion {
        rect: Rect::new(left, top, right, bottom),
        valid,
    }
}

/// Detect one mask per seed point. No masks are produced when no scan
/// direction is enabled.
#[instrument(skip(canvas, config), fields(points = points.len()))]
pub fn detect_masks(
    canvas: &Canvas,
    points: &[Point],
    config: &MaskScanConfig,
    maximum: AxisPair<u32>,
) -> Vec<MaskRegion> {
    if config.directions.is_empty() {
        return Vec::new();
    }
    let masks: Vec<MaskRegion> = points
        .iter()
        .map(|&point| detect_mask(canvas, point, config, maximum))
        .collect();
    for mask in &masks {
        debug!(rect = %mask.rect, valid = mask.valid, "Mask detected");
    }
    masks
}

/// Overwrite every pixel that lies in none of `masks` with `color`. An empty
/// mask list leaves the canvas untouched. Returns the number of pixels
/// changed.
pub fn apply_masks(canvas: &mut Canvas, masks: &[Rect], color: u8) -> u64 {
    if masks.is_empty() {
        return 0;
    }
    let mut changed = 0;
    for y in 0..canvas.height() as i32 {
        for x in 0..canvas.width() as i32 {
            let covered = masks.iter().any(|mask| mask.contains(x, y));
            if !covered && canvas.set(x, y, color) {
                changed += 1;
            }
        }
    }
    changed
}

/// Move the content of `rect` so it is centred on `center`, leaving white
/// behind. The move is skipped when the target would leave the sheet.
/// Returns the applied shift.
pub fn center_mask(canvas: &mut Canvas, center: Point, rect: Rect) -> Result<Option<(i32, i32)>> {
    let (width, height) = (rect.width(), rect.height());
    let target_x = center.x - width / 2;
    let target_y = center.y - height / 2;
    let fits = target_x >= 0
        && target_y >= 0
        && target_x + width <= canvas.width() as i32
        && target_y + height <= canvas.height() as i32;
    let shift = (target_x - rect.left, target_y - rect.top);
    if !fits || width <= 0 || height <= 0 {
        debug!(rect = %rect, shift_x = shift.0, shift_y = shift.1, "Centering skipped, target outside sheet");
        return Ok(None);
    }

    let content = canvas.sub_canvas(rect)?;
    canvas.fill_rect(rect, WHITE);
    content.copy_rect(content.bounds(), canvas, Point::new(target_x, target_y));
    info!(rect = %rect, shift_x = shift.0, shift_y = shift.1, "Mask centered");
    Ok(Some(shift))
}

// ---------------------------------------------------------------------------
// Border detection
// ---------------------------------------------------------------------------

/// Slide a full-length bar of `size` pixels inward from one sheet edge by
/// `step`. Returns the offset at which the bar first holds `threshold` or
/// more pixels no brighter than `max_black`, or 0 when that does not happen
/// within half the sheet.
pub fn detect_border_edge(
    canvas: &Canvas,
    step: (i32, i32),
    size: u32,
    threshold: u32,
    max_black: u8,
) -> u32 {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let size = size as i32;
    let (step_x, step_y) = step;
    let (mut bar, max) = if step_y == 0 {
        let bar = if step_x > 0 {
            Rect::new(0, 0, size - 1, h - 1)
        } else {
            Rect::new(w - size, 0, w - 1, h - 1)
        };
        (bar, w / 2)
    } else {
        let bar = if step_y > 0 {
            Rect::new(0, 0, w - 1, size - 1)
        } else {
            Rect::new(0, h - size, w - 1, h - 1)
        };
        (bar, h / 2)
    };

    let advance = (step_x + step_y).abs();
    if advance == 0 {
        return 0;
    }
    let mut offset = 0;
    while offset < max {
        if canvas.count_in_range(bar, 0, max_black) >= threshold as u64 {
            return offset as u32;
        }
        bar = bar.translate(step_x, step_y);
        offset += advance;
    }
    0
}

/// Measure the white margins around the content on the enabled axes.
#[instrument(skip(canvas, config))]
pub fn detect_border(canvas: &Canvas, config: &BorderScanConfig, max_black: u8) -> Border {
    let mut border = Border::default();
    if config.directions.horizontal {
        let (step, size, threshold) = (
            config.step.horizontal as i32,
            config.size.horizontal,
            config.threshold.horizontal,
        );
        border.left = detect_border_edge(canvas, (step, 0), size, threshold, max_black);
        border.right = detect_border_edge(canvas, (-step, 0), size, threshold, max_black);
    }
    if config.directions.vertical {
        let (step, size, threshold) = (
            config.step.vertical as i32,
            config.size.vertical,
            config.threshold.vertical,
        );
        border.top = detect_border_edge(canvas, (0, step), size, threshold, max_black);
        border.bottom = detect_border_edge(canvas, (0, -step), size, threshold, max_black);
    }
    info!(
        left = border.left,
        top = border.top,
        right = border.right,
        bottom = border.bottom,
        "Border detected"
    );
    border
}

/// Centre the area inside `border` on the sheet.
pub fn center_border(canvas: &mut Canvas, border: Border) -> Result<Option<(i32, i32)>> {
    let mask = border.to_mask(canvas.width(), canvas.height());
    let center = Point::new(canvas.width() as i32 / 2, canvas.height() as i32 / 2);
    center_mask(canvas, center, mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BLACK;
    use pagewash_core::{ColorDepth, Directions};

    fn blank(width: u32, height: u32) -> Canvas {
        Canvas::new(width, height, ColorDepth::Grayscale).expect("canvas")
    }

    /// On a blank sheet the scan stops at the first position.
    #[test]
    fn detect_edge_stops_on_white() {
        let canvas = blank(100, 100);
        assert_eq!(
            detect_edge(&canvas, Point::new(50, 50), (10, 0), 50, Extent::Full, 0.1),
            1
        );
    }

    /// The scan runs across a dark block and stops at the first white position.
    #[test]
    fn detect_edge_crosses_dark_block() {
        let mut canvas = blank(200, 100);
        canvas.fill_rect(Rect::new(40, 0, 159, 99), BLACK);
        // An 11-wide bar stepping right by 10 from x=100: seven dark samples,
        // then the bar at 165..175 is white.
        let steps = detect_edge(&canvas, Point::new(100, 50), (10, 0), 10, Extent::Full, 0.1);
        assert_eq!(steps, 8);
    }

    /// A blank sheet yields a fallback mask of exactly the maximum size.
    #[test]
    fn detect_mask_fallback_geometry() {
        let canvas = blank(200, 100);
        let config = MaskScanConfig::default();
        let point = Point::new(100, 50);
        let mask = detect_mask(&canvas, point, &config, AxisPair::new(200, 100));

        assert!(!mask.valid);
        assert_eq!(mask.rect.right - mask.rect.left, 200);
        assert_eq!(mask.rect.bottom - mask.rect.top, 100);
        assert_eq!((mask.rect.left + mask.rect.right) / 2, point.x);
        assert_eq!((mask.rect.top + mask.rect.bottom) / 2, point.y);
    }

    /// A text block of plausible size is found and accepted.
    #[test]
    fn detect_mask_finds_content_block() {
        let mut canvas = blank(400, 300);
        canvas.fill_rect(Rect::new(100, 20, 299, 279), BLACK);
        let config = MaskScanConfig::default();
        let mask = detect_mask(&canvas, Point::new(200, 150), &config, AxisPair::new(400, 300));

        // Fourteen samples each way at step 10, plus the half bar width.
        assert!(mask.valid, "mask {:?} should be valid", mask.rect);
        assert_eq!(mask.rect, Rect::new(35, 0, 365, 299));
    }

    /// Disabled scan directions produce no masks at all.
    #[test]
    fn detect_masks_without_directions() {
        let canvas = blank(50, 50);
        let config = MaskScanConfig {
            directions: Directions::default(),
            ..MaskScanConfig::default()
        };
        assert!(detect_masks(&canvas, &[Point::new(25, 25)], &config, AxisPair::both(50)).is_empty());
    }

    /// Pixels outside every mask take the mask colour; an empty list is a no-op.
    #[test]
    fn apply_masks_clears_outside() {
        let mut canvas = Canvas::filled(10, 10, ColorDepth::Grayscale, BLACK).expect("canvas");
        assert_eq!(apply_masks(&mut canvas, &[], WHITE), 0);
        let changed = apply_masks(
            &mut canvas,
            &[Rect::new(0, 0, 4, 4), Rect::new(6, 6, 20, 20)],
            WHITE,
        );
        assert_eq!(changed, 100 - 25 - 16);
        assert_eq!(canvas.get(2, 2), BLACK);
        assert_eq!(canvas.get(5, 5), WHITE);
        assert_eq!(canvas.get(9, 9), BLACK);
    }

    /// Content in a corner moves to the centre; impossible moves are skipped.
    #[test]
    fn center_mask_moves_content() {
        let mut canvas = blank(100, 100);
        canvas.fill_rect(Rect::new(0, 0, 9, 9), BLACK);
        let shift = center_mask(&mut canvas, Point::new(50, 50), Rect::new(0, 0, 9, 9))
            .expect("centering");
        assert_eq!(shift, Some((45, 45)));
        assert_eq!(canvas.get(0, 0), WHITE);
        assert_eq!(canvas.count_in_range(Rect::new(45, 45, 54, 54), 0, 0), 100);

        let skipped = center_mask(&mut canvas, Point::new(2, 2), Rect::new(45, 45, 54, 54))
            .expect("centering");
        assert_eq!(skipped, None);
    }

    /// Border offsets stop at the first bar holding enough dark pixels.
    #[test]
    fn detect_border_offsets() {
        let mut canvas = blank(100, 200);
        canvas.fill_rect(Rect::new(20, 30, 79, 149), BLACK);
        let config = BorderScanConfig {
            directions: Directions::BOTH,
            ..BorderScanConfig::default()
        };
        let border = detect_border(&canvas, &config, 127);
        assert_eq!(
            border,
            Border {
                left: 20,
                top: 30,
                right: 20,
                bottom: 50,
            }
        );
    }

    /// No content within half the sheet means no border.
    #[test]
    fn detect_border_edge_on_blank_sheet() {
        let canvas = blank(60, 60);
        assert_eq!(detect_border_edge(&canvas, (5, 0), 5, 5, 127), 0);
    }
}
