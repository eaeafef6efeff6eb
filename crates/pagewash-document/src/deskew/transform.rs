// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotation transform. Every target pixel looks up its source by rotating its
// polar coordinates around the canvas centre back by the given angle, so no
// holes appear. Supersampling each pixel into a 2x2 block before rotating
// and averaging afterwards softens the nearest-neighbour steps.

use pagewash_core::config::DeskewConfig;
use pagewash_core::error::Result;
use pagewash_core::{MaskRegion, Point, Rect};
use tracing::{debug, info, instrument};

use crate::canvas::Canvas;
use crate::deskew::estimate::detect_rotation;

// -- Rotation -----------------------------------------------------------------

/// A copy of `canvas` rotated by `radians` around its centre. Pixels that
/// come from outside the source are white.
pub fn rotate(canvas: &Canvas, radians: f64) -> Result<Canvas> {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    let mut target = Canvas::new(canvas.width(), canvas.height(), canvas.depth())?;
    let mid_x = width / 2;
    let mid_y = height / 2;

    for y in 0..height {
        for x in 0..width {
            let dx = (x - mid_x) as f64;
            let dy = (y - mid_y) as f64;
            let hyp = dx.hypot(dy);
            // -0.0 keeps atan2 in the correct half-plane on the centre row.
            let up = if dy == 0.0 { -0.0 } else { -dy };
            let alpha = dx.atan2(up) - radians;
            let (sin, cos) = alpha.sin_cos();
            let source_x = mid_x + (hyp * sin).round() as i32;
            let source_y = mid_y - (hyp * cos).round() as i32;
            target.set(x, y, canvas.get(source_x, source_y));
        }
    }
    Ok(target)
}

// -- Quarter pixels -----------------------------------------------------------

/// Double both dimensions, copying each pixel into a 2x2 block.
pub fn to_qpixels(canvas: &Canvas) -> Result<Canvas> {
    let mut expanded = Canvas::new(canvas.width() * 2, canvas.height() * 2, canvas.depth())?;
    for y in 0..canvas.height() as i32 {
        for x in 0..canvas.width() as i32 {
            let pixel = canvas.get(x, y);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                expanded.set(x * 2 + dx, y * 2 + dy, pixel);
            }
        }
    }
    Ok(expanded)
}

/// Halve both dimensions, averaging each 2x2 block.
pub fn from_qpixels(canvas: &Canvas) -> Result<Canvas> {
    let mut shrunk = Canvas::new(
        (canvas.width() / 2).max(1),
        (canvas.height() / 2).max(1),
        canvas.depth(),
    )?;
    for y in 0..shrunk.height() as i32 {
        for x in 0..shrunk.width() as i32 {
            let sum: u32 = [(0, 0), (1, 0), (0, 1), (1, 1)]
                .iter()
                .map(|(dx, dy)| canvas.get(x * 2 + dx, y * 2 + dy) as u32)
                .sum();
            shrunk.set(x, y, (sum / 4) as u8);
        }
    }
    Ok(shrunk)
}

// -- Deskewing masks ----------------------------------------------------------

/// Rotate the area `rect` of `canvas` in place.
fn rotate_area(canvas: &mut Canvas, rect: Rect, radians: f64) -> Result<()> {
    let area = canvas.sub_canvas(rect)?;
    let rotated = rotate(&area, radians)?;
    rotated.copy_rect(rotated.bounds(), canvas, Point::new(rect.left, rect.top));
    Ok(())
}

/// Straighten the content of every valid mask independently.
///
/// Rotations are measured on the unmodified canvas; the transforms then run
/// on a supersampled copy when `config.qpixels` is set. Returns the
/// correction applied to each valid mask in degrees (0 for none).
#[instrument(skip(canvas, masks, config), fields(masks = masks.len(), qpixels = config.qpixels))]
pub fn deskew_masks(canvas: &mut Canvas, masks: &[MaskRegion], config: &DeskewConfig) -> Result<Vec<f64>> {
    let corrections: Vec<(Rect, f64)> = masks
        .iter()
        .filter(|mask| mask.valid)
        .map(|mask| (mask.rect, -detect_rotation(canvas, mask.rect, config)))
        .collect();
    let degrees: Vec<f64> = corrections.iter().map(|(_, rotation)| *rotation).collect();

    if corrections.iter().all(|(_, rotation)| *rotation == 0.0) {
        debug!("No mask needs rotating");
        return Ok(degrees);
    }

    let scale = if config.qpixels { 2 } else { 1 };
    let mut work = if config.qpixels {
        Some(to_qpixels(canvas)?)
    } else {
        None
    };

    for (rect, rotation) in &corrections {
        if *rotation == 0.0 {
            continue;
        }
        // The rotated area excludes the mask's last column and row.
        let (width, height) = ((rect.right - rect.left) * scale, (rect.bottom - rect.top) * scale);
        if width <= 0 || height <= 0 {
            continue;
        }
        let (left, top) = (rect.left * scale, rect.top * scale);
        let area = Rect::new(left, top, left + width - 1, top + height - 1);
        info!(mask = %rect, degrees = rotation, "Rotating mask");
        rotate_area(work.as_mut().unwrap_or(&mut *canvas), area, rotation.to_radians())?;
    }

    if let Some(expanded) = work {
        *canvas = from_qpixels(&expanded)?;
    }
    Ok(degrees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};
    use pagewash_core::{ColorDepth, Directions};

    fn gradient(width: u32, height: u32) -> Canvas {
        let pixels = (0..width * height).map(|i| (i * 37 % 256) as u8).collect();
        Canvas::from_pixels(width, height, ColorDepth::Grayscale, pixels).expect("canvas")
    }

    /// A zero angle reproduces the source exactly.
    #[test]
    fn zero_rotation_is_identity() {
        let canvas = gradient(9, 7);
        assert_eq!(rotate(&canvas, 0.0).expect("rotate"), canvas);
    }

    /// A half turn maps a pixel right of the centre to the left of it.
    #[test]
    fn half_turn_mirrors_through_centre() {
        let mut canvas = Canvas::new(5, 5, ColorDepth::Grayscale).expect("canvas");
        canvas.set(3, 2, BLACK);
        let rotated = rotate(&canvas, std::f64::consts::PI).expect("rotate");
        assert_eq!(rotated.get(1, 2), BLACK);
        assert_eq!(rotated.get(3, 2), WHITE);
    }

    /// Expanding and shrinking without rotating is lossless.
    #[test]
    fn qpixel_round_trip() {
        let canvas = gradient(6, 4);
        let expanded = to_qpixels(&canvas).expect("expand");
        assert_eq!((expanded.width(), expanded.height()), (12, 8));
        assert_eq!(expanded.get(11, 7), canvas.get(5, 3));
        assert_eq!(from_qpixels(&expanded).expect("shrink"), canvas);
    }

    /// Shrinking averages the four source pixels.
    #[test]
    fn shrink_averages_blocks() {
        let pixels = vec![0, 255, 255, 255];
        let canvas = Canvas::from_pixels(2, 2, ColorDepth::Grayscale, pixels).expect("canvas");
        assert_eq!(from_qpixels(&canvas).expect("shrink").get(0, 0), 191);
    }

    /// Straight content and invalid masks leave the canvas untouched.
    #[test]
    fn straight_content_is_not_rotated() {
        let mut canvas = Canvas::new(200, 200, ColorDepth::Grayscale).expect("canvas");
        canvas.fill_rect(Rect::new(50, 50, 149, 149), BLACK);
        let before = canvas.clone();
        let masks = [
            MaskRegion::valid(Rect::new(40, 40, 159, 159)),
            MaskRegion {
                rect: Rect::new(0, 0, 10, 10),
                valid: false,
            },
        ];
        let degrees = deskew_masks(&mut canvas, &masks, &DeskewConfig::default()).expect("deskew");
        assert_eq!(degrees, vec![0.0]);
        assert_eq!(canvas, before);
    }

    /// A tilted block is rotated back against its tilt.
    #[test]
    fn tilted_content_is_corrected() {
        let mut straight = Canvas::new(400, 400, ColorDepth::Grayscale).expect("canvas");
        straight.fill_rect(Rect::new(100, 100, 299, 299), BLACK);
        let mut canvas = rotate(&straight, 1.0f64.to_radians()).expect("rotate");
        let tilted = canvas.clone();
        let config = DeskewConfig {
            directions: Directions::BOTH,
            ..DeskewConfig::default()
        };
        let masks = [MaskRegion::valid(Rect::new(80, 80, 319, 319))];
        let degrees = deskew_masks(&mut canvas, &masks, &config).expect("deskew");
        assert_eq!(degrees.len(), 1);
        assert!(degrees[0] < -0.8 && degrees[0] > -1.5, "corrected by {}", degrees[0]);
        assert_ne!(canvas, tilted);
        assert_eq!((canvas.width(), canvas.height()), (400, 400));
    }
}
