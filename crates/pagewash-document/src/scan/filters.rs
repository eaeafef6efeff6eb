// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact filters — black-area removal, noise removal, blur (sparse window)
// removal, and gray-shade removal. Each filter works in place and reports how
// much it changed.

use pagewash_core::Rect;
use pagewash_core::config::{BlackFilterConfig, BlurFilterConfig, GrayFilterConfig, NoiseFilterConfig};
use pagewash_core::error::Result;
use tracing::{debug, info, instrument};

use crate::canvas::{Canvas, RegionFiller, WHITE};

// -- Black area filter --------------------------------------------------------

/// Remove solid dark areas. Bars of `size` x `depth` pixels are slid across
/// the sheet in stripes; wherever at least `threshold` of a bar is no brighter
/// than `black_cutoff`, the dark region under it is flood-filled white.
/// Returns the number of pixels changed.
#[instrument(skip(canvas, config), fields(width = canvas.width(), height = canvas.height()))]
pub fn black_filter(canvas: &mut Canvas, config: &BlackFilterConfig, black_cutoff: u8) -> Result<u64> {
    let mut changed = 0;
    if config.directions.horizontal {
        changed += black_filter_scan(canvas, config, black_cutoff, true)?;
    }
    if config.directions.vertical {
        changed += black_filter_scan(canvas, config, black_cutoff, false)?;
    }
    info!(changed, "Black area filter applied");
    Ok(changed)
}

fn black_filter_scan(
    canvas: &mut Canvas,
    config: &BlackFilterConfig,
    black_cutoff: u8,
    horizontal: bool,
) -> Result<u64> {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let (size, depth, step) = if horizontal {
        (
            config.size.horizontal.max(1) as i32,
            config.depth.horizontal.max(1) as i32,
            config.step.horizontal.max(1) as i32,
        )
    } else {
        (
            config.size.vertical.max(1) as i32,
            config.depth.vertical.max(1) as i32,
            config.step.vertical.max(1) as i32,
        )
    };
    let threshold = (size as f64 * depth as f64 * config.threshold) as u64;
    let filler = RegionFiller::new(WHITE, 0, black_cutoff, config.intensity);

    // Stripes run along the scan direction and are stacked across it.
    let (mut stripe, stripe_shift, bar_step) = if horizontal {
        (Rect::new(0, 0, size - 1, depth - 1), (0, depth), (step, 0))
    } else {
        (Rect::new(0, 0, depth - 1, size - 1), (depth, 0), (0, step))
    };

    let mut changed = 0;
    while stripe.left < w && stripe.top < h {
        // Pull the last stripe back inside the sheet.
        let mut bar = stripe.translate(
            -(stripe.right - w + 1).max(0),
            -(stripe.bottom - h + 1).max(0),
        );
        while bar.left < w && bar.top < h {
            if canvas.count_in_range(bar, 0, black_cutoff) >= threshold {
                debug!(bar = %bar, "Black area found");
                for y in bar.top..=bar.bottom {
                    for x in bar.left..=bar.right {
                        changed += filler.flood_fill(canvas, x, y)?;
                    }
                }
            }
            bar = bar.translate(bar_step.0, bar_step.1);
        }
        stripe = stripe.translate(stripe_shift.0, stripe_shift.1);
    }
    Ok(changed)
}

// -- Noise filter -------------------------------------------------------------

/// Count (and optionally whiten) the dark pixels on the square ring at
/// Chebyshev distance `level` around `(x, y)`.
fn ring_pixels(canvas: &mut Canvas, x: i32, y: i32, level: i32, white_cutoff: u8, clear: bool) -> u32 {
    let mut count = 0;
    for yy in y - level..=y + level {
        for xx in x - level..=x + level {
            if (xx - x).abs() == level || (yy - y).abs() == level {
                if canvas.get(xx, yy) < white_cutoff {
                    if clear {
                        canvas.set(xx, yy, WHITE);
                    }
                    count += 1;
                }
            }
        }
    }
    count
}

/// Size of the dark cluster around `(x, y)` as seen through expanding rings,
/// counting at most `intensity` rings and stopping at the first empty one.
fn cluster_size(canvas: &mut Canvas, x: i32, y: i32, intensity: u32, white_cutoff: u8) -> u64 {
    let mut count = 1;
    for level in 1..=intensity as i32 {
        let ring = ring_pixels(canvas, x, y, level, white_cutoff, false);
        count += ring as u64;
        if ring == 0 {
            break;
        }
    }
    count
}

/// Remove isolated dark clusters of at most `intensity` pixels. A pixel is
/// dark when it is below `white_cutoff`. Returns the number of clusters
/// removed.
#[instrument(skip(canvas, config), fields(intensity = config.intensity))]
pub fn noise_filter(canvas: &mut Canvas, config: &NoiseFilterConfig, white_cutoff: u8) -> u64 {
    let mut clusters = 0;
    for y in 0..canvas.height() as i32 {
        for x in 0..canvas.width() as i32 {
            if canvas.get(x, y) >= white_cutoff {
                continue;
            }
            if cluster_size(canvas, x, y, config.intensity, white_cutoff) <= config.intensity as u64 {
                canvas.set(x, y, WHITE);
                let mut level = 1;
                while ring_pixels(canvas, x, y, level, white_cutoff, true) != 0 {
                    level += 1;
                }
                clusters += 1;
            }
        }
    }
    info!(clusters, "Noise filter applied");
    clusters
}

// -- Blur filter --------------------------------------------------------------

/// Clear windows that hold almost no dark pixels.
///
/// For each window position the dark-pixel count is taken over the window
/// and its four diagonal neighbours one step away; when even the largest of
/// those, as a ratio of the window area, is at most `intensity`, the dark
/// pixels of the window are whitened. Returns the number of pixels cleared.
#[instrument(skip(canvas, config))]
pub fn blur_filter(canvas: &mut Canvas, config: &BlurFilterConfig, white_cutoff: u8) -> u64 {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let (size_x, size_y) = (config.size.horizontal as i32, config.size.vertical as i32);
    let (step_x, step_y) = (
        config.step.horizontal.max(1) as i32,
        config.step.vertical.max(1) as i32,
    );
    let total = (size_x as f64) * (size_y as f64);
    let mut window = Rect::new(0, 0, size_x - 1, size_y - 1);
    let mut cleared = 0;

    loop {
        let neighbours = [
            (0, 0),
            (-step_x, -step_y),
            (step_x, -step_y),
            (-step_x, step_y),
            (step_x, step_y),
        ];
        let densest = neighbours
            .iter()
            .map(|&(dx, dy)| canvas.count_in_range(window.translate(dx, dy), 0, white_cutoff))
            .max()
            .unwrap_or(0);
        if densest as f64 / total <= config.intensity {
            cleared += canvas.clear_in_range(window, 0, white_cutoff);
        }

        if window.right < w {
            window = window.translate(step_x, 0);
        } else if window.bottom >= h {
            break;
        } else {
            window = Rect::new(0, window.top + step_y, size_x - 1, window.bottom + step_y);
        }
    }
    info!(cleared, "Blur filter applied");
    cleared
}

// -- Gray filter --------------------------------------------------------------

/// Clear windows that contain no black pixel and whose mean darkness stays
/// below `threshold` of full black. Returns the number of pixels changed.
#[instrument(skip(canvas, config))]
pub fn gray_filter(canvas: &mut Canvas, config: &GrayFilterConfig, black_cutoff: u8) -> u64 {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let (size_x, size_y) = (config.size.horizontal as i32, config.size.vertical as i32);
    let (step_x, step_y) = (
        config.step.horizontal.max(1) as i32,
        config.step.vertical.max(1) as i32,
    );
    let threshold = (WHITE as f64 * config.threshold) as i32;
    let mut window = Rect::new(0, 0, size_x - 1, size_y - 1);
    let mut changed = 0;

    loop {
        if canvas.count_in_range(window, 0, black_cutoff) == 0 {
            let darkness = (WHITE - canvas.average_brightness(window)) as i32;
            if darkness < threshold {
                changed += canvas.fill_rect(window, WHITE);
            }
        }

        if window.left < w {
            window = window.translate(step_x, 0);
        } else if window.bottom >= h {
            break;
        } else {
            window = Rect::new(0, window.top + step_y, size_x - 1, window.bottom + step_y);
        }
    }
    info!(changed, "Gray filter applied");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BLACK;
    use pagewash_core::{AxisPair, ColorDepth, Directions};

    fn blank(width: u32, height: u32) -> Canvas {
        Canvas::new(width, height, ColorDepth::Grayscale).expect("canvas")
    }

    /// A 20x20 black square is found by the bar scan and erased.
    #[test]
    fn black_filter_removes_solid_square() {
        let mut canvas = blank(100, 100);
        canvas.fill_rect(Rect::new(40, 40, 59, 59), BLACK);
        let config = BlackFilterConfig {
            directions: Directions::BOTH,
            size: AxisPair::both(20),
            depth: AxisPair::both(20),
            step: AxisPair::both(5),
            threshold: 0.95,
            intensity: 20,
        };

        let changed = black_filter(&mut canvas, &config, 127).expect("black filter");
        assert_eq!(changed, 400);
        assert_eq!(canvas.count_in_range(canvas.bounds(), 0, 254), 0);
    }

    /// A sheet that is black everywhere is cleared in one fill.
    #[test]
    fn black_filter_clears_black_page() {
        let mut canvas = Canvas::filled(300, 300, ColorDepth::Grayscale, BLACK).expect("canvas");
        let config = BlackFilterConfig {
            directions: Directions::BOTH,
            size: AxisPair::both(20),
            depth: AxisPair::both(20),
            step: AxisPair::both(5),
            threshold: 0.95,
            intensity: 20,
        };

        let changed = black_filter(&mut canvas, &config, 127).expect("black filter");
        assert_eq!(changed, 300 * 300);
        assert_eq!(canvas.count_in_range(canvas.bounds(), 0, 254), 0);
    }

    /// Thin strokes never fill a bar and survive the black filter.
    #[test]
    fn black_filter_keeps_thin_lines() {
        let mut canvas = blank(100, 100);
        canvas.fill_rect(Rect::new(10, 50, 89, 51), BLACK);
        let changed = black_filter(&mut canvas, &BlackFilterConfig::default(), 127).expect("black filter");
        assert_eq!(changed, 0);
        assert_eq!(canvas.count_in_range(canvas.bounds(), 0, 0), 160);
    }

    /// A lone dark pixel is noise at intensity 4 but kept at intensity 0.
    #[test]
    fn noise_filter_single_pixel() {
        let mut canvas = blank(30, 30);
        canvas.set(15, 15, BLACK);

        let mut untouched = canvas.clone();
        assert_eq!(
            noise_filter(&mut untouched, &NoiseFilterConfig { intensity: 0 }, 229),
            0
        );
        assert_eq!(untouched.get(15, 15), BLACK);

        assert_eq!(
            noise_filter(&mut canvas, &NoiseFilterConfig { intensity: 4 }, 229),
            1
        );
        assert_eq!(canvas.get(15, 15), WHITE);
    }

    /// Clusters larger than the intensity are left alone.
    #[test]
    fn noise_filter_keeps_large_clusters() {
        let mut canvas = blank(30, 30);
        canvas.fill_rect(Rect::new(10, 10, 13, 13), BLACK);
        canvas.fill_rect(Rect::new(25, 25, 26, 25), BLACK);

        let clusters = noise_filter(&mut canvas, &NoiseFilterConfig::default(), 229);
        assert_eq!(clusters, 1, "only the two-pixel speck is noise");
        assert_eq!(canvas.count_in_range(Rect::new(10, 10, 13, 13), 0, 0), 16);
        assert_eq!(canvas.get(25, 25), WHITE);
        assert_eq!(canvas.get(26, 25), WHITE);
    }

    /// Sparse specks far from other content are cleared by the blur filter.
    #[test]
    fn blur_filter_clears_sparse_window() {
        let mut canvas = blank(200, 200);
        canvas.set(120, 120, BLACK);
        canvas.fill_rect(Rect::new(0, 0, 49, 49), BLACK);

        let config = BlurFilterConfig {
            size: AxisPair::both(50),
            step: AxisPair::both(50),
            intensity: 0.01,
        };
        let cleared = blur_filter(&mut canvas, &config, 229);
        assert_eq!(cleared, 1);
        assert_eq!(canvas.get(120, 120), WHITE);
        assert_eq!(canvas.count_in_range(Rect::new(0, 0, 49, 49), 0, 0), 2500);
    }

    /// Uniform light gray is wiped completely by the gray filter.
    #[test]
    fn gray_filter_clears_light_gray() {
        let mut canvas = Canvas::filled(200, 200, ColorDepth::Grayscale, 200).expect("canvas");
        let config = GrayFilterConfig {
            size: AxisPair::both(50),
            step: AxisPair::both(50),
            threshold: 0.5,
        };
        let changed = gray_filter(&mut canvas, &config, 127);
        assert_eq!(changed, 40_000);
        assert_eq!(canvas.count_in_range(canvas.bounds(), 255, 255), 40_000);
    }

    /// Windows holding a black pixel keep their gray shading.
    #[test]
    fn gray_filter_keeps_windows_with_black() {
        let mut canvas = Canvas::filled(100, 100, ColorDepth::Grayscale, 200).expect("canvas");
        canvas.set(10, 10, BLACK);
        let config = GrayFilterConfig {
            size: AxisPair::both(50),
            step: AxisPair::both(50),
            threshold: 0.5,
        };
        gray_filter(&mut canvas, &config, 127);
        assert_eq!(canvas.get(20, 20), 200);
        assert_eq!(canvas.get(70, 70), WHITE);
    }
}
