// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canvas — a rectangular buffer of 8-bit gray values with bounds-checked
// access. Reads outside the buffer yield white and writes outside it are
// ignored, so detectors can hand over rectangles that reach past the sheet.

use image::{GrayImage, Luma};
use pagewash_core::error::{PagewashError, Result};
use pagewash_core::{ColorDepth, Point, Rect};

/// Gray value of a white pixel.
pub const WHITE: u8 = 255;
/// Gray value of a black pixel.
pub const BLACK: u8 = 0;

/// One sheet (or part of one) held in memory, one byte per pixel, row-major.
///
/// Bilevel canvases use the same byte layout and only hold 0 and 255 after
/// decoding; the depth tag decides how the canvas is written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    depth: ColorDepth,
    pixels: Vec<u8>,
}

/// Allocate `width * height` bytes set to `value`, reporting exhaustion as an error.
fn allocate(width: u32, height: u32, value: u8) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(PagewashError::InvalidDimensions { width, height });
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or(PagewashError::Allocation { bytes: usize::MAX })?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| PagewashError::Allocation { bytes: len })?;
    pixels.resize(len, value);
    Ok(pixels)
}

impl Canvas {
    // -- Construction ---------------------------------------------------------

    /// A white canvas.
    pub fn new(width: u32, height: u32, depth: ColorDepth) -> Result<Self> {
        Self::filled(width, height, depth, WHITE)
    }

    /// A canvas with every pixel set to `value`.
    pub fn filled(width: u32, height: u32, depth: ColorDepth, value: u8) -> Result<Self> {
        Ok(Self {
            width,
            height,
            depth,
            pixels: allocate(width, height, value)?,
        })
    }

    /// Wrap an existing row-major pixel buffer.
    pub fn from_pixels(width: u32, height: u32, depth: ColorDepth, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PagewashError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(PagewashError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            pixels,
        })
    }

    /// Take over the pixels of a decoded grayscale image.
    pub fn from_gray_image(image: GrayImage, depth: ColorDepth) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_pixels(width, height, depth, image.into_raw())
    }

    /// Copy the pixels into an `image` buffer.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([self.pixels[y as usize * self.width as usize + x as usize]])
        })
    }

    /// Re-tag the canvas with another depth; pixel bytes are unchanged.
    pub fn with_depth(mut self, depth: ColorDepth) -> Self {
        self.depth = depth;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> ColorDepth {
        self.depth
    }

    /// The whole canvas as a rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::sheet(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            None
        } else {
            Some(y as usize * self.width as usize + x as usize)
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    // -- Pixel access ---------------------------------------------------------

    /// Gray value at `(x, y)`; white outside the canvas.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(WHITE, |i| self.pixels[i])
    }

    /// Store `value` at `(x, y)`. Returns whether the pixel changed; writes
    /// outside the canvas do nothing and return `false`.
    pub fn set(&mut self, x: i32, y: i32, value: u8) -> bool {
        match self.index(x, y) {
            Some(i) if self.pixels[i] != value => {
                self.pixels[i] = value;
                true
            }
            _ => false,
        }
    }

    // -- Rectangle operations -------------------------------------------------

    /// Set every pixel of `rect` to `color`; returns the number that changed.
    pub fn fill_rect(&mut self, rect: Rect, color: u8) -> u64 {
        let mut changed = 0;
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                if self.set(x, y, color) {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Count pixels of `rect` whose value lies in `min..=max`. Positions
    /// outside the canvas read as white.
    pub fn count_in_range(&self, rect: Rect, min: u8, max: u8) -> u64 {
        let mut count = 0;
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                let pixel = self.get(x, y);
                if pixel >= min && pixel <= max {
                    count += 1;
                }
            }
        }
        count
    }

    /// Like [`count_in_range`](Self::count_in_range), but also turns every
    /// counted pixel white.
    pub fn clear_in_range(&mut self, rect: Rect, min: u8, max: u8) -> u64 {
        let mut count = 0;
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                let pixel = self.get(x, y);
                if pixel >= min && pixel <= max {
                    self.set(x, y, WHITE);
                    count += 1;
                }
            }
        }
        count
    }

    /// Integer mean gray value over `rect`; positions outside the canvas
    /// count as white and an empty rectangle reads as white.
    pub fn average_brightness(&self, rect: Rect) -> u8 {
        if !rect.is_valid() {
            return WHITE;
        }
        let count = rect.width() as i64 * rect.height() as i64;
        let mut total: i64 = 0;
        for y in rect.top..=rect.bottom {
            for x in rect.left..=rect.right {
                total += self.get(x, y) as i64;
            }
        }
        (total / count) as u8
    }

    /// Copy `src_rect` of this canvas into `target` with its top-left corner
    /// at `origin`. Both sides are clipped by the usual bounds rules.
    pub fn copy_rect(&self, src_rect: Rect, target: &mut Canvas, origin: Point) {
        for row in 0..src_rect.height().max(0) {
            for col in 0..src_rect.width().max(0) {
                let pixel = self.get(src_rect.left + col, src_rect.top + row);
                target.set(origin.x + col, origin.y + row, pixel);
            }
        }
    }

    /// A new canvas holding a copy of `rect`.
    pub fn sub_canvas(&self, rect: Rect) -> Result<Canvas> {
        let width = u32::try_from(rect.width()).unwrap_or(0);
        let height = u32::try_from(rect.height()).unwrap_or(0);
        let mut area = Canvas::new(width, height, self.depth)?;
        self.copy_rect(rect, &mut area, Point::new(0, 0));
        Ok(area)
    }
}
