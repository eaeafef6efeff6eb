// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometry and option types for Pagewash.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PagewashError;

/// Parse a comma-separated list of integers, reporting `what` on failure.
fn parse_ints<T: FromStr>(s: &str, what: &str) -> Result<Vec<T>, PagewashError> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<T>()
                .map_err(|_| PagewashError::Config(format!("invalid {what} '{s}'")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rectangles and points
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle with inclusive coordinates.
///
/// Detectors may produce rectangles that reach outside the sheet or are
/// degenerate; every canvas operation clips through its bounds check instead
/// of rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The whole area of a `width` x `height` sheet.
    pub fn sheet(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    /// Number of columns covered (inclusive bounds).
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    /// Number of rows covered (inclusive bounds).
    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    /// `left <= right && top <= bottom`.
    pub fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Shift by `(dx, dy)`.
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{},{}]", self.left, self.top, self.right, self.bottom)
    }
}

impl FromStr for Rect {
    type Err = PagewashError;

    /// Parse `"left,top,right,bottom"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_ints::<i32>(s, "rectangle")?.as_slice() {
            &[left, top, right, bottom] => Ok(Self::new(left, top, right, bottom)),
            _ => Err(PagewashError::Config(format!(
                "rectangle '{s}' needs four coordinates"
            ))),
        }
    }
}

/// Seed coordinate for mask detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl FromStr for Point {
    type Err = PagewashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_ints::<i32>(s, "point")?.as_slice() {
            &[x, y] => Ok(Self::new(x, y)),
            _ => Err(PagewashError::Config(format!("point '{s}' needs two coordinates"))),
        }
    }
}

/// Margin widths on the four sheet sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Border {
    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }

    /// The area inside the border on a `width` x `height` sheet.
    pub fn to_mask(&self, width: u32, height: u32) -> Rect {
        Rect::new(
            self.left as i32,
            self.top as i32,
            width as i32 - self.right as i32 - 1,
            height as i32 - self.bottom as i32 - 1,
        )
    }
}

impl FromStr for Border {
    type Err = PagewashError;

    /// Parse `"left,top,right,bottom"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_ints::<u32>(s, "border")?.as_slice() {
            &[left, top, right, bottom] => Ok(Self {
                left,
                top,
                right,
                bottom,
            }),
            _ => Err(PagewashError::Config(format!(
                "border '{s}' needs four values"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Scan tuning values
// ---------------------------------------------------------------------------

/// A value that may differ between the horizontal and the vertical axis.
///
/// Parsed from `"n"` (both axes) or `"h,v"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisPair<T> {
    pub horizontal: T,
    pub vertical: T,
}

impl<T: Copy> AxisPair<T> {
    pub const fn new(horizontal: T, vertical: T) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub const fn both(value: T) -> Self {
        Self {
            horizontal: value,
            vertical: value,
        }
    }
}

impl<T: Copy + FromStr> FromStr for AxisPair<T> {
    type Err = PagewashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_ints::<T>(s, "value pair")?.as_slice() {
            &[value] => Ok(Self::both(value)),
            &[horizontal, vertical] => Ok(Self::new(horizontal, vertical)),
            _ => Err(PagewashError::Config(format!(
                "'{s}' needs one or two values"
            ))),
        }
    }
}

/// Which axes a scan runs along. The default is neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directions {
    pub horizontal: bool,
    pub vertical: bool,
}

impl Directions {
    pub const HORIZONTAL: Self = Self {
        horizontal: true,
        vertical: false,
    };
    pub const VERTICAL: Self = Self {
        horizontal: false,
        vertical: true,
    };
    pub const BOTH: Self = Self {
        horizontal: true,
        vertical: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.horizontal && !self.vertical
    }
}

impl FromStr for Directions {
    type Err = PagewashError;

    /// Any string mentioning `h` and/or `v` (`"h"`, `"v"`, `"h,v"`, `"hv"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower.chars().any(|c| !matches!(c, 'h' | 'v' | ',' | ' ')) {
            return Err(PagewashError::Config(format!(
                "invalid scan direction '{s}' (expected h, v or h,v)"
            )));
        }
        Ok(Self {
            horizontal: lower.contains('h'),
            vertical: lower.contains('v'),
        })
    }
}

/// Extent of a scan bar: a pixel count, or the whole sheet dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extent {
    Full,
    Pixels(u32),
}

impl Extent {
    /// Resolve against the full dimension `full`.
    pub fn resolve(self, full: u32) -> u32 {
        match self {
            Extent::Full => full,
            Extent::Pixels(pixels) => pixels,
        }
    }
}

impl FromStr for Extent {
    type Err = PagewashError;

    /// `"-1"` or `"full"` select the whole dimension.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-1" | "full" => Ok(Extent::Full),
            other => other
                .parse()
                .map(Extent::Pixels)
                .map_err(|_| PagewashError::Config(format!("invalid scan extent '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet-level enums
// ---------------------------------------------------------------------------

/// How many pages sit on one sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// No template: explicit mask points only.
    None,
    /// One page centred on the sheet.
    #[default]
    Single,
    /// Two facing pages side by side.
    Double,
}

impl FromStr for Layout {
    type Err = PagewashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            _ => Err(PagewashError::Config(format!(
                "unknown layout '{s}' (expected single, double or none)"
            ))),
        }
    }
}

/// Pixel interpretation of a canvas, and the output file type it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorDepth {
    /// Black and white (PBM).
    Bilevel,
    /// 8-bit gray (PGM).
    Grayscale,
}

impl FromStr for ColorDepth {
    type Err = PagewashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pbm" | "bilevel" => Ok(Self::Bilevel),
            "pgm" | "grayscale" => Ok(Self::Grayscale),
            _ => Err(PagewashError::Config(format!(
                "unknown output type '{s}' (expected pbm or pgm)"
            ))),
        }
    }
}

/// Quarter-turn rotation applied before or after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuarterTurn {
    /// +90 degrees.
    Clockwise,
    /// -90 degrees.
    CounterClockwise,
}

impl QuarterTurn {
    /// `+1` for clockwise, `-1` for counter-clockwise.
    pub fn direction(self) -> i32 {
        match self {
            QuarterTurn::Clockwise => 1,
            QuarterTurn::CounterClockwise => -1,
        }
    }
}

impl FromStr for QuarterTurn {
    type Err = PagewashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "90" | "+90" => Ok(Self::Clockwise),
            "-90" => Ok(Self::CounterClockwise),
            _ => Err(PagewashError::Config(format!(
                "rotation must be 90 or -90, got '{s}'"
            ))),
        }
    }
}

/// A detected or configured content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRegion {
    pub rect: Rect,
    /// `false` when detection fell back to a maximum-size rectangle.
    pub valid: bool,
}

impl MaskRegion {
    pub fn valid(rect: Rect) -> Self {
        Self { rect, valid: true }
    }
}
