// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanprep pipeline.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates, relative to some buffer's origin.
///
/// Coordinates are signed: detectors and margin adjustments may produce
/// rectangles that hang off the image, and consumers clamp them with
/// [`Rect::clamp_to`] before touching pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from inclusive-exclusive corner coordinates.
    pub fn from_corners(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self::new(
            min_x,
            min_y,
            max_x.saturating_sub(min_x),
            max_y.saturating_sub(min_y),
        )
    }

    /// A rectangle covering `fraction` of each image axis, centred in the image.
    ///
    /// `fraction` is clamped to `[0.0, 1.0]`; the result is never smaller
    /// than 1x1 for a non-empty image.
    pub fn centered(image_width: u32, image_height: u32, fraction: f32) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        let w = ((image_width as f32 * fraction).round() as i32).max(1);
        let h = ((image_height as f32 * fraction).round() as i32).max(1);
        let x = ((image_width as i32 - w) / 2).max(0);
        let y = ((image_height as i32 - h) / 2).max(0);
        Self::new(x, y, w, h)
    }

    /// Exclusive right edge, saturating at `i32` bounds.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32` bounds.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Area in pixels; zero for degenerate rectangles.
    pub fn area(&self) -> i64 {
        if self.is_degenerate() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether two rectangles overlap or touch.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(other.x > self.right()
            || other.right() < self.x
            || other.y > self.bottom()
            || other.bottom() < self.y)
    }

    /// Whether the horizontal spans of two rectangles overlap or touch,
    /// ignoring their vertical positions.
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        !(other.right() < self.x || other.x > self.right())
    }

    /// Smallest rectangle enclosing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Intersect with `[0, width) x [0, height)`.
    ///
    /// The result may be degenerate when the rectangle lies entirely outside
    /// the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        let (w, h) = (width as i32, height as i32);
        let x0 = self.x.clamp(0, w);
        let y0 = self.y.clamp(0, h);
        let x1 = self.right().clamp(0, w);
        let y1 = self.bottom().clamp(0, h);
        Rect::from_corners(x0, y0, x1.max(x0), y1.max(y0))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Signed pixel offsets applied to a detected rectangle before the final crop.
///
/// Positive `left`/`top` move those edges inward; positive `right`/`bottom`
/// move those edges outward. All zeros is the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginAdjustment {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl MarginAdjustment {
    pub const fn new(top: i32, bottom: i32, left: i32, right: i32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Objective quality figures computed over a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean luma, 0..=255.
    pub brightness: u32,
    /// Mean absolute vertical luma gradient.
    pub sharpness: u32,
    /// Luma standard deviation scaled to 0..=100, when computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<u32>,
}

/// Per-frame report consumed by a live capture-assist display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0..=100.
    pub sharpness: u32,
    /// 0..=255.
    pub brightness: u32,
    /// 0..=100.
    pub contrast: u32,
    /// Plausible document outline, if one was found.
    pub invoice_rect: Option<Rect>,
}

/// Which shape of the processing pipeline to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// grayscale → normalize → adaptive threshold → metrics, no cropping.
    #[default]
    SinglePass,
    /// Boundary detection for review, margin adjustment, then crop + threshold.
    DetectAdjustFinalize,
    /// grayscale → normalize → edge boundary → crop → threshold in one call.
    FullFourStage,
}

impl PipelineMode {
    /// Parse the short names accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "single" | "single_pass" => Some(Self::SinglePass),
            "adjust" | "detect_adjust_finalize" => Some(Self::DetectAdjustFinalize),
            "full" | "full_four_stage" => Some(Self::FullFourStage),
            _ => None,
        }
    }
}
