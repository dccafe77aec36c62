// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vision capabilities — contour-based boundary candidates and Laplacian
// sharpness, with a reduced-fidelity fallback when contour analysis is not
// compiled in. The implementation is chosen once, at construction time.

use std::sync::Arc;

use scanprep_core::{BoundaryConfig, Rect};
use tracing::debug;

use crate::image::PixelBuffer;
use crate::scan::boundary::BoundaryDetector;

/// Optional computer-vision operations the pipeline can use.
pub trait VisionCapability: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Bounding rectangles of high-gradient blobs in a grayscale frame.
    /// An empty list means nothing was found (or nothing can be found).
    fn boundary_candidates(&self, frame: &PixelBuffer) -> Vec<Rect>;

    /// Variance of the Laplacian over luma, or `None` when unavailable.
    fn laplacian_variance(&self, frame: &PixelBuffer) -> Option<f64>;

    /// One document rectangle for `frame`, falling back to the detector's
    /// centred rectangle when no candidate survives.
    fn detect_boundary(&self, frame: &PixelBuffer, detector: &BoundaryDetector) -> Rect {
        let candidates = self.boundary_candidates(frame);
        debug!(vision = self.name(), candidates = candidates.len(), "Boundary candidates");
        detector.detect(&candidates, frame.width(), frame.height())
    }
}

/// Capability set with no contour analysis and no Laplacian.
///
/// Boundary detection always lands on the centred fallback rectangle and
/// sharpness gates treat every frame as sharp enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackVision;

impl VisionCapability for FallbackVision {
    fn name(&self) -> &str {
        "fallback"
    }

    fn boundary_candidates(&self, _frame: &PixelBuffer) -> Vec<Rect> {
        Vec::new()
    }

    fn laplacian_variance(&self, _frame: &PixelBuffer) -> Option<f64> {
        None
    }
}

/// The best capability set compiled into this build.
pub fn default_vision(config: &BoundaryConfig) -> Arc<dyn VisionCapability> {
    #[cfg(feature = "vision")]
    {
        Arc::new(contour::ContourVision::new(config.dilate_radius))
    }
    #[cfg(not(feature = "vision"))]
    {
        let _ = config;
        Arc::new(FallbackVision)
    }
}

#[cfg(feature = "vision")]
pub use contour::ContourVision;

#[cfg(feature = "vision")]
mod contour {
    use image::GrayImage;
    use imageproc::contours::{BorderType, Contour, find_contours};
    use imageproc::distance_transform::Norm;
    use imageproc::filter::laplacian_filter;
    use imageproc::morphology::dilate;
    use scanprep_core::Rect;
    use tracing::{debug, instrument};

    use super::VisionCapability;
    use crate::image::PixelBuffer;
    use crate::scan::binarize::detect_edges;

    /// Sobel edges, square dilation to join fragments, then the bounding box
    /// of every outer contour.
    #[derive(Debug, Clone, Copy)]
    pub struct ContourVision {
        dilate_radius: u8,
    }

    impl ContourVision {
        pub fn new(dilate_radius: u8) -> Self {
            Self { dilate_radius }
        }

        /// Bounding boxes of outer contours in a binary mask.
        fn outer_boxes(mask: &GrayImage) -> Vec<Rect> {
            let contours: Vec<Contour<i32>> = find_contours(mask);
            contours
                .iter()
                .filter(|c| c.border_type == BorderType::Outer && !c.points.is_empty())
                .map(|c| {
                    let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
                    let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
                    for p in &c.points {
                        min_x = min_x.min(p.x);
                        min_y = min_y.min(p.y);
                        max_x = max_x.max(p.x);
                        max_y = max_y.max(p.y);
                    }
                    Rect::from_corners(min_x, min_y, max_x + 1, max_y + 1)
                })
                .collect()
        }
    }

    impl Default for ContourVision {
        fn default() -> Self {
            Self::new(2)
        }
    }

    impl VisionCapability for ContourVision {
        fn name(&self) -> &str {
            "contour"
        }

        #[instrument(skip(self, frame), fields(width = frame.width(), height = frame.height()))]
        fn boundary_candidates(&self, frame: &PixelBuffer) -> Vec<Rect> {
            let edges = detect_edges(frame).to_gray();
            let r = self.dilate_radius;
            let mask = if r > 0 {
                dilate(&edges, Norm::LInf, r)
            } else {
                edges
            };

            // Dilation pads every blob by `r` on each side; take it back off,
            // except where the image edge already clipped the padding.
            let pad = r as i32;
            let (w, h) = (mask.width() as i32, mask.height() as i32);
            let boxes: Vec<Rect> = Self::outer_boxes(&mask)
                .into_iter()
                .map(|b| {
                    let left = if b.x > 0 { pad } else { 0 };
                    let top = if b.y > 0 { pad } else { 0 };
                    let right = if b.right() < w { pad } else { 0 };
                    let bottom = if b.bottom() < h { pad } else { 0 };
                    let shrunk = Rect::from_corners(
                        b.x + left,
                        b.y + top,
                        b.right() - right,
                        b.bottom() - bottom,
                    );
                    if shrunk.is_degenerate() { b } else { shrunk }
                })
                .collect();
            debug!(count = boxes.len(), "Contour boxes extracted");
            boxes
        }

        fn laplacian_variance(&self, frame: &PixelBuffer) -> Option<f64> {
            let response = laplacian_filter(&frame.to_gray());
            let n = response.width() as f64 * response.height() as f64;
            if n == 0.0 {
                return Some(0.0);
            }
            let (sum, sum_sq) = response.pixels().fold((0.0f64, 0.0f64), |(s, sq), p| {
                let v = p.0[0] as f64;
                (s + v, sq + v * v)
            });
            let mean = sum / n;
            Some((sum_sq / n - mean * mean).max(0.0))
        }
    }
}
