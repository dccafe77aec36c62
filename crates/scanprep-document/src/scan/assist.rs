// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture assist — per-frame quality report for a live preview overlay.

use scanprep_core::{QualityReport, Rect};
use tracing::instrument;

use crate::image::PixelBuffer;
use crate::image::filters::{calculate_contrast, calculate_metrics, edge_density, grayscale};
use crate::scan::boundary::BoundaryDetector;
use crate::scan::vision::VisionCapability;

/// Laplacian variance per sharpness point on the 0..=100 scale.
const LAPLACIAN_SCALE: f64 = 50.0;

/// Whether a detected rectangle has the proportions of a receipt or invoice
/// held up to the camera: each side 30%–95% of the frame, aspect 0.5..=3.
pub fn is_plausible_document(rect: &Rect, frame_width: u32, frame_height: u32) -> bool {
    if rect.is_degenerate() {
        return false;
    }
    let (fw, fh) = (frame_width as f64, frame_height as f64);
    let (w, h) = (rect.width as f64, rect.height as f64);
    let aspect = w / h;
    w >= fw * 0.3
        && h >= fh * 0.3
        && w <= fw * 0.95
        && h <= fh * 0.95
        && (0.5..=3.0).contains(&aspect)
}

/// Sharpness, brightness, contrast and a plausible document outline for one
/// frame.
///
/// Sharpness is the Laplacian variance / 50 (capped at 100) when the vision
/// capability provides it, else the edge density. `invoice_rect` is only set
/// when contour analysis found something document-shaped; the centred
/// fallback rectangle is never reported.
#[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
pub fn quality_report(
    frame: &PixelBuffer,
    vision: &dyn VisionCapability,
    detector: &BoundaryDetector,
) -> QualityReport {
    let metrics = calculate_metrics(frame);
    let contrast = calculate_contrast(frame);

    let sharpness = match vision.laplacian_variance(frame) {
        Some(variance) => (variance / LAPLACIAN_SCALE).clamp(0.0, 100.0).round() as u32,
        None => edge_density(frame),
    };

    let (w, h) = frame.dimensions();
    let gray = grayscale(frame.clone());
    let candidates = vision.boundary_candidates(&gray);
    let invoice_rect = detector
        .detect_candidates(&candidates, w, h)
        .filter(|r| is_plausible_document(r, w, h));

    QualityReport {
        sharpness,
        brightness: metrics.brightness,
        contrast,
        invoice_rect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::vision::FallbackVision;

    #[test]
    fn plausible_document_bounds() {
        assert!(is_plausible_document(&Rect::new(50, 30, 200, 200), 400, 300));
        // Too narrow.
        assert!(!is_plausible_document(&Rect::new(50, 30, 100, 200), 400, 300));
        // Fills the whole frame.
        assert!(!is_plausible_document(&Rect::new(0, 0, 400, 300), 400, 300));
        // Too elongated.
        assert!(!is_plausible_document(&Rect::new(0, 0, 370, 100), 400, 300));
    }

    #[test]
    fn fallback_report_uses_edge_density() {
        let frame = PixelBuffer::from_pixel(40, 30, [128, 128, 128, 255]);
        let report = quality_report(&frame, &FallbackVision, &BoundaryDetector::default());
        assert_eq!(report.brightness, 128);
        assert_eq!(report.sharpness, 0);
        assert_eq!(report.contrast, 0);
        assert_eq!(report.invoice_rect, None);
    }

    struct FixedVision(Rect);

    impl VisionCapability for FixedVision {
        fn name(&self) -> &str {
            "fixed"
        }

        fn boundary_candidates(&self, _frame: &PixelBuffer) -> Vec<Rect> {
            vec![self.0]
        }

        fn laplacian_variance(&self, _frame: &PixelBuffer) -> Option<f64> {
            None
        }
    }

    #[test]
    fn detection_matching_centred_rect_is_reported() {
        let frame = PixelBuffer::from_pixel(400, 300, [128, 128, 128, 255]);
        let detector = BoundaryDetector::default();
        let paper = detector.fallback(400, 300);
        assert_eq!(paper, Rect::new(40, 30, 320, 240));

        let report = quality_report(&frame, &FixedVision(paper), &detector);
        assert_eq!(report.invoice_rect, Some(paper));
    }

    #[cfg(feature = "vision")]
    #[test]
    fn contour_report_finds_paper() {
        use crate::scan::vision::ContourVision;

        let mut frame = PixelBuffer::from_pixel(400, 300, [20, 20, 20, 255]);
        for y in 40..260u32 {
            for x in 100..300u32 {
                let i = ((y * 400 + x) * 4) as usize;
                frame.as_raw_mut()[i..i + 3].copy_from_slice(&[240, 240, 240]);
            }
        }
        let report = quality_report(&frame, &ContourVision::default(), &BoundaryDetector::default());
        let rect = report.invoice_rect.expect("paper outline");
        assert!((rect.x - 100).abs() <= 2 && (rect.y - 40).abs() <= 2, "{:?}", rect);
        assert!(report.sharpness > 0);
    }
}
