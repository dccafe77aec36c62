// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanprep-document — Receipt and invoice image normalization.
//
// Turns camera photos into clean, cropped, binarized rasters suitable for
// OCR: pixel filters, integral-image adaptive thresholding, morphology,
// boundary detection with a centred fallback, margin-adjusted cropping, and a
// hysteresis gate for auto-capture from live frames.

pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary types so callers can use `scanprep_document::Pipeline` etc.
pub use image::PixelBuffer;
pub use pipeline::{AdjustSession, Pipeline, PipelineResult};
pub use scan::{BoundaryDetector, FallbackVision, GateState, PreFilterGate, VisionCapability};

#[cfg(feature = "vision")]
pub use scan::ContourVision;
