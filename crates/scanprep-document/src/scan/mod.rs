// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning stages — adaptive binarization, morphology, boundary detection,
// cropping, vision capabilities, and the live-frame capture gate.

pub mod assist;
pub mod binarize;
pub mod boundary;
pub mod crop;
pub mod morphology;
pub mod prefilter;
pub mod vision;

pub use boundary::BoundaryDetector;
pub use prefilter::{GateState, PreFilterGate};
pub use vision::{FallbackVision, VisionCapability, default_vision};

#[cfg(feature = "vision")]
pub use vision::ContourVision;
