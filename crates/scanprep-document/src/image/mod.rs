// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — the RGBA pixel buffer and the statistical filters over it.

pub mod buffer;
pub mod filters;

pub use buffer::{PixelBuffer, luma};
