// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanprep.

use thiserror::Error;

/// Top-level error type for all Scanprep operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Input errors --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    // -- Geometry / parameter errors --
    #[error("crop rectangle is degenerate ({width}x{height})")]
    DegenerateCrop { width: i64, height: i64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // -- Output errors --
    #[error("failed to encode image: {0}")]
    Encode(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Whether the caller should keep its previous valid state and carry on.
    ///
    /// Degenerate crops and out-of-range parameters come from interactive
    /// adjustment and only invalidate the current attempt. Everything else
    /// means the input or environment is unusable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::DegenerateCrop { .. } | ScanError::InvalidParameter(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
