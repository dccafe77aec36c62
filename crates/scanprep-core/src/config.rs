// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline, boundary-detection and capture-gate configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::PipelineMode;

/// Complete Scanprep settings, as stored in a JSON config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub pipeline: PipelineConfig,
    pub boundary: BoundaryConfig,
    pub prefilter: PreFilterConfig,
}

impl ScanConfig {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: ScanConfig = serde_json::from_str(&data)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Write settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

/// Settings for one pipeline run.
///
/// Fields missing from a config file take the preset of the file's `mode`,
/// so `{"mode": "detect_adjust_finalize"}` alone yields `c = 10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PipelineConfigFile")]
pub struct PipelineConfig {
    pub mode: PipelineMode,
    /// Adaptive threshold window side (odd).
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub c: i32,
    /// Run mean/stddev normalization before thresholding.
    pub auto_contrast: bool,
    /// Contrast stretch around mid-gray applied after tone normalization.
    pub contrast_boost: Option<f32>,
    /// Apply a morphological close after binarization.
    pub morph_close: bool,
    /// Square kernel side for the close.
    pub morph_kernel: u32,
    /// Mild sharpen strength, if any.
    pub sharpen: Option<f32>,
    /// Downscale inputs whose longest side exceeds this.
    pub max_dimension: Option<u32>,
    /// JPEG quality used when the raster is exported (1-100).
    pub jpeg_quality: u8,
}

/// On-disk form of [`PipelineConfig`]: every field optional.
///
/// Optional settings use `Option<Option<_>>` so an explicit `null` (turn the
/// stage off) differs from an absent key (keep the preset).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PipelineConfigFile {
    mode: PipelineMode,
    block_size: Option<u32>,
    c: Option<i32>,
    auto_contrast: Option<bool>,
    #[serde(deserialize_with = "present")]
    contrast_boost: Option<Option<f32>>,
    morph_close: Option<bool>,
    morph_kernel: Option<u32>,
    #[serde(deserialize_with = "present")]
    sharpen: Option<Option<f32>>,
    #[serde(deserialize_with = "present")]
    max_dimension: Option<Option<u32>>,
    jpeg_quality: Option<u8>,
}

/// A key that is present, including one set to `null`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<PipelineConfigFile> for PipelineConfig {
    fn from(file: PipelineConfigFile) -> Self {
        let preset = PipelineConfig::for_mode(file.mode);
        Self {
            mode: file.mode,
            block_size: file.block_size.unwrap_or(preset.block_size),
            c: file.c.unwrap_or(preset.c),
            auto_contrast: file.auto_contrast.unwrap_or(preset.auto_contrast),
            contrast_boost: file.contrast_boost.unwrap_or(preset.contrast_boost),
            morph_close: file.morph_close.unwrap_or(preset.morph_close),
            morph_kernel: file.morph_kernel.unwrap_or(preset.morph_kernel),
            sharpen: file.sharpen.unwrap_or(preset.sharpen),
            max_dimension: file.max_dimension.unwrap_or(preset.max_dimension),
            jpeg_quality: file.jpeg_quality.unwrap_or(preset.jpeg_quality),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::single_pass()
    }
}

impl PipelineConfig {
    /// grayscale → normalize → threshold(21, 7).
    pub fn single_pass() -> Self {
        Self {
            mode: PipelineMode::SinglePass,
            block_size: 21,
            c: 7,
            auto_contrast: true,
            contrast_boost: None,
            morph_close: false,
            morph_kernel: 3,
            sharpen: None,
            max_dimension: Some(2048),
            jpeg_quality: 90,
        }
    }

    /// Detect for review, then crop + grayscale + threshold(21, 10).
    pub fn detect_adjust_finalize() -> Self {
        Self {
            mode: PipelineMode::DetectAdjustFinalize,
            c: 10,
            ..Self::single_pass()
        }
    }

    /// grayscale → normalize → edge boundary → crop → threshold(21, 7).
    pub fn full_four_stage() -> Self {
        Self {
            mode: PipelineMode::FullFourStage,
            ..Self::single_pass()
        }
    }

    /// Default preset for a mode.
    pub fn for_mode(mode: PipelineMode) -> Self {
        match mode {
            PipelineMode::SinglePass => Self::single_pass(),
            PipelineMode::DetectAdjustFinalize => Self::detect_adjust_finalize(),
            PipelineMode::FullFourStage => Self::full_four_stage(),
        }
    }

    /// Reject settings the algorithms cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size % 2 == 0 {
            return Err(ScanError::InvalidParameter(format!(
                "block_size must be odd and positive, got {}",
                self.block_size
            )));
        }
        if self.morph_kernel == 0 {
            return Err(ScanError::InvalidParameter(
                "morph_kernel must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ScanError::InvalidParameter(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if matches!(self.contrast_boost, Some(f) if !f.is_finite() || f <= 0.0) {
            return Err(ScanError::InvalidParameter(
                "contrast_boost must be a positive factor".into(),
            ));
        }
        if matches!(self.max_dimension, Some(0)) {
            return Err(ScanError::InvalidParameter(
                "max_dimension must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Candidate filtering and fallback for boundary detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Candidates smaller than this (in pixels) are noise.
    pub min_area: u32,
    /// Candidates within this fraction of the image size from any border are
    /// frame artifacts.
    pub border_margin_ratio: f32,
    /// Fraction of each axis covered by the fallback rectangle.
    pub fallback_fraction: f32,
    /// Radius of the square dilation that joins edge fragments.
    pub dilate_radius: u8,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            min_area: 800,
            border_margin_ratio: 0.02,
            fallback_fraction: 0.8,
            dilate_radius: 2,
        }
    }
}

/// Thresholds and hysteresis for live-frame capture gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreFilterConfig {
    /// Consecutive document-like frames needed before triggering.
    pub stable_frames: u32,
    /// Frames ignored after a trigger.
    pub cooldown_frames: u32,
    pub min_brightness: u32,
    pub max_brightness: u32,
    /// Minimum Laplacian variance, when that capability is available.
    pub min_sharpness: f64,
    /// A channel value above this counts as near-white.
    pub white_threshold: u8,
    /// Fraction of near-white pixels for a frame to look like paper.
    pub min_white_ratio: f64,
}

impl Default for PreFilterConfig {
    fn default() -> Self {
        Self {
            stable_frames: 5,
            cooldown_frames: 30,
            min_brightness: 70,
            max_brightness: 210,
            min_sharpness: 60.0,
            white_threshold: 200,
            min_white_ratio: 0.45,
        }
    }
}
