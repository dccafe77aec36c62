// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestration — single-pass binarization, the one-shot
// detect/crop/binarize variant, and the interactive detect → adjust →
// finalize session.

use std::sync::Arc;

use scanprep_core::error::Result;
use scanprep_core::{
    BoundaryConfig, MarginAdjustment, PipelineConfig, PipelineMode, PreFilterConfig,
    QualityMetrics, QualityReport, Rect, ScanConfig,
};
use tracing::{debug, info, instrument};

use crate::image::PixelBuffer;
use crate::image::filters::{
    calculate_contrast, calculate_metrics, enhance_contrast, grayscale, normalize, sharpen,
};
use crate::scan::assist;
use crate::scan::binarize::adaptive_threshold;
use crate::scan::boundary::BoundaryDetector;
use crate::scan::crop::{crop, current_rect};
use crate::scan::morphology::morph_close;
use crate::scan::prefilter::PreFilterGate;
use crate::scan::vision::{VisionCapability, default_vision};

/// Output of one successful run. Superseded, never mutated, by the next run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub width: u32,
    pub height: u32,
    pub metrics: QualityMetrics,
    pub raster: PixelBuffer,
}

impl PipelineResult {
    fn from_raster(raster: PixelBuffer) -> Self {
        let mut metrics = calculate_metrics(&raster);
        metrics.contrast = Some(calculate_contrast(&raster));
        Self {
            width: raster.width(),
            height: raster.height(),
            metrics,
            raster,
        }
    }

    /// Serialize the raster for upload.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        self.raster.to_jpeg_bytes(quality)
    }
}

/// Interactive crop state: the original image, the detected rectangle and the
/// user's current margins.
///
/// Changing margins never re-runs detection.
#[derive(Debug, Clone)]
pub struct AdjustSession {
    original: PixelBuffer,
    detected: Rect,
    margins: MarginAdjustment,
}

impl AdjustSession {
    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    /// The rectangle found by boundary detection.
    pub fn detected(&self) -> Rect {
        self.detected
    }

    pub fn margins(&self) -> MarginAdjustment {
        self.margins
    }

    pub fn set_margins(&mut self, margins: MarginAdjustment) {
        self.margins = margins;
    }

    /// The detected rectangle with the current margins applied.
    pub fn current_rect(&self) -> Rect {
        current_rect(
            self.detected,
            self.margins,
            self.original.width(),
            self.original.height(),
        )
    }
}

/// Configured document-normalization pipeline.
///
/// Stages are pure functions over owned buffers, so a run that is no longer
/// wanted can simply be dropped by the caller.
pub struct Pipeline {
    config: PipelineConfig,
    detector: BoundaryDetector,
    vision: Arc<dyn VisionCapability>,
}

impl Pipeline {
    // -- Construction ---------------------------------------------------------

    /// Build a pipeline around an explicit vision capability.
    pub fn new(
        config: PipelineConfig,
        boundary: BoundaryConfig,
        vision: Arc<dyn VisionCapability>,
    ) -> Result<Self> {
        config.validate()?;
        info!(mode = ?config.mode, vision = vision.name(), "Pipeline configured");
        Ok(Self {
            config,
            detector: BoundaryDetector::new(boundary),
            vision,
        })
    }

    /// Build a pipeline with the best vision capability compiled in.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        Self::new(
            config.pipeline.clone(),
            config.boundary.clone(),
            default_vision(&config.boundary),
        )
    }

    // -- Accessors ------------------------------------------------------------

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mode(&self) -> PipelineMode {
        self.config.mode
    }

    pub fn detector(&self) -> &BoundaryDetector {
        &self.detector
    }

    pub fn vision(&self) -> &Arc<dyn VisionCapability> {
        &self.vision
    }

    // -- One-shot runs --------------------------------------------------------

    /// Decode compressed image bytes and run the configured mode.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn process_bytes(&self, data: &[u8]) -> Result<PipelineResult> {
        let buf = PixelBuffer::from_bytes(data)?;
        self.run(buf)
    }

    /// Run the configured mode end to end with zero margins.
    #[instrument(skip(self, buf), fields(mode = ?self.config.mode, width = buf.width(), height = buf.height()))]
    pub fn run(&self, buf: PixelBuffer) -> Result<PipelineResult> {
        let result = match self.config.mode {
            PipelineMode::SinglePass => self.run_single_pass(buf),
            PipelineMode::FullFourStage => self.run_full_four_stage(buf)?,
            PipelineMode::DetectAdjustFinalize => {
                let session = self.start_session(buf);
                self.apply_final_processing(&session)?
            }
        };
        info!(
            width = result.width,
            height = result.height,
            brightness = result.metrics.brightness,
            sharpness = result.metrics.sharpness,
            "Pipeline run complete"
        );
        Ok(result)
    }

    fn run_single_pass(&self, buf: PixelBuffer) -> PipelineResult {
        let toned = self.tone(self.prepare(buf));
        PipelineResult::from_raster(self.binarize(toned))
    }

    fn run_full_four_stage(&self, buf: PixelBuffer) -> Result<PipelineResult> {
        let toned = self.tone(self.prepare(buf));
        let rect = self.vision.detect_boundary(&toned, &self.detector);
        let cropped = crop(&toned, rect)?;
        drop(toned);
        Ok(PipelineResult::from_raster(self.binarize(cropped)))
    }

    // -- Detect → adjust → finalize ------------------------------------------

    /// Locate the document region in an image.
    ///
    /// Works on a grayscale, tone-normalized copy; the input is untouched.
    #[instrument(skip_all, fields(width = buf.width(), height = buf.height()))]
    pub fn detect_boundary(&self, buf: &PixelBuffer) -> Rect {
        let toned = normalize(grayscale(buf.clone()));
        self.vision.detect_boundary(&toned, &self.detector)
    }

    /// Decode an image and detect its boundary for review.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn load_image(&self, data: &[u8]) -> Result<AdjustSession> {
        let buf = PixelBuffer::from_bytes(data)?;
        Ok(self.start_session(buf))
    }

    /// Detect the boundary of an already-decoded image for review.
    pub fn start_session(&self, buf: PixelBuffer) -> AdjustSession {
        let original = self.prepare(buf);
        let detected = self.detect_boundary(&original);
        debug!(%detected, "Adjust session started");
        AdjustSession {
            original,
            detected,
            margins: MarginAdjustment::default(),
        }
    }

    /// Cheap preview of the current crop: grayscale, optional normalize and
    /// threshold on the cropped region only.
    ///
    /// A degenerate crop is a recoverable error; keep showing the last preview.
    pub fn preview(&self, session: &AdjustSession) -> Result<PixelBuffer> {
        let cropped = crop(&session.original, session.current_rect())?;
        let toned = self.tone(cropped);
        Ok(adaptive_threshold(toned, self.config.block_size, self.config.c))
    }

    /// Commit the current crop: crop, grayscale, threshold, metrics.
    #[instrument(skip_all, fields(rect = %session.current_rect()))]
    pub fn apply_final_processing(&self, session: &AdjustSession) -> Result<PipelineResult> {
        let cropped = crop(&session.original, session.current_rect())?;
        let gray = grayscale(cropped);
        Ok(PipelineResult::from_raster(self.binarize(gray)))
    }

    // -- Live frames ----------------------------------------------------------

    /// Quality report for a live frame, using this pipeline's vision and
    /// boundary settings.
    pub fn quality_report(&self, frame: &PixelBuffer) -> QualityReport {
        assist::quality_report(frame, self.vision.as_ref(), &self.detector)
    }

    /// A fresh capture gate sharing this pipeline's vision capability.
    pub fn prefilter_gate(&self, config: PreFilterConfig) -> PreFilterGate {
        PreFilterGate::new(config, Arc::clone(&self.vision))
    }

    // -- Stages ---------------------------------------------------------------

    fn prepare(&self, buf: PixelBuffer) -> PixelBuffer {
        match self.config.max_dimension {
            Some(max) => buf.fit_within(max, max),
            None => buf,
        }
    }

    fn tone(&self, buf: PixelBuffer) -> PixelBuffer {
        let gray = grayscale(buf);
        let toned = if self.config.auto_contrast {
            normalize(gray)
        } else {
            gray
        };
        match self.config.contrast_boost {
            Some(factor) => enhance_contrast(toned, factor),
            None => toned,
        }
    }

    fn binarize(&self, buf: PixelBuffer) -> PixelBuffer {
        let buf = match self.config.sharpen {
            Some(strength) => sharpen(buf, strength),
            None => buf,
        };
        let binary = adaptive_threshold(buf, self.config.block_size, self.config.c);
        if self.config.morph_close {
            morph_close(binary, self.config.morph_kernel)
        } else {
            binary
        }
    }
}
