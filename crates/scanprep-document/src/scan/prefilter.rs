// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live-frame capture gate. Decides when a stream of camera frames has shown a
// stable, well-exposed, paper-like scene for long enough to auto-capture,
// then holds off for a cooldown period.

use std::sync::Arc;

use scanprep_core::PreFilterConfig;
use tracing::{debug, info, trace};

use crate::image::PixelBuffer;
use crate::image::filters::{calculate_metrics, white_ratio};
use crate::scan::vision::VisionCapability;

/// Observable phase of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No consecutive passing frames.
    Idle,
    /// This many consecutive passing frames so far.
    Accumulating(u32),
    /// This many more frames will be ignored.
    Cooldown(u32),
}

/// Stateful hysteresis gate over live frames.
///
/// One gate lives for one capture session. Frames are borrowed for the
/// duration of [`PreFilterGate::feed`] only.
pub struct PreFilterGate {
    config: PreFilterConfig,
    vision: Arc<dyn VisionCapability>,
    hit_count: u32,
    cooldown: u32,
}

impl PreFilterGate {
    pub fn new(config: PreFilterConfig, vision: Arc<dyn VisionCapability>) -> Self {
        Self {
            config,
            vision,
            hit_count: 0,
            cooldown: 0,
        }
    }

    pub fn config(&self) -> &PreFilterConfig {
        &self.config
    }

    pub fn state(&self) -> GateState {
        if self.cooldown > 0 {
            GateState::Cooldown(self.cooldown)
        } else if self.hit_count > 0 {
            GateState::Accumulating(self.hit_count)
        } else {
            GateState::Idle
        }
    }

    /// Forget any progress and cooldown.
    pub fn reset(&mut self) {
        self.hit_count = 0;
        self.cooldown = 0;
    }

    /// Consider one frame. Returns `true` exactly when the caller should
    /// capture now.
    pub fn feed(&mut self, frame: &PixelBuffer) -> bool {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            trace!(remaining = self.cooldown, "Gate cooling down");
            return false;
        }

        if !self.basic_check(frame) {
            self.hit_count = 0;
            return false;
        }

        if self.looks_like_document(frame) {
            self.hit_count += 1;
        } else {
            self.hit_count = 0;
        }
        debug!(hit_count = self.hit_count, "Frame evaluated");

        if self.hit_count >= self.config.stable_frames {
            self.hit_count = 0;
            self.cooldown = self.config.cooldown_frames;
            info!(cooldown = self.cooldown, "Capture triggered");
            return true;
        }
        false
    }

    /// Exposure within bounds and, when measurable, enough Laplacian energy.
    fn basic_check(&self, frame: &PixelBuffer) -> bool {
        let brightness = calculate_metrics(frame).brightness;
        if brightness < self.config.min_brightness || brightness > self.config.max_brightness {
            trace!(brightness, "Frame exposure out of range");
            return false;
        }
        match self.vision.laplacian_variance(frame) {
            Some(variance) if variance < self.config.min_sharpness => {
                trace!(variance, "Frame too blurry");
                false
            }
            _ => true,
        }
    }

    /// Enough near-white pixels to be paper.
    fn looks_like_document(&self, frame: &PixelBuffer) -> bool {
        white_ratio(frame, self.config.white_threshold) >= self.config.min_white_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::vision::FallbackVision;

    /// Vision stub reporting a fixed Laplacian variance.
    struct FixedSharpness(f64);

    impl VisionCapability for FixedSharpness {
        fn name(&self) -> &str {
            "fixed"
        }
        fn boundary_candidates(&self, _frame: &PixelBuffer) -> Vec<scanprep_core::Rect> {
            Vec::new()
        }
        fn laplacian_variance(&self, _frame: &PixelBuffer) -> Option<f64> {
            Some(self.0)
        }
    }

    /// Mostly white paper with a dark strip, brightness inside the window.
    fn paper_frame() -> PixelBuffer {
        let mut frame = PixelBuffer::from_pixel(20, 20, [230, 230, 230, 255]);
        for px in frame.as_raw_mut().chunks_exact_mut(4).take(120) {
            px[..3].copy_from_slice(&[40, 40, 40]);
        }
        frame
    }

    fn gate() -> PreFilterGate {
        PreFilterGate::new(PreFilterConfig::default(), Arc::new(FallbackVision))
    }

    #[test]
    fn triggers_once_after_stable_frames() {
        let mut gate = gate();
        let frame = paper_frame();
        let results: Vec<bool> = (0..5).map(|_| gate.feed(&frame)).collect();
        assert_eq!(results, vec![false, false, false, false, true]);
        assert_eq!(gate.state(), GateState::Cooldown(30));
    }

    #[test]
    fn cooldown_suppresses_retrigger() {
        let mut gate = gate();
        let frame = paper_frame();
        for _ in 0..5 {
            gate.feed(&frame);
        }
        // 30 cooldown frames, then 4 more to rebuild the count.
        for i in 0..34 {
            assert!(!gate.feed(&frame), "unexpected trigger at frame {}", i);
        }
        assert!(gate.feed(&frame));
    }

    #[test]
    fn reset_clears_cooldown() {
        let mut gate = gate();
        let frame = paper_frame();
        for _ in 0..5 {
            gate.feed(&frame);
        }
        assert_eq!(gate.state(), GateState::Cooldown(30));

        gate.reset();
        assert_eq!(gate.state(), GateState::Idle);
        // A fresh run of stable frames triggers again without waiting out the cooldown.
        assert_eq!((0..5).filter(|_| gate.feed(&frame)).count(), 1);
    }

    #[test]
    fn dark_frame_resets_progress() {
        let mut gate = gate();
        let paper = paper_frame();
        let dark = PixelBuffer::from_pixel(20, 20, [10, 10, 10, 255]);
        for _ in 0..4 {
            gate.feed(&paper);
        }
        assert_eq!(gate.state(), GateState::Accumulating(4));
        assert!(!gate.feed(&dark));
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn non_paper_frame_resets_progress() {
        let mut gate = gate();
        let gray = PixelBuffer::from_pixel(20, 20, [128, 128, 128, 255]);
        gate.feed(&paper_frame());
        assert!(!gate.feed(&gray));
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn blurry_frames_never_trigger() {
        let mut gate = PreFilterGate::new(
            PreFilterConfig::default(),
            Arc::new(FixedSharpness(10.0)),
        );
        let frame = paper_frame();
        assert!((0..20).all(|_| !gate.feed(&frame)));
    }

    #[test]
    fn sharp_frames_trigger_with_laplacian() {
        let mut gate = PreFilterGate::new(
            PreFilterConfig::default(),
            Arc::new(FixedSharpness(500.0)),
        );
        let frame = paper_frame();
        assert_eq!((0..5).filter(|_| gate.feed(&frame)).count(), 1);
    }
}
