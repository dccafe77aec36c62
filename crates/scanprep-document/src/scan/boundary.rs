// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary detection — turns candidate blob rectangles into one document
// region by filtering, merging overlapping fragments, and stacking text
// blocks that share a horizontal extent.

use scanprep_core::{BoundaryConfig, Rect};
use tracing::{debug, info, instrument, warn};

/// Merge overlapping (or touching) rectangles into their unions until no two
/// results overlap.
///
/// The fixed point does not depend on input order; the output is sorted so
/// that equal sets compare equal.
pub fn merge_overlapping_rects(rects: &[Rect]) -> Vec<Rect> {
    let mut merged: Vec<Rect> = rects.iter().copied().filter(|r| !r.is_degenerate()).collect();

    loop {
        let mut changed = false;
        let mut i = 0;
        while i < merged.len() {
            let mut j = i + 1;
            while j < merged.len() {
                if merged[i].overlaps(&merged[j]) {
                    let other = merged.swap_remove(j);
                    merged[i] = merged[i].union(&other);
                    changed = true;
                    // merged[i] grew; rescan its partners.
                    j = i + 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        if !changed {
            break;
        }
    }

    merged.sort_unstable();
    merged
}

/// Pick the largest rectangle as an anchor and return the union of every
/// rectangle whose horizontal span overlaps the anchor's.
///
/// Assumes a portrait document whose separate text blocks stack vertically
/// within one column. Side-by-side columns outside the anchor's span are
/// dropped.
pub fn select_boundary(rects: &[Rect]) -> Option<Rect> {
    let anchor = rects
        .iter()
        .copied()
        .reduce(|best, r| if r.area() > best.area() { r } else { best })?;

    rects
        .iter()
        .filter(|r| anchor.overlaps_horizontally(r))
        .copied()
        .reduce(|acc, r| acc.union(&r))
}

/// Locates the document region from candidate blob rectangles.
#[derive(Debug, Clone, Default)]
pub struct BoundaryDetector {
    config: BoundaryConfig,
}

impl BoundaryDetector {
    pub fn new(config: BoundaryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    /// Drop candidates that are too small or hug the image border.
    pub fn filter_candidates(&self, candidates: &[Rect], width: u32, height: u32) -> Vec<Rect> {
        let margin_x = (width as f32 * self.config.border_margin_ratio).round() as i32;
        let margin_y = (height as f32 * self.config.border_margin_ratio).round() as i32;
        let (w, h) = (width as i32, height as i32);
        let min_area = self.config.min_area as i64;

        candidates
            .iter()
            .copied()
            .filter(|r| r.area() >= min_area && r.area() > 0)
            .filter(|r| {
                r.x >= margin_x
                    && r.y >= margin_y
                    && r.right() <= w - margin_x
                    && r.bottom() <= h - margin_y
            })
            .collect()
    }

    /// The centred rectangle used when nothing usable was detected.
    pub fn fallback(&self, width: u32, height: u32) -> Rect {
        Rect::centered(width, height, self.config.fallback_fraction)
    }

    /// Reduce candidates to one in-bounds, non-empty rectangle, or `None`
    /// when nothing survives filtering.
    pub fn detect_candidates(&self, candidates: &[Rect], width: u32, height: u32) -> Option<Rect> {
        let kept = self.filter_candidates(candidates, width, height);
        let merged = merge_overlapping_rects(&kept);
        debug!(kept = kept.len(), merged = merged.len(), "Candidates merged");

        select_boundary(&merged)
            .map(|r| r.clamp_to(width, height))
            .filter(|r| !r.is_degenerate())
    }

    /// Like [`BoundaryDetector::detect_candidates`], but always returns a
    /// rectangle: the centred fallback stands in when nothing was found.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub fn detect(&self, candidates: &[Rect], width: u32, height: u32) -> Rect {
        match self.detect_candidates(candidates, width, height) {
            Some(rect) => {
                info!(%rect, "Boundary detected");
                rect
            }
            None => {
                let rect = self.fallback(width, height);
                warn!(%rect, "No usable boundary candidates; using centred fallback");
                rect
            }
        }
    }
}
