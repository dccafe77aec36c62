// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop engine — margin adjustment of a detected rectangle and clamped
// sub-image extraction.

use scanprep_core::error::{Result, ScanError};
use scanprep_core::{MarginAdjustment, Rect};
use tracing::{debug, instrument};

use crate::image::PixelBuffer;

/// Apply user margins to a detected rectangle.
///
/// The origin is clamped at zero and the size at the image's far edges, so
/// zero margins on an in-bounds rectangle return it unchanged. The result may
/// still be degenerate if the margins collapse it.
pub fn current_rect(
    detected: Rect,
    margins: MarginAdjustment,
    image_width: u32,
    image_height: u32,
) -> Rect {
    let x = detected.x.saturating_add(margins.left).max(0);
    let y = detected.y.saturating_add(margins.top).max(0);
    let room_x = (image_width.min(i32::MAX as u32) as i32).saturating_sub(x);
    let room_y = (image_height.min(i32::MAX as u32) as i32).saturating_sub(y);
    let width = room_x.min(
        detected
            .width
            .saturating_sub(margins.left)
            .saturating_add(margins.right),
    );
    let height = room_y.min(
        detected
            .height
            .saturating_sub(margins.top)
            .saturating_add(margins.bottom),
    );
    Rect::new(x, y, width, height)
}

/// Copy the sub-rectangle `rect` (clamped to the buffer) into a new buffer.
///
/// Fails with [`ScanError::DegenerateCrop`] when nothing of the rectangle
/// lies inside the buffer; callers keep their previous result.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height(), %rect))]
pub fn crop(buf: &PixelBuffer, rect: Rect) -> Result<PixelBuffer> {
    let clamped = rect.clamp_to(buf.width(), buf.height());
    if rect.is_degenerate() || clamped.is_degenerate() {
        return Err(ScanError::DegenerateCrop {
            width: clamped.width.min(rect.width) as i64,
            height: clamped.height.min(rect.height) as i64,
        });
    }

    let view = image::imageops::crop_imm(
        buf.as_image(),
        clamped.x as u32,
        clamped.y as u32,
        clamped.width as u32,
        clamped.height as u32,
    );
    debug!(%clamped, "Cropped");
    Ok(PixelBuffer::from_image(view.to_image()))
}
