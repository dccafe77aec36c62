// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Morphology — square max/min filters over luma for cleaning binarized output.

use tracing::instrument;

use crate::image::PixelBuffer;
use crate::image::buffer::to_byte;

#[derive(Debug, Clone, Copy)]
enum Extremum {
    Max,
    Min,
}

impl Extremum {
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Max => a.max(b),
            Extremum::Min => a.min(b),
        }
    }
}

/// `k x k` max filter over luma. Out-of-bounds samples are skipped, so the
/// window shrinks at the borders. Output is opaque gray.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn dilate(buf: PixelBuffer, k: u32) -> PixelBuffer {
    square_filter(buf, k, Extremum::Max)
}

/// `k x k` min filter over luma, border handling as in [`dilate`].
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn erode(buf: PixelBuffer, k: u32) -> PixelBuffer {
    square_filter(buf, k, Extremum::Min)
}

/// Closing: dilate then erode. Fills holes and gaps narrower than `k`.
pub fn morph_close(buf: PixelBuffer, k: u32) -> PixelBuffer {
    erode(dilate(buf, k), k)
}

/// A clipped square window is the product of two clipped 1-D windows, so the
/// filter runs as a horizontal pass followed by a vertical pass.
fn square_filter(mut buf: PixelBuffer, k: u32, op: Extremum) -> PixelBuffer {
    let (w, h) = (buf.width() as usize, buf.height() as usize);
    let half = (k / 2) as usize;
    let plane: Vec<u8> = buf.luma_plane().into_iter().map(to_byte).collect();

    let mut horizontal = vec![0u8; w * h];
    for y in 0..h {
        let row = &plane[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(half);
            let hi = (x + half).min(w - 1);
            horizontal[y * w + x] = row[lo..=hi].iter().copied().fold(row[x], |a, b| op.pick(a, b));
        }
    }

    let data = buf.as_raw_mut();
    for x in 0..w {
        for y in 0..h {
            let lo = y.saturating_sub(half);
            let hi = (y + half).min(h - 1);
            let mut value = horizontal[y * w + x];
            for ny in lo..=hi {
                value = op.pick(value, horizontal[ny * w + x]);
            }
            let idx = (y * w + x) * 4;
            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value;
            data[idx + 3] = 255;
        }
    }
    buf
}
