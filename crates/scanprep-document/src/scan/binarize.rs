// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization — integral-image adaptive thresholding and the Sobel edge map
// used to feed boundary detection.

use tracing::{debug, info, instrument};

use crate::image::PixelBuffer;

/// Sobel gradient magnitude above which a pixel is an edge.
const EDGE_THRESHOLD: f64 = 128.0;

const SOBEL_X: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
const SOBEL_Y: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

/// Summed-area table over the R channel of an RGBA buffer.
///
/// The table is `(width+1) x (height+1)` with a zero row and column, so
/// `sum[(y+1)*(width+1) + (x+1)]` is the sum of all samples in `[0..=x] x [0..=y]`.
pub struct IntegralImage {
    table: Vec<u64>,
    width: usize,
    height: usize,
}

impl IntegralImage {
    /// Build the table in one pass.
    pub fn from_red_channel(buf: &PixelBuffer) -> Self {
        let (width, height) = (buf.width() as usize, buf.height() as usize);
        let stride = width + 1;
        let mut table = vec![0u64; stride * (height + 1)];
        let data = buf.as_raw();

        for y in 0..height {
            let mut row_sum: u64 = 0;
            for x in 0..width {
                row_sum += data[(y * width + x) * 4] as u64;
                table[(y + 1) * stride + x + 1] = row_sum + table[y * stride + x + 1];
            }
        }

        Self {
            table,
            width,
            height,
        }
    }

    /// Sum and sample count of the square window of half-size `half` centred
    /// on `(cx, cy)`, clipped to the image.
    pub fn window_sum(&self, cx: usize, cy: usize, half: usize) -> (u64, u64) {
        let stride = self.width + 1;
        let x1 = cx.saturating_sub(half);
        let y1 = cy.saturating_sub(half);
        let x2 = (cx + half + 1).min(self.width);
        let y2 = (cy + half + 1).min(self.height);

        let sum = self.table[y2 * stride + x2] + self.table[y1 * stride + x1]
            - self.table[y1 * stride + x2]
            - self.table[y2 * stride + x1];
        let area = (x2.saturating_sub(x1) * y2.saturating_sub(y1)) as u64;
        (sum, area)
    }

    /// Mean of the window, or mid-gray for an empty window.
    pub fn window_mean(&self, cx: usize, cy: usize, half: usize) -> f64 {
        let (sum, area) = self.window_sum(cx, cy, half);
        if area == 0 {
            return 128.0;
        }
        sum as f64 / area as f64
    }
}

/// Local adaptive threshold over the R channel.
///
/// Each pixel is compared against the mean of the `block_size x block_size`
/// window around it (half-window `block_size / 2`, clipped at the borders)
/// minus `c`. Darker pixels become black, the rest white; output is opaque.
///
/// Expects a grayscale buffer; colour inputs are thresholded on red only.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn adaptive_threshold(mut buf: PixelBuffer, block_size: u32, c: i32) -> PixelBuffer {
    info!(block_size, c, "Applying adaptive threshold");

    let integral = IntegralImage::from_red_channel(&buf);
    let (width, height) = (buf.width() as usize, buf.height() as usize);
    let half = (block_size / 2) as usize;
    let c = c as f64;
    let data = buf.as_raw_mut();

    for y in 0..height {
        for x in 0..width {
            let mean = integral.window_mean(x, y, half);
            let idx = (y * width + x) * 4;
            let value = if (data[idx] as f64) < mean - c { 0 } else { 255 };
            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value;
            data[idx + 3] = 255;
        }
    }

    debug!("Adaptive threshold complete");
    buf
}

/// Binary Sobel edge map over luma.
///
/// Interior pixels whose gradient magnitude exceeds 128 become white, the rest
/// black. The outermost ring has no full neighbourhood and is left black.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn detect_edges(buf: &PixelBuffer) -> PixelBuffer {
    let (w, h) = (buf.width() as usize, buf.height() as usize);
    let mut output = PixelBuffer::from_pixel(buf.width(), buf.height(), [0, 0, 0, 255]);
    if w < 3 || h < 3 {
        return output;
    }

    let plane = buf.luma_plane();
    let out = output.as_raw_mut();
    let mut edge_count = 0usize;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut gx = 0.0;
            let mut gy = 0.0;
            let mut k = 0;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    let v = plane[ny * w + nx];
                    gx += v * SOBEL_X[k] as f64;
                    gy += v * SOBEL_Y[k] as f64;
                    k += 1;
                }
            }
            if (gx * gx + gy * gy).sqrt() > EDGE_THRESHOLD {
                let idx = (y * w + x) * 4;
                out[idx] = 255;
                out[idx + 1] = 255;
                out[idx + 2] = 255;
                edge_count += 1;
            }
        }
    }

    debug!(edge_count, "Sobel edge detection complete");
    output
}
