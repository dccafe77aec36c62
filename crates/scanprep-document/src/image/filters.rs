// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Statistical filters — grayscale reduction, mean/stddev tone normalization,
// contrast and sharpening adjustments, and the cheap per-frame quality metrics.

use scanprep_core::QualityMetrics;
use tracing::{debug, instrument};

use super::buffer::{PixelBuffer, luma, to_byte};

/// Target standard deviation after normalization.
const NORMALIZE_SPREAD: f64 = 40.0;
/// Target mean after normalization.
const NORMALIZE_CENTER: f64 = 128.0;
/// Luma step between neighbours that counts as an edge in [`edge_density`].
const EDGE_STEP: f64 = 30.0;

/// Replace R, G and B with the pixel's luma. Alpha is untouched.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn grayscale(mut buf: PixelBuffer) -> PixelBuffer {
    for px in buf.as_raw_mut().chunks_exact_mut(4) {
        let y = to_byte(luma(px[0], px[1], px[2]));
        px[0] = y;
        px[1] = y;
        px[2] = y;
    }
    buf
}

/// Recentre the R channel to mean 128 and stddev 40, writing the result to
/// R, G and B.
///
/// Expects a grayscale buffer. A flat image (stddev 0) is treated as having
/// stddev 1, so every pixel lands on 128.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn normalize(mut buf: PixelBuffer) -> PixelBuffer {
    let n = buf.len();
    if n == 0 {
        return buf;
    }

    let (sum, sum_sq) = buf
        .as_raw()
        .chunks_exact(4)
        .fold((0.0f64, 0.0f64), |(s, sq), px| {
            let v = px[0] as f64;
            (s + v, sq + v * v)
        });
    let mean = sum / n as f64;
    let variance = sum_sq / n as f64 - mean * mean;
    let mut std_dev = variance.max(0.0).sqrt();
    if !std_dev.is_finite() || std_dev == 0.0 {
        std_dev = 1.0;
    }
    debug!(mean, std_dev, "Normalizing tone");

    for px in buf.as_raw_mut().chunks_exact_mut(4) {
        let v = (px[0] as f64 - mean) / std_dev * NORMALIZE_SPREAD + NORMALIZE_CENTER;
        let v = to_byte(v);
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
    buf
}

/// Stretch RGB around mid-gray: `128 + (v - 128) * factor`.
pub fn enhance_contrast(mut buf: PixelBuffer, factor: f32) -> PixelBuffer {
    let factor = factor as f64;
    for px in buf.as_raw_mut().chunks_exact_mut(4) {
        for channel in px.iter_mut().take(3) {
            *channel = to_byte(128.0 + (*channel as f64 - 128.0) * factor);
        }
    }
    buf
}

/// Mild 3x3 sharpen over luma with kernel `[0,-1,0; -1,4s,-1; 0,-1,0]`.
///
/// The outermost ring of pixels is left as it was.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn sharpen(mut buf: PixelBuffer, strength: f32) -> PixelBuffer {
    let (w, h) = (buf.width() as usize, buf.height() as usize);
    if w < 3 || h < 3 {
        return buf;
    }
    let plane = buf.luma_plane();
    let center = 4.0 * strength as f64;
    let data = buf.as_raw_mut();

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let sum = plane[i] * center
                - plane[i - w]
                - plane[i + w]
                - plane[i - 1]
                - plane[i + 1];
            let v = to_byte(sum);
            let o = i * 4;
            data[o] = v;
            data[o + 1] = v;
            data[o + 2] = v;
        }
    }
    buf
}

/// Brightness (mean luma) and sharpness (mean absolute difference between each
/// pixel and the one directly below it), both rounded.
///
/// The sharpness sum covers every pixel with a row beneath it but is divided
/// by the total pixel count, so the last row contributes zero.
pub fn calculate_metrics(buf: &PixelBuffer) -> QualityMetrics {
    let n = buf.len();
    if n == 0 {
        return QualityMetrics {
            brightness: 0,
            sharpness: 0,
            contrast: None,
        };
    }

    let plane = buf.luma_plane();
    let w = buf.width() as usize;

    let brightness = plane.iter().sum::<f64>() / n as f64;
    let gradient: f64 = plane
        .iter()
        .zip(plane.iter().skip(w))
        .map(|(a, b)| (a - b).abs())
        .sum();
    let sharpness = gradient / n as f64;

    QualityMetrics {
        brightness: brightness.round() as u32,
        sharpness: sharpness.round() as u32,
        contrast: None,
    }
}

/// Luma standard deviation around the rounded mean, as a 0..=100 score
/// (`stddev / 128 * 100`).
pub fn calculate_contrast(buf: &PixelBuffer) -> u32 {
    let n = buf.len();
    if n == 0 {
        return 0;
    }
    let plane = buf.luma_plane();
    let mean = (plane.iter().sum::<f64>() / n as f64).round();
    let variance = plane.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let score = (variance.sqrt() / 128.0 * 100.0).round();
    score.min(100.0) as u32
}

/// Percentage (0..=100) of horizontally adjacent pixel pairs whose luma
/// differs by more than 30. A sharpness estimate that needs no convolution.
pub fn edge_density(buf: &PixelBuffer) -> u32 {
    let n = buf.len();
    if n == 0 {
        return 0;
    }
    let w = buf.width() as usize;
    let plane = buf.luma_plane();
    let edges = plane
        .chunks_exact(w)
        .flat_map(|row| row.windows(2))
        .filter(|pair| (pair[0] - pair[1]).abs() > EDGE_STEP)
        .count();
    ((edges as f64 / n as f64) * 100.0).round().min(100.0) as u32
}

/// Fraction of pixels whose R, G and B all exceed `threshold`.
pub fn white_ratio(buf: &PixelBuffer, threshold: u8) -> f64 {
    let n = buf.len();
    if n == 0 {
        return 0.0;
    }
    let white = buf
        .as_raw()
        .chunks_exact(4)
        .filter(|px| px[0] > threshold && px[1] > threshold && px[2] > threshold)
        .count();
    white as f64 / n as f64
}
