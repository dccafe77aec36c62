// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the scanprep-document crate: the integral-image
// threshold on its own, boundary detection, and a full four-stage run on a
// phone-sized synthetic receipt.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use scanprep_core::{BoundaryConfig, PipelineConfig, Rect};
use scanprep_document::scan::binarize::adaptive_threshold;
use scanprep_document::scan::vision::default_vision;
use scanprep_document::{BoundaryDetector, PixelBuffer, Pipeline};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Light paper with dark "text" lines on a darker table, `width` x `height`.
fn synthetic_receipt(width: u32, height: u32) -> PixelBuffer {
    let paper = Rect::new(
        width as i32 / 4,
        height as i32 / 8,
        width as i32 / 2,
        height as i32 * 3 / 4,
    );
    let mut buf = PixelBuffer::from_pixel(width, height, [60, 50, 45, 255]);
    for y in paper.y..paper.bottom() {
        let text_row = (y - paper.y) % 24 < 6;
        for x in paper.x..paper.right() {
            let v = if text_row && (x / 7) % 3 != 0 { 30 } else { 235 };
            let i = ((y as u32 * width + x as u32) * 4) as usize;
            buf.as_raw_mut()[i..i + 3].copy_from_slice(&[v, v, v]);
        }
    }
    buf
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Adaptive threshold on a 1024x768 image; cost should not depend on block size.
fn bench_adaptive_threshold(c: &mut Criterion) {
    let buf = synthetic_receipt(1024, 768);
    for block_size in [11u32, 21, 51] {
        c.bench_function(&format!("adaptive_threshold (1024x768, block {})", block_size), |b| {
            b.iter(|| black_box(adaptive_threshold(black_box(buf.clone()), block_size, 7)));
        });
    }
}

/// Boundary detection with whichever vision capability is compiled in.
fn bench_boundary_detection(c: &mut Criterion) {
    let buf = synthetic_receipt(800, 600);
    let config = BoundaryConfig::default();
    let vision = default_vision(&config);
    let detector = BoundaryDetector::new(config);

    c.bench_function(&format!("detect_boundary (800x600, {})", vision.name()), |b| {
        b.iter(|| black_box(vision.detect_boundary(black_box(&buf), &detector)));
    });
}

/// Full-four-stage run on a 1600x1200 photo, which is first fitted to 2048.
fn bench_full_pipeline(c: &mut Criterion) {
    let buf = synthetic_receipt(1600, 1200);
    let boundary = BoundaryConfig::default();
    let pipeline = Pipeline::new(
        PipelineConfig::full_four_stage(),
        boundary.clone(),
        default_vision(&boundary),
    )
    .expect("default config is valid");

    c.bench_function("pipeline full_four_stage (1600x1200)", |b| {
        b.iter(|| black_box(pipeline.run(black_box(buf.clone())).expect("run")));
    });
}

criterion_group!(
    benches,
    bench_adaptive_threshold,
    bench_boundary_detection,
    bench_full_pipeline
);
criterion_main!(benches);
