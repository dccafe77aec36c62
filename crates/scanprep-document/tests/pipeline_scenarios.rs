// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end runs through the public API: encoded bytes in, binarized raster
// and metrics out.

use std::sync::Arc;

use scanprep_core::{
    BoundaryConfig, MarginAdjustment, PipelineConfig, PipelineMode, PreFilterConfig, Rect,
    ScanConfig, ScanError,
};
use scanprep_document::image::filters::calculate_metrics;
use scanprep_document::scan::crop::crop;
use scanprep_document::{FallbackVision, Pipeline, PixelBuffer};

fn fallback_pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::new(config, BoundaryConfig::default(), Arc::new(FallbackVision))
        .expect("valid config")
}

#[cfg(feature = "vision")]
fn white_block_on_black() -> PixelBuffer {
    let mut buf = PixelBuffer::from_pixel(400, 300, [0, 0, 0, 255]);
    for y in 125..175u32 {
        for x in 150..250u32 {
            let i = ((y * 400 + x) * 4) as usize;
            buf.as_raw_mut()[i..i + 3].copy_from_slice(&[255, 255, 255]);
        }
    }
    buf
}

#[cfg(feature = "vision")]
fn near(actual: i32, expected: i32, tolerance: i32) -> bool {
    (actual - expected).abs() <= tolerance
}

#[test]
fn uniform_gray_single_pass() {
    let input = PixelBuffer::from_pixel(400, 300, [128, 128, 128, 255]);
    let metrics = calculate_metrics(&input);
    assert_eq!(metrics.brightness, 128);
    assert_eq!(metrics.sharpness, 0);

    let png = input.to_png_bytes().expect("encode");
    let result = fallback_pipeline(PipelineConfig::single_pass())
        .process_bytes(&png)
        .expect("run");
    assert_eq!((result.width, result.height), (400, 300));
    // Nothing is darker than its neighbourhood, so the page comes out blank.
    assert_eq!(result.metrics.brightness, 255);
    assert_eq!(result.metrics.sharpness, 0);
    assert_eq!(result.metrics.contrast, Some(0));
}

#[test]
fn crop_overhang_clamps_to_image_edge() {
    let buf = PixelBuffer::from_pixel(400, 300, [50, 60, 70, 255]);
    let out = crop(&buf, Rect::new(350, 0, 100, 50)).expect("crop");
    assert_eq!(out.width(), 50);
    assert_eq!(out.height(), 50);
}

#[cfg(feature = "vision")]
#[test]
fn white_block_boundary_is_found() {
    let config = ScanConfig::default();
    let pipeline = Pipeline::from_config(&config).expect("default config");
    let rect = pipeline.detect_boundary(&white_block_on_black());
    assert!(near(rect.x, 150, 2) && near(rect.y, 125, 2), "{}", rect);
    assert!(near(rect.width, 100, 4) && near(rect.height, 50, 4), "{}", rect);
}

#[cfg(feature = "vision")]
#[test]
fn full_four_stage_crops_to_block() {
    let config = ScanConfig {
        pipeline: PipelineConfig::full_four_stage(),
        ..ScanConfig::default()
    };
    let pipeline = Pipeline::from_config(&config).expect("valid config");
    let result = pipeline.run(white_block_on_black()).expect("run");
    assert!(near(result.width as i32, 100, 4), "{}", result.width);
    assert!(near(result.height as i32, 50, 4), "{}", result.height);
}

#[test]
fn two_stage_session_with_margins() {
    let pipeline = fallback_pipeline(PipelineConfig::detect_adjust_finalize());
    let png = PixelBuffer::from_pixel(200, 100, [220, 215, 210, 255])
        .to_png_bytes()
        .expect("encode");

    let mut session = pipeline.load_image(&png).expect("load");
    assert_eq!(session.detected(), Rect::new(20, 10, 160, 80));

    session.set_margins(MarginAdjustment::new(-5, 5, -10, 10));
    assert_eq!(session.current_rect(), Rect::new(10, 5, 180, 90));

    let preview = pipeline.preview(&session).expect("preview");
    assert_eq!(preview.dimensions(), (180, 90));

    let result = pipeline.apply_final_processing(&session).expect("finalize");
    assert_eq!((result.width, result.height), (180, 90));
    let jpeg = result.to_jpeg_bytes(90).expect("jpeg");
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

#[test]
fn degenerate_margins_keep_session_alive() {
    let pipeline = fallback_pipeline(PipelineConfig::detect_adjust_finalize());
    let mut session = pipeline.start_session(PixelBuffer::from_pixel(200, 100, [200, 200, 200, 255]));
    let good = pipeline.apply_final_processing(&session).expect("finalize");

    session.set_margins(MarginAdjustment::new(90, -90, 0, 0));
    match pipeline.apply_final_processing(&session) {
        Err(err @ ScanError::DegenerateCrop { .. }) => assert!(err.is_recoverable()),
        other => panic!("expected a degenerate crop, got {:?}", other.map(|r| r.width)),
    }

    session.set_margins(MarginAdjustment::default());
    let again = pipeline.apply_final_processing(&session).expect("finalize");
    assert_eq!(again, good);
}

#[test]
fn config_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scanprep.json");

    let config = ScanConfig {
        pipeline: PipelineConfig {
            max_dimension: Some(128),
            ..PipelineConfig::for_mode(PipelineMode::FullFourStage)
        },
        ..ScanConfig::default()
    };
    config.save(&path).expect("save");

    let loaded = ScanConfig::load(&path).expect("load");
    let pipeline = Pipeline::from_config(&loaded).expect("valid config");
    assert_eq!(pipeline.mode(), PipelineMode::FullFourStage);

    let result = pipeline
        .run(PixelBuffer::from_pixel(512, 256, [180, 180, 180, 255]))
        .expect("run");
    assert!(result.width <= 128 && result.height <= 128);
}

#[test]
fn gate_from_pipeline_triggers_on_paper() {
    let pipeline = fallback_pipeline(PipelineConfig::single_pass());
    let mut gate = pipeline.prefilter_gate(PreFilterConfig {
        stable_frames: 3,
        cooldown_frames: 2,
        ..PreFilterConfig::default()
    });

    let mut paper = PixelBuffer::from_pixel(32, 32, [235, 235, 235, 255]);
    for px in paper.as_raw_mut().chunks_exact_mut(4).take(256) {
        px[..3].copy_from_slice(&[30, 30, 30]);
    }

    let fired: Vec<bool> = (0..8).map(|_| gate.feed(&paper)).collect();
    assert_eq!(
        fired,
        vec![false, false, true, false, false, false, false, true]
    );
}
