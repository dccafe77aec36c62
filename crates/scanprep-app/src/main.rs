// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanprep — command-line receipt/invoice normaliser
//
// Entry point. Initialises logging, loads settings, runs the document
// pipeline on one image and writes the binarized JPEG plus a JSON summary.

mod cli;

use std::process::ExitCode;

use scanprep_core::{PipelineConfig, PipelineMode, QualityMetrics, Rect, ScanConfig};
use scanprep_document::{Pipeline, PipelineResult, PixelBuffer};
use serde::Serialize;

use cli::{Args, CliError, USAGE};

/// What gets printed to stdout after a successful run.
#[derive(Debug, Serialize)]
struct Summary {
    mode: PipelineMode,
    vision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    crop: Option<Rect>,
    width: u32,
    height: u32,
    metrics: QualityMetrics,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse(std::env::args().skip(1)).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(error = %e, "scanprep failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(mode) = args.mode {
        // Switching mode picks that mode's preset but keeps explicit settings
        // that are not part of the preset.
        let keep = config.pipeline.clone();
        config.pipeline = PipelineConfig {
            contrast_boost: keep.contrast_boost,
            sharpen: keep.sharpen,
            max_dimension: keep.max_dimension,
            jpeg_quality: keep.jpeg_quality,
            ..PipelineConfig::for_mode(mode)
        };
    }
    if let Some(quality) = args.quality {
        config.pipeline.jpeg_quality = quality;
    }

    let pipeline = Pipeline::from_config(&config)?;
    let input = PixelBuffer::open(&args.input)?;
    tracing::info!(
        path = %args.input.display(),
        width = input.width(),
        height = input.height(),
        "Input loaded"
    );

    if args.report {
        let report = pipeline.quality_report(&input);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let (result, crop) = match pipeline.mode() {
        PipelineMode::DetectAdjustFinalize => {
            let mut session = pipeline.start_session(input);
            if let Some(margins) = args.margins {
                session.set_margins(margins);
            }
            let rect = session.current_rect();
            (pipeline.apply_final_processing(&session)?, Some(rect))
        }
        _ => {
            if args.margins.is_some() {
                tracing::warn!("--margins only applies to adjust mode; ignoring");
            }
            (pipeline.run(input)?, None)
        }
    };

    write_output(&args, &config, &result)?;

    let summary = Summary {
        mode: pipeline.mode(),
        vision: pipeline.vision().name().to_string(),
        crop,
        width: result.width,
        height: result.height,
        metrics: result.metrics,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn write_output(args: &Args, config: &ScanConfig, result: &PipelineResult) -> Result<(), CliError> {
    let Some(path) = &args.output else {
        return Ok(());
    };
    result.raster.save(path, config.pipeline.jpeg_quality)?;
    tracing::info!(path = %path.display(), "Output written");
    Ok(())
}
