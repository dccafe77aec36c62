// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the `scanprep` binary.

use std::path::PathBuf;

use scanprep_core::{MarginAdjustment, PipelineMode, ScanError};

pub const USAGE: &str = "\
usage: scanprep <input> <output.jpg> [options]
       scanprep --report <input>

options:
  --mode <single|adjust|full>   pipeline mode (default: from config, else single)
  --config <file.json>          load settings from a JSON file
  --margins <t,b,l,r>           margin adjustment in pixels (adjust mode)
  --quality <1-100>             JPEG quality (default: from config, else 90)
  --report                      print a capture quality report and exit";

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub mode: Option<PipelineMode>,
    pub config: Option<PathBuf>,
    pub margins: Option<MarginAdjustment>,
    pub quality: Option<u8>,
    pub report: bool,
}

impl Args {
    /// Parse everything after the program name.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut positional = Vec::new();
        let mut mode = None;
        let mut config = None;
        let mut margins = None;
        let mut quality = None;
        let mut report = false;

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--report" => report = true,
                "--mode" => {
                    let value = value_for(&mut iter, "--mode")?;
                    mode = Some(PipelineMode::from_name(&value).ok_or_else(|| {
                        CliError::Usage(format!("unknown mode '{}'", value))
                    })?);
                }
                "--config" => config = Some(PathBuf::from(value_for(&mut iter, "--config")?)),
                "--margins" => margins = Some(parse_margins(&value_for(&mut iter, "--margins")?)?),
                "--quality" => {
                    let value = value_for(&mut iter, "--quality")?;
                    quality = Some(value.parse().map_err(|_| {
                        CliError::Usage(format!("invalid quality '{}'", value))
                    })?);
                }
                "-h" | "--help" => return Err(CliError::Usage("help requested".into())),
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("unknown option '{}'", flag)));
                }
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        let mut positional = positional.into_iter();
        let input = positional
            .next()
            .ok_or_else(|| CliError::Usage("missing input image".into()))?;
        let output = positional.next();
        if output.is_none() && !report {
            return Err(CliError::Usage("missing output path".into()));
        }
        if let Some(extra) = positional.next() {
            return Err(CliError::Usage(format!(
                "unexpected argument '{}'",
                extra.display()
            )));
        }

        Ok(Self {
            input,
            output,
            mode,
            config,
            margins,
            quality,
            report,
        })
    }
}

fn value_for(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, CliError> {
    iter.next()
        .ok_or_else(|| CliError::Usage(format!("{} needs a value", flag)))
}

/// `top,bottom,left,right`, each a signed pixel offset.
fn parse_margins(value: &str) -> Result<MarginAdjustment, CliError> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CliError::Usage(format!("invalid margins '{}'", value)))?;
    match parts.as_slice() {
        [top, bottom, left, right] => Ok(MarginAdjustment::new(*top, *bottom, *left, *right)),
        _ => Err(CliError::Usage(format!(
            "margins need four values (top,bottom,left,right), got '{}'",
            value
        ))),
    }
}
