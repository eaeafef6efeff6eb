// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewash: post-process scanned sheets from the command line.
//
// Exit status: 0 on success, 1 for configuration errors, 2 when a sheet
// failed to load, process or save, 3 when the machine ran out of resources.

mod args;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use pagewash_core::PagewashError;
use pagewash_document::{BatchRunner, BatchSummary, StageOutcome};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, ReportFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -q / -v.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Exit status for a failed run: the error's class when it carries one.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PagewashError>()
        .map_or(1, |err| err.exit_code() as u8)
}

fn run(cli: &Cli) -> Result<u8> {
    let config = cli.run_config()?;

    if cli.dump_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(0);
    }

    let input = cli
        .input
        .as_deref()
        .context("No input file given (see --help)")?;

    let summary = BatchRunner::new(&config)
        .run(input, cli.output.as_deref())
        .with_context(|| format!("Failed to process {input}"))?;

    match cli.report {
        Some(ReportFormat::Json) => println!("{}", serde_json::to_string_pretty(&summary)?),
        Some(ReportFormat::Text) => print!("{}", text_report(&summary)),
        None => {}
    }

    Ok(summary.exit_code() as u8)
}

/// One line per processed sheet listing the stages that did something,
/// then one line per failure.
fn text_report(summary: &BatchSummary) -> String {
    let mut out = String::new();
    for report in &summary.reports {
        let stages: Vec<String> = report
            .stages
            .iter()
            .filter_map(|stage| {
                let detail = match &stage.outcome {
                    StageOutcome::Skipped => return None,
                    StageOutcome::Pixels { changed } => format!("{changed} px"),
                    StageOutcome::Clusters { removed } => format!("{removed} clusters"),
                    StageOutcome::Masks { masks } => format!("{} masks", masks.len()),
                    StageOutcome::Rotations { degrees } => degrees
                        .iter()
                        .map(|d| format!("{d:.2}°"))
                        .collect::<Vec<_>>()
                        .join(" "),
                    StageOutcome::Border { changed, .. } => format!("{changed} px"),
                    StageOutcome::Centered { moved } => format!("{} moved", moved.len()),
                    StageOutcome::Transformed => "done".to_string(),
                };
                Some(format!("{:?}={detail}", stage.stage))
            })
            .collect();
        out.push_str(&format!(
            "sheet {} {}x{} {}ms: {}\n",
            report.sheet,
            report.width,
            report.height,
            report.elapsed.as_millis(),
            stages.join(", ")
        ));
    }
    for failure in &summary.failures {
        out.push_str(&format!(
            "sheet {} failed ({}): {}\n",
            failure.sheet, failure.path, failure.message
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pagewash_core::ErrorClass;
    use pagewash_document::pipeline::{SheetFailure, StageReport};
    use pagewash_document::{SheetReport, Stage};

    use super::*;

    /// Typed errors keep their class through added context.
    #[test]
    fn exit_status_follows_error_class() {
        let err = anyhow::Error::new(PagewashError::InputNotFound {
            path: "scan1.pgm".into(),
        })
            .context("Failed to process scan%d.pgm");
        assert_eq!(exit_status(&err), 2);
        assert_eq!(exit_status(&anyhow::anyhow!("no input")), 1);
    }

    /// The text report skips stages that did nothing.
    #[test]
    fn text_report_lists_active_stages() {
        let summary = BatchSummary {
            reports: vec![SheetReport {
                sheet: 3,
                width: 40,
                height: 20,
                stages: vec![
                    StageReport {
                        stage: Stage::NoiseFilter,
                        outcome: StageOutcome::Clusters { removed: 4 },
                    },
                    StageReport {
                        stage: Stage::Deskew,
                        outcome: StageOutcome::Skipped,
                    },
                ],
                elapsed: Duration::from_millis(7),
            }],
            failures: vec![SheetFailure {
                sheet: 4,
                path: "scan4.pgm".into(),
                class: ErrorClass::Sheet,
                message: "truncated raster".into(),
            }],
            elapsed: Duration::from_millis(9),
        };
        let text = text_report(&summary);
        assert_eq!(
            text,
            "sheet 3 40x20 7ms: NoiseFilter=4 clusters\nsheet 4 failed (scan4.pgm): truncated raster\n"
        );
    }
}
