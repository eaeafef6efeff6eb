// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch driver — walks numbered sheet files, runs the sheet processor on each
// selected sheet and writes the results.

use std::path::Path;
use std::time::{Duration, Instant};

use pagewash_core::error::{PagewashError, Result};
use pagewash_core::{ErrorClass, RunConfig};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::image::{load_canvas, save_canvas};
use crate::pipeline::report::SheetReport;
use crate::pipeline::sheet::SheetProcessor;

/// Expand `%d`, `%Nd` and `%0Nd` to `sheet` and `%%` to `%`. Other `%`
/// sequences are kept as written.
pub fn resolve_pattern(pattern: &str, sheet: u32) -> String {
    let mut resolved = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;
    while let Some(at) = rest.find('%') {
        resolved.push_str(&rest[..at]);
        let spec = &rest[at + 1..];
        if let Some(after) = spec.strip_prefix('%') {
            resolved.push('%');
            rest = after;
            continue;
        }
        let zero = spec.starts_with('0');
        let digits = spec.bytes().take_while(u8::is_ascii_digit).count();
        match (spec[..digits].parse::<usize>().ok(), spec[digits..].strip_prefix('d')) {
            (width, Some(after)) => {
                let width = width.unwrap_or(0);
                if zero {
                    resolved.push_str(&format!("{sheet:0width$}"));
                } else {
                    resolved.push_str(&format!("{sheet:width$}"));
                }
                rest = after;
            }
            (_, None) => {
                resolved.push('%');
                rest = spec;
            }
        }
    }
    resolved.push_str(rest);
    resolved
}

/// A sheet that could not be loaded, processed or saved.
#[derive(Debug, Clone, Serialize)]
pub struct SheetFailure {
    pub sheet: u32,
    pub path: String,
    pub class: ErrorClass,
    pub message: String,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub reports: Vec<SheetReport>,
    pub failures: Vec<SheetFailure>,
    pub elapsed: Duration,
}

impl BatchSummary {
    /// 0 when every sheet went through, otherwise the status of the most
    /// severe failure.
    pub fn exit_code(&self) -> i32 {
        self.failures
            .iter()
            .map(|failure| failure.class.exit_code())
            .max()
            .unwrap_or(0)
    }
}

pub struct BatchRunner<'a> {
    config: &'a RunConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Process every sheet matched by `input`, writing to `output`.
    ///
    /// With `%` in `input` (and multi-sheet mode on) sheets are numbered from
    /// the start sheet until the end sheet or the first missing file. A
    /// missing or unreadable first sheet fails the run; later sheet failures
    /// are collected in the summary.
    #[instrument(skip(self))]
    pub fn run(&self, input: &str, output: Option<&str>) -> Result<BatchSummary> {
        let config = self.config;
        config.validate()?;
        if config.write_output && output.is_none() {
            return Err(PagewashError::Config("no output file specified".into()));
        }

        let started = Instant::now();
        let multi = config.multi_sheet && input.contains('%');
        let (first, last) = if multi {
            (config.start_sheet, config.end_sheet)
        } else {
            (1, Some(1))
        };
        let processor = SheetProcessor::new(&config.sheet, &config.policy);
        let mut summary = BatchSummary {
            reports: Vec::new(),
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        };

        let mut sheet = first;
        while last.is_none_or(|last| sheet <= last) {
            let input_path = if multi {
                resolve_pattern(input, sheet)
            } else {
                input.to_string()
            };
            if multi && !Path::new(&input_path).exists() {
                if sheet == first {
                    return Err(PagewashError::InputNotFound { path: input_path });
                }
                debug!(sheet, path = %input_path, "No further input, batch complete");
                break;
            }

            if !config.policy.processes(sheet) {
                debug!(sheet, "Sheet not selected");
            } else {
                let canvas = match load_canvas(&input_path) {
                    Ok(canvas) => canvas,
                    Err(err) if sheet == first => return Err(err),
                    Err(err) => {
                        warn!(sheet, path = %input_path, error = %err, "Failed to load sheet, ending batch");
                        summary.failures.push(failure(sheet, &input_path, &err));
                        break;
                    }
                };
                let input_depth = canvas.depth();
                info!(sheet, path = %input_path, "Processing sheet");

                match processor.process(sheet, canvas) {
                    Ok((canvas, report)) => {
                        let written = match output {
                            Some(output) if config.write_output => {
                                let output_path = if multi {
                                    resolve_pattern(output, sheet)
                                } else {
                                    output.to_string()
                                };
                                let depth = config.output_depth.unwrap_or(input_depth);
                                save_canvas(&canvas, &output_path, depth, config.sheet.black_threshold)
                                    .map_err(|err| (output_path, err))
                            }
                            _ => Ok(()),
                        };
                        match written {
                            Ok(()) => summary.reports.push(report),
                            Err((path, err)) => {
                                warn!(sheet, path = %path, error = %err, "Failed to save sheet");
                                summary.failures.push(failure(sheet, &path, &err));
                            }
                        }
                    }
                    Err(err) if err.class() == ErrorClass::Resource => return Err(err),
                    Err(err) => {
                        warn!(sheet, error = %err, "Failed to process sheet");
                        summary.failures.push(failure(sheet, &input_path, &err));
                    }
                }
            }

            match sheet.checked_add(1) {
                Some(next) => sheet = next,
                None => break,
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            sheets = summary.reports.len(),
            failures = summary.failures.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Batch finished"
        );
        Ok(summary)
    }
}

fn failure(sheet: u32, path: &str, err: &PagewashError) -> SheetFailure {
    SheetFailure {
        sheet,
        path: path.to_string(),
        class: err.class(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, Canvas};
    use pagewash_core::{ColorDepth, Rect, SheetSelector};

    fn write_sheet(path: &Path) {
        let mut canvas = Canvas::new(60, 40, ColorDepth::Grayscale).expect("canvas");
        canvas.fill_rect(Rect::new(20, 10, 40, 30), BLACK);
        save_canvas(&canvas, path, ColorDepth::Grayscale, 0.5).expect("save");
    }

    /// Patterns expand like printf integer conversions.
    #[test]
    fn pattern_resolution() {
        assert_eq!(resolve_pattern("scan%d.pgm", 7), "scan7.pgm");
        assert_eq!(resolve_pattern("scan%03d.pgm", 7), "scan007.pgm");
        assert_eq!(resolve_pattern("scan%3d.pgm", 7), "scan  7.pgm");
        assert_eq!(resolve_pattern("100%%-%02d", 12), "100%-12");
        assert_eq!(resolve_pattern("odd%s", 1), "odd%s");
        assert_eq!(resolve_pattern("plain.pgm", 1), "plain.pgm");
    }

    /// Sheets are processed until the first missing number.
    #[test]
    fn batch_stops_at_missing_sheet() {
        let dir = tempfile::tempdir().expect("tempdir");
        for sheet in 1..=2 {
            write_sheet(&dir.path().join(format!("in{sheet:02}.pgm")));
        }
        let input = dir.path().join("in%02d.pgm");
        let output = dir.path().join("out%02d.pgm");
        let config = RunConfig::default();
        let summary = BatchRunner::new(&config)
            .run(
                input.to_str().expect("utf-8 path"),
                Some(output.to_str().expect("utf-8 path")),
            )
            .expect("run");

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.exit_code(), 0);
        assert!(dir.path().join("out01.pgm").exists());
        assert!(dir.path().join("out02.pgm").exists());
        assert!(!dir.path().join("out03.pgm").exists());
    }

    /// A missing first sheet is an error.
    #[test]
    fn missing_first_sheet_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in%02d.pgm");
        let config = RunConfig::default();
        let err = BatchRunner::new(&config)
            .run(input.to_str().expect("utf-8 path"), Some("out%02d.pgm"))
            .expect_err("missing input");
        assert!(matches!(err, PagewashError::InputNotFound { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    /// Test-only runs write nothing and excluded sheets are passed over.
    #[test]
    fn test_only_and_exclusion() {
        let dir = tempfile::tempdir().expect("tempdir");
        for sheet in 1..=3 {
            write_sheet(&dir.path().join(format!("in{sheet}.pgm")));
        }
        let mut config = RunConfig {
            write_output: false,
            ..RunConfig::default()
        };
        config.policy.set_exclude("2".parse::<SheetSelector>().expect("selector"));
        let input = dir.path().join("in%d.pgm");
        let summary = BatchRunner::new(&config)
            .run(input.to_str().expect("utf-8 path"), None)
            .expect("run");

        let sheets: Vec<u32> = summary.reports.iter().map(|report| report.sheet).collect();
        assert_eq!(sheets, vec![1, 3]);
        let written = std::fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(written, 3);
    }

    /// A single file is processed once even without a `%` pattern.
    #[test]
    fn single_sheet_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("page.pgm");
        let output = dir.path().join("page.pbm");
        write_sheet(&input);
        let config = RunConfig {
            output_depth: Some(ColorDepth::Bilevel),
            ..RunConfig::default()
        };
        let summary = BatchRunner::new(&config)
            .run(
                input.to_str().expect("utf-8 path"),
                Some(output.to_str().expect("utf-8 path")),
            )
            .expect("run");
        assert_eq!(summary.reports.len(), 1);
        let written = load_canvas(&output).expect("load output");
        assert_eq!(written.depth(), ColorDepth::Bilevel);
    }

    /// An output pattern is required unless output is switched off.
    #[test]
    fn output_required() {
        let config = RunConfig::default();
        let err = BatchRunner::new(&config)
            .run("in%d.pgm", None)
            .expect_err("no output");
        assert_eq!(err.exit_code(), 1);
    }
}
