// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline module — the per-sheet stage sequence, its reports, and the batch
// driver over numbered sheet files.

pub mod batch;
pub mod report;
pub mod sheet;

pub use batch::{BatchRunner, BatchSummary, SheetFailure, resolve_pattern};
pub use report::{SheetReport, Stage, StageOutcome, StageReport};
pub use sheet::SheetProcessor;
