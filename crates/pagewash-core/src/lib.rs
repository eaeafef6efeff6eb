// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagewash — Core types, sheet selection, configuration, and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod selector;
pub mod types;

pub use config::{RunConfig, SheetConfig};
pub use error::{ErrorClass, PagewashError};
pub use selector::{Feature, SheetPolicy, SheetSelector};
pub use types::*;
